//! Staged uniform values
//!
//! A uniform holds a committed value and a staged one. Updates only touch
//! the staged value; `sync` commits it and `upload` pushes the committed
//! value to the current program. Arrays remember which elements changed so a
//! sync copies only those, unless a whole-array replace was staged.

use std::fmt::Debug;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::device::{Device, UniformValue};
use crate::error::Result;
use crate::resource::shader_program::ShaderProgram;

const SOURCE: &str = "glcache::UniformArray";

/// Element types a uniform can hold
pub trait UniformData: Copy + PartialEq + Debug {
    fn value(&self) -> UniformValue<'_>;
    fn array_value(values: &[Self]) -> UniformValue<'_>;
}

macro_rules! impl_uniform_data {
    ($ty:ty, $single:ident, $array:ident) => {
        impl UniformData for $ty {
            fn value(&self) -> UniformValue<'_> {
                UniformValue::$single(*self)
            }

            fn array_value(values: &[Self]) -> UniformValue<'_> {
                UniformValue::$array(values)
            }
        }
    };
}

impl_uniform_data!(i32, Int, IntArray);
impl_uniform_data!(f32, Float, FloatArray);
impl_uniform_data!(Vec2, Vec2, Vec2Array);
impl_uniform_data!(Vec3, Vec3, Vec3Array);
impl_uniform_data!(Vec4, Vec4, Vec4Array);
impl_uniform_data!(Mat4, Mat4, Mat4Array);

/// Common interface of [`Uniform`] and [`UniformArray`]
pub trait StagedUniform {
    fn name(&self) -> &str;

    /// Whether `sync` would change the committed value
    fn is_pending(&self) -> bool;

    /// Commit the staged value
    fn sync(&mut self);

    /// Upload the committed value to `program`, which must be current
    fn upload(&self, device: &mut dyn Device, program: &ShaderProgram) -> Result<()>;
}

// ===== UNIFORM =====

#[derive(Debug, Clone)]
pub struct Uniform<T: UniformData> {
    name: String,
    committed: T,
    staged: T,
}

impl<T: UniformData> Uniform<T> {
    pub fn new(name: &str, value: T) -> Self {
        Self {
            name: name.to_string(),
            committed: value,
            staged: value,
        }
    }

    /// Stage a new value for the next `sync`
    pub fn update(&mut self, value: T) {
        self.staged = value;
    }

    pub fn staged(&self) -> T {
        self.staged
    }

    pub fn committed(&self) -> T {
        self.committed
    }
}

impl<T: UniformData> StagedUniform for Uniform<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_pending(&self) -> bool {
        self.staged != self.committed
    }

    fn sync(&mut self) {
        self.committed = self.staged;
    }

    fn upload(&self, device: &mut dyn Device, program: &ShaderProgram) -> Result<()> {
        program.set_uniform(device, &self.name, self.committed.value())
    }
}

// ===== UNIFORM ARRAY =====

/// Fixed-length uniform array with per-element staging
#[derive(Debug, Clone)]
pub struct UniformArray<T: UniformData> {
    name: String,
    committed: Vec<T>,
    staged: Vec<T>,
    /// Commit every element on the next sync
    reupload: bool,
    /// Elements staged since the last sync (without `reupload`)
    dirty: Vec<usize>,
}

impl<T: UniformData> UniformArray<T> {
    pub fn new(name: &str, values: Vec<T>) -> Self {
        Self {
            name: name.to_string(),
            committed: values.clone(),
            staged: values,
            reupload: false,
            dirty: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn staged(&self) -> &[T] {
        &self.staged
    }

    pub fn committed(&self) -> &[T] {
        &self.committed
    }

    /// Stage a whole new array (same length) for the next `sync`
    pub fn replace(&mut self, values: Vec<T>) -> Result<()> {
        if values.len() != self.staged.len() {
            crate::glc_bail!(
                SOURCE,
                InvalidArgument,
                "{}: replacement has {} elements, array has {}",
                self.name,
                values.len(),
                self.staged.len()
            );
        }
        self.staged = values;
        self.reupload = true;
        self.dirty.clear();
        Ok(())
    }

    /// Stage one element
    ///
    /// With `reupload` the next sync commits the whole array instead of
    /// just the elements staged since the last one.
    pub fn update(&mut self, index: usize, value: T, reupload: bool) -> Result<()> {
        let len = self.staged.len();
        let Some(slot) = self.staged.get_mut(index) else {
            crate::glc_bail!(SOURCE, InvalidArgument, "{}: index {} out of range ({} elements)", self.name, index, len);
        };
        *slot = value;

        if reupload {
            self.reupload = true;
            self.dirty.clear();
        } else if !self.reupload && !self.dirty.contains(&index) {
            self.dirty.push(index);
        }
        Ok(())
    }
}

impl<T: UniformData> StagedUniform for UniformArray<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_pending(&self) -> bool {
        self.reupload || !self.dirty.is_empty()
    }

    fn sync(&mut self) {
        if self.reupload {
            self.committed.copy_from_slice(&self.staged);
            self.reupload = false;
        } else {
            for &index in &self.dirty {
                self.committed[index] = self.staged[index];
            }
        }
        self.dirty.clear();
    }

    fn upload(&self, device: &mut dyn Device, program: &ShaderProgram) -> Result<()> {
        program.set_uniform(device, &self.name, T::array_value(&self.committed))
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
