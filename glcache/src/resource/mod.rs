//! Device resources
//!
//! Reference-counted device objects whose contents are staged through
//! deferred update queues and pushed to the device on `synchronize`.

pub mod lifecycle;
pub mod update_queue;
pub mod buffer;
pub mod texture;
pub mod shader_program;
pub mod uniform;

pub use lifecycle::{DeviceObject, Resource, ResourceId};
pub use update_queue::{PendingUpdate, SourceData, UpdateFlags, UpdateQueue};
pub use buffer::{Buffer, BufferUpdate};
pub use texture::{ImageUpdate, Texture2D};
pub use shader_program::ShaderProgram;
pub use uniform::{StagedUniform, Uniform, UniformArray, UniformData};
