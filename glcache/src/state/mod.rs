/// State module - the device state cache

pub mod state_cache;

pub use state_cache::{BlendEquations, BlendFunc, StateCache, StencilFunc, StencilOps};
