/// Utility types shared across the crate

pub mod handle_allocator;

pub use handle_allocator::HandleAllocator;
