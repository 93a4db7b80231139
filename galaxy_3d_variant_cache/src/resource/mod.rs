//! Resource management module
//!
//! Binary buffers, typed accessors over them, and the `ResourceManager`
//! that owns every cache and exposes them to the renderer.

mod resource_manager;
pub mod buffer_cache;
pub mod accessor;

pub use resource_manager::ResourceManager;
pub use buffer_cache::{Buffer, BufferCache, BufferId};
pub use accessor::{
    Accessor, AccessorCache, AccessorId, AccessorKey,
    ComponentType, ElementShape, ElementType,
};
