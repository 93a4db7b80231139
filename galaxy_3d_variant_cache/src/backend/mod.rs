/// Backend module - boundary with the graphics API that compiles and links shaders

// Module declarations
pub mod graphics_backend;

// Re-export everything from graphics_backend.rs
pub use graphics_backend::*;

// Mock backend for tests (no GPU required)
#[cfg(test)]
pub mod mock_backend;
