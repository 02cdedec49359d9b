//! Drawing: CPU scene composition and the wgpu presenter.

mod canvas;
mod gpu;
pub mod scene;

// Re-export public types
pub use canvas::{Canvas, Rgba, WHITE};
pub use gpu::RenderSystem;
pub use scene::compose;
