mod renderer;

pub use renderer::{RenderError, Renderer, HIGHLIGHT_TILE};

/// Canvas size in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
