mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig, DEFAULT_MAX_RENDER_FPS, MAX_FPS_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{RenderError, Viewport, HIGHLIGHT_TILE};
