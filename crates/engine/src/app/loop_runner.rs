use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::interaction::ClickOutcome;
use crate::session::Session;

use super::input::{InputAction, InputCollector};
use super::metrics::MetricsAccumulator;
use super::rendering::{RenderError, Renderer, Viewport};

pub const MAX_FPS_ENV_VAR: &str = "MAGIC_WORMS_MAX_FPS";
pub const DEFAULT_MAX_RENDER_FPS: u32 = 24;
const CANVAS_MARGIN_PX: u32 = 20;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub max_render_fps: Option<u32>,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Magic Worms".to_string(),
            canvas_width: 1280,
            canvas_height: 900,
            max_render_fps: Some(DEFAULT_MAX_RENDER_FPS),
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    /// Sizes the canvas to cover both grids plus a margin on the right and bottom.
    pub fn fit_to_session(mut self, session: &Session) -> Self {
        let game = session.game().grid.pixel_bounds();
        let palette = session.palette().grid.pixel_bounds();
        let right = game.right.max(palette.right).ceil().max(1.0) as u32;
        let bottom = game.bottom.max(palette.bottom).ceil().max(1.0) as u32;
        self.canvas_width = right.saturating_add(CANVAS_MARGIN_PX);
        self.canvas_height = bottom.saturating_add(CANVAS_MARGIN_PX);
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `session` until the window closes or Escape is pressed.
/// Sprites are read from `<asset_root>/sprites`.
pub fn run_app(
    config: LoopConfig,
    mut session: Session,
    asset_root: PathBuf,
) -> Result<(), AppError> {
    let canvas = Viewport {
        width: config.canvas_width.max(1),
        height: config.canvas_height.max(1),
    };

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(canvas.width as f64, canvas.height as f64))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), canvas, asset_root.join("sprites"))
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap =
        normalize_render_fps_cap(resolve_max_render_fps(config.max_render_fps));
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    info!(
        canvas_width = canvas.width,
        canvas_height = canvas.height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        selection = session.current_selection(),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(
                        renderer.window_to_canvas(position.x as f32, position.y as f32),
                    );
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.set_cursor_position_px(None);
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let is_down = state == ElementState::Pressed;
                    if let Some(placed) =
                        handle_left_mouse(&mut session, &mut input_collector, is_down)
                    {
                        metrics_accumulator.record_click(placed);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if let Some(action) = action_for_key(event.physical_key) {
                        let is_down = event.state == ElementState::Pressed;
                        if input_collector.set_action(action, is_down) {
                            apply_action(&mut session, action);
                        }
                    }
                    if input_collector.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let snapshot = input_collector.snapshot_for_frame();

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) =
                        renderer.render_session(&session, snapshot.cursor_position_px())
                    {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(metrics) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = metrics.fps,
                            frame_time_ms = metrics.frame_time_ms,
                            clicks = metrics.clicks,
                            placements = metrics.placements,
                            selection = session.current_selection(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    match key {
        PhysicalKey::Code(KeyCode::KeyG) => Some(InputAction::ToggleOutlines),
        PhysicalKey::Code(KeyCode::KeyV) => Some(InputAction::ToggleCenterLine),
        PhysicalKey::Code(KeyCode::KeyP) => Some(InputAction::TogglePaletteOutlines),
        PhysicalKey::Code(KeyCode::Escape) => Some(InputAction::Quit),
        _ => None,
    }
}

/// Applies a freshly pressed display toggle. Quit is handled by the event loop.
fn apply_action(session: &mut Session, action: InputAction) {
    match action {
        InputAction::ToggleOutlines => {
            let visible = session.toggle_game_outlines();
            info!(visible, "grid_outlines_toggled");
        }
        InputAction::ToggleCenterLine => {
            let visible = session.toggle_game_center_line();
            info!(visible, "center_line_toggled");
        }
        InputAction::TogglePaletteOutlines => {
            let visible = session.toggle_palette_outlines();
            info!(visible, "palette_outlines_toggled");
        }
        InputAction::Quit => {}
    }
}

/// Runs the click for a fresh left press at the cursor position of that press. Returns
/// whether it placed a tile, or `None` when no click happened.
fn handle_left_mouse(
    session: &mut Session,
    input: &mut InputCollector,
    is_down: bool,
) -> Option<bool> {
    let pointer = input.set_left_mouse(is_down)?;
    let outcome = session.click(pointer);
    Some(matches!(outcome, ClickOutcome::Placed { .. }))
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_max_render_fps(config_cap: Option<u32>) -> Option<u32> {
    match env::var(MAX_FPS_ENV_VAR) {
        Ok(value) => parse_render_cap(&value).unwrap_or_else(|| {
            warn!(
                env_var = MAX_FPS_ENV_VAR,
                value = value.as_str(),
                "invalid max-fps env var value; falling back to config"
            );
            config_cap
        }),
        Err(env::VarError::NotPresent) => config_cap,
        Err(err) => {
            warn!(
                env_var = MAX_FPS_ENV_VAR,
                error = %err,
                "unable to read max-fps env var; falling back to config"
            );
            config_cap
        }
    }
}

/// `"off"` disables the cap. Returns `None` when the value is unusable.
fn parse_render_cap(value: &str) -> Option<Option<u32>> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return Some(None);
    }
    trimmed.parse::<u32>().ok().map(Some)
}
