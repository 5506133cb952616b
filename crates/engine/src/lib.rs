use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod asset_keys;
pub mod board;
pub mod catalog;
pub mod content;
pub mod grid;
pub mod interaction;
pub mod session;

pub use app::{
    run_app, AppError, InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot, RenderError,
    Viewport, DEFAULT_MAX_RENDER_FPS, HIGHLIGHT_TILE, MAX_FPS_ENV_VAR,
};
pub use asset_keys::AssetKeyError;
pub use board::{BoardError, BoardState, CellRecord, MalformedReason};
pub use catalog::{CatalogError, TileCatalog, TileKind, TileKindId, TileLayer, EMPTY_TILE};
pub use content::{load_session, ContentError};
pub use grid::{CellCoord, Grid, GridDisplay, GridError, GridSpec, PixelRect, Vec2};
pub use interaction::{ClickOutcome, HoverPreview, InteractionController, Surface};
pub use session::{Session, SessionError, SessionParts, SurfaceKind};

pub const ROOT_ENV_VAR: &str = "MAGIC_WORMS_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub content_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let content_dir = root.join("assets").join("base");
        Self { root, content_dir }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/magic-worms\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = tempfile::TempDir::new().expect("tempdir");
        fs::create_dir(temp.path().join("assets")).expect("assets dir");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn content_dir_is_assets_base() {
        let paths = AppPaths::from_root(PathBuf::from("/srv/worms"));
        assert_eq!(paths.content_dir, PathBuf::from("/srv/worms/assets/base"));
    }

    #[test]
    fn loop_defaults_are_reachable_from_the_crate_root() {
        let config = LoopConfig::default();
        assert_eq!(config.max_render_fps, Some(DEFAULT_MAX_RENDER_FPS));
        assert_eq!(HIGHLIGHT_TILE, "highlight_0");

        let viewport = Viewport {
            width: config.canvas_width,
            height: config.canvas_height,
        };
        assert_eq!(viewport.width, 1280);
        assert_eq!(LoopMetricsSnapshot::default().fps, 0.0);
    }
}
