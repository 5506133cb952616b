use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worms_engine::{
    load_session, resolve_app_paths, AppPaths, ContentError, LoopConfig, Session, StartupError,
};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: Session,
    pub(crate) asset_root: PathBuf,
}

#[derive(Debug, Error)]
enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Initializes logging and loads the session. Failures are logged and turned into an exit code.
pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Magic Worms Startup ===");

    resolve_app_paths()
        .map_err(BootstrapError::from)
        .and_then(|paths| wire_from_paths(&paths))
        .map_err(|err| {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        })
}

fn wire_from_paths(paths: &AppPaths) -> Result<AppWiring, BootstrapError> {
    info!(
        root = %paths.root.display(),
        content_dir = %paths.content_dir.display(),
        "startup"
    );
    let session = load_session(&paths.content_dir)?;
    let config = LoopConfig::default().fit_to_session(&session);

    Ok(AppWiring {
        config,
        session,
        asset_root: paths.content_dir.clone(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use worms_engine::{ClickOutcome, Vec2, EMPTY_TILE};

    fn shipped_paths() -> AppPaths {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        AppPaths::from_root(root)
    }

    #[test]
    fn shipped_content_builds_a_session() {
        let wiring = wire_from_paths(&shipped_paths()).expect("shipped content should load");
        let session = &wiring.session;

        assert_eq!(session.current_selection(), "wood_0");
        assert_eq!(session.game().board.rows(), 20);
        assert_eq!(session.game().board.cols(), 20);
        assert!(wiring.config.canvas_width > 0);
        assert!(wiring.asset_root.ends_with("assets/base"));
    }

    #[test]
    fn shipped_board_has_sky_grass_and_ground() {
        let wiring = wire_from_paths(&shipped_paths()).expect("load");
        let board = &wiring.session.game().board;
        assert_eq!(board.get(0, 0).expect("sky"), "background_0");
        assert_eq!(board.get(18, 3).expect("grass"), "grass_0");
        assert_eq!(board.get(19, 3).expect("ground"), "ground_0");
    }

    #[test]
    fn shipped_rules_reject_building_on_ground() {
        let mut wiring = wire_from_paths(&shipped_paths()).expect("load");
        let session = &mut wiring.session;
        let ground = session.game().grid.cell_origin(19, 0);
        let pointer = Vec2::new(ground.x + 1.0, ground.y + 1.0);

        assert!(matches!(session.click(pointer), ClickOutcome::Rejected { .. }));
        assert_eq!(session.game().board.get(19, 0).expect("cell"), "ground_0");
    }

    #[test]
    fn shipped_palette_contains_only_known_kinds() {
        let wiring = wire_from_paths(&shipped_paths()).expect("load");
        let session = &wiring.session;
        for (_, _, name) in session.palette().board.iter_cells() {
            assert!(name == EMPTY_TILE || session.catalog().is_known(name));
        }
    }

    #[test]
    fn missing_content_dir_reports_read_failure() {
        let paths = AppPaths::from_root(PathBuf::from("/nonexistent/magic-worms"));
        let err = wire_from_paths(&paths).err().expect("missing dir must fail");
        assert!(matches!(
            err,
            BootstrapError::Content(ContentError::ReadFile { .. })
        ));
    }
}
