use thiserror::Error;
use tracing::info;

use crate::board::{BoardError, BoardState};
use crate::catalog::TileCatalog;
use crate::grid::{Grid, GridDisplay, Vec2};
use crate::interaction::{ClickOutcome, HoverPreview, InteractionController, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Game,
    Palette,
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Game => f.write_str("game"),
            Self::Palette => f.write_str("palette"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{surface} board is invalid: {source}")]
    Board {
        surface: SurfaceKind,
        #[source]
        source: BoardError,
    },
    #[error("default selection '{name}' is not a known tile kind")]
    UnknownDefaultSelection { name: String },
    #[error("game grid and palette grid overlap in pixel space")]
    GridsOverlap,
}

/// Validated inputs for a session.
#[derive(Debug, Clone)]
pub struct SessionParts {
    pub catalog: TileCatalog,
    pub game_grid: Grid,
    pub game_board: BoardState,
    pub ui_grid: Grid,
    pub palette_board: BoardState,
    pub default_selection: String,
}

/// One running game: catalog, both surfaces and the click controller, owned together
/// and handed explicitly to the loop and renderer.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: TileCatalog,
    game: Surface,
    palette: Surface,
    controller: InteractionController,
}

impl Session {
    pub fn new(parts: SessionParts) -> Result<Self, SessionError> {
        let SessionParts {
            catalog,
            game_grid,
            game_board,
            mut ui_grid,
            palette_board,
            default_selection,
        } = parts;

        check_surface(SurfaceKind::Game, &game_grid, &game_board, &catalog)?;
        check_surface(SurfaceKind::Palette, &ui_grid, &palette_board, &catalog)?;
        if !catalog.is_known(&default_selection) {
            return Err(SessionError::UnknownDefaultSelection {
                name: default_selection,
            });
        }
        if game_grid.pixel_bounds().overlaps(&ui_grid.pixel_bounds()) {
            return Err(SessionError::GridsOverlap);
        }

        ui_grid.set_display(GridDisplay {
            outlines_visible: false,
            center_line_visible: false,
        });

        info!(
            game_rows = game_grid.rows(),
            game_cols = game_grid.cols(),
            palette_rows = ui_grid.rows(),
            palette_cols = ui_grid.cols(),
            tile_kinds = catalog.len(),
            default_selection = default_selection.as_str(),
            "session_built"
        );

        Ok(Self {
            catalog,
            game: Surface::new(game_grid, game_board),
            palette: Surface::new(ui_grid, palette_board),
            controller: InteractionController::new(default_selection),
        })
    }

    pub fn click(&mut self, pointer: Vec2) -> ClickOutcome {
        self.controller
            .on_click(pointer, &mut self.game, &self.palette, &self.catalog)
    }

    pub fn hover_preview(&self, pointer: Vec2) -> HoverPreview<'_> {
        self.controller
            .hover_preview(pointer, &self.game, &self.palette)
    }

    pub fn current_selection(&self) -> &str {
        self.controller.current_selection()
    }

    pub fn toggle_game_outlines(&mut self) -> bool {
        self.game.grid.toggle_outlines()
    }

    pub fn toggle_game_center_line(&mut self) -> bool {
        self.game.grid.toggle_center_line()
    }

    pub fn toggle_palette_outlines(&mut self) -> bool {
        self.palette.grid.toggle_outlines()
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn game(&self) -> &Surface {
        &self.game
    }

    pub fn palette(&self) -> &Surface {
        &self.palette
    }
}

fn check_surface(
    surface: SurfaceKind,
    grid: &Grid,
    board: &BoardState,
    catalog: &TileCatalog,
) -> Result<(), SessionError> {
    board
        .ensure_matches(grid)
        .and_then(|()| board.ensure_known_kinds(catalog))
        .map_err(|source| SessionError::Board { surface, source })
}
