use tracing::{debug, warn};

use crate::board::BoardState;
use crate::catalog::TileCatalog;
use crate::grid::{CellCoord, Grid, Vec2};

/// A grid together with the board it addresses.
#[derive(Debug, Clone)]
pub struct Surface {
    pub grid: Grid,
    pub board: BoardState,
}

impl Surface {
    pub fn new(grid: Grid, board: BoardState) -> Self {
        Self { grid, board }
    }

    /// Cell under the pointer paired with the kind stored there.
    fn kind_under(&self, pointer: Vec2) -> Option<(CellCoord, &str)> {
        let cell = self.grid.cell_at(pointer)?;
        match self.board.get(cell.row, cell.col) {
            Ok(kind) => Some((cell, kind)),
            Err(error) => {
                warn!(error = %error, "surface_cell_lookup_failed");
                None
            }
        }
    }
}

/// What a single click did. Rejections are ordinary gameplay, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Placed { cell: CellCoord, previous: String },
    Rejected { cell: CellCoord, current: String },
    Selected { cell: CellCoord, kind: String },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverPreview<'a> {
    /// The selected kind drawn over the hovered game cell.
    Ghost { cell: CellCoord, kind: &'a str },
    PaletteHighlight { cell: CellCoord },
    None,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    selected: String,
}

impl InteractionController {
    pub fn new(default_selection: impl Into<String>) -> Self {
        Self {
            selected: default_selection.into(),
        }
    }

    pub fn current_selection(&self) -> &str {
        &self.selected
    }

    pub fn hovered_cell(&self, grid: &Grid, pointer: Vec2) -> Option<CellCoord> {
        grid.cell_at(pointer)
    }

    /// Game grid first, then palette. Everything else is a no-op.
    pub fn on_click(
        &mut self,
        pointer: Vec2,
        game: &mut Surface,
        palette: &Surface,
        catalog: &TileCatalog,
    ) -> ClickOutcome {
        if game.grid.contains(pointer) {
            return self.place(pointer, game, catalog);
        }
        if palette.grid.contains(pointer) {
            return self.select(pointer, palette);
        }
        ClickOutcome::Ignored
    }

    pub fn hover_preview<'a>(
        &'a self,
        pointer: Vec2,
        game: &Surface,
        palette: &Surface,
    ) -> HoverPreview<'a> {
        if let Some(cell) = self.hovered_cell(&game.grid, pointer) {
            return HoverPreview::Ghost {
                cell,
                kind: &self.selected,
            };
        }
        if let Some(cell) = self.hovered_cell(&palette.grid, pointer) {
            return HoverPreview::PaletteHighlight { cell };
        }
        HoverPreview::None
    }

    fn place(&mut self, pointer: Vec2, game: &mut Surface, catalog: &TileCatalog) -> ClickOutcome {
        let Some((cell, current)) = game.kind_under(pointer) else {
            return ClickOutcome::Ignored;
        };
        let overwritable = match catalog.is_overwritable(current) {
            Ok(overwritable) => overwritable,
            Err(error) => {
                warn!(row = cell.row, col = cell.col, error = %error, "placement_target_unknown");
                return ClickOutcome::Ignored;
            }
        };
        if !overwritable {
            debug!(row = cell.row, col = cell.col, current, "placement_rejected");
            return ClickOutcome::Rejected {
                cell,
                current: current.to_string(),
            };
        }

        let previous = current.to_string();
        if let Err(error) = game.board.set(cell.row, cell.col, &self.selected) {
            warn!(error = %error, "placement_write_failed");
            return ClickOutcome::Ignored;
        }
        debug!(
            row = cell.row,
            col = cell.col,
            previous = previous.as_str(),
            placed = self.selected.as_str(),
            "tile_placed"
        );
        ClickOutcome::Placed { cell, previous }
    }

    fn select(&mut self, pointer: Vec2, palette: &Surface) -> ClickOutcome {
        let Some((cell, kind)) = palette.kind_under(pointer) else {
            return ClickOutcome::Ignored;
        };
        kind.clone_into(&mut self.selected);
        debug!(row = cell.row, col = cell.col, kind, "selection_changed");
        ClickOutcome::Selected {
            cell,
            kind: kind.to_string(),
        }
    }
}
