use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TileCatalog;
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("expected {expected} rows, got {actual}")]
    RowCount { expected: u32, actual: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: u32,
        actual: usize,
    },
    #[error("no record for cell ({row}, {col})")]
    MissingCell { row: u32, col: u32 },
    #[error("more than one record for cell ({row}, {col})")]
    DuplicateCell { row: u32, col: u32 },
    #[error("record for cell ({row}, {col}) lies outside the board")]
    CellOutOfRange { row: u32, col: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("malformed board map: {reason}")]
    MalformedMap { reason: MalformedReason },
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} board")]
    OutOfBounds {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
    #[error("board is {board_rows}x{board_cols} but its grid is {grid_rows}x{grid_cols}")]
    DimensionMismatch {
        board_rows: u32,
        board_cols: u32,
        grid_rows: u32,
        grid_cols: u32,
    },
    #[error("cell ({row}, {col}) holds unknown tile kind '{name}'")]
    UnknownKind { row: u32, col: u32, name: String },
}

/// One cell entry of a record-style map, as written by the map generator script.
/// The generator writes indices as strings and adds `id`/`entireRow`; both forms load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    #[serde(deserialize_with = "cell_index")]
    pub row_number: u32,
    #[serde(deserialize_with = "cell_index")]
    pub column_number: u32,
    pub tile: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellIndexField {
    Number(u32),
    Text(String),
}

fn cell_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match CellIndexField::deserialize(deserializer)? {
        CellIndexField::Number(index) => Ok(index),
        CellIndexField::Text(text) => text.trim().parse().map_err(|_| {
            de::Error::invalid_value(Unexpected::Str(&text), &"a non-negative cell index")
        }),
    }
}

/// Row-major store of tile kind names. Performs no permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    rows: u32,
    cols: u32,
    cells: Vec<String>,
}

impl BoardState {
    pub fn from_rows(rows: u32, cols: u32, literal: Vec<Vec<String>>) -> Result<Self, BoardError> {
        if literal.len() != rows as usize {
            return Err(BoardError::MalformedMap {
                reason: MalformedReason::RowCount {
                    expected: rows,
                    actual: literal.len(),
                },
            });
        }
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        for (row, entries) in literal.into_iter().enumerate() {
            if entries.len() != cols as usize {
                return Err(BoardError::MalformedMap {
                    reason: MalformedReason::RowLength {
                        row,
                        expected: cols,
                        actual: entries.len(),
                    },
                });
            }
            cells.extend(entries);
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn filled(rows: u32, cols: u32, name: &str) -> Self {
        Self {
            rows,
            cols,
            cells: vec![name.to_string(); rows as usize * cols as usize],
        }
    }

    /// Builds a board from one record per cell. Every cell must be covered exactly once.
    pub fn from_cell_records(
        rows: u32,
        cols: u32,
        records: Vec<CellRecord>,
    ) -> Result<Self, BoardError> {
        let mut slots: Vec<Option<String>> = vec![None; rows as usize * cols as usize];
        for record in records {
            let (row, col) = (record.row_number, record.column_number);
            if row >= rows || col >= cols {
                return Err(BoardError::MalformedMap {
                    reason: MalformedReason::CellOutOfRange { row, col },
                });
            }
            let slot = &mut slots[row as usize * cols as usize + col as usize];
            if slot.is_some() {
                return Err(BoardError::MalformedMap {
                    reason: MalformedReason::DuplicateCell { row, col },
                });
            }
            *slot = Some(record.tile);
        }

        let mut cells = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(name) => cells.push(name),
                None => {
                    return Err(BoardError::MalformedMap {
                        reason: MalformedReason::MissingCell {
                            row: (index / cols as usize) as u32,
                            col: (index % cols as usize) as u32,
                        },
                    })
                }
            }
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn get(&self, row: u32, col: u32) -> Result<&str, BoardError> {
        let index = self.index_of(row, col)?;
        Ok(self.cells[index].as_str())
    }

    pub fn set(&mut self, row: u32, col: u32, name: &str) -> Result<(), BoardError> {
        let index = self.index_of(row, col)?;
        name.clone_into(&mut self.cells[index]);
        Ok(())
    }

    /// Cells in row-major order as `(row, col, kind name)`.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &str)> + '_ {
        let cols = self.cols as usize;
        self.cells.iter().enumerate().map(move |(index, name)| {
            ((index / cols) as u32, (index % cols) as u32, name.as_str())
        })
    }

    pub fn ensure_matches(&self, grid: &Grid) -> Result<(), BoardError> {
        if self.rows == grid.rows() && self.cols == grid.cols() {
            return Ok(());
        }
        Err(BoardError::DimensionMismatch {
            board_rows: self.rows,
            board_cols: self.cols,
            grid_rows: grid.rows(),
            grid_cols: grid.cols(),
        })
    }

    pub fn ensure_known_kinds(&self, catalog: &TileCatalog) -> Result<(), BoardError> {
        match self.iter_cells().find(|(_, _, name)| !catalog.is_known(name)) {
            Some((row, col, name)) => Err(BoardError::UnknownKind {
                row,
                col,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn index_of(&self, row: u32, col: u32) -> Result<usize, BoardError> {
        if row >= self.rows || col >= self.cols {
            return Err(BoardError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row as usize * self.cols as usize + col as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_kind, EMPTY_TILE};
    use crate::grid::{GridSpec, Vec2};

    fn names(row: &[&str]) -> Vec<String> {
        row.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn cell_record_accepts_string_and_numeric_indices() {
        let generated: CellRecord = serde_json::from_value(serde_json::json!({
            "id": "3",
            "entireRow": "0",
            "columnNumber": "3",
            "rowNumber": "17",
            "tile": "background_0"
        }))
        .expect("generator record");
        assert_eq!(generated, record(17, 3, "background_0"));

        let numeric: CellRecord = serde_json::from_value(serde_json::json!({
            "rowNumber": 17, "columnNumber": 3, "tile": "background_0"
        }))
        .expect("numeric record");
        assert_eq!(numeric, generated);

        let negative = serde_json::from_value::<CellRecord>(serde_json::json!({
            "rowNumber": "-1", "columnNumber": "0", "tile": "background_0"
        }));
        assert!(negative.is_err());
    }

    #[test]
    fn malformed_map_message_names_the_cell() {
        let err = BoardState::from_cell_records(2, 2, vec![record(0, 0, "grass")])
            .expect_err("missing cells");
        assert_eq!(
            err.to_string(),
            "malformed board map: no record for cell (0, 1)"
        );
    }

    fn record(row: u32, col: u32, tile: &str) -> CellRecord {
        CellRecord {
            row_number: row,
            column_number: col,
            tile: tile.to_string(),
        }
    }

    #[test]
    fn from_rows_keeps_row_major_layout() {
        let board = BoardState::from_rows(
            2,
            3,
            vec![names(&["a", "b", "c"]), names(&["d", "e", "f"])],
        )
        .expect("board");
        assert_eq!(board.get(0, 2), Ok("c"));
        assert_eq!(board.get(1, 0), Ok("d"));
        let order = board
            .iter_cells()
            .map(|(_, _, name)| name)
            .collect::<Vec<_>>()
            .concat();
        assert_eq!(order, "abcdef");
    }

    #[test]
    fn short_row_fails_instead_of_padding() {
        let err = BoardState::from_rows(2, 3, vec![names(&["a", "b", "c"]), names(&["d", "e"])])
            .expect_err("short row");
        assert_eq!(
            err,
            BoardError::MalformedMap {
                reason: MalformedReason::RowLength {
                    row: 1,
                    expected: 3,
                    actual: 2
                }
            }
        );
    }

    #[test]
    fn long_row_fails_instead_of_truncating() {
        let err = BoardState::from_rows(1, 2, vec![names(&["a", "b", "c"])]).expect_err("long");
        assert!(matches!(
            err,
            BoardError::MalformedMap {
                reason: MalformedReason::RowLength { actual: 3, .. }
            }
        ));
    }

    #[test]
    fn row_count_mismatch_fails() {
        let err = BoardState::from_rows(3, 1, vec![names(&["a"])]).expect_err("rows");
        assert_eq!(
            err,
            BoardError::MalformedMap {
                reason: MalformedReason::RowCount {
                    expected: 3,
                    actual: 1
                }
            }
        );
    }

    #[test]
    fn get_and_set_check_bounds() {
        let mut board = BoardState::filled(2, 2, EMPTY_TILE);
        assert_eq!(
            board.get(2, 0),
            Err(BoardError::OutOfBounds {
                row: 2,
                col: 0,
                rows: 2,
                cols: 2
            })
        );
        assert!(board.set(0, 2, "rock").is_err());
        board.set(1, 1, "rock").expect("set");
        assert_eq!(board.get(1, 1), Ok("rock"));
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let mut board = BoardState::filled(1, 1, "rock");
        board.set(0, 0, "grass").expect("set");
        assert_eq!(board.get(0, 0), Ok("grass"));
    }

    #[test]
    fn cell_records_build_full_board() {
        let board = BoardState::from_cell_records(
            2,
            2,
            vec![
                record(1, 1, "ground_0"),
                record(0, 0, "background_0"),
                record(0, 1, "background_0"),
                record(1, 0, "grass_0"),
            ],
        )
        .expect("board");
        assert_eq!(board.get(1, 0), Ok("grass_0"));
        assert_eq!(board.get(1, 1), Ok("ground_0"));
    }

    #[test]
    fn cell_records_reject_gaps_duplicates_and_strays() {
        let missing = BoardState::from_cell_records(1, 2, vec![record(0, 0, "a")]);
        assert_eq!(
            missing,
            Err(BoardError::MalformedMap {
                reason: MalformedReason::MissingCell { row: 0, col: 1 }
            })
        );

        let duplicate =
            BoardState::from_cell_records(1, 1, vec![record(0, 0, "a"), record(0, 0, "b")]);
        assert!(matches!(
            duplicate,
            Err(BoardError::MalformedMap {
                reason: MalformedReason::DuplicateCell { row: 0, col: 0 }
            })
        ));

        let stray = BoardState::from_cell_records(1, 1, vec![record(0, 0, "a"), record(0, 4, "b")]);
        assert!(matches!(
            stray,
            Err(BoardError::MalformedMap {
                reason: MalformedReason::CellOutOfRange { row: 0, col: 4 }
            })
        ));
    }

    #[test]
    fn dimensions_must_match_grid() {
        let grid = Grid::new(GridSpec {
            rows: 4,
            cols: 4,
            cell_width: 10.0,
            cell_height: 10.0,
            origin: Vec2::default(),
        })
        .expect("grid");
        assert!(BoardState::filled(4, 4, EMPTY_TILE).ensure_matches(&grid).is_ok());
        assert!(matches!(
            BoardState::filled(4, 3, EMPTY_TILE).ensure_matches(&grid),
            Err(BoardError::DimensionMismatch { board_cols: 3, .. })
        ));
    }

    #[test]
    fn unknown_kind_names_are_reported_with_position() {
        let catalog = TileCatalog::from_kinds([test_kind(0, "grass", true)]).expect("catalog");
        let board = BoardState::from_rows(
            1,
            3,
            vec![names(&["grass", EMPTY_TILE, "lava"])],
        )
        .expect("board");
        assert_eq!(
            board.ensure_known_kinds(&catalog),
            Err(BoardError::UnknownKind {
                row: 0,
                col: 2,
                name: "lava".to_string()
            })
        );
    }
}
