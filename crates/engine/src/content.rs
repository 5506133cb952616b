use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::board::{BoardError, BoardState, CellRecord};
use crate::catalog::{CatalogError, TileCatalog, TileKind, TileKindId, TileLayer};
use crate::grid::{Grid, GridError, GridSpec};
use crate::session::{Session, SessionError, SessionParts, SurfaceKind};

pub const CATALOG_FILE_NAME: &str = "tiles.json";
pub const LAYOUT_FILE_NAME: &str = "layout.json";
pub const DEFAULT_SELECTION: &str = "wood_0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileCatalogFile {
    pub tiles: Vec<TileRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileRecord {
    pub id: u32,
    pub name: String,
    pub overwritable: bool,
    pub image: String,
    #[serde(default)]
    pub layer: TileLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutFile {
    pub game_grid: GridSpec,
    pub ui_grid: GridSpec,
    #[serde(default = "default_selection")]
    pub default_selection: String,
    pub game_board: BoardSource,
    pub palette_board: BoardSource,
}

/// Board contents, tagged by `format` so each file states its own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum BoardSource {
    Rows { rows: Vec<Vec<String>> },
    CellRecords { records: Vec<CellRecord> },
}

fn default_selection() -> String {
    DEFAULT_SELECTION.to_string()
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {file} at {path}: {message}")]
    Parse {
        file: String,
        path: String,
        message: String,
    },
    #[error("invalid tile catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid {surface} grid: {source}")]
    Grid {
        surface: SurfaceKind,
        #[source]
        source: GridError,
    },
    #[error("invalid {surface} board: {source}")]
    Board {
        surface: SurfaceKind,
        #[source]
        source: BoardError,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn parse_catalog(raw: &str) -> Result<TileCatalogFile, ContentError> {
    parse_json(CATALOG_FILE_NAME, raw)
}

pub fn parse_layout(raw: &str) -> Result<LayoutFile, ContentError> {
    parse_json(LAYOUT_FILE_NAME, raw)
}

pub fn build_catalog(file: TileCatalogFile) -> Result<TileCatalog, ContentError> {
    let kinds = file.tiles.into_iter().map(|record| TileKind {
        id: TileKindId(record.id),
        name: record.name,
        overwritable: record.overwritable,
        asset_key: record.image,
        layer: record.layer,
    });
    Ok(TileCatalog::from_kinds(kinds)?)
}

pub fn build_session(
    catalog_file: TileCatalogFile,
    layout: LayoutFile,
) -> Result<Session, ContentError> {
    let catalog = build_catalog(catalog_file)?;
    let game_grid = build_grid(SurfaceKind::Game, layout.game_grid)?;
    let ui_grid = build_grid(SurfaceKind::Palette, layout.ui_grid)?;
    let game_board = build_board(SurfaceKind::Game, &game_grid, layout.game_board)?;
    let palette_board = build_board(SurfaceKind::Palette, &ui_grid, layout.palette_board)?;

    Ok(Session::new(SessionParts {
        catalog,
        game_grid,
        game_board,
        ui_grid,
        palette_board,
        default_selection: layout.default_selection,
    })?)
}

/// Reads `tiles.json` and `layout.json` from `content_dir` and assembles a session.
pub fn load_session(content_dir: &Path) -> Result<Session, ContentError> {
    let catalog_file = parse_catalog(&read_content_file(&content_dir.join(CATALOG_FILE_NAME))?)?;
    let layout = parse_layout(&read_content_file(&content_dir.join(LAYOUT_FILE_NAME))?)?;
    let session = build_session(catalog_file, layout)?;
    info!(
        content_dir = %content_dir.display(),
        tile_kinds = session.catalog().len(),
        "content_loaded"
    );
    Ok(session)
}

fn build_grid(surface: SurfaceKind, spec: GridSpec) -> Result<Grid, ContentError> {
    Grid::new(spec).map_err(|source| ContentError::Grid { surface, source })
}

fn build_board(
    surface: SurfaceKind,
    grid: &Grid,
    source: BoardSource,
) -> Result<BoardState, ContentError> {
    let board = match source {
        BoardSource::Rows { rows } => BoardState::from_rows(grid.rows(), grid.cols(), rows),
        BoardSource::CellRecords { records } => {
            BoardState::from_cell_records(grid.rows(), grid.cols(), records)
        }
    };
    board.map_err(|source| ContentError::Board { surface, source })
}

fn read_content_file(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(file: &str, raw: &str) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| ContentError::Parse {
        file: file.to_string(),
        path: error.path().to_string(),
        message: error.inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EMPTY_TILE;
    use crate::grid::{CellCoord, Vec2};
    use crate::interaction::ClickOutcome;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog_json() -> serde_json::Value {
        json!({
            "tiles": [
                { "id": 0, "name": "grass", "overwritable": true, "image": "grass_0" },
                { "id": 1, "name": "rock", "overwritable": false, "image": "rock_0" },
                { "id": 2, "name": "highlight_0", "overwritable": false,
                  "image": "highlight_0", "layer": "ui" }
            ]
        })
    }

    fn layout_json() -> serde_json::Value {
        json!({
            "game_grid": { "rows": 4, "cols": 4, "cell_width": 10.0, "cell_height": 10.0 },
            "ui_grid": {
                "rows": 1, "cols": 2, "cell_width": 10.0, "cell_height": 10.0,
                "origin": { "x": 60.0, "y": 0.0 }
            },
            "default_selection": "rock",
            "game_board": {
                "format": "rows",
                "rows": [
                    ["grass", "rock", "grass", "grass"],
                    ["empty", "empty", "empty", "empty"],
                    ["empty", "empty", "empty", "empty"],
                    ["empty", "empty", "empty", "empty"]
                ]
            },
            "palette_board": {
                "format": "cell_records",
                "records": [
                    { "rowNumber": 0, "columnNumber": 0, "tile": "grass" },
                    { "rowNumber": 0, "columnNumber": 1, "tile": "rock" }
                ]
            }
        })
    }

    fn write_content(dir: &Path, catalog: &serde_json::Value, layout: &serde_json::Value) {
        fs::write(dir.join(CATALOG_FILE_NAME), catalog.to_string()).expect("write catalog");
        fs::write(dir.join(LAYOUT_FILE_NAME), layout.to_string()).expect("write layout");
    }

    #[test]
    fn loads_session_from_directory() {
        let temp = TempDir::new().expect("tempdir");
        write_content(temp.path(), &catalog_json(), &layout_json());

        let mut session = load_session(temp.path()).expect("session");
        assert_eq!(session.current_selection(), "rock");
        assert_eq!(
            session.catalog().lookup("highlight_0").expect("kind").layer,
            TileLayer::Ui
        );
        assert_eq!(session.palette().board.get(0, 1), Ok("rock"));

        let outcome = session.click(Vec2::new(5.0, 5.0));
        assert_eq!(
            outcome,
            ClickOutcome::Placed {
                cell: CellCoord::new(0, 0),
                previous: "grass".to_string()
            }
        );
        session.click(Vec2::new(65.0, 5.0));
        assert_eq!(session.current_selection(), "grass");
        assert!(matches!(
            session.click(Vec2::new(15.0, 5.0)),
            ClickOutcome::Rejected { .. }
        ));
        assert!(matches!(
            session.click(Vec2::new(45.0, 45.0)),
            ClickOutcome::Ignored
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_session(temp.path()).expect_err("missing");
        match err {
            ContentError::ReadFile { path, .. } => {
                assert!(path.ends_with(CATALOG_FILE_NAME));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_error_names_json_path() {
        let raw = json!({
            "tiles": [
                { "id": 0, "name": "grass", "overwritable": "yes", "image": "grass_0" }
            ]
        })
        .to_string();
        let err = parse_catalog(&raw).expect_err("bad bool");
        match err {
            ContentError::Parse { file, path, .. } => {
                assert_eq!(file, CATALOG_FILE_NAME);
                assert_eq!(path, "tiles[0].overwritable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn generator_records_load_into_game_board() {
        let records: Vec<serde_json::Value> = (0..4)
            .flat_map(|row| (0..4).map(move |col| (row, col)))
            .map(|(row, col)| {
                let tile = if row < 3 { "grass" } else { "rock" };
                json!({
                    "id": format!("{row}"),
                    "entireRow": "0",
                    "columnNumber": format!("{col}"),
                    "rowNumber": format!("{row}"),
                    "tile": tile
                })
            })
            .collect();
        let mut layout = layout_json();
        layout["game_board"] = json!({ "format": "cell_records", "records": records });

        let layout = parse_layout(&layout.to_string()).expect("generator layout");
        let catalog = parse_catalog(&catalog_json().to_string()).expect("catalog");
        let session = build_session(catalog, layout).expect("session");
        assert_eq!(session.game().board.get(0, 2), Ok("grass"));
        assert_eq!(session.game().board.get(3, 1), Ok("rock"));
    }

    #[test]
    fn untagged_board_shape_is_rejected() {
        let mut layout = layout_json();
        layout["game_board"] = json!([["grass"]]);
        assert!(matches!(
            parse_layout(&layout.to_string()),
            Err(ContentError::Parse { .. })
        ));
    }

    #[test]
    fn malformed_row_fails_whole_load() {
        let temp = TempDir::new().expect("tempdir");
        let mut layout = layout_json();
        layout["game_board"]["rows"][2] = json!(["empty", "empty", "empty"]);
        write_content(temp.path(), &catalog_json(), &layout);

        let err = load_session(temp.path()).expect_err("malformed");
        assert!(matches!(
            err,
            ContentError::Board {
                surface: SurfaceKind::Game,
                source: BoardError::MalformedMap { .. }
            }
        ));
    }

    #[test]
    fn invalid_grid_spec_is_reported_per_surface() {
        let mut layout = layout_json();
        layout["ui_grid"]["cols"] = json!(0);
        let layout = parse_layout(&layout.to_string()).expect("layout");
        let catalog = parse_catalog(&catalog_json().to_string()).expect("catalog");
        let err = build_session(catalog, layout).expect_err("zero cols");
        assert!(matches!(
            err,
            ContentError::Grid {
                surface: SurfaceKind::Palette,
                source: GridError::ZeroColumns
            }
        ));
    }

    #[test]
    fn duplicate_catalog_entry_fails() {
        let mut catalog = catalog_json();
        catalog["tiles"][1]["name"] = json!("grass");
        let catalog = parse_catalog(&catalog.to_string()).expect("catalog");
        let layout = parse_layout(&layout_json().to_string()).expect("layout");
        assert!(matches!(
            build_session(catalog, layout),
            Err(ContentError::Catalog(CatalogError::DuplicateKind { .. }))
        ));
    }

    #[test]
    fn empty_sentinel_in_catalog_fails() {
        let mut catalog = catalog_json();
        catalog["tiles"][0]["name"] = json!(EMPTY_TILE);
        let catalog = parse_catalog(&catalog.to_string()).expect("catalog");
        assert!(matches!(
            build_catalog(catalog),
            Err(ContentError::Catalog(CatalogError::ReservedName))
        ));
    }

    #[test]
    fn default_selection_falls_back_to_wood() {
        let mut layout = layout_json();
        layout
            .as_object_mut()
            .expect("object")
            .remove("default_selection");
        let layout = parse_layout(&layout.to_string()).expect("layout");
        assert_eq!(layout.default_selection, DEFAULT_SELECTION);

        let catalog = parse_catalog(&catalog_json().to_string()).expect("catalog");
        assert!(matches!(
            build_session(catalog, layout),
            Err(ContentError::Session(
                SessionError::UnknownDefaultSelection { .. }
            ))
        ));
    }
}
