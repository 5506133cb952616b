use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset_keys::{validate_asset_key, AssetKeyError};

/// Name held by cells that have never been painted. It is not a registered kind and
/// always accepts placement.
pub const EMPTY_TILE: &str = "empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKindId(pub u32);

/// Whether a kind is terrain that can be placed on the board or art used only by the UI
/// (for example the palette hover highlight).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileLayer {
    #[default]
    Build,
    Ui,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileKind {
    pub id: TileKindId,
    pub name: String,
    pub overwritable: bool,
    pub asset_key: String,
    pub layer: TileLayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("tile kind '{name}' is already registered")]
    DuplicateKind { name: String },
    #[error("tile kind id {id} is already used by '{existing}'")]
    DuplicateId { id: u32, existing: String },
    #[error("'empty' is reserved for unpainted cells and cannot be registered")]
    ReservedName,
    #[error("unknown tile kind '{name}'")]
    UnknownKind { name: String },
    #[error("tile kind '{name}' has an invalid asset key: {source}")]
    InvalidAssetKey {
        name: String,
        #[source]
        source: AssetKeyError,
    },
}

/// Registry of tile kinds, built once from static content and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct TileCatalog {
    kinds: Vec<TileKind>,
    index_by_name: HashMap<String, usize>,
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = TileKind>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for kind in kinds {
            catalog.register(kind)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, kind: TileKind) -> Result<(), CatalogError> {
        if kind.name == EMPTY_TILE {
            return Err(CatalogError::ReservedName);
        }
        if self.index_by_name.contains_key(&kind.name) {
            return Err(CatalogError::DuplicateKind { name: kind.name });
        }
        if let Some(existing) = self.kinds.iter().find(|existing| existing.id == kind.id) {
            return Err(CatalogError::DuplicateId {
                id: kind.id.0,
                existing: existing.name.clone(),
            });
        }
        validate_asset_key(&kind.asset_key).map_err(|source| CatalogError::InvalidAssetKey {
            name: kind.name.clone(),
            source,
        })?;

        self.index_by_name.insert(kind.name.clone(), self.kinds.len());
        self.kinds.push(kind);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&TileKind, CatalogError> {
        self.index_by_name
            .get(name)
            .map(|&index| &self.kinds[index])
            .ok_or_else(|| CatalogError::UnknownKind {
                name: name.to_string(),
            })
    }

    pub fn is_overwritable(&self, name: &str) -> Result<bool, CatalogError> {
        if name == EMPTY_TILE {
            return Ok(true);
        }
        self.lookup(name).map(|kind| kind.overwritable)
    }

    /// True for the empty sentinel and for every registered kind.
    pub fn is_known(&self, name: &str) -> bool {
        name == EMPTY_TILE || self.index_by_name.contains_key(name)
    }

    pub fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_kind(id: u32, name: &str, overwritable: bool) -> TileKind {
    TileKind {
        id: TileKindId(id),
        name: name.to_string(),
        overwritable,
        asset_key: name.to_string(),
        layer: TileLayer::Build,
    }
}
