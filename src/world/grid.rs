//! In-memory grid world
//!
//! A small host stand-in used by the CLI and the test suite. Cells, loaded
//! regions and entity names can be changed at any time; reads always see the
//! latest write.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use super::{CellState, World};
use crate::command::{CommandSender, SelectorError, SelectorResolver};
use crate::error::Result;
use crate::models::Coordinate;

/// Serialized form of a [`GridWorld`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World names; the first one is the default world
    pub worlds: Vec<String>,

    /// Names of entities selectors can resolve to
    #[serde(default)]
    pub entities: Vec<String>,

    /// Regions that read as unloaded
    #[serde(default)]
    pub unloaded_chunks: Vec<ChunkRef>,

    /// Cells with non-empty state
    #[serde(default)]
    pub cells: Vec<CellEntry>,
}

/// A region column in a world
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRef {
    pub world: String,
    pub chunk_x: i32,
    pub chunk_z: i32,
}

/// A cell and its state in a [`WorldSnapshot`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellEntry {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(flatten)]
    pub state: CellState,
}

/// Mutable in-memory world
#[derive(Debug, Default)]
pub struct GridWorld {
    worlds: Vec<String>,
    cells: RwLock<HashMap<Coordinate, CellState>>,
    unloaded: RwLock<HashSet<ChunkRef>>,
    entities: RwLock<Vec<String>>,
}

impl GridWorld {
    /// Create a world set with the given world names
    pub fn new<I, S>(worlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            worlds: worlds.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Build from a snapshot
    pub fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        let cells = snapshot
            .cells
            .into_iter()
            .map(|entry| {
                (
                    Coordinate::new(entry.world, entry.x, entry.y, entry.z),
                    entry.state,
                )
            })
            .collect();

        Self {
            worlds: snapshot.worlds,
            cells: RwLock::new(cells),
            unloaded: RwLock::new(snapshot.unloaded_chunks.into_iter().collect()),
            entities: RwLock::new(snapshot.entities),
        }
    }

    /// Load a JSON snapshot file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: WorldSnapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            worlds = snapshot.worlds.len(),
            cells = snapshot.cells.len(),
            "Loaded world snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Replace the state of a cell
    pub fn set_cell(&self, coord: Coordinate, state: CellState) {
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(coord, state);
    }

    /// Reset a cell to the empty state
    pub fn clear_cell(&self, coord: &Coordinate) {
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(coord);
    }

    /// Mark the region containing `coord` as unloaded
    pub fn unload_region(&self, coord: &Coordinate) {
        self.unloaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chunk_of(coord));
    }

    /// Mark the region containing `coord` as loaded
    pub fn load_region(&self, coord: &Coordinate) {
        self.unloaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chunk_of(coord));
    }

    /// Add an entity name selectors can resolve to
    pub fn add_entity(&self, name: impl Into<String>) {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.into());
    }
}

fn chunk_of(coord: &Coordinate) -> ChunkRef {
    let (chunk_x, chunk_z) = coord.chunk();
    ChunkRef {
        world: coord.world.clone(),
        chunk_x,
        chunk_z,
    }
}

impl World for GridWorld {
    fn has_world(&self, name: &str) -> bool {
        self.worlds.iter().any(|world| world == name)
    }

    fn default_world(&self) -> Option<String> {
        self.worlds.first().cloned()
    }

    fn is_loaded(&self, coord: &Coordinate) -> bool {
        self.has_world(&coord.world)
            && !self
                .unloaded
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&chunk_of(coord))
    }

    fn cell_state(&self, coord: &Coordinate) -> CellState {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(coord)
            .cloned()
            .unwrap_or_default()
    }
}

impl SelectorResolver for GridWorld {
    /// Supports `@a`, `@e`, `@p`, `@r` and `@s` with an optional
    /// `[name=...]` filter. Any other base matches nothing.
    fn select(&self, sender: &CommandSender, selector: &str) -> std::result::Result<Vec<String>, SelectorError> {
        let (base, name_filter) = match selector.split_once('[') {
            Some((base, args)) => {
                let args = args
                    .strip_suffix(']')
                    .ok_or_else(|| SelectorError::Malformed(selector.to_string()))?;
                let name = args
                    .split(',')
                    .filter_map(|arg| arg.trim().strip_prefix("name="))
                    .next()
                    .map(str::to_string);
                (base, name)
            }
            None => (selector, None),
        };

        let entities = self
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let candidates = entities
            .iter()
            .filter(|name| name_filter.as_deref().map_or(true, |wanted| *name == wanted));

        let selected: Vec<String> = match base {
            "@a" | "@e" => candidates.cloned().collect(),
            "@p" | "@r" => candidates.take(1).cloned().collect(),
            "@s" => candidates.filter(|name| **name == sender.name).cloned().collect(),
            _ => Vec::new(),
        };

        Ok(selected)
    }
}
