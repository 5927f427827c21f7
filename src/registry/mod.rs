//! Watch list registry
//!
//! Loads the configured watch entries once at startup and answers membership
//! and id lookups afterwards. The registry is never mutated after load, so it
//! can be shared behind an `Arc` and read without locking.

use std::collections::HashMap;

use crate::config::DuplicatePolicy;
use crate::models::{Coordinate, WatchedCell};
use crate::world::World;

/// Why a single watch entry was skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchEntryError {
    #[error("entry is not a table: {0}")]
    NotATable(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is malformed: {value}")]
    MalformedField { field: &'static str, value: String },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("world '{0}' does not exist")]
    UnknownWorld(String),

    #[error("{0} is already watched")]
    Duplicate(Coordinate),
}

/// Immutable index of watched cells
#[derive(Debug, Default)]
pub struct WatchRegistry {
    ids: HashMap<Coordinate, u32>,
    cells: Vec<WatchedCell>,
}

impl WatchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load raw watch entries
    ///
    /// Entries that fail to parse are logged and skipped; the rest are
    /// assigned ids in the order they were accepted.
    pub fn load(entries: &[toml::Value], world: &dyn World, policy: DuplicatePolicy) -> Self {
        let mut registry = Self::new();
        if entries.is_empty() {
            tracing::info!("No locations configured for monitoring");
            return registry;
        }

        let mut next_id: u32 = 0;

        for (index, entry) in entries.iter().enumerate() {
            let coord = match parse_entry(entry, world) {
                Ok(coord) => coord,
                Err(WatchEntryError::UnknownWorld(name)) => {
                    tracing::warn!(index, world = %name, "Skipping watch entry for unknown world");
                    continue;
                }
                Err(e) => {
                    tracing::error!(index, error = %e, "Failed to load watch entry");
                    continue;
                }
            };

            if let Some(&existing) = registry.ids.get(&coord) {
                match policy {
                    DuplicatePolicy::Reject => {
                        tracing::warn!(
                            index,
                            coordinate = %coord,
                            id = existing,
                            "{}",
                            WatchEntryError::Duplicate(coord.clone())
                        );
                        continue;
                    }
                    DuplicatePolicy::LastWins => {
                        tracing::warn!(
                            index,
                            coordinate = %coord,
                            retired_id = existing,
                            new_id = next_id,
                            "Duplicate watch entry replaces earlier id"
                        );
                        registry.cells.retain(|cell| cell.coordinate != coord);
                    }
                }
            }

            registry.ids.insert(coord.clone(), next_id);
            registry.cells.push(WatchedCell {
                coordinate: coord,
                id: next_id,
            });
            next_id += 1;
        }

        tracing::info!(
            entries = entries.len(),
            watched = registry.len(),
            "Loaded watch list"
        );

        registry
    }

    /// Build from coordinates directly, ids in iteration order
    pub fn from_coordinates<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut registry = Self::new();
        for coord in coords {
            if registry.ids.contains_key(&coord) {
                continue;
            }
            let id = registry.cells.len() as u32;
            registry.ids.insert(coord.clone(), id);
            registry.cells.push(WatchedCell {
                coordinate: coord,
                id,
            });
        }
        registry
    }

    #[inline]
    pub fn is_watched(&self, coord: &Coordinate) -> bool {
        self.ids.contains_key(coord)
    }

    #[inline]
    pub fn id_of(&self, coord: &Coordinate) -> Option<u32> {
        self.ids.get(coord).copied()
    }

    /// Watched cells in id order
    pub fn cells(&self) -> &[WatchedCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parse one raw entry into a coordinate in an existing world
pub fn parse_entry(entry: &toml::Value, world: &dyn World) -> Result<Coordinate, WatchEntryError> {
    let table = entry
        .as_table()
        .ok_or_else(|| WatchEntryError::NotATable(entry.to_string()))?;

    let world_name = match table.get("world") {
        Some(toml::Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(WatchEntryError::MalformedField {
                field: "world",
                value: other.to_string(),
            })
        }
        None => return Err(WatchEntryError::MissingField("world")),
    };

    let x = int_field(table, "x")?;
    let y = int_field(table, "y")?;
    let z = int_field(table, "z")?;

    if !world.has_world(&world_name) {
        return Err(WatchEntryError::UnknownWorld(world_name));
    }

    Ok(Coordinate::new(world_name, x, y, z))
}

/// Read an integer field; floats are truncated toward zero
fn int_field(table: &toml::Table, field: &'static str) -> Result<i32, WatchEntryError> {
    match table.get(field) {
        Some(toml::Value::Integer(n)) => i32::try_from(*n).map_err(|_| WatchEntryError::OutOfRange {
            field,
            value: n.to_string(),
        }),
        Some(toml::Value::Float(f)) if f.is_finite() => {
            let truncated = f.trunc();
            if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
                return Err(WatchEntryError::OutOfRange {
                    field,
                    value: f.to_string(),
                });
            }
            Ok(truncated as i32)
        }
        Some(other) => Err(WatchEntryError::MalformedField {
            field,
            value: other.to_string(),
        }),
        None => Err(WatchEntryError::MissingField(field)),
    }
}
