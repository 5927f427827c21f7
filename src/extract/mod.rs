//! Cell snapshot extraction
//!
//! Turns the live state of a cell into an [`AttributeMap`]. The map always
//! starts with `world`, `x`, `y`, `z`, `material`, then `id` for watched
//! cells, then whatever the probe tables find, then `extraData` if given.

pub mod probes;

use std::sync::Arc;

use crate::models::{AttributeMap, Coordinate, ExtraData, WatchedCell};
use crate::registry::WatchRegistry;
use crate::world::World;

pub use probes::{all_probes, Probe, GENERIC_PROBES, KIND_PROBES};

/// Reads cells from the world and serializes them
#[derive(Clone)]
pub struct AttributeExtractor {
    world: Arc<dyn World>,
    registry: Arc<WatchRegistry>,
}

impl AttributeExtractor {
    pub fn new(world: Arc<dyn World>, registry: Arc<WatchRegistry>) -> Self {
        Self { world, registry }
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn world(&self) -> &dyn World {
        self.world.as_ref()
    }

    /// Snapshot the cell at `coord` as it is right now
    pub fn extract(&self, coord: &Coordinate, extra: Option<&ExtraData>) -> AttributeMap {
        let state = self.world.cell_state(coord);
        let mut attrs = AttributeMap::new();

        attrs.insert("world", coord.world.as_str());
        attrs.insert("x", coord.x);
        attrs.insert("y", coord.y);
        attrs.insert("z", coord.z);
        attrs.insert("material", state.material.as_str());

        if let Some(id) = self.registry.id_of(coord) {
            attrs.insert("id", id);
        }

        for probe in all_probes() {
            for facet in state.facets() {
                if (probe.extract)(facet, &mut attrs) {
                    break;
                }
            }
        }

        if let Some(extra) = extra {
            attrs.insert("extraData", extra);
        }

        attrs
    }

    /// Snapshot several watched cells, skipping unloaded ones
    pub fn extract_loaded(&self, cells: &[WatchedCell]) -> Vec<AttributeMap> {
        cells
            .iter()
            .filter(|cell| {
                let loaded = self.world.is_loaded(&cell.coordinate);
                if !loaded {
                    tracing::warn!(
                        coordinate = %cell.coordinate,
                        id = cell.id,
                        "Watched cell is not loaded, skipping"
                    );
                }
                loaded
            })
            .map(|cell| self.extract(&cell.coordinate, None))
            .collect()
    }
}

impl std::fmt::Debug for AttributeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeExtractor")
            .field("watched", &self.registry.len())
            .finish()
    }
}
