//! Host world boundary
//!
//! The grid itself is owned by the host. This module defines what cellwatch
//! needs from it: world name resolution, region load state, and a live read
//! of a cell's state expressed as a material plus a list of facets.
//!
//! # Facets
//!
//! A facet is one capability a cell state exposes (power, direction, age, a
//! bed's part, ...). A cell exposes any number of them, in any order; the
//! extractor decides the order in which they are reported.
//!
//! ```json
//! {
//!   "material": "OAK_STAIRS",
//!   "facets": [
//!     { "facet": "stairs", "shape": "STRAIGHT", "facing": "NORTH", "half": "BOTTOM" },
//!     { "facet": "waterlogged", "waterlogged": false }
//!   ]
//! }
//! ```

pub mod grid;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Coordinate;

pub use grid::{GridWorld, WorldSnapshot};

/// Material reported for cells the host has no state for
pub const EMPTY_MATERIAL: &str = "AIR";

/// Read access to the host's grid
///
/// Implementations must return the state as it is at call time; cellwatch
/// never caches what it reads.
pub trait World: Send + Sync {
    /// Whether a world with this name exists
    fn has_world(&self, name: &str) -> bool;

    /// World used when a caller has no world context
    fn default_world(&self) -> Option<String>;

    /// Whether the region containing `coord` is currently loaded
    fn is_loaded(&self, coord: &Coordinate) -> bool;

    /// Live state of the cell at `coord`
    fn cell_state(&self, coord: &Coordinate) -> CellState;
}

/// Snapshot of one cell's state as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub material: String,
    #[serde(default)]
    pub facets: Vec<Facet>,
}

impl CellState {
    /// State with a material and no facets
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            facets: Vec::new(),
        }
    }

    /// Empty cell
    pub fn empty() -> Self {
        Self::new(EMPTY_MATERIAL)
    }

    /// Add a facet
    pub fn with(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Direction a cell can face or connect towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockFace {
    North,
    East,
    South,
    West,
    Up,
    Down,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    WestNorthWest,
    NorthNorthWest,
    NorthNorthEast,
    EastNorthEast,
    EastSouthEast,
    SouthSouthEast,
    SouthSouthWest,
    WestSouthWest,
    #[serde(rename = "SELF")]
    Zero,
}

impl BlockFace {
    /// Host's canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::East => "EAST",
            Self::South => "SOUTH",
            Self::West => "WEST",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::NorthEast => "NORTH_EAST",
            Self::NorthWest => "NORTH_WEST",
            Self::SouthEast => "SOUTH_EAST",
            Self::SouthWest => "SOUTH_WEST",
            Self::WestNorthWest => "WEST_NORTH_WEST",
            Self::NorthNorthWest => "NORTH_NORTH_WEST",
            Self::NorthNorthEast => "NORTH_NORTH_EAST",
            Self::EastNorthEast => "EAST_NORTH_EAST",
            Self::EastSouthEast => "EAST_SOUTH_EAST",
            Self::SouthSouthEast => "SOUTH_SOUTH_EAST",
            Self::SouthSouthWest => "SOUTH_SOUTH_WEST",
            Self::WestSouthWest => "WEST_SOUTH_WEST",
            Self::Zero => "SELF",
        }
    }
}

impl fmt::Display for BlockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orientation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One capability exposed by a cell state
///
/// String-valued fields carry the host's canonical upper-case name for
/// enumerations cellwatch passes through unchanged (`"TOP"`, `"STRAIGHT"`,
/// `"SUBTRACT"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "facet", rename_all = "snake_case")]
pub enum Facet {
    // Generic capabilities
    Powerable { powered: bool },
    Directional { facing: BlockFace },
    Rotatable { rotation: BlockFace },
    Openable { open: bool },
    Waterlogged { waterlogged: bool },
    Lightable { lit: bool },
    Ageable { age: u32, maximum_age: u32 },
    Levelled { level: u32, maximum_level: u32 },
    Bisected { half: String },
    Slab { slab_type: String },
    Stairs { shape: String, facing: BlockFace, half: String },
    FaceAttachable { attached_face: String },
    AnaloguePowerable { power: u32, maximum_power: u32 },
    MultipleFacing { faces: Vec<BlockFace> },
    Orientable { axis: Axis },
    Snowable { snowy: bool },

    // Kind-specific state
    Bed { part: String, occupied: bool },
    Bell { attachment: String },
    Campfire { signal_fire: bool },
    Candle { candles: u32 },
    Cake { bites: u32 },
    Chest { chest_type: String },
    ChiseledBookshelf { slots: [bool; 6] },
    CommandBlock { conditional: bool },
    Comparator { mode: String },
    /// Dispensers and droppers
    Dispenser { triggered: bool },
    EndPortalFrame { eye: bool },
    Farmland { moisture: u32 },
    Gate { in_wall: bool },
    Hopper { enabled: bool },
    Jigsaw { orientation: String },
    Jukebox { has_record: bool },
    Lantern { hanging: bool },
    Lectern { has_book: bool },
    NoteBlock { instrument: String, note: u8 },
    Piston { extended: bool },
    TechnicalPiston { piston_type: String },
    BrewingStand { bottles: [bool; 3] },
    Rail { shape: String },
    RedstoneWire { north: String, east: String, south: String, west: String },
    Repeater { delay: u32, locked: bool },
    Sapling { stage: u32, maximum_stage: u32 },
    Scaffolding { bottom: bool, distance: u32 },
    SeaPickle { pickles: u32 },
    StructureBlock { mode: String },
    Tnt { unstable: bool },
    Tripwire { attached: bool, disarmed: bool },
    TurtleEgg { eggs: u32, hatch: u32 },
    Wall { up: bool, north: String, east: String, south: String, west: String },
}
