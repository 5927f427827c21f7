//! Capability probe tables
//!
//! Each [`Probe`] matches one facet variant and writes its attributes. The
//! tables are walked in order, so their order is the key order of every
//! snapshot. Supporting a new cell kind means appending one entry.

use crate::models::AttributeMap;
use crate::world::Facet;

/// One capability check plus the attributes it contributes
pub struct Probe {
    /// Name used in logs and tests
    pub capability: &'static str,
    /// Writes attributes and returns true if `facet` is this capability
    pub extract: fn(&Facet, &mut AttributeMap) -> bool,
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("capability", &self.capability)
            .finish()
    }
}

macro_rules! probe {
    ($capability:literal, $pattern:pat => |$attrs:ident| $body:block) => {
        Probe {
            capability: $capability,
            extract: |facet, $attrs| {
                if let $pattern = facet {
                    $body
                    true
                } else {
                    false
                }
            },
        }
    };
}

const DIRECTIONS: [&str; 4] = ["north", "east", "south", "west"];

/// Capabilities shared by many cell kinds
pub static GENERIC_PROBES: &[Probe] = &[
    probe!("powerable", Facet::Powerable { powered } => |attrs| {
        attrs.insert("powered", *powered);
    }),
    probe!("directional", Facet::Directional { facing } => |attrs| {
        attrs.insert("facing", facing.as_str());
    }),
    probe!("rotatable", Facet::Rotatable { rotation } => |attrs| {
        attrs.insert("rotation", rotation.as_str());
    }),
    probe!("openable", Facet::Openable { open } => |attrs| {
        attrs.insert("open", *open);
    }),
    probe!("waterlogged", Facet::Waterlogged { waterlogged } => |attrs| {
        attrs.insert("waterlogged", *waterlogged);
    }),
    probe!("lightable", Facet::Lightable { lit } => |attrs| {
        attrs.insert("lit", *lit);
    }),
    probe!("ageable", Facet::Ageable { age, maximum_age } => |attrs| {
        attrs.insert("age", *age);
        attrs.insert("maximumAge", *maximum_age);
    }),
    probe!("levelled", Facet::Levelled { level, maximum_level } => |attrs| {
        attrs.insert("level", *level);
        attrs.insert("maximumLevel", *maximum_level);
    }),
    probe!("bisected", Facet::Bisected { half } => |attrs| {
        attrs.insert("half", half.as_str());
    }),
    probe!("slab", Facet::Slab { slab_type } => |attrs| {
        attrs.insert("type", slab_type.as_str());
    }),
    probe!("stairs", Facet::Stairs { shape, facing, half } => |attrs| {
        attrs.insert("shape", shape.as_str());
        attrs.insert("facing", facing.as_str());
        attrs.insert("half", half.as_str());
    }),
    probe!("face_attachable", Facet::FaceAttachable { attached_face } => |attrs| {
        attrs.insert("face", attached_face.as_str());
    }),
    probe!("analogue_powerable", Facet::AnaloguePowerable { power, maximum_power } => |attrs| {
        attrs.insert("power", *power);
        attrs.insert("maximum_power", *maximum_power);
    }),
    probe!("multiple_facing", Facet::MultipleFacing { faces } => |attrs| {
        let names: Vec<String> = faces.iter().map(|face| face.as_str().to_string()).collect();
        attrs.insert("mf_faces", names);
    }),
    probe!("orientable", Facet::Orientable { axis } => |attrs| {
        attrs.insert("axis", axis.as_str());
    }),
    probe!("snowable", Facet::Snowable { snowy } => |attrs| {
        attrs.insert("snowy", *snowy);
    }),
];

/// State specific to one cell kind
pub static KIND_PROBES: &[Probe] = &[
    probe!("bed", Facet::Bed { part, occupied } => |attrs| {
        attrs.insert("part", part.as_str());
        attrs.insert("occupied", *occupied);
    }),
    probe!("bell", Facet::Bell { attachment } => |attrs| {
        attrs.insert("attachment", attachment.as_str());
    }),
    probe!("campfire", Facet::Campfire { signal_fire } => |attrs| {
        attrs.insert("signal_fire", *signal_fire);
    }),
    probe!("candle", Facet::Candle { candles } => |attrs| {
        attrs.insert("candle_count", *candles);
    }),
    probe!("cake", Facet::Cake { bites } => |attrs| {
        attrs.insert("bites", *bites);
    }),
    probe!("chest", Facet::Chest { chest_type } => |attrs| {
        attrs.insert("chest_type", chest_type.as_str());
    }),
    probe!("chiseled_bookshelf", Facet::ChiseledBookshelf { slots } => |attrs| {
        for (i, occupied) in slots.iter().enumerate() {
            attrs.insert(format!("slot_{i}_occupied"), *occupied);
        }
    }),
    probe!("command_block", Facet::CommandBlock { conditional } => |attrs| {
        attrs.insert("conditional", *conditional);
    }),
    probe!("comparator", Facet::Comparator { mode } => |attrs| {
        attrs.insert("mode", mode.as_str());
    }),
    probe!("dispenser", Facet::Dispenser { triggered } => |attrs| {
        attrs.insert("triggered", *triggered);
    }),
    probe!("end_portal_frame", Facet::EndPortalFrame { eye } => |attrs| {
        attrs.insert("eye", *eye);
    }),
    probe!("farmland", Facet::Farmland { moisture } => |attrs| {
        attrs.insert("moisture", *moisture);
    }),
    probe!("gate", Facet::Gate { in_wall } => |attrs| {
        attrs.insert("in_wall", *in_wall);
    }),
    probe!("hopper", Facet::Hopper { enabled } => |attrs| {
        attrs.insert("enabled", *enabled);
    }),
    probe!("jigsaw", Facet::Jigsaw { orientation } => |attrs| {
        attrs.insert("orientation", orientation.as_str());
    }),
    probe!("jukebox", Facet::Jukebox { has_record } => |attrs| {
        attrs.insert("has_record", *has_record);
    }),
    probe!("lantern", Facet::Lantern { hanging } => |attrs| {
        attrs.insert("hanging", *hanging);
    }),
    probe!("lectern", Facet::Lectern { has_book } => |attrs| {
        attrs.insert("has_book", *has_book);
    }),
    probe!("note_block", Facet::NoteBlock { instrument, note } => |attrs| {
        attrs.insert("instrument", instrument.as_str());
        attrs.insert("note", *note);
    }),
    probe!("piston", Facet::Piston { extended } => |attrs| {
        attrs.insert("extended", *extended);
    }),
    probe!("technical_piston", Facet::TechnicalPiston { piston_type } => |attrs| {
        attrs.insert("piston_type", piston_type.as_str());
    }),
    probe!("brewing_stand", Facet::BrewingStand { bottles } => |attrs| {
        for (i, present) in bottles.iter().enumerate() {
            attrs.insert(format!("has_bottle_{i}"), *present);
        }
    }),
    probe!("rail", Facet::Rail { shape } => |attrs| {
        attrs.insert("rail_shape", shape.as_str());
    }),
    probe!("redstone_wire", Facet::RedstoneWire { north, east, south, west } => |attrs| {
        for (dir, connection) in DIRECTIONS.iter().zip([north, east, south, west]) {
            attrs.insert(format!("{dir}_wire_connection"), connection.as_str());
        }
    }),
    probe!("repeater", Facet::Repeater { delay, locked } => |attrs| {
        attrs.insert("delay", *delay);
        attrs.insert("locked", *locked);
    }),
    probe!("sapling", Facet::Sapling { stage, maximum_stage } => |attrs| {
        attrs.insert("stage", *stage);
        attrs.insert("maximum_stage", *maximum_stage);
    }),
    probe!("scaffolding", Facet::Scaffolding { bottom, distance } => |attrs| {
        attrs.insert("bottom", *bottom);
        attrs.insert("distance", *distance);
    }),
    probe!("sea_pickle", Facet::SeaPickle { pickles } => |attrs| {
        attrs.insert("pickles", *pickles);
    }),
    probe!("structure_block", Facet::StructureBlock { mode } => |attrs| {
        attrs.insert("structure_mode", mode.as_str());
    }),
    probe!("tnt", Facet::Tnt { unstable } => |attrs| {
        attrs.insert("unstable", *unstable);
    }),
    probe!("tripwire", Facet::Tripwire { attached, disarmed } => |attrs| {
        attrs.insert("attached", *attached);
        attrs.insert("disarmed", *disarmed);
    }),
    probe!("turtle_egg", Facet::TurtleEgg { eggs, hatch } => |attrs| {
        attrs.insert("eggs", *eggs);
        attrs.insert("hatch_stage", *hatch);
    }),
    probe!("wall", Facet::Wall { up, north, east, south, west } => |attrs| {
        attrs.insert("up", *up);
        for (dir, height) in DIRECTIONS.iter().zip([north, east, south, west]) {
            attrs.insert(format!("{dir}_wall_height"), height.as_str());
        }
    }),
];

/// Both tables, generic first
pub fn all_probes() -> impl Iterator<Item = &'static Probe> {
    GENERIC_PROBES.iter().chain(KIND_PROBES.iter())
}
