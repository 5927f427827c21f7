//! Common test utilities

use std::sync::Arc;

use cellwatch::config::Config;
use cellwatch::models::Coordinate;
use cellwatch::world::{BlockFace, CellState, Facet, GridWorld};

/// Watched cells used across tests, in id order
#[allow(dead_code)]
pub const WATCHED: [(i32, i32, i32); 2] = [(0, 64, 0), (1, 64, 0)];

/// Create a world with two dimensions and a lever at the first watched cell
#[allow(dead_code)]
pub fn create_test_world() -> Arc<GridWorld> {
    let world = Arc::new(GridWorld::new(["world", "world_nether"]));
    world.set_cell(
        Coordinate::new("world", 0, 64, 0),
        CellState::new("LEVER")
            .with(Facet::Powerable { powered: false })
            .with(Facet::Directional { facing: BlockFace::North })
            .with(Facet::FaceAttachable { attached_face: "FLOOR".into() }),
    );
    world
}

/// Config with the two watched cells and the given base URL
#[allow(dead_code)]
pub fn create_test_config(api_url: &str) -> Config {
    let mut config: Config = toml::from_str(
        r#"
        [monitored_blocks]
        batch = { endpoint = "/monitor/batch" }

        [reporter]
        timeout_secs = 2
        max_pending = 16
        "#,
    )
    .expect("test config should parse");

    config.api_url = api_url.to_string();
    config.monitored_blocks.locations = WATCHED
        .iter()
        .map(|&(x, y, z)| location("world", x, y, z))
        .collect();
    config
}

/// A raw watch entry
#[allow(dead_code)]
pub fn location(world: &str, x: i32, y: i32, z: i32) -> toml::Value {
    let mut table = toml::Table::new();
    table.insert("world".into(), toml::Value::String(world.into()));
    table.insert("x".into(), toml::Value::Integer(x.into()));
    table.insert("y".into(), toml::Value::Integer(y.into()));
    table.insert("z".into(), toml::Value::Integer(z.into()));
    toml::Value::Table(table)
}

/// Coordinate of the n-th watched cell
#[allow(dead_code)]
pub fn watched(n: usize) -> Coordinate {
    let (x, y, z) = WATCHED[n];
    Coordinate::new("world", x, y, z)
}

/// An address nothing is listening on
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
