pub mod constants;
pub mod engine;
pub mod high_score_store;
pub mod pathfinding;
pub mod ports;
pub mod rng;
pub mod server_protocol;
pub mod types;
pub mod world;
