pub mod core;
pub mod graph;
pub mod server;
pub mod state;
pub mod store;
