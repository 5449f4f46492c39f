pub mod agent;
pub mod engine;
pub mod error;
pub mod join;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod wire;
pub mod world;
