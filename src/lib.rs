pub mod analysis;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod render;
pub mod response;
pub mod server;
pub mod tools;
