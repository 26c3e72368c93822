pub mod client;
pub mod models;

pub use client::{HttpFetcher, ResourceFetcher};
pub use models::{ClientConfig, RemoteResource};
