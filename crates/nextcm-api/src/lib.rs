// nextcm-api: Async Rust client for the BIG-IP Next Central Manager REST API

pub mod client;
pub mod devices;
pub mod error;
pub mod object;
pub mod spec;
pub mod transport;

pub use client::{Client, ClientConfig, Method};
pub use error::Error;
pub use object::RestObject;
pub use transport::{TlsMode, TransportConfig};
