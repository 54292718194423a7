// fyta-api: Async Rust client for the FYTA cloud API
//
// Three endpoints make up the whole surface: the credential login, the
// user-plant inventory, and authenticated image downloads. Everything
// above raw HTTP (classification, normalization, caching) lives in
// `fyta-core`.

pub mod assets;
pub mod auth;
pub mod client;
pub mod error;
pub mod inventory;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::FytaClient;
pub use error::Error;
pub use models::{Fields, Garden, Hub, Inventory, Plant, RecordId, Sensor};
pub use transport::{TlsMode, TransportConfig};
