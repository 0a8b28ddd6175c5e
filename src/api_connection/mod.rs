pub mod connection;
pub mod endpoints;

pub use connection::{build_http_client, get_json, ApiConnectionError};
