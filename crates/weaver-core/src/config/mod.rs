//! Unified configuration layer.
//!
//! Every environment variable the gateway reads goes through this module;
//! other crates consume the typed structs instead of calling `std::env::var`.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `env_parse`, `.env` loading
//! - `schema`: `HealthConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants and their aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, env_parse, load_dotenv, load_dotenv_from};
pub use schema::{HealthConfig, ObservabilityConfig};
