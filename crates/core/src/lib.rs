#![warn(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use config::AppConfig;
pub use error::{WifinetError, WifinetResult};
pub use types::*;
