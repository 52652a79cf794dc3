pub mod config;
pub mod error;
pub mod types;
pub mod validation;

pub use config::PocketConfig;
pub use error::{PocketError, Result};
pub use types::*;
