pub mod config;
pub mod error;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use error::{ConfigError, Result};
