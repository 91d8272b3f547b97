pub mod api;
pub mod audio;
pub mod config;
pub mod download;
pub mod error;
pub mod translate;

pub use config::Config;
pub use error::{FrankError, Result};
