pub mod config;
pub mod engine;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
