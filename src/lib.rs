pub mod aggregate;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod ranking;
pub mod rates;
pub mod report;
pub mod service;
pub mod source;
pub mod time_range;

pub use error::{AppError, Result};
