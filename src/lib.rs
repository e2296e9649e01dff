pub mod calculator;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod services;
pub mod utils;

pub use error::{AppError, Result};
