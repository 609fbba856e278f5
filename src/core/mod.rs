//! Core utilities: configuration and the error taxonomy.

pub mod config;
pub mod errors;

pub use errors::AppError;
