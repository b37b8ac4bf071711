//! Shared primitives for the banana workspace

mod error;

pub use error::HttpError;
