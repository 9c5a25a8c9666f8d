//! # groupcast-core
//! Shared configuration, error type, domain types, and trait seams.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
