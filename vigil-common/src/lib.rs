//! Common error types and utilities shared across Vigil crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used throughout the Vigil workspace. It is intentionally lightweight and
//! dependency-minimal so that all crates can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`VigilError`] and [`Result`]: Shared error handling
//! - [`observability`]: Centralised tracing/logging initialisation

pub mod observability;

/// Error types used across the Vigil system.
///
/// Configuration errors are fatal: test setup cannot proceed on an
/// unrecognized execution mode, browser identity, or invalid wait policy.
#[derive(thiserror::Error, Debug)]
pub enum VigilError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The underlying automation engine reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`VigilError`].
pub type Result<T> = std::result::Result<T, VigilError>;
