//! Error types for svgview
//!
//! This module provides error types for the two subsystems that can fail:
//! - Source errors (locating and reading vector bytes)
//! - Render errors (parsing and rasterizing vector content)
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use thiserror::Error;

/// Result type alias for svgview operations
///
/// This is a convenience type that uses our Error type as the error variant.
///
/// # Examples
///
/// ```
/// use svgview::Result;
///
/// fn load_bytes(name: &str) -> Result<Vec<u8>> {
///     Ok(Vec::new())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for svgview
///
/// Each variant wraps a more specific error type for that subsystem.
/// Errors are `Clone` so a single failure can be reported to several
/// observers (diagnostics sink, caller) without re-running the request.
#[derive(Error, Debug, Clone)]
pub enum Error {
  /// Locating or reading source bytes failed
  #[error("Source error: {0}")]
  Source(#[from] SourceError),

  /// Parsing or rasterizing vector content failed
  #[error("Render error: {0}")]
  Render(#[from] RenderError),
}

impl Error {
  /// Whether this error means the source simply does not exist.
  ///
  /// Only this condition is eligible for the locator-to-asset
  /// reinterpretation; read failures and malformed content are not.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::Source(SourceError::NotFound { .. }))
  }
}

/// Errors that occur while locating or reading source bytes
///
/// # Examples
///
/// ```
/// use svgview::error::SourceError;
///
/// let error = SourceError::NotFound {
///     descriptor: "asset 'icons/missing.svg'".to_string(),
/// };
/// ```
#[derive(Error, Debug, Clone)]
pub enum SourceError {
  /// Nothing backs the descriptor in its namespace
  #[error("no readable stream for {descriptor}")]
  NotFound { descriptor: String },

  /// The stream exists but could not be read
  #[error("failed to read {descriptor}: {reason}")]
  Io { descriptor: String, reason: String },
}

/// Errors that occur while parsing or rasterizing vector content
///
/// A parse failure is terminal for the request that produced it: there is
/// no retry and no fallback, and it is never swallowed into a blank render.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
  /// The vector document is malformed
  #[error("failed to parse vector document: {reason}")]
  Parse { reason: String },

  /// The document resolves to a surface that cannot be allocated
  #[error("cannot allocate a {width}x{height} render surface")]
  Surface { width: u32, height: u32 },
}
