//! Sub-resource resolution callbacks
//!
//! A vector document may reference resources the engine cannot reach on
//! its own: font families for `text` elements and external files in
//! `image` elements. [`SubResourceResolver`] lets the embedding
//! application supply those; the default answers are "not supported / not
//! found", signaling the engine to skip or substitute.

use std::sync::Arc;

/// Font slant requested by a document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
  Normal,
  Italic,
  Oblique,
}

/// Capability callbacks consulted while rendering.
///
/// All methods default to declining, so an implementation overrides only
/// the capabilities it actually provides. Note that the engine gates
/// [`resolve_image`](SubResourceResolver::resolve_image) on
/// [`is_format_supported`](SubResourceResolver::is_format_supported) when
/// the reference's format is recognizable: return `true` for the formats
/// your `resolve_image` can produce.
///
/// Resolved artifacts are not cached by the render pipeline; resolvers
/// that load fonts or images expensively should memoize internally.
pub trait SubResourceResolver: Send + Sync {
  /// Provide font bytes for a family referenced by the document
  fn resolve_font(&self, _family: &str, _weight: u16, _style: FontStyle) -> Option<Vec<u8>> {
    None
  }

  /// Provide image bytes for an external `image` reference
  fn resolve_image(&self, _reference: &str) -> Option<Vec<u8>> {
    None
  }

  /// Whether `resolve_image` supports the given MIME type
  fn is_format_supported(&self, _mime_type: &str) -> bool {
    false
  }
}

impl<T: SubResourceResolver + ?Sized> SubResourceResolver for Arc<T> {
  fn resolve_font(&self, family: &str, weight: u16, style: FontStyle) -> Option<Vec<u8>> {
    (**self).resolve_font(family, weight, style)
  }

  fn resolve_image(&self, reference: &str) -> Option<Vec<u8>> {
    (**self).resolve_image(reference)
  }

  fn is_format_supported(&self, mime_type: &str) -> bool {
    (**self).is_format_supported(mime_type)
  }
}

/// Resolver that declines everything; external references are skipped
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

impl SubResourceResolver for NoResolver {}
