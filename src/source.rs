//! Source selection
//!
//! A widget can be configured with up to three mutually-exclusive inputs:
//! an explicit asset filename, an embedded resource id, or a locator
//! string. [`SourceConfig::resolve`] picks exactly one canonical
//! [`SourceDescriptor`] from them, or none.
//!
//! The locator input is ambiguous by nature: the same string may name
//! platform-resolvable content or a bare asset filename. That ambiguity is
//! not settled here — only the byte provider knows whether a stream exists
//! for a given interpretation, so the orchestrator reinterprets the string
//! as an asset name when (and only when) the locator namespace reports it
//! absent.

use std::fmt;

/// Identifies where vector bytes come from.
///
/// Used directly as the render-cache key: two descriptors are equal iff
/// they have the same variant and the same payload. A descriptor, once
/// resolved, is immutable for the lifetime of the request it represents.
///
/// The locator payload is kept verbatim rather than URL-normalized; two
/// spellings of the same target are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceDescriptor {
  /// An id in the embedded-resource namespace
  Resource(u32),
  /// A locator string for platform-resolvable content
  Locator(String),
  /// A filename in the bundled-asset namespace
  Asset(String),
}

impl fmt::Display for SourceDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SourceDescriptor::Resource(id) => write!(f, "resource {id}"),
      SourceDescriptor::Locator(locator) => write!(f, "locator '{locator}'"),
      SourceDescriptor::Asset(name) => write!(f, "asset '{name}'"),
    }
  }
}

/// Source-selection inputs plus the caching policy.
///
/// Mirrors the widget's construction-time configuration surface. The three
/// source inputs are mutually exclusive by convention; when several are
/// set, [`SourceConfig::resolve`] applies a strict precedence instead of
/// rejecting the configuration.
///
/// # Examples
///
/// ```
/// use svgview::source::{SourceConfig, SourceDescriptor};
///
/// let config = SourceConfig::new().with_asset("icons/logo.svg");
/// assert_eq!(
///     config.resolve(),
///     Some(SourceDescriptor::Asset("icons/logo.svg".to_string())),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
  /// Explicit asset filename; takes precedence over everything else
  pub asset: Option<String>,
  /// Embedded resource id
  pub resource_id: Option<u32>,
  /// Locator string, or a bare asset filename (settled at open time)
  pub locator: Option<String>,
  /// Whether resolutions consult and populate the shared render cache
  pub cache: bool,
}

impl SourceConfig {
  /// Creates an empty configuration (no source, caching off)
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the explicit asset filename
  pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
    self.asset = Some(asset.into());
    self
  }

  /// Sets the embedded resource id
  pub fn with_resource_id(mut self, id: u32) -> Self {
    self.resource_id = Some(id);
    self
  }

  /// Sets the locator string
  pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
    self.locator = Some(locator.into());
    self
  }

  /// Enables or disables cache participation
  pub fn with_cache(mut self, cache: bool) -> Self {
    self.cache = cache;
    self
  }

  /// Selects exactly one source descriptor, or none.
  ///
  /// Precedence, first match wins:
  /// 1. a non-empty asset filename;
  /// 2. a resource id — resolution terminates here, the locator string is
  ///    never consulted even when also set;
  /// 3. a non-empty locator string;
  /// 4. otherwise none: no rendering occurs.
  ///
  /// Empty strings count as unset.
  pub fn resolve(&self) -> Option<SourceDescriptor> {
    if let Some(asset) = non_empty(self.asset.as_deref()) {
      return Some(SourceDescriptor::Asset(asset.to_string()));
    }
    if let Some(id) = self.resource_id {
      return Some(SourceDescriptor::Resource(id));
    }
    if let Some(locator) = non_empty(self.locator.as_deref()) {
      return Some(SourceDescriptor::Locator(locator.to_string()));
    }
    None
  }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn asset_wins_regardless_of_other_inputs() {
    let config = SourceConfig::new()
      .with_asset("logo.svg")
      .with_resource_id(42)
      .with_locator("file:///tmp/logo.svg");
    assert_eq!(
      config.resolve(),
      Some(SourceDescriptor::Asset("logo.svg".to_string()))
    );
  }

  #[test]
  fn resource_id_terminates_before_locator() {
    let config = SourceConfig::new()
      .with_resource_id(42)
      .with_locator("file:///tmp/logo.svg");
    assert_eq!(config.resolve(), Some(SourceDescriptor::Resource(42)));
  }

  #[test]
  fn locator_is_last_resort() {
    let config = SourceConfig::new().with_locator("content/logo.svg");
    assert_eq!(
      config.resolve(),
      Some(SourceDescriptor::Locator("content/logo.svg".to_string()))
    );
  }

  #[test]
  fn empty_strings_count_as_unset() {
    let config = SourceConfig::new().with_asset("").with_locator("logo.svg");
    assert_eq!(
      config.resolve(),
      Some(SourceDescriptor::Locator("logo.svg".to_string()))
    );
    assert_eq!(SourceConfig::new().with_asset("").resolve(), None);
  }

  #[test]
  fn no_inputs_resolves_to_none() {
    assert_eq!(SourceConfig::new().resolve(), None);
  }

  #[test]
  fn descriptors_compare_by_variant_and_payload() {
    assert_eq!(
      SourceDescriptor::Asset("a.svg".to_string()),
      SourceDescriptor::Asset("a.svg".to_string())
    );
    assert_ne!(
      SourceDescriptor::Asset("a.svg".to_string()),
      SourceDescriptor::Locator("a.svg".to_string())
    );
    assert_ne!(
      SourceDescriptor::Resource(1),
      SourceDescriptor::Resource(2)
    );
  }
}
