//! Byte provider adapters
//!
//! This module provides trait-based abstractions for opening the bytes
//! behind a [`SourceDescriptor`], one collaborator per namespace:
//!
//! - [`ResourceLoader`]: the embedded-resource namespace
//! - [`ContentOpener`]: platform-resolvable content locators
//! - [`AssetOpener`]: the bundled-asset namespace
//!
//! Keeping these behind traits lets the embedding application swap in its
//! own I/O (mocking for tests, archive-backed assets, network-backed
//! content) while the core stays agnostic about where bytes come from.
//!
//! Every adapter reads its backing stream to completion and returns owned
//! bytes, so the stream is released on every exit path — success or
//! failure — before control returns to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use svgview::provider::{AssetOpener, AssetDir};
//!
//! let assets = AssetDir::new("app/assets");
//! let bytes = assets.open_asset("icons/logo.svg")?;
//! println!("Got {} bytes", bytes.bytes.len());
//! # svgview::Result::Ok(())
//! ```

use crate::error::{Result, SourceError};
use crate::source::SourceDescriptor;
use base64::Engine;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use url::Url;

// ============================================================================
// Core types
// ============================================================================

/// Result of opening a source: its bytes and an optional content type
#[derive(Debug, Clone)]
pub struct SourceBytes {
  /// Raw bytes of the source
  pub bytes: Vec<u8>,
  /// Content type, if the namespace knows it (e.g. "image/svg+xml")
  pub content_type: Option<String>,
}

impl SourceBytes {
  /// Create a new SourceBytes
  pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
    Self {
      bytes,
      content_type,
    }
  }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Opens bytes from the embedded-resource namespace.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across widget
/// instances on different threads.
pub trait ResourceLoader: Send + Sync {
  /// Open the resource with the given id.
  ///
  /// Fails with `NotFound` when the id is absent from the namespace.
  fn open_resource(&self, id: u32) -> Result<SourceBytes>;
}

/// Opens bytes behind a content locator.
pub trait ContentOpener: Send + Sync {
  /// Open the content the locator names.
  ///
  /// Fails with `NotFound` when nothing backs the locator — this specific
  /// failure is what lets the orchestrator reinterpret the locator as an
  /// asset filename — or `Io` for any other stream failure.
  fn open_content(&self, locator: &str) -> Result<SourceBytes>;
}

/// Opens bytes from the bundled-asset namespace.
pub trait AssetOpener: Send + Sync {
  /// Open the asset with the given filename.
  ///
  /// Fails with `NotFound` when the asset is absent.
  fn open_asset(&self, name: &str) -> Result<SourceBytes>;
}

impl<T: ResourceLoader + ?Sized> ResourceLoader for Arc<T> {
  fn open_resource(&self, id: u32) -> Result<SourceBytes> {
    (**self).open_resource(id)
  }
}

impl<T: ContentOpener + ?Sized> ContentOpener for Arc<T> {
  fn open_content(&self, locator: &str) -> Result<SourceBytes> {
    (**self).open_content(locator)
  }
}

impl<T: AssetOpener + ?Sized> AssetOpener for Arc<T> {
  fn open_asset(&self, name: &str) -> Result<SourceBytes> {
    (**self).open_asset(name)
  }
}

// ============================================================================
// ByteProviders - per-variant dispatch
// ============================================================================

/// The three collaborators bundled behind one `open` call.
///
/// Dispatches on the descriptor variant; carries no policy of its own.
/// Cloning shares the underlying adapters.
#[derive(Clone)]
pub struct ByteProviders {
  resources: Arc<dyn ResourceLoader>,
  content: Arc<dyn ContentOpener>,
  assets: Arc<dyn AssetOpener>,
}

impl ByteProviders {
  /// Creates providers backed by the bundled implementations: an empty
  /// [`ResourceTable`], a [`UrlContentOpener`], and an [`AssetDir`] rooted
  /// at the current directory.
  pub fn new() -> Self {
    Self {
      resources: Arc::new(ResourceTable::new()),
      content: Arc::new(UrlContentOpener::new()),
      assets: Arc::new(AssetDir::new(".")),
    }
  }

  /// Replaces the embedded-resource loader
  pub fn with_resources(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
    self.resources = resources;
    self
  }

  /// Replaces the content opener
  pub fn with_content(mut self, content: Arc<dyn ContentOpener>) -> Self {
    self.content = content;
    self
  }

  /// Replaces the asset opener
  pub fn with_assets(mut self, assets: Arc<dyn AssetOpener>) -> Self {
    self.assets = assets;
    self
  }

  /// Opens the bytes behind a descriptor via the matching adapter
  pub fn open(&self, descriptor: &SourceDescriptor) -> Result<SourceBytes> {
    match descriptor {
      SourceDescriptor::Resource(id) => self.resources.open_resource(*id),
      SourceDescriptor::Locator(locator) => self.content.open_content(locator),
      SourceDescriptor::Asset(name) => self.assets.open_asset(name),
    }
  }
}

impl Default for ByteProviders {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for ByteProviders {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ByteProviders").finish_non_exhaustive()
  }
}

// ============================================================================
// ResourceTable - bundled ResourceLoader
// ============================================================================

/// Embedded-resource registry mapping ids to byte payloads.
///
/// The embedding application registers its compiled-in resources once
/// (typically from `include_bytes!`) and shares the table across widgets.
///
/// # Examples
///
/// ```
/// use svgview::provider::{ResourceLoader, ResourceTable};
///
/// let table = ResourceTable::new()
///     .with_resource(1, b"<svg xmlns='http://www.w3.org/2000/svg'/>".to_vec());
/// assert!(table.open_resource(1).is_ok());
/// assert!(table.open_resource(2).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
  entries: HashMap<u32, Arc<Vec<u8>>>,
}

impl ResourceTable {
  /// Creates an empty table
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a resource, replacing any previous payload for the id
  pub fn insert(&mut self, id: u32, bytes: impl Into<Vec<u8>>) {
    self.entries.insert(id, Arc::new(bytes.into()));
  }

  /// Builder-style [`ResourceTable::insert`]
  pub fn with_resource(mut self, id: u32, bytes: impl Into<Vec<u8>>) -> Self {
    self.insert(id, bytes);
    self
  }
}

impl ResourceLoader for ResourceTable {
  fn open_resource(&self, id: u32) -> Result<SourceBytes> {
    let entry = self.entries.get(&id).ok_or_else(|| SourceError::NotFound {
      descriptor: SourceDescriptor::Resource(id).to_string(),
    })?;
    Ok(SourceBytes::new(entry.as_ref().clone(), None))
  }
}

// ============================================================================
// UrlContentOpener - bundled ContentOpener
// ============================================================================

/// Bundled content opener for `file://` URLs, bare filesystem paths, and
/// `data:` URLs (base64 or percent-encoded).
///
/// Other schemes fail with `Io`, not `NotFound`: an unsupported scheme says
/// nothing about whether content exists, so it must not re-route the
/// request into the asset namespace. A network-backed opener can be
/// supplied through the [`ContentOpener`] trait instead.
#[derive(Debug, Clone, Default)]
pub struct UrlContentOpener;

impl UrlContentOpener {
  /// Creates the opener
  pub fn new() -> Self {
    Self
  }

  fn open_path(&self, locator: &str, path: &Path) -> Result<SourceBytes> {
    let bytes = std::fs::read(path).map_err(|e| io_to_source_error(locator, &e))?;
    Ok(SourceBytes::new(
      bytes,
      guess_content_type_from_path(&path.to_string_lossy()),
    ))
  }
}

impl ContentOpener for UrlContentOpener {
  fn open_content(&self, locator: &str) -> Result<SourceBytes> {
    match Url::parse(locator) {
      Ok(url) if url.scheme() == "data" => decode_data_url(locator),
      Ok(url) if url.scheme() == "file" => {
        let path = url.to_file_path().map_err(|_| SourceError::Io {
          descriptor: descriptor_label(locator),
          reason: "not a local file path".to_string(),
        })?;
        self.open_path(locator, &path)
      }
      Ok(url) => Err(
        SourceError::Io {
          descriptor: descriptor_label(locator),
          reason: format!("scheme '{}' is not supported", url.scheme()),
        }
        .into(),
      ),
      // Not a URL at all; treat as a bare filesystem path.
      Err(_) => self.open_path(locator, Path::new(locator)),
    }
  }
}

fn descriptor_label(locator: &str) -> String {
  SourceDescriptor::Locator(locator.to_string()).to_string()
}

fn io_to_source_error(locator: &str, err: &io::Error) -> SourceError {
  if err.kind() == io::ErrorKind::NotFound {
    SourceError::NotFound {
      descriptor: descriptor_label(locator),
    }
  } else {
    SourceError::Io {
      descriptor: descriptor_label(locator),
      reason: err.to_string(),
    }
  }
}

// ============================================================================
// AssetDir - bundled AssetOpener
// ============================================================================

/// Bundled asset opener rooted at a directory.
///
/// Asset names are relative paths under the root; rooted names and names
/// traversing out of the root are treated as absent.
#[derive(Debug, Clone)]
pub struct AssetDir {
  root: PathBuf,
}

impl AssetDir {
  /// Creates an opener rooted at `root`
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Returns the configured root directory
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl AssetOpener for AssetDir {
  fn open_asset(&self, name: &str) -> Result<SourceBytes> {
    let not_found = || SourceError::NotFound {
      descriptor: SourceDescriptor::Asset(name.to_string()).to_string(),
    };

    let relative = Path::new(name);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
      return Err(not_found().into());
    }

    let path = self.root.join(relative);
    let bytes = std::fs::read(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        not_found()
      } else {
        SourceError::Io {
          descriptor: SourceDescriptor::Asset(name.to_string()).to_string(),
          reason: e.to_string(),
        }
      }
    })?;
    Ok(SourceBytes::new(bytes, guess_content_type_from_path(name)))
  }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Guess content type from a path's extension
fn guess_content_type_from_path(path: &str) -> Option<String> {
  let ext = Path::new(path)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase())?;

  let mime = match ext.as_str() {
    "svg" => "image/svg+xml",
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => return None,
  };

  Some(mime.to_string())
}

/// Decode a data: URL into bytes
fn decode_data_url(locator: &str) -> Result<SourceBytes> {
  let invalid = |reason: String| SourceError::Io {
    descriptor: descriptor_label(locator),
    reason,
  };

  let rest = locator
    .strip_prefix("data:")
    .ok_or_else(|| invalid("not a data URL".to_string()))?;
  let comma_pos = rest
    .find(',')
    .ok_or_else(|| invalid("missing comma in data URL".to_string()))?;

  let header = &rest[..comma_pos];
  let data = &rest[comma_pos + 1..];

  // Header shape: [mediatype][;base64]
  let is_base64 = header.ends_with(";base64") || header.contains(";base64;");
  let media_type = header
    .split(';')
    .next()
    .filter(|s| !s.is_empty() && s.contains('/'))
    .map(|s| s.to_string());

  let bytes = if is_base64 {
    base64::engine::general_purpose::STANDARD
      .decode(data)
      .map_err(|e| invalid(format!("invalid base64: {e}")))?
  } else {
    percent_decode(data).map_err(invalid)?
  };

  Ok(SourceBytes::new(bytes, media_type))
}

/// Percent-decode a string to bytes
fn percent_decode(input: &str) -> std::result::Result<Vec<u8>, String> {
  let mut out = Vec::with_capacity(input.len());
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    if bytes[i] == b'%' {
      if i + 2 >= bytes.len() {
        return Err("incomplete percent-escape".to_string());
      }
      let hi = (bytes[i + 1] as char).to_digit(16);
      let lo = (bytes[i + 2] as char).to_digit(16);
      match (hi, lo) {
        (Some(hi), Some(lo)) => {
          out.push(((hi << 4) | lo) as u8);
          i += 3;
        }
        _ => return Err("invalid percent-escape".to_string()),
      }
    } else {
      out.push(bytes[i]);
      i += 1;
    }
  }

  Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
