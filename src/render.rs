//! Render pipeline
//!
//! Turns raw vector bytes into a displayable [`RenderedDrawable`]. Parsing
//! and rasterization are delegated entirely to the external SVG engine
//! behind the [`VectorEngine`] trait; the bundled [`ResvgEngine`] drives
//! `usvg`/`resvg` at the document's intrinsic size.
//!
//! Before handing the document to the engine, external sub-resource
//! references are offered to the [`SubResourceResolver`]: resolved image
//! bytes are inlined as `data:` URLs and resolved fonts are loaded into
//! the engine's font database. Unresolved references are left for the
//! engine to skip.
//!
//! Every drawable carries [`SurfaceRequirement::SoftwareCompositing`]:
//! overlapping transparent paint operations only compose correctly on a
//! software-backed surface, and the presenting layer must apply the
//! requirement before showing any drawable, cached or fresh.

use crate::error::{RenderError, Result};
use crate::resolver::{FontStyle, SubResourceResolver};
use base64::Engine;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use roxmltree::Document;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Compositing the presenting surface must honor before drawing.
///
/// Resolved once, statically: rasterized vector output always requires
/// software-backed compositing, so there is exactly one requirement to
/// publish. Kept as an explicit value so the embedding layer applies it
/// for cached artifacts just as for fresh ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceRequirement {
  /// Present without promoting the surface to an accelerated layer
  SoftwareCompositing,
}

/// The in-memory paintable artifact produced by rasterizing vector content.
///
/// Cloning shares the underlying pixels; the cache entry and any number of
/// displaying widgets hold the same artifact with independent lifetimes.
#[derive(Clone)]
pub struct RenderedDrawable {
  pixmap: Arc<Pixmap>,
  surface: SurfaceRequirement,
}

impl RenderedDrawable {
  /// Wraps a rasterized pixmap into a drawable
  pub fn new(pixmap: Pixmap) -> Self {
    Self {
      pixmap: Arc::new(pixmap),
      surface: SurfaceRequirement::SoftwareCompositing,
    }
  }

  /// The rasterized pixels
  pub fn pixmap(&self) -> &Pixmap {
    &self.pixmap
  }

  /// Width in pixels
  pub fn width(&self) -> u32 {
    self.pixmap.width()
  }

  /// Height in pixels
  pub fn height(&self) -> u32 {
    self.pixmap.height()
  }

  /// The compositing requirement for presenting this drawable
  pub fn surface_requirement(&self) -> SurfaceRequirement {
    self.surface
  }

  /// Whether two drawables are the same artifact, not merely equal pixels
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.pixmap, &other.pixmap)
  }
}

impl fmt::Debug for RenderedDrawable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RenderedDrawable")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("surface", &self.surface)
      .finish_non_exhaustive()
  }
}

/// Trait for the external vector-graphics engine
///
/// A pure function of bytes in, drawable out. Malformed markup fails with
/// [`RenderError::Parse`]; that failure is terminal for the request — the
/// caller must surface it, never substitute a blank render.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across widget
/// instances.
pub trait VectorEngine: Send + Sync {
  /// Parse and rasterize a vector document at its intrinsic size
  fn render(&self, data: &[u8], resolver: &dyn SubResourceResolver) -> Result<RenderedDrawable>;
}

impl<T: VectorEngine + ?Sized> VectorEngine for Arc<T> {
  fn render(&self, data: &[u8], resolver: &dyn SubResourceResolver) -> Result<RenderedDrawable> {
    (**self).render(data, resolver)
  }
}

/// Bundled engine delegating to `usvg` for parsing and `resvg` for
/// rasterization.
///
/// # Example
///
/// ```rust,no_run
/// use svgview::render::{ResvgEngine, VectorEngine};
/// use svgview::resolver::NoResolver;
///
/// let engine = ResvgEngine::new();
/// let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;
/// let drawable = engine.render(svg, &NoResolver)?;
/// assert_eq!(drawable.width(), 8);
/// # svgview::Result::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct ResvgEngine {
  fallback_width: f32,
  fallback_height: f32,
  dpi: f32,
}

impl ResvgEngine {
  /// Creates an engine with the default 512x512 fallback document size
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the size used when the document declares no dimensions
  pub fn with_fallback_size(mut self, width: f32, height: f32) -> Self {
    self.fallback_width = width;
    self.fallback_height = height;
    self
  }

  /// Sets the DPI used to resolve physical units
  pub fn with_dpi(mut self, dpi: f32) -> Self {
    self.dpi = dpi;
    self
  }

  /// Offers document font references to the resolver and collects the
  /// resolved faces into a font database for the engine.
  fn load_resolved_fonts(
    &self,
    content: &str,
    resolver: &dyn SubResourceResolver,
  ) -> Option<usvg::fontdb::Database> {
    let doc = Document::parse(content).ok()?;
    let mut db: Option<usvg::fontdb::Database> = None;
    let mut offered: HashSet<String> = HashSet::new();

    for node in doc.descendants().filter(|n| n.is_element()) {
      let Some(families) = node.attribute("font-family") else {
        continue;
      };
      let weight = node
        .attribute("font-weight")
        .map(parse_font_weight)
        .unwrap_or(400);
      let style = node
        .attribute("font-style")
        .map(parse_font_style)
        .unwrap_or(FontStyle::Normal);

      for family in families.split(',') {
        let family = family.trim().trim_matches(|c| c == '\'' || c == '"');
        if family.is_empty() || !offered.insert(family.to_string()) {
          continue;
        }
        if let Some(bytes) = resolver.resolve_font(family, weight, style) {
          db.get_or_insert_with(usvg::fontdb::Database::new)
            .load_font_data(bytes);
        }
      }
    }

    db
  }

  /// Resolves external `image` references and inlines them as `data:`
  /// URLs. Returns `None` when the document is left unchanged; a document
  /// that fails to parse here is handed to the engine untouched so the
  /// engine reports the authoritative parse error.
  fn inline_external_images(
    &self,
    content: &str,
    resolver: &dyn SubResourceResolver,
  ) -> Option<String> {
    let doc = Document::parse(content).ok()?;
    let mut replacements: Vec<(String, String)> = Vec::new();

    for node in doc.descendants().filter(|n| n.is_element()) {
      if !node.tag_name().name().eq_ignore_ascii_case("image") {
        continue;
      }
      for attr in node.attributes() {
        if attr.name() != "href" {
          continue;
        }

        let reference = attr.value().trim();
        if reference.is_empty() || reference.starts_with('#') || reference.starts_with("data:") {
          continue;
        }
        if let Some(mime) = mime_for_reference(reference) {
          if !resolver.is_format_supported(&mime) {
            continue;
          }
        }
        let Some(bytes) = resolver.resolve_image(reference) else {
          continue;
        };

        let mime = mime_for_reference(reference).unwrap_or_else(|| "image/png".to_string());
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        replacements.push((reference.to_string(), format!("data:{mime};base64,{encoded}")));
      }
    }

    if replacements.is_empty() {
      return None;
    }

    let mut rewritten = content.to_string();
    for (reference, data_url) in replacements {
      rewritten = rewritten.replace(&format!("\"{reference}\""), &format!("\"{data_url}\""));
      rewritten = rewritten.replace(&format!("'{reference}'"), &format!("'{data_url}'"));
    }
    Some(rewritten)
  }
}

impl Default for ResvgEngine {
  fn default() -> Self {
    Self {
      fallback_width: 512.0,
      fallback_height: 512.0,
      dpi: 96.0,
    }
  }
}

impl VectorEngine for ResvgEngine {
  fn render(&self, data: &[u8], resolver: &dyn SubResourceResolver) -> Result<RenderedDrawable> {
    let mut options = usvg::Options::default();
    options.dpi = self.dpi;
    if let Some(size) = usvg::Size::from_wh(self.fallback_width, self.fallback_height) {
      options.default_size = size;
    }

    // Pre-passes only apply to textual documents; compressed input goes to
    // the engine as-is.
    let prepared: Cow<[u8]> = match std::str::from_utf8(data) {
      Ok(text) => {
        if let Some(db) = self.load_resolved_fonts(text, resolver) {
          options.fontdb = Arc::new(db);
        }
        match self.inline_external_images(text, resolver) {
          Some(rewritten) => Cow::Owned(rewritten.into_bytes()),
          None => Cow::Borrowed(data),
        }
      }
      Err(_) => Cow::Borrowed(data),
    };

    let tree = usvg::Tree::from_data(&prepared, &options).map_err(|e| RenderError::Parse {
      reason: e.to_string(),
    })?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or(RenderError::Surface {
      width: size.width(),
      height: size.height(),
    })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    Ok(RenderedDrawable::new(pixmap))
  }
}

fn parse_font_weight(value: &str) -> u16 {
  let trimmed = value.trim();
  if let Ok(weight) = trimmed.parse::<u16>() {
    return weight;
  }
  if trimmed.eq_ignore_ascii_case("bold") {
    700
  } else {
    400
  }
}

fn parse_font_style(value: &str) -> FontStyle {
  let trimmed = value.trim();
  if trimmed.eq_ignore_ascii_case("italic") {
    FontStyle::Italic
  } else if trimmed.eq_ignore_ascii_case("oblique") {
    FontStyle::Oblique
  } else {
    FontStyle::Normal
  }
}

/// Guess the MIME type of an image reference from its extension
fn mime_for_reference(reference: &str) -> Option<String> {
  let ext = Path::new(reference)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase())?;

  let mime = match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "svg" => "image/svg+xml",
    _ => return None,
  };

  Some(mime.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::resolver::NoResolver;

  const RECT_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="3" height="2" viewBox="0 0 3 2"><rect width="3" height="2" fill="#ff0000"/></svg>"##;

  #[test]
  fn renders_at_intrinsic_document_size() {
    let drawable = ResvgEngine::new()
      .render(RECT_SVG, &NoResolver)
      .expect("render rect");
    assert_eq!((drawable.width(), drawable.height()), (3, 2));

    let pixel = drawable.pixmap().pixel(1, 1).expect("in-bounds pixel");
    assert!(pixel.alpha() > 0, "expected painted pixel, got {pixel:?}");
  }

  #[test]
  fn dimensionless_document_uses_fallback_size() {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#;
    let drawable = ResvgEngine::new()
      .with_fallback_size(64.0, 32.0)
      .render(svg, &NoResolver)
      .expect("render dimensionless");
    assert_eq!((drawable.width(), drawable.height()), (64, 32));
  }

  #[test]
  fn malformed_markup_is_a_parse_error() {
    let err = ResvgEngine::new()
      .render(b"<svg xmlns='http://www.w3.org/2000/svg'><rect", &NoResolver)
      .expect_err("malformed document");
    assert!(matches!(err, Error::Render(RenderError::Parse { .. })));
  }

  #[test]
  fn clones_share_the_artifact() {
    let drawable = ResvgEngine::new()
      .render(RECT_SVG, &NoResolver)
      .expect("render rect");
    let clone = drawable.clone();
    assert!(drawable.ptr_eq(&clone));
    assert_eq!(
      clone.surface_requirement(),
      SurfaceRequirement::SoftwareCompositing
    );
  }

  struct PngResolver;

  impl SubResourceResolver for PngResolver {
    fn resolve_image(&self, reference: &str) -> Option<Vec<u8>> {
      (reference == "badge.png").then(|| b"png-bytes".to_vec())
    }

    fn is_format_supported(&self, mime_type: &str) -> bool {
      mime_type == "image/png"
    }
  }

  #[test]
  fn resolved_image_references_are_inlined() {
    let engine = ResvgEngine::new();
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><image href="badge.png"/></svg>"#;

    let rewritten = engine
      .inline_external_images(svg, &PngResolver)
      .expect("reference inlined");
    assert!(
      rewritten.contains("data:image/png;base64,"),
      "unexpected rewrite: {rewritten}"
    );
    assert!(!rewritten.contains("\"badge.png\""));
  }

  #[test]
  fn unsupported_formats_are_left_for_the_engine_to_skip() {
    let engine = ResvgEngine::new();
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><image href="badge.gif"/></svg>"#;
    assert!(engine.inline_external_images(svg, &PngResolver).is_none());
  }

  struct FontProbe {
    offered: std::sync::Mutex<Vec<(String, u16, FontStyle)>>,
  }

  impl SubResourceResolver for FontProbe {
    fn resolve_font(&self, family: &str, weight: u16, style: FontStyle) -> Option<Vec<u8>> {
      if let Ok(mut offered) = self.offered.lock() {
        offered.push((family.to_string(), weight, style));
      }
      None
    }
  }

  #[test]
  fn document_fonts_are_offered_once_per_family() {
    let probe = FontProbe {
      offered: std::sync::Mutex::new(Vec::new()),
    };
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><text font-family="Brand, serif" font-weight="bold" font-style="italic">a</text><text font-family="Brand">b</text></svg>"#;

    ResvgEngine::new()
      .render(svg, &probe)
      .expect("render with unresolved fonts");

    let offered = probe.offered.lock().unwrap();
    assert_eq!(
      offered.as_slice(),
      &[
        ("Brand".to_string(), 700, FontStyle::Italic),
        ("serif".to_string(), 700, FontStyle::Italic),
      ]
    );
  }

  #[test]
  fn fragment_and_data_references_are_untouched() {
    let engine = ResvgEngine::new();
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><image href="#local"/><image href="data:image/png;base64,AA=="/></svg>"##;
    assert!(engine.inline_external_images(svg, &PngResolver).is_none());
  }
}
