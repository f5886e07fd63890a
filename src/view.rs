//! Resolution orchestration and widget state
//!
//! [`SvgView`] composes the crate: locate a source, consult the shared
//! cache, open bytes through the matching provider, rasterize through the
//! vector engine, optionally populate the cache, and publish the drawable.
//!
//! # Pipeline
//!
//! ```text
//! Idle → Resolving → (CacheHit | Loading) → Rendering → Done | Failed
//! ```
//!
//! A request is synchronous and blocking on the caller's thread; nothing
//! in it is cancellable. Display state is replaced only when a request
//! reaches `Done` — a failed run never clears an already-displayed
//! artifact. The single automatic recovery is the one-shot reinterpretation
//! of a locator as an asset filename when the locator namespace reports
//! nothing behind it.
//!
//! # Example
//!
//! ```rust,no_run
//! use svgview::source::SourceConfig;
//! use svgview::view::SvgView;
//!
//! let mut view = SvgView::new();
//! view.apply_config(&SourceConfig::new().with_asset("icons/logo.svg").with_cache(true));
//! if let Some(drawable) = view.drawable() {
//!     println!("{}x{}", drawable.width(), drawable.height());
//! }
//! ```

use crate::cache::RenderCache;
use crate::error::{Error, Result};
use crate::provider::{
  AssetOpener, ByteProviders, ContentOpener, ResourceLoader, SourceBytes,
};
use crate::render::{RenderedDrawable, ResvgEngine, SurfaceRequirement, VectorEngine};
use crate::resolver::{NoResolver, SubResourceResolver};
use crate::source::{SourceConfig, SourceDescriptor};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Per-sink diagnostics collection.
///
/// Attached with [`SvgViewBuilder::diagnostics_sink`]; several widgets may
/// share one sink. Counters cover cache traffic; warnings record failed
/// resolutions (which otherwise degrade to "keep prior display").
#[derive(Debug, Default, Clone)]
pub struct ResolveDiagnostics {
  /// Cache lookups attempted (only counted while caching is enabled)
  pub requests: usize,
  /// Lookups answered from the cache
  pub cache_hits: usize,
  /// Lookups that fell through to the provider and engine
  pub cache_misses: usize,
  /// Failed resolutions, oldest first
  pub warnings: Vec<ResolveWarning>,
}

/// A recorded resolution failure
#[derive(Debug, Clone)]
pub struct ResolveWarning {
  /// The descriptor the request was resolving
  pub source: String,
  /// The failure, rendered
  pub message: String,
}

impl ResolveDiagnostics {
  fn record_error(&mut self, descriptor: &SourceDescriptor, error: &Error) {
    self.warnings.push(ResolveWarning {
      source: descriptor.to_string(),
      message: error.to_string(),
    });
  }
}

/// Builder for [`SvgView`] instances
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use svgview::cache::RenderCache;
/// use svgview::provider::AssetDir;
/// use svgview::view::SvgView;
///
/// let shared_cache = RenderCache::new();
/// let view = SvgView::builder()
///     .asset_opener(Arc::new(AssetDir::new("app/assets")))
///     .cache(shared_cache.clone())
///     .caching(true)
///     .build();
/// ```
#[derive(Clone)]
pub struct SvgViewBuilder {
  providers: ByteProviders,
  engine: Arc<dyn VectorEngine>,
  resolver: Arc<dyn SubResourceResolver>,
  cache: RenderCache,
  caching: bool,
  diagnostics: Option<Arc<Mutex<ResolveDiagnostics>>>,
}

impl SvgViewBuilder {
  /// Creates a builder with the bundled collaborators and caching off
  pub fn new() -> Self {
    Self {
      providers: ByteProviders::new(),
      engine: Arc::new(ResvgEngine::new()),
      resolver: Arc::new(NoResolver),
      cache: RenderCache::new(),
      caching: false,
      diagnostics: None,
    }
  }

  /// Replaces all three byte providers at once
  pub fn providers(mut self, providers: ByteProviders) -> Self {
    self.providers = providers;
    self
  }

  /// Replaces the embedded-resource loader
  pub fn resource_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
    self.providers = self.providers.with_resources(loader);
    self
  }

  /// Replaces the content opener
  pub fn content_opener(mut self, opener: Arc<dyn ContentOpener>) -> Self {
    self.providers = self.providers.with_content(opener);
    self
  }

  /// Replaces the asset opener
  pub fn asset_opener(mut self, opener: Arc<dyn AssetOpener>) -> Self {
    self.providers = self.providers.with_assets(opener);
    self
  }

  /// Replaces the vector engine
  pub fn engine(mut self, engine: Arc<dyn VectorEngine>) -> Self {
    self.engine = engine;
    self
  }

  /// Replaces the sub-resource resolver
  pub fn resolver(mut self, resolver: Arc<dyn SubResourceResolver>) -> Self {
    self.resolver = resolver;
    self
  }

  /// Shares a render cache with other widgets
  pub fn cache(mut self, cache: RenderCache) -> Self {
    self.cache = cache;
    self
  }

  /// Sets the initial caching policy
  pub fn caching(mut self, caching: bool) -> Self {
    self.caching = caching;
    self
  }

  /// Attaches a diagnostics sink
  pub fn diagnostics_sink(mut self, sink: Arc<Mutex<ResolveDiagnostics>>) -> Self {
    self.diagnostics = Some(sink);
    self
  }

  /// Builds an idle widget
  pub fn build(self) -> SvgView {
    SvgView {
      source: None,
      caching: self.caching,
      providers: self.providers,
      engine: self.engine,
      resolver: self.resolver,
      cache: self.cache,
      displayed: None,
      diagnostics: self.diagnostics,
    }
  }
}

impl Default for SvgViewBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for SvgViewBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SvgViewBuilder")
      .field("caching", &self.caching)
      .finish_non_exhaustive()
  }
}

/// A lazily-resolving vector-image widget.
///
/// Holds the current source descriptor, the caching policy, and the
/// currently displayed drawable. Set-source operations re-resolve
/// immediately; failures leave the previous display state untouched and
/// are recorded on the diagnostics sink rather than propagated, so no
/// failure escapes to the embedding application as a panic or a blank
/// render. Callers that want the error in hand use
/// [`SvgView::resolve_and_render`] directly.
pub struct SvgView {
  source: Option<SourceDescriptor>,
  caching: bool,
  providers: ByteProviders,
  engine: Arc<dyn VectorEngine>,
  resolver: Arc<dyn SubResourceResolver>,
  cache: RenderCache,
  displayed: Option<RenderedDrawable>,
  diagnostics: Option<Arc<Mutex<ResolveDiagnostics>>>,
}

impl SvgView {
  /// Creates a widget with the bundled collaborators and caching off
  pub fn new() -> Self {
    Self::builder().build()
  }

  /// Starts building a widget with custom collaborators
  pub fn builder() -> SvgViewBuilder {
    SvgViewBuilder::new()
  }

  /// Applies a construction-time configuration: adopts its caching policy,
  /// then resolves the source it selects. No selected source means no
  /// visual change.
  pub fn apply_config(&mut self, config: &SourceConfig) {
    self.caching = config.cache;
    match config.resolve() {
      Some(descriptor) => self.set_source(descriptor),
      None => self.source = None,
    }
  }

  /// Displays the vector resource with the given id
  pub fn set_resource(&mut self, id: u32) {
    self.set_source(SourceDescriptor::Resource(id));
  }

  /// Displays the content behind the given locator.
  ///
  /// When the locator namespace reports nothing behind the string, it is
  /// reinterpreted as an asset filename — once.
  pub fn set_locator(&mut self, locator: impl Into<String>) {
    self.set_source(SourceDescriptor::Locator(locator.into()));
  }

  /// Displays the asset with the given filename
  pub fn set_asset(&mut self, name: impl Into<String>) {
    self.set_source(SourceDescriptor::Asset(name.into()));
  }

  /// Sets the caching policy and then displays the asset
  pub fn set_asset_cached(&mut self, name: impl Into<String>, cache: bool) {
    self.caching = cache;
    self.set_asset(name);
  }

  /// Changes whether this widget consults and populates the shared cache.
  ///
  /// Prior cache entries are left alone; only this widget's participation
  /// changes, going forward.
  pub fn set_caching(&mut self, caching: bool) {
    self.caching = caching;
  }

  /// Whether this widget participates in the shared cache
  pub fn is_caching(&self) -> bool {
    self.caching
  }

  /// The currently resolved source descriptor, if any.
  ///
  /// After a successful locator-to-asset fallback this is the asset
  /// descriptor — the key the render was stored under.
  pub fn source(&self) -> Option<&SourceDescriptor> {
    self.source.as_ref()
  }

  /// The currently displayed drawable, if any.
  ///
  /// The returned handle shares the artifact; it stays valid independent
  /// of later set-source operations and cache writes.
  pub fn drawable(&self) -> Option<RenderedDrawable> {
    self.displayed.clone()
  }

  /// The compositing requirement for the currently displayed drawable.
  ///
  /// Must be applied to the presenting surface before drawing — for
  /// cached artifacts just as for freshly rendered ones.
  pub fn surface_requirement(&self) -> Option<SurfaceRequirement> {
    self.displayed.as_ref().map(|d| d.surface_requirement())
  }

  /// The shared render cache this widget participates in
  pub fn cache(&self) -> &RenderCache {
    &self.cache
  }

  /// Resolves a descriptor through cache, providers, and engine without
  /// touching widget display state.
  ///
  /// This is the plain service form of the pipeline: the UI-binding layer
  /// holds the widget state, while callers that only need the artifact
  /// call this.
  pub fn resolve_and_render(&self, descriptor: &SourceDescriptor) -> Result<RenderedDrawable> {
    self.resolve_with(descriptor).map(|(drawable, _)| drawable)
  }

  fn set_source(&mut self, descriptor: SourceDescriptor) {
    self.source = Some(descriptor);
    self.refresh();
  }

  fn refresh(&mut self) {
    let Some(descriptor) = self.source.clone() else {
      return;
    };
    match self.resolve_with(&descriptor) {
      Ok((drawable, resolved)) => {
        self.source = Some(resolved);
        self.displayed = Some(drawable);
      }
      // Keep whatever was displayed before; the failure only becomes a
      // diagnostic.
      Err(err) => self.record_error(&descriptor, &err),
    }
  }

  /// Runs the pipeline for one descriptor, returning the drawable and the
  /// final descriptor it was resolved (and, when caching, stored) under.
  fn resolve_with(
    &self,
    descriptor: &SourceDescriptor,
  ) -> Result<(RenderedDrawable, SourceDescriptor)> {
    if let Some(hit) = self.cached(descriptor) {
      return Ok((hit, descriptor.clone()));
    }

    match self.providers.open(descriptor) {
      Ok(bytes) => Ok((
        self.render_and_store(&bytes, descriptor)?,
        descriptor.clone(),
      )),
      Err(err) if err.is_not_found() => {
        let SourceDescriptor::Locator(raw) = descriptor else {
          return Err(err);
        };
        // Same string, asset interpretation. One retry, no further
        // fallback.
        let retry = SourceDescriptor::Asset(raw.clone());
        if let Some(hit) = self.cached(&retry) {
          return Ok((hit, retry));
        }
        let bytes = self.providers.open(&retry)?;
        Ok((self.render_and_store(&bytes, &retry)?, retry))
      }
      Err(err) => Err(err),
    }
  }

  fn render_and_store(
    &self,
    bytes: &SourceBytes,
    descriptor: &SourceDescriptor,
  ) -> Result<RenderedDrawable> {
    let drawable = self.engine.render(&bytes.bytes, self.resolver.as_ref())?;
    if self.caching {
      self.cache.store(descriptor.clone(), drawable.clone());
    }
    Ok(drawable)
  }

  fn cached(&self, descriptor: &SourceDescriptor) -> Option<RenderedDrawable> {
    if !self.caching {
      return None;
    }
    self.with_diagnostics(|d| d.requests += 1);
    match self.cache.lookup(descriptor) {
      Some(hit) => {
        self.with_diagnostics(|d| d.cache_hits += 1);
        Some(hit)
      }
      None => {
        self.with_diagnostics(|d| d.cache_misses += 1);
        None
      }
    }
  }

  fn record_error(&self, descriptor: &SourceDescriptor, error: &Error) {
    self.with_diagnostics(|d| d.record_error(descriptor, error));
  }

  fn with_diagnostics(&self, record: impl FnOnce(&mut ResolveDiagnostics)) {
    if let Some(sink) = &self.diagnostics {
      if let Ok(mut guard) = sink.lock() {
        record(&mut guard);
      }
    }
  }
}

impl Default for SvgView {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for SvgView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SvgView")
      .field("source", &self.source)
      .field("caching", &self.caching)
      .field("displayed", &self.displayed)
      .finish_non_exhaustive()
  }
}
