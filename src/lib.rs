pub mod cache;
pub mod error;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod source;
pub mod view;

pub use cache::RenderCache;
pub use error::{Error, Result};
pub use provider::{
  AssetDir, AssetOpener, ByteProviders, ContentOpener, ResourceLoader, ResourceTable, SourceBytes,
  UrlContentOpener,
};
pub use render::{RenderedDrawable, ResvgEngine, SurfaceRequirement, VectorEngine};
pub use resolver::{FontStyle, NoResolver, SubResourceResolver};
pub use source::{SourceConfig, SourceDescriptor};
pub use view::{ResolveDiagnostics, ResolveWarning, SvgView, SvgViewBuilder};

// Re-export Pixmap from tiny-skia for public use
pub use resvg::tiny_skia::Pixmap;
