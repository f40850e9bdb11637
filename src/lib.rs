//! inkframe composes single raster frames for e-ink family displays.
//!
//! A frame is a background image, resolved through an ordered fallback chain, with a
//! data-driven overlay of live information painted on top and an optional fixed-palette
//! quantization for the panel. The public API is composer-oriented:
//!
//! - Load an [`InkframeConfig`]
//! - Build a [`FrameComposer`] over an [`ObjectStore`]
//! - Render a [`FrameRequest`] into a [`RenderedFrame`]
//!
//! Batch jobs that keep the object store stocked live in [`assets::rotation`] and
//! [`assets::weekly`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod data;
mod foundation;
pub mod layout;
pub mod providers;
pub mod render;
pub mod session;
pub mod store;

pub use crate::foundation::config::{
    ApiKeys, Features, FontPaths, IconStyle, InkframeConfig, KeyConventions, Partition,
    RotationSettings, Timeouts,
};
pub use crate::foundation::core::{Canvas, Rect, Rgba8};
pub use crate::foundation::error::{InkframeError, InkframeResult};

pub use crate::assets::background::{
    BackgroundRequest, BackgroundResolver, BackgroundTier, ImageAsset, SourceTier,
};
pub use crate::assets::normalize::normalize_to_canvas;
pub use crate::assets::rotation::{RotationManager, RotationReport};
pub use crate::assets::weekly::{WeeklyArtGenerator, WeeklyReport, next_week_start};
pub use crate::data::context::RenderContext;
pub use crate::data::weather::{IconKind, WeatherSnapshot, classify};
pub use crate::layout::model::{ContentType, Element, ElementKind, LayoutDocument};
pub use crate::layout::store::{LayoutSource, LayoutStore};
pub use crate::render::fonts::FontCache;
pub use crate::render::layout::LayoutRenderer;
pub use crate::render::quantize::{PaletteSpec, quantize};
pub use crate::session::{FrameComposer, FrameDiagnostics, FrameRequest, RenderedFrame};
pub use crate::store::{DirStore, MemoryStore, ObjectStore};
