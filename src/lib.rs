//! Animated line chart of the White/Black household wealth gap.
//!
//! One CSV in, one looping GIF out. Each frame widens the visible year range by one row, picks
//! an era theme (fonts, colors, sizes) from the last visible year, thins the x ticks as the range
//! grows, and reveals ratio labels at historical events once the line has passed them.
//!
//! - Load a [`Series`]
//! - Create an [`AnimationSession`]
//! - Render every frame into a [`FrameSink`] such as [`GifSink`], or a single still
#![forbid(unsafe_code)]

mod foundation;

pub mod axes;
pub mod config;
pub mod encode;
pub mod events;
pub mod plan;
pub mod render;
pub mod scene;
pub mod series;
pub mod session;
pub mod theme;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8};
pub use crate::foundation::error::{ChartError, ChartResult};

pub use crate::config::ChartConfig;
pub use crate::encode::{FrameSink, GifSink, GifSinkOpts, InMemorySink, SinkConfig, write_png};
pub use crate::events::{EventMarker, LabelBook};
pub use crate::plan::FramePlan;
pub use crate::render::{FontSet, FrameRGBA, Rasterizer};
pub use crate::series::{Record, Series};
pub use crate::session::{AnimationSession, RenderStats};
pub use crate::theme::{Era, Theme};
