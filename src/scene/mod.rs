//! Frame layout and SVG scene construction.

pub mod layout;
pub mod svg;

pub use layout::Layout;
pub use svg::{FrameScene, build_svg};
