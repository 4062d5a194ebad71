use std::path::Path;

use anyhow::Context as _;

use crate::{
    encode::{ensure_parent_dir, flatten_to_opaque_rgba8},
    foundation::error::ChartResult,
    render::FrameRGBA,
};

/// Write a single frame as an opaque PNG still.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> ChartResult<()> {
    ensure_parent_dir(path)?;

    let mut straight = vec![0u8; frame.data.len()];
    flatten_to_opaque_rgba8(
        &mut straight,
        &frame.data,
        frame.premultiplied,
        [255, 255, 255, 255],
    )?;

    image::save_buffer_with_format(
        path,
        &straight,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
