//! Frame sinks: GIF animation output, PNG stills, in-memory capture.

pub mod gif;
pub mod png;
pub mod sink;

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ChartError, ChartResult};

pub use self::gif::{GifSink, GifSinkOpts};
pub use self::png::write_png;
pub use self::sink::{FrameSink, InMemorySink, SinkConfig};

pub fn ensure_parent_dir(path: &Path) -> ChartResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Composite `src` over an opaque `bg_rgba` into straight, fully opaque RGBA8.
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ChartResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ChartError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        // Premultiplied red @ 50% alpha => rgb is 128,0,0 when premul.
        let src = vec![128u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn flatten_transparent_shows_background() {
        let src = vec![0u8; 8];
        let mut dst = vec![0u8; 8];
        flatten_to_opaque_rgba8(&mut dst, &src, true, [0xd0, 0xbf, 0xab, 255]).unwrap();
        assert_eq!(dst, vec![0xd0, 0xbf, 0xab, 255, 0xd0, 0xbf, 0xab, 255]);
    }

    #[test]
    fn flatten_rejects_mismatched_buffers() {
        let mut dst = vec![0u8; 4];
        assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 8], true, [0, 0, 0, 255]).is_err());
    }

    #[test]
    fn ensure_parent_dir_accepts_bare_file_names() {
        ensure_parent_dir(Path::new("animation.gif")).unwrap();
    }
}
