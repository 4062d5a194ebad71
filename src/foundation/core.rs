use crate::foundation::error::{ChartError, ChartResult};

pub use kurbo::{Affine, Point, Rect};

/// Absolute 0-based animation frame index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index as `usize` for series lookups.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Iterate the frames of the range in increasing order.
    pub fn iter(self) -> impl Iterator<Item = FrameIndex> {
        (self.start.0..self.end.0).map(FrameIndex)
    }
}

/// Whole frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps(u32);

impl Fps {
    /// Create a validated FPS value.
    pub fn new(fps: u32) -> ChartResult<Self> {
        if fps == 0 {
            return Err(ChartError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Duration of one frame in milliseconds, as a `(numer, denom)` pair.
    pub fn frame_delay_ms(self) -> (u32, u32) {
        (1000, self.0)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Pixel canvas for a figure of `inches` at `dpi`.
    pub fn from_figure(inches: (f64, f64), dpi: u32) -> ChartResult<Self> {
        let px = |v: f64| -> ChartResult<u32> {
            let p = (v * f64::from(dpi)).round();
            if !p.is_finite() || p < 1.0 || p > f64::from(u32::MAX) {
                return Err(ChartError::validation(format!(
                    "figure size {v}in at {dpi}dpi is not a usable pixel size"
                )));
            }
            Ok(p as u32)
        };
        Ok(Self {
            width: px(inches.0)?,
            height: px(inches.1)?,
        })
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const GREY: Self = Self::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (case-insensitive, `#` optional).
    pub fn parse_hex(s: &str) -> ChartResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        let hex_byte = |i: usize| -> ChartResult<u8> {
            let pair = s
                .get(i..i + 2)
                .ok_or_else(|| ChartError::validation(format!("invalid hex color \"{s}\"")))?;
            u8::from_str_radix(pair, 16)
                .map_err(|_| ChartError::validation(format!("invalid hex byte \"{pair}\"")))
        };

        match s.len() {
            6 => Ok(Self::rgb(hex_byte(0)?, hex_byte(2)?, hex_byte(4)?)),
            8 => Ok(Self {
                r: hex_byte(0)?,
                g: hex_byte(2)?,
                b: hex_byte(4)?,
                a: hex_byte(6)?,
            }),
            _ => Err(ChartError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    /// `#rrggbb` form for SVG paint attributes (alpha is emitted separately).
    pub fn to_svg_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_range_iterates_half_open() {
        let r = FrameRange {
            start: FrameIndex(2),
            end: FrameIndex(5),
        };
        assert_eq!(r.len_frames(), 3);
        assert_eq!(
            r.iter().collect::<Vec<_>>(),
            vec![FrameIndex(2), FrameIndex(3), FrameIndex(4)]
        );
    }

    #[test]
    fn fps_rejects_zero() {
        assert!(Fps::new(0).is_err());
        assert_eq!(Fps::new(8).unwrap().frame_delay_ms(), (1000, 8));
    }

    #[test]
    fn canvas_from_figure_scales_by_dpi() {
        let c = Canvas::from_figure((16.0, 9.0), 100).unwrap();
        assert_eq!((c.width, c.height), (1600, 900));
        let c = Canvas::from_figure((16.0, 9.0), 150).unwrap();
        assert_eq!((c.width, c.height), (2400, 1350));
        assert!(Canvas::from_figure((0.0, 9.0), 100).is_err());
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(
            Rgba8::parse_hex("#d0bfab").unwrap(),
            Rgba8::rgb(0xd0, 0xbf, 0xab)
        );
        assert_eq!(Rgba8::parse_hex("FFFFFF80").unwrap().a, 0x80);
        assert!(Rgba8::parse_hex("#fff").is_err());
        assert!(Rgba8::parse_hex("#gg0000").is_err());
        assert_eq!(Rgba8::rgb(0x29, 0x29, 0x29).to_svg_hex(), "#292929");
    }
}
