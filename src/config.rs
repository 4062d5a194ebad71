use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    encode::gif::GIF_SPEED_RANGE,
    events::DEFAULT_WRAP_WIDTH,
    foundation::{
        core::{Canvas, Fps},
        error::{ChartError, ChartResult},
    },
    scene::layout::FIGURE_INCHES,
};

pub const DEFAULT_INPUT: &str = "White-Black wealth gap per year.csv";
pub const DEFAULT_OUTPUT: &str = "animation.gif";

/// Render settings. Every field has a default; a JSON file may set any subset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    /// Pixels per inch of the 16x9 inch figure.
    pub dpi: u32,
    /// GIF quantizer speed, 1 (best) ..= 30 (fastest).
    pub gif_speed: i32,
    pub wrap_width: usize,
    /// Multiplier applied to the largest ratio to get the top of the y axis.
    pub headroom: f64,
    pub font_dirs: Vec<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            fps: 8,
            dpi: 150,
            gif_speed: 10,
            wrap_width: DEFAULT_WRAP_WIDTH,
            headroom: 1.1,
            font_dirs: Vec::new(),
        }
    }
}

impl ChartConfig {
    pub fn load(path: &Path) -> ChartResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ChartError::validation(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ChartResult<()> {
        Fps::new(self.fps)?;
        if self.dpi == 0 {
            return Err(ChartError::validation("dpi must be > 0"));
        }
        if !GIF_SPEED_RANGE.contains(&self.gif_speed) {
            return Err(ChartError::validation(format!(
                "gif_speed must be within {}..={}",
                GIF_SPEED_RANGE.start(),
                GIF_SPEED_RANGE.end()
            )));
        }
        if self.wrap_width == 0 {
            return Err(ChartError::validation("wrap_width must be > 0"));
        }
        if !self.headroom.is_finite() || self.headroom < 1.0 {
            return Err(ChartError::validation("headroom must be a finite value >= 1"));
        }
        let canvas = self.canvas()?;
        if canvas.width > u32::from(u16::MAX) || canvas.height > u32::from(u16::MAX) {
            return Err(ChartError::validation(format!(
                "dpi {} gives a {}x{} canvas, larger than GIF allows",
                self.dpi, canvas.width, canvas.height
            )));
        }
        Ok(())
    }

    pub fn fps(&self) -> ChartResult<Fps> {
        Fps::new(self.fps)
    }

    pub fn canvas(&self) -> ChartResult<Canvas> {
        Canvas::from_figure(FIGURE_INCHES, self.dpi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ChartConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.fps, 8);
        assert_eq!(cfg.input, PathBuf::from("White-Black wealth gap per year.csv"));
        assert_eq!(cfg.output, PathBuf::from("animation.gif"));
        let c = cfg.canvas().unwrap();
        assert_eq!((c.width, c.height), (2400, 1350));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ChartConfig = serde_json::from_str(r#"{ "fps": 12, "dpi": 50 }"#).unwrap();
        assert_eq!(cfg.fps, 12);
        assert_eq!(cfg.dpi, 50);
        assert_eq!(cfg.wrap_width, 25);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ChartConfig>(r#"{ "fsp": 12 }"#).is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let bad = [
            ChartConfig {
                fps: 0,
                ..ChartConfig::default()
            },
            ChartConfig {
                dpi: 0,
                ..ChartConfig::default()
            },
            ChartConfig {
                dpi: 5000,
                ..ChartConfig::default()
            },
            ChartConfig {
                gif_speed: 31,
                ..ChartConfig::default()
            },
            ChartConfig {
                wrap_width: 0,
                ..ChartConfig::default()
            },
            ChartConfig {
                headroom: 0.5,
                ..ChartConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn load_reads_json_file() {
        let dir = PathBuf::from("target").join("config_unit");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chart.json");
        std::fs::write(&path, r#"{ "output": "out/reel.gif", "gif_speed": 20 }"#).unwrap();

        let cfg = ChartConfig::load(&path).unwrap();
        assert_eq!(cfg.output, PathBuf::from("out/reel.gif"));
        assert_eq!(cfg.gif_speed, 20);

        std::fs::write(&path, r#"{ "fps": 0 }"#).unwrap();
        assert!(ChartConfig::load(&path).is_err());
    }
}
