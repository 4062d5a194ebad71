use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::ChartResult,
    },
    render::FrameRGBA,
};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Playback rate.
    pub fps: Fps,
    /// Total frames that will be pushed.
    pub frame_count: u64,
}

/// Consumer of rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between
/// one `begin` and one `end`.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ChartResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChartResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ChartResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ChartResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChartResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ChartResult<()> {
        self.ended = true;
        Ok(())
    }
}
