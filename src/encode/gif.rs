use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::{
    encode::{
        ensure_parent_dir, flatten_to_opaque_rgba8,
        sink::{FrameSink, SinkConfig},
    },
    foundation::{
        core::FrameIndex,
        error::{ChartError, ChartResult},
    },
    render::FrameRGBA,
};

/// Quantizer speed range accepted by the GIF encoder (1 = best quality, 30 = fastest).
pub const GIF_SPEED_RANGE: std::ops::RangeInclusive<i32> = 1..=30;

#[derive(Clone, Debug)]
pub struct GifSinkOpts {
    pub out_path: PathBuf,
    pub speed: i32,
    pub overwrite: bool,
    /// Color shown through any transparent pixels.
    pub bg_rgba: [u8; 4],
}

impl GifSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            speed: 10,
            overwrite: true,
            bg_rgba: [255, 255, 255, 255],
        }
    }
}

/// Last byte of every well-formed GIF stream.
const GIF_TRAILER: u8 = 0x3b;

/// In-memory target for the encoder. The encoder only finishes its stream on drop, so it writes
/// here and the sink copies the bytes to disk itself where write errors can be reported.
#[derive(Clone, Default)]
struct EncodedBytes(Arc<Mutex<Vec<u8>>>);

impl EncodedBytes {
    fn take(&self) -> ChartResult<Vec<u8>> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| ChartError::encode("gif buffer lock poisoned"))?;
        Ok(std::mem::take(&mut *bytes))
    }
}

impl Write for EncodedBytes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("gif buffer lock poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes pushed frames as a looping animated GIF.
pub struct GifSink {
    opts: GifSinkOpts,
    cfg: Option<SinkConfig>,
    encoder: Option<GifEncoder<EncodedBytes>>,
    bytes: EncodedBytes,
    delay: image::Delay,
    scratch: Vec<u8>,
    last: Option<FrameIndex>,
    frames_written: u64,
}

impl GifSink {
    pub fn new(opts: GifSinkOpts) -> ChartResult<Self> {
        if !GIF_SPEED_RANGE.contains(&opts.speed) {
            return Err(ChartError::validation(format!(
                "gif speed must be within {}..={}, got {}",
                GIF_SPEED_RANGE.start(),
                GIF_SPEED_RANGE.end(),
                opts.speed
            )));
        }
        Ok(Self {
            opts,
            cfg: None,
            encoder: None,
            bytes: EncodedBytes::default(),
            delay: image::Delay::from_numer_denom_ms(100, 1),
            scratch: Vec::new(),
            last: None,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> ChartResult<()> {
        if self.encoder.is_some() {
            return Err(ChartError::encode("gif sink already started"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ChartError::validation("gif width/height must be non-zero"));
        }
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(ChartError::validation(format!(
                "gif frames are limited to {0}x{0}, got {1}x{2}",
                u16::MAX,
                cfg.width,
                cfg.height
            )));
        }

        let path = &self.opts.out_path;
        ensure_parent_dir(path)?;
        if !self.opts.overwrite && path.exists() {
            return Err(ChartError::validation(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }

        self.bytes = EncodedBytes::default();
        let mut encoder = GifEncoder::new_with_speed(self.bytes.clone(), self.opts.speed);
        encoder.set_repeat(Repeat::Infinite)?;

        let (numer, denom) = cfg.fps.frame_delay_ms();
        self.delay = image::Delay::from_numer_denom_ms(numer, denom);
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.encoder = Some(encoder);
        self.last = None;
        self.frames_written = 0;

        tracing::debug!(
            path = %path.display(),
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps.get(),
            "gif sink started"
        );
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ChartResult<()> {
        let (Some(cfg), Some(encoder)) = (self.cfg.as_ref(), self.encoder.as_mut()) else {
            return Err(ChartError::encode("gif sink is not started"));
        };

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ChartError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if self.last.is_some_and(|last| idx <= last) {
            return Err(ChartError::validation(format!(
                "frames must be pushed in increasing order, got {} after {:?}",
                idx.0, self.last
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.opts.bg_rgba,
        )?;

        let buffer = image::RgbaImage::from_raw(frame.width, frame.height, self.scratch.clone())
            .ok_or_else(|| ChartError::encode("frame buffer does not match its dimensions"))?;
        encoder.encode_frame(image::Frame::from_parts(buffer, 0, 0, self.delay))?;

        self.last = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> ChartResult<()> {
        let Some(encoder) = self.encoder.take() else {
            return Err(ChartError::encode("gif sink is not started"));
        };
        // Dropping the encoder appends the trailer.
        drop(encoder);
        let bytes = self.bytes.take()?;

        let path = &self.opts.out_path;
        if self.frames_written == 0 {
            return Err(ChartError::encode(format!(
                "gif '{}' has no frames",
                path.display()
            )));
        }
        if bytes.last() != Some(&GIF_TRAILER) {
            return Err(ChartError::encode(format!(
                "gif '{}' stream is incomplete",
                path.display()
            )));
        }

        let mut file =
            File::create(path).with_context(|| format!("create gif '{}'", path.display()))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .with_context(|| format!("write gif '{}'", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            bytes = bytes.len(),
            frames = self.frames_written,
            "gif sink finished"
        );
        Ok(())
    }
}
