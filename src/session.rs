use crate::{
    axes,
    config::ChartConfig,
    encode::sink::{FrameSink, SinkConfig},
    events::{self, EventMarker, LabelBook},
    foundation::{
        core::{Canvas, Fps, FrameIndex, FrameRange},
        error::ChartResult,
    },
    plan::FramePlan,
    render::{FontSet, FrameRGBA, Rasterizer},
    scene::{FrameScene, Layout, build_svg},
    series::Series,
};

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub frames_rendered: u64,
    /// Intersection labels revealed over the run.
    pub labels_revealed: u64,
}

/// Renders the animation for one series.
///
/// The session owns the only mutable state of the animation, the [`LabelBook`]; everything else
/// is recomputed per frame from the frame index.
pub struct AnimationSession {
    series: Series,
    markers: Vec<EventMarker>,
    labels: LabelBook,
    layout: Layout,
    rasterizer: Rasterizer,
    canvas: Canvas,
    fps: Fps,
    y_top: f64,
}

impl AnimationSession {
    pub fn new(series: Series, cfg: &ChartConfig, fonts: &FontSet) -> ChartResult<Self> {
        cfg.validate()?;
        series.validate()?;

        for (era, font) in fonts.missing_theme_fonts() {
            match fonts.generic_face(font.fallback) {
                Some(face) => tracing::warn!(
                    era = era.anchor_year(),
                    family = font.family,
                    "font not installed, falling back to '{face}'"
                ),
                None => tracing::warn!(
                    era = era.anchor_year(),
                    family = font.family,
                    "font not installed and no fallback face available; its text is skipped"
                ),
            }
        }

        let markers = events::markers(&series, cfg.wrap_width);
        let labels = LabelBook::new(&markers);
        let y_top = axes::y_top(series.max_ratio(), cfg.headroom);

        Ok(Self {
            markers,
            labels,
            layout: Layout::default(),
            rasterizer: Rasterizer::new(fonts),
            canvas: cfg.canvas()?,
            fps: cfg.fps()?,
            y_top,
            series,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.series.len() as u64
    }

    pub fn frames(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.frame_count()),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn labels(&self) -> &LabelBook {
        &self.labels
    }

    pub fn plan(&self, frame: FrameIndex) -> ChartResult<FramePlan> {
        FramePlan::for_frame(&self.series, frame, self.y_top)
    }

    /// Draw `plan` with the labels as they currently stand.
    fn draw(&self, plan: &FramePlan) -> ChartResult<FrameRGBA> {
        let svg = build_svg(&FrameScene {
            plan,
            layout: &self.layout,
            series: &self.series,
            markers: &self.markers,
            labels: &self.labels,
        });
        self.rasterizer.rasterize(&svg, self.canvas)
    }

    /// SVG document for `frame` as it appears in the full animation.
    pub fn frame_svg(&mut self, frame: FrameIndex) -> ChartResult<String> {
        let plan = self.plan(frame)?;
        self.labels.replay(&self.series, frame)?;
        Ok(build_svg(&FrameScene {
            plan: &plan,
            layout: &self.layout,
            series: &self.series,
            markers: &self.markers,
            labels: &self.labels,
        }))
    }

    /// Render one still of `frame` as it appears in the full animation.
    #[tracing::instrument(skip(self))]
    pub fn render_frame(&mut self, frame: FrameIndex) -> ChartResult<FrameRGBA> {
        let plan = self.plan(frame)?;
        self.labels.replay(&self.series, frame)?;
        self.draw(&plan)
    }

    /// Render every frame in order into `sink`.
    pub fn render_all(&mut self, sink: &mut dyn FrameSink) -> ChartResult<RenderStats> {
        let range = self.frames();
        let mut stats = RenderStats {
            frames_total: range.len_frames(),
            ..RenderStats::default()
        };

        tracing::info!(
            frames = stats.frames_total,
            width = self.canvas.width,
            height = self.canvas.height,
            fps = self.fps.get(),
            "rendering animation"
        );

        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            frame_count: stats.frames_total,
        })?;

        self.labels.reset();
        for frame in range.iter() {
            let plan = self.plan(frame)?;
            let revealed = self.labels.observe(plan.end_year);
            stats.labels_revealed += revealed as u64;

            let pixels = self.draw(&plan)?;
            sink.push_frame(frame, &pixels)?;
            stats.frames_rendered += 1;

            tracing::debug!(
                frame = frame.0,
                year = plan.end_year,
                era = plan.theme.era.anchor_year(),
                revealed,
                "frame rendered"
            );
        }

        sink.end()?;
        tracing::info!(
            frames = stats.frames_rendered,
            labels = stats.labels_revealed,
            "animation complete"
        );
        Ok(stats)
    }
}
