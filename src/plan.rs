use serde::Serialize;

use crate::{
    axes::{self, AxisWindow, Tick},
    foundation::{core::FrameIndex, error::ChartResult},
    series::Series,
    theme::Theme,
};

/// Everything about a frame that depends only on its index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FramePlan {
    pub frame: FrameIndex,
    pub end_year: i32,
    pub title: String,
    pub theme: Theme,
    pub window: AxisWindow,
    pub x_tick_interval: i32,
    pub x_ticks: Vec<i32>,
    pub y_ticks: Vec<Tick>,
}

impl FramePlan {
    /// Plan `frame` with the y axis topped at `y_top` (see [`axes::y_top`]).
    pub fn for_frame(series: &Series, frame: FrameIndex, y_top: f64) -> ChartResult<Self> {
        let end_year = axes::end_year(series, frame)?;
        let start_year = series.start_year();
        let window = AxisWindow::new(start_year, end_year, y_top);
        let x_tick_interval = axes::x_tick_interval(end_year);

        Ok(Self {
            frame,
            end_year,
            title: format!("Black/White Wealth Gap: {end_year}"),
            theme: Theme::for_year(end_year),
            window,
            x_tick_interval,
            x_ticks: axes::x_ticks(start_year, end_year, x_tick_interval),
            y_ticks: axes::y_ticks(window.y_min, window.y_max),
        })
    }
}
