use serde::Serialize;

use crate::{
    foundation::{
        core::FrameIndex,
        error::{ChartError, ChartResult},
    },
    series::Series,
};

/// Bottom of the y axis.
pub const Y_BOTTOM: f64 = 1.0;

/// Year at the right end of the line for `frame`.
///
/// Frames 0 and 1 both show the first year: the initial frame repeats it before the line starts
/// advancing.
pub fn end_year(series: &Series, frame: FrameIndex) -> ChartResult<i32> {
    if frame.as_usize() >= series.len() {
        return Err(ChartError::validation(format!(
            "frame {} is outside the animation (0..{})",
            frame.0,
            series.len()
        )));
    }
    let idx = frame.as_usize().max(1) - 1;
    Ok(series.rows()[idx].year)
}

/// Spacing of x ticks; sparser as the window widens.
pub fn x_tick_interval(current_year: i32) -> i32 {
    if current_year <= 1890 {
        5
    } else if current_year <= 1920 {
        10
    } else {
        20
    }
}

/// Top of the y axis: `max_ratio * headroom` rounded half-to-even, kept above [`Y_BOTTOM`].
pub fn y_top(max_ratio: f64, headroom: f64) -> f64 {
    let top = (max_ratio * headroom).round_ties_even();
    if top > Y_BOTTOM { top } else { Y_BOTTOM + 1.0 }
}

/// Data-space bounds visible in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AxisWindow {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl AxisWindow {
    pub fn new(start_year: i32, current_year: i32, y_top: f64) -> Self {
        Self {
            x_min: f64::from(start_year),
            x_max: f64::from(current_year) + 1.0,
            y_min: Y_BOTTOM,
            y_max: y_top,
        }
    }

    pub fn contains_x(&self, x: f64) -> bool {
        self.x_min <= x && x <= self.x_max
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.contains_x(x) && self.y_min <= y && y <= self.y_max
    }
}

/// `start, start + interval, …` strictly below `current_year + 1`.
pub fn x_ticks(start_year: i32, current_year: i32, interval: i32) -> Vec<i32> {
    let interval = interval.max(1);
    (start_year..=current_year)
        .step_by(interval as usize)
        .collect()
}

/// A y tick position and its label text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

const MAX_Y_INTERVALS: f64 = 9.0;
const NICE_STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Evenly spaced "nice" ticks covering `[lo, hi]`.
pub fn y_ticks(lo: f64, hi: f64) -> Vec<Tick> {
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Vec::new();
    }

    let raw = (hi - lo) / MAX_Y_INTERVALS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = NICE_STEPS
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude);

    let decimals = decimals_for_step(step);
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;

    (first..=last)
        .map(|k| {
            let value = k as f64 * step;
            Tick {
                value,
                label: format!("{value:.decimals$}"),
            }
        })
        .collect()
}

fn decimals_for_step(step: f64) -> usize {
    let mut decimals = 0usize;
    let mut s = step;
    while decimals < 6 && (s - s.round()).abs() > 1e-9 {
        s *= 10.0;
        decimals += 1;
    }
    decimals
}
