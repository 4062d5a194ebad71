//! Historical event markers and the ratio labels revealed as the line passes them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    axes,
    foundation::{
        core::{FrameIndex, Point},
        error::ChartResult,
    },
    series::Series,
};

/// Data-space offset of an intersection label from its event point.
pub const LABEL_OFFSET: (f64, f64) = (0.28, 0.53);

/// Default column width for wrapped event annotations.
pub const DEFAULT_WRAP_WIDTH: usize = 25;

/// An event row, prepared for drawing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventMarker {
    pub year: i32,
    pub ratio: f64,
    pub text: String,
    /// `text` broken into lines of at most the wrap width.
    pub wrapped: Vec<String>,
}

impl EventMarker {
    pub fn point(&self) -> Point {
        Point::new(f64::from(self.year), self.ratio)
    }
}

/// Markers for every event row, in file order.
pub fn markers(series: &Series, wrap_width: usize) -> Vec<EventMarker> {
    series
        .events()
        .filter_map(|r| {
            let text = r.event.as_ref()?;
            Some(EventMarker {
                year: r.year,
                ratio: r.ratio,
                text: text.clone(),
                wrapped: wrap(text, wrap_width),
            })
        })
        .collect()
}

/// Greedy word wrap.
///
/// Lines break at whitespace or after a hyphen inside a word; words longer than `width` are split.
/// Whitespace between words on the same line is kept, one space per whitespace character.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for (gap, chunk) in chunks(text) {
        let gap = if line.is_empty() { 0 } else { gap };
        if line.chars().count() + gap + chunk.chars().count() <= width {
            line.extend(std::iter::repeat_n(' ', gap));
            line.push_str(chunk);
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        let mut rest: Vec<char> = chunk.chars().collect();
        while rest.len() > width {
            lines.push(rest.drain(..width).collect());
        }
        line = rest.into_iter().collect();
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Split into wrap units, each paired with the number of whitespace characters before it. The
/// tail after a hyphen has a gap of zero.
fn chunks(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut gap = 0;
    for word in text.split(char::is_whitespace) {
        if word.is_empty() {
            gap += 1;
            continue;
        }
        let mut start = 0;
        let chars: Vec<(usize, char)> = word.char_indices().collect();
        for (i, &(pos, c)) in chars.iter().enumerate() {
            let inner = i > 0 && i + 1 < chars.len();
            if c == '-' && inner && chars[i - 1].1.is_alphanumeric() {
                let end = pos + c.len_utf8();
                out.push((if start == 0 { gap } else { 0 }, &word[start..end]));
                start = end;
            }
        }
        out.push((if start == 0 { gap } else { 0 }, &word[start..]));
        gap = 1;
    }
    out
}

/// Ratio label attached to an event intersection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntersectionLabel {
    /// Displayed text; empty until the line has passed the event.
    pub text: String,
    /// The ratio rounded to one decimal, shown once revealed.
    pub ratio_text: String,
    /// Data-space position of the text baseline start.
    pub anchor: Point,
}

impl IntersectionLabel {
    pub fn is_revealed(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Event year → mutable intersection label.
///
/// Labels start hidden and are revealed once the visible range has moved past their year; a
/// revealed label stays for the rest of the animation. Later rows with the same year replace
/// earlier ones.
#[derive(Clone, Debug, Default)]
pub struct LabelBook {
    labels: BTreeMap<i32, IntersectionLabel>,
}

impl LabelBook {
    pub fn new(markers: &[EventMarker]) -> Self {
        let mut labels = BTreeMap::new();
        for m in markers {
            labels.insert(
                m.year,
                IntersectionLabel {
                    text: String::new(),
                    ratio_text: format!("{:.1}", m.ratio),
                    anchor: Point::new(
                        f64::from(m.year) + LABEL_OFFSET.0,
                        m.ratio + LABEL_OFFSET.1,
                    ),
                },
            );
        }
        Self { labels }
    }

    /// Hide every label.
    pub fn reset(&mut self) {
        for label in self.labels.values_mut() {
            label.text.clear();
        }
    }

    /// Reveal labels for events strictly before `end_year`. Returns how many became visible.
    pub fn observe(&mut self, end_year: i32) -> usize {
        let mut revealed = 0;
        for (_, label) in self.labels.range_mut(..end_year) {
            if !label.is_revealed() {
                label.text = label.ratio_text.clone();
                revealed += 1;
            }
        }
        revealed
    }

    /// Rebuild the label state as it stands after rendering frames `0..=frame` in order.
    pub fn replay(&mut self, series: &Series, frame: FrameIndex) -> ChartResult<()> {
        self.reset();
        // End years never decrease, so the last frame's observation covers the earlier ones.
        let end = axes::end_year(series, frame)?;
        self.observe(end);
        Ok(())
    }

    pub fn get(&self, year: i32) -> Option<&IntersectionLabel> {
        self.labels.get(&year)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn revealed(&self) -> impl Iterator<Item = (i32, &IntersectionLabel)> {
        self.labels
            .iter()
            .filter(|(_, l)| l.is_revealed())
            .map(|(y, l)| (*y, l))
    }
}
