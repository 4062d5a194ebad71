use crate::{
    axes::AxisWindow,
    foundation::core::{Affine, Point, Rect},
};

/// Figure size in inches.
pub const FIGURE_INCHES: (f64, f64) = (16.0, 9.0);

/// Points per inch; layout is expressed in points so font sizes need no conversion.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Plot area edges as fractions of the figure, measured from the bottom-left corner.
const PLOT_LEFT: f64 = 0.125;
const PLOT_RIGHT: f64 = 0.9;
const PLOT_BOTTOM: f64 = 0.11;
const PLOT_TOP: f64 = 0.73;

pub const TITLE_PAD: f64 = 140.0;
pub const LABEL_PAD: f64 = 15.0;
pub const TICK_LENGTH: f64 = 3.5;
pub const TICK_PAD: f64 = 3.5;
/// The x-axis label sits this fraction of the plot height below the plot area.
pub const X_LABEL_DROP: f64 = 0.075;

/// Fixed geometry of the figure in points (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub figure: Rect,
    pub plot: Rect,
}

impl Default for Layout {
    fn default() -> Self {
        Self::for_figure(FIGURE_INCHES)
    }
}

impl Layout {
    pub fn for_figure(inches: (f64, f64)) -> Self {
        let w = inches.0 * POINTS_PER_INCH;
        let h = inches.1 * POINTS_PER_INCH;
        Self {
            figure: Rect::new(0.0, 0.0, w, h),
            plot: Rect::new(
                w * PLOT_LEFT,
                h * (1.0 - PLOT_TOP),
                w * PLOT_RIGHT,
                h * (1.0 - PLOT_BOTTOM),
            ),
        }
    }

    /// Baseline position of the title.
    pub fn title_anchor(&self) -> Point {
        Point::new(self.plot.center().x, self.plot.y0 - TITLE_PAD)
    }

    /// Top-centre of the x-axis label.
    pub fn x_label_anchor(&self) -> Point {
        Point::new(
            self.plot.center().x,
            self.plot.y1 + self.plot.height() * X_LABEL_DROP,
        )
    }

    /// Maps data coordinates in `window` onto the plot area.
    pub fn data_to_figure(&self, window: &AxisWindow) -> Affine {
        let sx = self.plot.width() / (window.x_max - window.x_min);
        let sy = self.plot.height() / (window.y_max - window.y_min);
        Affine::new([
            sx,
            0.0,
            0.0,
            -sy,
            self.plot.x0 - window.x_min * sx,
            self.plot.y1 + window.y_min * sy,
        ])
    }
}
