//! Era themes: the chart re-dresses itself as the animation moves through history.

use serde::Serialize;

use crate::foundation::core::Rgba8;

/// Historical era a frame belongs to, keyed by the era's anchor year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Era {
    /// 1860 onward (and anything earlier).
    Reconstruction,
    /// 1900 onward.
    EarlyCentury,
    /// 1940 onward.
    MidCentury,
    /// 1980 onward.
    Modern,
}

impl Era {
    pub const ALL: [Era; 4] = [
        Era::Reconstruction,
        Era::EarlyCentury,
        Era::MidCentury,
        Era::Modern,
    ];

    /// Era for the frame whose visible range ends at `year`.
    pub fn for_year(year: i32) -> Self {
        if year >= 1980 {
            Era::Modern
        } else if year >= 1940 {
            Era::MidCentury
        } else if year >= 1900 {
            Era::EarlyCentury
        } else {
            Era::Reconstruction
        }
    }

    pub fn anchor_year(self) -> i32 {
        match self {
            Era::Reconstruction => 1860,
            Era::EarlyCentury => 1900,
            Era::MidCentury => 1940,
            Era::Modern => 1980,
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            Era::Reconstruction => Theme {
                era: self,
                title_font: Font::new("Edwardian Script ITC", Generic::Cursive),
                axis_label_font: Font::new("Brush Script MT", Generic::Cursive),
                tick_label_size: 24.0,
                tick_label_font: Font::new("Bradley Hand ITC", Generic::Cursive),
                tick_label_color: Rgba8::rgb(0x29, 0x29, 0x29),
                background_color: Rgba8::rgb(0xd0, 0xbf, 0xab),
            },
            Era::EarlyCentury => Theme {
                era: self,
                title_font: Font::new("SimSun", Generic::Serif),
                axis_label_font: Font::new("SimSun", Generic::Serif),
                tick_label_size: 20.0,
                tick_label_font: Font::new("Franklin Gothic Medium", Generic::SansSerif),
                tick_label_color: Rgba8::rgb(0x38, 0x37, 0x34),
                background_color: Rgba8::rgb(0xd6, 0xc7, 0xb6),
            },
            Era::MidCentury => Theme {
                era: self,
                title_font: Font::new("DejaVu Sans Mono", Generic::Monospace),
                axis_label_font: Font::new("Consolas", Generic::Monospace),
                tick_label_size: 18.0,
                tick_label_font: Font::new("Consolas", Generic::Monospace),
                tick_label_color: Rgba8::rgb(0x24, 0x24, 0x24),
                background_color: Rgba8::rgb(0xd7, 0xd7, 0xd7),
            },
            Era::Modern => Theme {
                era: self,
                title_font: Font::new("Times New Roman", Generic::Serif),
                axis_label_font: Font::new("Microsoft Sans Serif", Generic::SansSerif),
                tick_label_size: 19.0,
                tick_label_font: Font::new("Microsoft Sans Serif", Generic::SansSerif),
                tick_label_color: Rgba8::BLACK,
                background_color: Rgba8::rgb(0xff, 0xff, 0xff),
            },
        }
    }
}

/// Generic CSS family used when a named face is not installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generic {
    Serif,
    SansSerif,
    Cursive,
    Monospace,
}

impl Generic {
    fn css(self) -> &'static str {
        match self {
            Generic::Serif => "serif",
            Generic::SansSerif => "sans-serif",
            Generic::Cursive => "cursive",
            Generic::Monospace => "monospace",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Font {
    pub family: &'static str,
    pub fallback: Generic,
}

impl Font {
    pub const fn new(family: &'static str, fallback: Generic) -> Self {
        Self { family, fallback }
    }

    /// CSS `font-family` list, e.g. `'Consolas', monospace`.
    pub fn css_family(self) -> String {
        format!("'{}', {}", self.family, self.fallback.css())
    }
}

/// Fonts, sizes (points) and colors applied to one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Theme {
    pub era: Era,
    pub title_font: Font,
    pub axis_label_font: Font,
    pub tick_label_size: f64,
    pub tick_label_font: Font,
    pub tick_label_color: Rgba8,
    pub background_color: Rgba8,
}

impl Theme {
    pub fn for_year(year: i32) -> Self {
        Era::for_year(year).theme()
    }

    pub fn title_size(&self) -> f64 {
        self.tick_label_size + 12.0
    }

    pub fn axis_label_size(&self) -> f64 {
        self.tick_label_size
    }

    pub fn tick_size(&self) -> f64 {
        self.tick_label_size - 4.0
    }

    pub fn event_size(&self) -> f64 {
        self.tick_label_size - 7.0
    }
}

/// Point size of the ratio labels placed at event intersections.
pub const INTERSECTION_LABEL_SIZE: f64 = 8.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_boundaries_are_inclusive_lower_bounds() {
        assert_eq!(Era::for_year(1820), Era::Reconstruction);
        assert_eq!(Era::for_year(1899), Era::Reconstruction);
        assert_eq!(Era::for_year(1900), Era::EarlyCentury);
        assert_eq!(Era::for_year(1939), Era::EarlyCentury);
        assert_eq!(Era::for_year(1940), Era::MidCentury);
        assert_eq!(Era::for_year(1979), Era::MidCentury);
        assert_eq!(Era::for_year(1980), Era::Modern);
        assert_eq!(Era::for_year(2020), Era::Modern);
    }

    #[test]
    fn anchor_years_select_their_own_era() {
        for era in Era::ALL {
            assert_eq!(Era::for_year(era.anchor_year()), era);
            assert_eq!(era.theme().era, era);
        }
    }

    #[test]
    fn derived_sizes_follow_tick_label_size() {
        let t = Theme::for_year(1863);
        assert_eq!(t.tick_label_size, 24.0);
        assert_eq!(t.title_size(), 36.0);
        assert_eq!(t.tick_size(), 20.0);
        assert_eq!(t.event_size(), 17.0);

        let t = Theme::for_year(1950);
        assert_eq!(t.title_size(), 30.0);
        assert_eq!(t.background_color, Rgba8::parse_hex("#d7d7d7").unwrap());
    }

    #[test]
    fn css_family_carries_generic_fallback() {
        let t = Theme::for_year(1990);
        assert_eq!(t.title_font.css_family(), "'Times New Roman', serif");
        assert_eq!(
            Theme::for_year(1941).tick_label_font.css_family(),
            "'Consolas', monospace"
        );
    }
}
