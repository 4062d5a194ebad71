//! The (Year, Ratio, Event) time series the chart is drawn from.

use std::{fs::File, io::Read, path::Path};

use anyhow::Context as _;
use serde::{Deserialize, Deserializer};

use crate::foundation::error::{ChartError, ChartResult};

/// One row of the wealth gap CSV.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "Year")]
    pub year: i32,

    #[serde(rename = "Ratio")]
    pub ratio: f64,

    /// Optional annotation; blank cells and a missing column both read as `None`.
    #[serde(rename = "Events", default, deserialize_with = "blank_as_none")]
    pub event: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty()))
}

/// Immutable, validated series. Construct through [`Series::new`] or the CSV loaders.
#[derive(Clone, Debug)]
pub struct Series {
    rows: Vec<Record>,
}

impl Series {
    pub fn new(rows: Vec<Record>) -> ChartResult<Self> {
        let series = Self { rows };
        series.validate()?;
        Ok(series)
    }

    pub fn load(path: &Path) -> ChartResult<Self> {
        let f = File::open(path).with_context(|| format!("open series '{}'", path.display()))?;
        let series = Self::from_csv_reader(f).map_err(|e| match e {
            ChartError::Data(msg) => ChartError::data(format!("{}: {msg}", path.display())),
            other => other,
        })?;

        let summary = series.summary();
        tracing::info!(
            path = %path.display(),
            rows = summary.rows,
            events = series.events().count(),
            "loaded series: {summary}"
        );
        Ok(series)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> ChartResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (i, result) in rdr.deserialize::<Record>().enumerate() {
            let row = result.map_err(|e| ChartError::data(format!("row {}: {e}", i + 1)))?;
            rows.push(row);
        }
        Self::new(rows)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.rows.is_empty() {
            return Err(ChartError::validation("series has no rows"));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if !row.ratio.is_finite() {
                return Err(ChartError::validation(format!(
                    "row {} (year {}): ratio must be finite",
                    i + 1,
                    row.year
                )));
            }
        }
        if let Some(w) = self.rows.windows(2).find(|w| w[1].year < w[0].year) {
            return Err(ChartError::validation(format!(
                "years must be non-decreasing, found {} after {}",
                w[1].year, w[0].year
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First year of the series; the left edge of the x axis.
    pub fn start_year(&self) -> i32 {
        self.rows[0].year
    }

    pub fn max_ratio(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.ratio)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Rows that carry an event annotation, in file order.
    pub fn events(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().filter(|r| r.event.is_some())
    }

    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary {
            rows: self.rows.len(),
            first_year: self.start_year(),
            last_year: self.rows[self.rows.len() - 1].year,
            ratio_min: self
                .rows
                .iter()
                .map(|r| r.ratio)
                .fold(f64::INFINITY, f64::min),
            ratio_max: self.max_ratio(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesSummary {
    pub rows: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub ratio_min: f64,
    pub ratio_max: f64,
}

impl std::fmt::Display for SeriesSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows, years {}..={}, ratio [{:.2}, {:.2}]",
            self.rows, self.first_year, self.last_year, self.ratio_min, self.ratio_max
        )
    }
}
