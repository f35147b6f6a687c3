//! Terminal series types produced by the pipeline.
//!
//! [`TimeSeries1D`] is the spatially reduced monthly series, [`AnnualSeries`]
//! its per-year aggregation. Both are short-lived values handed to the output
//! writer or an external plotting layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PipelineError, Result};

/// A calendar date tagged onto one time step.
///
/// Unlike `chrono::NaiveDate` this can represent dates of non-Gregorian model
/// calendars (a no-leap year has no February 29th, but every Gregorian date is
/// representable too). Field order gives the derived ordering chronological
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CfDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        CfDate { year, month, day }
    }
}

impl fmt::Display for CfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Ordered (date, value) series with one entry per source time step.
///
/// Invariants enforced at construction: dates and values have equal length,
/// and dates are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries1D {
    dates: Vec<CfDate>,
    values: Vec<f64>,
}

impl TimeSeries1D {
    pub fn new(dates: Vec<CfDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(PipelineError::ShapeError {
                source_name: "<series>".to_string(),
                detail: format!(
                    "series has {} dates but {} values",
                    dates.len(),
                    values.len()
                ),
            });
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PipelineError::SegmentsOutOfOrder {
                detail: format!("date {} is not before {}", w[0], w[1]),
            });
        }
        Ok(TimeSeries1D { dates, values })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[CfDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (CfDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// One (year, mean) entry of an [`AnnualSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualPoint {
    pub year: i32,
    pub mean: f64,
}

/// Ascending per-year means, one entry per distinct year of the input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSeries {
    points: Vec<AnnualPoint>,
}

impl AnnualSeries {
    /// Builds from (year, mean) pairs already in ascending year order.
    pub(crate) fn from_points(points: Vec<AnnualPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].year < w[1].year));
        AnnualSeries { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[AnnualPoint] {
        &self.points
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.year)
    }

    pub fn means(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.mean)
    }

    /// Ordinary least-squares fit over (year, mean), for the trend overlay an
    /// external plotting layer draws on top of the annual series.
    ///
    /// Returns `None` for fewer than two points.
    pub fn linear_trend(&self) -> Option<TrendLine> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }

        let nf = n as f64;
        let mean_x = self.points.iter().map(|p| p.year as f64).sum::<f64>() / nf;
        let mean_y = self.points.iter().map(|p| p.mean).sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for p in &self.points {
            let dx = p.year as f64 - mean_x;
            sxx += dx * dx;
            sxy += dx * (p.mean - mean_y);
        }

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(TrendLine {
            slope_per_year: slope,
            intercept: mean_y - slope * mean_x,
        })
    }
}

/// Least-squares trend line through an [`AnnualSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    /// Change of the mean value per calendar year
    pub slope_per_year: f64,
    /// Value of the fit at year zero
    pub intercept: f64,
}

impl TrendLine {
    /// Evaluates the fitted line at a given year.
    pub fn at(&self, year: i32) -> f64 {
        self.intercept + self.slope_per_year * year as f64
    }
}
