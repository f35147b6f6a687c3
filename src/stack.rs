//! Stitching per-file fields into one continuous record.
//!
//! Model output for a long experiment arrives as several NetCDF files covering
//! disjoint time spans. [`concatenate`] stacks their variable arrays along the
//! time axis in the caller-supplied order, after validating that the spatial
//! grids agree and that the segments really are in chronological order. It
//! never reorders: caller order is the contract, disorder is an error.

use ndarray::{Array3, Axis};

use crate::errors::{PipelineError, Result};
use crate::reader::GridAxis;
use crate::series::CfDate;

/// Dense 3-D field indexed `[time, lat, lon]`, plus the sentinel fill value
/// marking missing cells. Owned by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Field3D {
    data: Array3<f64>,
    fill_value: Option<f64>,
}

impl Field3D {
    pub fn new(data: Array3<f64>, fill_value: Option<f64>) -> Self {
        Field3D { data, fill_value }
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.fill_value
    }

    pub fn n_time(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn n_lat(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn n_lon(&self) -> usize {
        self.data.shape()[2]
    }

    /// Whether a cell value counts as missing: equal to the declared fill
    /// value, or not finite.
    pub fn is_missing(&self, value: f64) -> bool {
        if !value.is_finite() {
            return true;
        }
        match self.fill_value {
            Some(fill) => value == fill,
            None => false,
        }
    }
}

/// One source file's contribution to the stitched record: its field, its
/// normalized dates, its spatial axes, and the locator used in error reports.
#[derive(Debug, Clone)]
pub struct Segment {
    pub locator: String,
    pub field: Field3D,
    pub dates: Vec<CfDate>,
    pub lon_axis: GridAxis,
    pub lat_axis: GridAxis,
}

impl Segment {
    /// Validates the segment's own shape: dates per time step, axes matching
    /// the field's spatial extents, and dates strictly increasing within the
    /// segment.
    fn validate(&self) -> Result<()> {
        if self.dates.len() != self.field.n_time() {
            return Err(PipelineError::ShapeError {
                source_name: self.locator.clone(),
                detail: format!(
                    "{} time steps but {} dates",
                    self.field.n_time(),
                    self.dates.len()
                ),
            });
        }
        if self.lat_axis.len() != self.field.n_lat() || self.lon_axis.len() != self.field.n_lon() {
            return Err(PipelineError::ShapeError {
                source_name: self.locator.clone(),
                detail: format!(
                    "field is {} lat x {} lon but axes are {} lat x {} lon",
                    self.field.n_lat(),
                    self.field.n_lon(),
                    self.lat_axis.len(),
                    self.lon_axis.len()
                ),
            });
        }
        if let Some(w) = self.dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PipelineError::SegmentsOutOfOrder {
                detail: format!(
                    "within '{}': date {} is not before {}",
                    self.locator, w[0], w[1]
                ),
            });
        }
        Ok(())
    }
}

/// Stacks segments along the time axis into one continuous field and date
/// sequence.
///
/// Preconditions checked here: every segment shares the first segment's
/// lat/lon axis lengths (`AxisMismatch` otherwise), every segment is
/// internally consistent (`ShapeError`), and consecutive segments do not
/// overlap or run backwards in time (`SegmentsOutOfOrder`). No partial
/// success: the first violation fails the whole call.
pub fn concatenate(segments: Vec<Segment>) -> Result<(Field3D, Vec<CfDate>)> {
    let mut segments = segments;
    let first = match segments.first() {
        Some(first) => first,
        None => {
            return Err(PipelineError::ShapeError {
                source_name: "<none>".to_string(),
                detail: "no sources to concatenate".to_string(),
            });
        }
    };

    let (n_lat, n_lon) = (first.field.n_lat(), first.field.n_lon());
    let reference = first.locator.clone();
    let fill_value = first.field.fill_value();

    for segment in &segments {
        segment.validate()?;

        if segment.field.n_lat() != n_lat {
            return Err(PipelineError::AxisMismatch {
                axis: "latitude".to_string(),
                expected: n_lat,
                got: segment.field.n_lat(),
                reference: reference.clone(),
                source_name: segment.locator.clone(),
            });
        }
        if segment.field.n_lon() != n_lon {
            return Err(PipelineError::AxisMismatch {
                axis: "longitude".to_string(),
                expected: n_lon,
                got: segment.field.n_lon(),
                reference: reference.clone(),
                source_name: segment.locator.clone(),
            });
        }
    }

    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        match (prev.dates.last(), next.dates.first()) {
            (Some(&last), Some(&first)) if last >= first => {
                return Err(PipelineError::SegmentsOutOfOrder {
                    detail: format!(
                        "'{}' ends at {} but '{}' starts at {}",
                        prev.locator, last, next.locator, first
                    ),
                });
            }
            _ => {}
        }
    }

    // A later segment may declare a different fill sentinel; remap its missing
    // cells to the first segment's sentinel so the stitched field has one.
    for segment in segments.iter_mut().skip(1) {
        if segment.field.fill_value() != fill_value {
            remap_fill(&mut segment.field, fill_value);
        }
    }

    let total_steps: usize = segments.iter().map(|s| s.field.n_time()).sum();
    log::debug!(
        "stitching {} segments into {} time steps",
        segments.len(),
        total_steps
    );

    let views: Vec<_> = segments.iter().map(|s| s.field.data().view()).collect();
    let stacked =
        ndarray::concatenate(Axis(0), &views).map_err(|e| PipelineError::ShapeError {
            source_name: reference.clone(),
            detail: e.to_string(),
        })?;

    let dates: Vec<CfDate> = segments.iter().flat_map(|s| s.dates.iter().copied()).collect();

    Ok((Field3D::new(stacked, fill_value), dates))
}

fn remap_fill(field: &mut Field3D, target: Option<f64>) {
    let old = field.fill_value;
    let replacement = target.unwrap_or(f64::NAN);
    if let Some(old_fill) = old {
        field.data.mapv_inplace(|v| if v == old_fill { replacement } else { v });
    }
    field.fill_value = target;
}
