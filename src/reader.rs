//! Reading coordinate axes, variables, and time encodings from one source.
//!
//! [`GridSource`] owns both the open NetCDF handle and the staging guard of
//! its locator, so remote temp copies and the file handle are released
//! together on every exit path.

use ndarray::Array3;
use netcdf::AttributeValue;

use crate::calendar::TimeEncoding;
use crate::errors::{PipelineError, Result};
use crate::stack::Field3D;
use crate::storage::StagedSource;

/// Named, ordered 1-D coordinate axis (longitude or latitude). Immutable once
/// read.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    name: String,
    values: Vec<f64>,
}

impl GridAxis {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    #[cfg(test)]
    pub fn from_values(name: &str, values: Vec<f64>) -> Self {
        GridAxis {
            name: name.to_string(),
            values,
        }
    }
}

/// Scalar metadata declared on a variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMeta {
    pub units: Option<String>,
    pub long_name: Option<String>,
    pub fill_value: Option<f64>,
}

/// One open gridded-data source
pub struct GridSource {
    file: netcdf::File,
    staged: StagedSource,
}

impl GridSource {
    /// Opens a staged source, failing with `SourceUnavailable` if the local
    /// copy cannot be opened as NetCDF.
    pub fn open(staged: StagedSource) -> Result<Self> {
        let file = netcdf::open(staged.local_path())
            .map_err(|e| PipelineError::unavailable(staged.locator(), e))?;
        Ok(GridSource { file, staged })
    }

    /// The locator this source was opened from, verbatim.
    pub fn locator(&self) -> &str {
        self.staged.locator()
    }

    /// Reads a named 1-D coordinate axis.
    pub fn read_axis(&self, name: &str) -> Result<GridAxis> {
        let var = self.variable(name)?;
        let values = var.get_values::<f64, _>(..)?;
        if values.is_empty() {
            return Err(PipelineError::ShapeError {
                source_name: self.locator().to_string(),
                detail: format!("coordinate axis '{name}' is empty"),
            });
        }
        Ok(GridAxis {
            name: name.to_string(),
            values,
        })
    }

    /// Reads a named 3-D variable as a `[time, lat, lon]` field together with
    /// its declared metadata.
    ///
    /// The variable's dimensions must be exactly (time, lat, lon) in that
    /// order; anything else is a `ShapeError`, not something to silently
    /// transpose.
    pub fn read_variable(
        &self,
        name: &str,
        time_name: &str,
        lat_name: &str,
        lon_name: &str,
    ) -> Result<(Field3D, VariableMeta)> {
        let var = self.variable(name)?;

        let dim_names: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let expected = [time_name, lat_name, lon_name];
        if dim_names != expected {
            return Err(PipelineError::ShapeError {
                source_name: self.locator().to_string(),
                detail: format!(
                    "variable '{name}' has dimensions {dim_names:?}, expected {expected:?}"
                ),
            });
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values = var.get_values::<f64, _>(..)?;
        let data = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values).map_err(|e| {
            PipelineError::ShapeError {
                source_name: self.locator().to_string(),
                detail: e.to_string(),
            }
        })?;

        let meta = VariableMeta {
            units: self.string_attribute(&var, "units"),
            long_name: self.string_attribute(&var, "long_name"),
            fill_value: self.fill_value(&var),
        };

        Ok((Field3D::new(data, meta.fill_value), meta))
    }

    /// Reads the raw time offsets plus the encoding declared by the time
    /// variable's `units` and optional `calendar` attributes.
    pub fn read_time(&self, name: &str) -> Result<(Vec<f64>, TimeEncoding)> {
        let var = self.variable(name)?;
        let offsets = var.get_values::<f64, _>(..)?;

        let units = self.string_attribute(&var, "units").ok_or_else(|| {
            PipelineError::MalformedTimeUnits {
                units: "<missing>".to_string(),
                source_name: self.locator().to_string(),
                reason: format!("time variable '{name}' has no 'units' attribute"),
            }
        })?;
        let calendar = self.string_attribute(&var, "calendar");

        let encoding = TimeEncoding::parse(&units, calendar.as_deref(), self.locator())?;
        Ok((offsets, encoding))
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| PipelineError::VariableNotFound {
                var: name.to_string(),
                source_name: self.locator().to_string(),
            })
    }

    fn string_attribute(&self, var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
        var.attribute(name)
            .and_then(|attr| match attr.value().ok()? {
                AttributeValue::Str(s) => Some(s),
                _ => None,
            })
    }

    /// Extracts `_FillValue` (or the older `missing_value`) as f64, whatever
    /// numeric width it was declared with.
    fn fill_value(&self, var: &netcdf::Variable<'_>) -> Option<f64> {
        for attr_name in ["_FillValue", "missing_value"] {
            let value = var
                .attribute(attr_name)
                .and_then(|attr| match attr.value().ok()? {
                    AttributeValue::Double(v) => Some(v),
                    AttributeValue::Float(v) => Some(v as f64),
                    AttributeValue::Int(v) => Some(v as f64),
                    AttributeValue::Short(v) => Some(v as f64),
                    _ => None,
                });
            if value.is_some() {
                return value;
            }
        }
        None
    }
}
