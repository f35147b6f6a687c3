//! # Source Inspection Module
//!
//! Extracts and displays the structure of a NetCDF source (dimensions,
//! variables, attributes) plus the detected time encoding, which is usually
//! the first thing to check when a stitch misbehaves.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calendar::TimeEncoding;
use crate::storage::stage_source;

/// Information about a NetCDF dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Information about a NetCDF variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub attributes: HashMap<String, String>,
}

/// Detected time-axis encoding of a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeAxisInfo {
    pub variable: String,
    pub units: String,
    pub calendar: String,
    pub steps: usize,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Complete structural description of one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub locator: String,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub global_attributes: HashMap<String, String>,
    pub time_axis: Option<TimeAxisInfo>,
}

/// Opens a source (staging it from S3 when needed) and extracts its
/// structure.
///
/// When `variable` is given only that variable is described in detail;
/// `detailed` additionally collects every attribute instead of just names.
pub async fn get_source_info(
    locator: &str,
    variable: Option<&str>,
    detailed: bool,
    time_name: &str,
) -> Result<SourceInfo> {
    let staged = stage_source(locator)
        .await
        .with_context(|| format!("Failed to stage source: {locator}"))?;

    debug!("opening NetCDF source: {}", locator);
    let file = netcdf::open(staged.local_path())
        .with_context(|| format!("Failed to open NetCDF source: {locator}"))?;

    let mut dimensions = Vec::new();
    for dim in file.dimensions() {
        dimensions.push(DimensionInfo {
            name: dim.name().to_string(),
            length: dim.len(),
            is_unlimited: dim.is_unlimited(),
        });
    }

    let mut variables = Vec::new();
    for var in file.variables() {
        if let Some(wanted) = variable {
            if var.name() != wanted {
                continue;
            }
        }

        let mut attributes = HashMap::new();
        if detailed {
            for attr in var.attributes() {
                let value = attr
                    .value()
                    .map(|v| format!("{v:?}"))
                    .unwrap_or_else(|e| format!("<unreadable: {e}>"));
                attributes.insert(attr.name().to_string(), value);
            }
        }

        variables.push(VariableInfo {
            name: var.name().to_string(),
            data_type: format!("{:?}", var.vartype()).to_lowercase(),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            attributes,
        });
    }

    let mut global_attributes = HashMap::new();
    for attr in file.attributes() {
        let value = attr
            .value()
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|e| format!("<unreadable: {e}>"));
        global_attributes.insert(attr.name().to_string(), value);
    }

    let time_axis = describe_time_axis(&file, time_name, locator);

    Ok(SourceInfo {
        locator: locator.to_string(),
        dimensions,
        variables,
        global_attributes,
        time_axis,
    })
}

/// Best-effort description of the time axis; a source without a usable time
/// variable simply reports none.
fn describe_time_axis(file: &netcdf::File, time_name: &str, locator: &str) -> Option<TimeAxisInfo> {
    let var = file.variable(time_name)?;

    let units: String = var.attribute("units").and_then(|attr| {
        match attr.value().ok()? {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    })?;
    let calendar: Option<String> = var.attribute("calendar").and_then(|attr| {
        match attr.value().ok()? {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    });

    let offsets = var.get_values::<f64, _>(..).ok()?;

    let (start, end) = match TimeEncoding::parse(&units, calendar.as_deref(), locator) {
        Ok(encoding) => {
            let dates = crate::calendar::normalize(&offsets, &encoding, locator).ok();
            match dates {
                Some(dates) => (
                    dates.first().map(|d| d.to_string()),
                    dates.last().map(|d| d.to_string()),
                ),
                None => (None, None),
            }
        }
        Err(e) => {
            debug!("time axis of {} not normalizable: {}", locator, e);
            (None, None)
        }
    };

    Some(TimeAxisInfo {
        variable: time_name.to_string(),
        units,
        calendar: calendar.unwrap_or_else(|| "standard (implied)".to_string()),
        steps: offsets.len(),
        start,
        end,
    })
}

/// Renders the collected information for humans.
pub fn print_source_info(info: &SourceInfo) {
    println!("Source: {}", info.locator);

    println!("\nDimensions:");
    for dim in &info.dimensions {
        let length = if dim.is_unlimited {
            format!("{} (unlimited)", dim.length)
        } else {
            dim.length.to_string()
        };
        println!("  {}: {}", dim.name, length);
    }

    println!("\nVariables:");
    for var in &info.variables {
        println!(
            "  {} [{}]: ({})",
            var.name,
            var.data_type,
            var.dimensions.join(", ")
        );
        let mut names: Vec<_> = var.attributes.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in names {
            println!("    {} = {}", name, value);
        }
    }

    match &info.time_axis {
        Some(time) => {
            println!("\nTime axis ('{}'):", time.variable);
            println!("  units: {}", time.units);
            println!("  calendar: {}", time.calendar);
            println!("  steps: {}", time.steps);
            if let (Some(start), Some(end)) = (&time.start, &time.end) {
                println!("  span: {} .. {}", start, end);
            }
        }
        None => println!("\nTime axis: none detected"),
    }
}
