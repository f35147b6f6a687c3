//! Annual aggregation of the monthly regional series.

use std::collections::BTreeMap;

use crate::series::{AnnualPoint, AnnualSeries, TimeSeries1D};

/// Groups the series by the calendar-year component of each date and averages
/// each group.
///
/// Partial years (a series starting in July, say) are averaged over however
/// many samples exist, not forced to twelve. Years come out ascending with
/// exactly one entry per distinct year; no interpolation or gap filling is
/// performed, so a missing year is simply absent.
pub fn resample_annual(series: &TimeSeries1D) -> AnnualSeries {
    let mut groups: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

    for (date, value) in series.iter() {
        let entry = groups.entry(date.year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let points = groups
        .into_iter()
        .map(|(year, (sum, count))| AnnualPoint {
            year,
            mean: sum / count as f64,
        })
        .collect();

    AnnualSeries::from_points(points)
}
