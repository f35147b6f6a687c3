use crate::input::JobConfig;
use crate::region::RegionSelection;
use crate::series::CfDate;
use std::time::Duration;

pub fn show_greeting(config_source: &str) {
    println!("=== NetCDF to Regional Series ===");
    println!("Loading configuration from: {}", config_source);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Variable: {}", config.variable_name);
    println!("  Sources ({}):", config.sources.len());
    for (i, source) in config.sources.iter().enumerate() {
        println!("    {}: {}", i + 1, source);
    }
    println!(
        "  Region: lat [{}, {}], lon [{}, {}] ({})",
        config.region.lat_min,
        config.region.lat_max,
        config.region.lon_min,
        config.region.lon_max,
        config.region.convention
    );
    println!("  Weighting: {:?}", config.weighting);
    if let Some(output) = &config.output {
        println!("  Output: {} ({:?})", output.series_key, output.kind);
    }
}

pub fn show_stitch_summary(n_segments: usize, n_steps: usize, first: CfDate, last: CfDate) {
    println!("\nStitched record:");
    println!("  Segments: {}", n_segments);
    println!("  Time steps: {}", n_steps);
    println!("  Span: {} .. {}", first, last);
}

pub fn show_selection_summary(selection: &RegionSelection) {
    println!(
        "\nRegion selection: {} lat x {} lon = {} cells",
        selection.lat_indices.len(),
        selection.lon_indices.len(),
        selection.n_cells()
    );
}

pub fn show_farewell_with_timing(elapsed: Duration, n_years: usize) {
    println!(
        "\n=== Produced {} annual means in {:.2?} ===",
        n_years, elapsed
    );
}
