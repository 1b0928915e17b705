//! NetCDF serialization of the two output layouts.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::dates;
use crate::error::Result;
use crate::grid::{FullGrid, PointListGrid};
use crate::parameters::DatasetIdentity;

/// On-disk sentinel standing in for NaN cells in full-grid output.
pub const FILL_VALUE: f32 = 99999.9;

/// Physical units for a variable code: millimetres for rainfall, kelvin for
/// the temperature predictands.
fn units_for(var_code: &str) -> &'static str {
    match var_code {
        "rr" | "rain" => "mm",
        _ => "K",
    }
}

/// Data variable name and long_name for an output file: the identity's
/// archive code when one is given, else the caller's fallback name.
fn data_var_names<'a>(
    identity: Option<&'a DatasetIdentity>,
    fallback: &'a str,
) -> (&'a str, &'a str) {
    match identity {
        Some(id) => (id.var_code(), id.predictand.as_str()),
        None => (fallback, fallback),
    }
}

fn add_global_attrs(
    file: &mut netcdf::FileMut,
    identity: Option<&DatasetIdentity>,
) -> Result<()> {
    let title = match identity {
        Some(id) => format!("Daily gridded climate series ({})", id),
        None => "Daily gridded climate series".to_string(),
    };
    file.add_attribute("title", title.as_str())?;
    file.add_attribute("source", "Statistical Downscaling Model")?;
    file.add_attribute(
        "history",
        format!("Generated on {}", Utc::now().format("%Y-%m-%d")).as_str(),
    )?;
    Ok(())
}

/// Write a point-list grid: unlimited `dates` dimension, fixed `gpnames`
/// dimension, and one data variable named after the predictand's archive
/// code.
pub fn write_point_list(
    path: &Path,
    grid: &PointListGrid,
    varname: &str,
    identity: Option<&DatasetIdentity>,
) -> Result<()> {
    let ndates = grid.dates.len();
    let npoints = grid.gpnames.len();
    info!(path = %path.display(), ndates, npoints, "writing point-list file");

    let mut file = netcdf::create(path)?;
    add_global_attrs(&mut file, identity)?;

    file.add_unlimited_dimension("dates")?;
    file.add_dimension("gpnames", npoints)?;

    {
        let mut var = file.add_variable::<i32>("dates", &["dates"])?;
        var.put_attribute("units", "day")?;
        var.put_attribute("long_name", "[Y]YYMMDD")?;
        let values: Vec<i32> = grid.dates.to_vec();
        var.put_values(&values, 0..ndates)?;
    }

    {
        let mut var = file.add_variable::<i64>("gpnames", &["gpnames"])?;
        var.put_attribute("units", "LLLLLTTTT")?;
        var.put_attribute(
            "long_name",
            "First 5 digits are longitude and last 4 digits are latitude",
        )?;
        let values: Vec<i64> = grid.gpnames.to_vec();
        var.put_values(&values, ..)?;
    }

    {
        let (var_code, long_name) = data_var_names(identity, varname);
        let mut var = file.add_variable::<f32>(var_code, &["dates", "gpnames"])?;
        var.put_attribute("units", units_for(var_code))?;
        var.put_attribute("long_name", long_name)?;
        let values: Vec<f32> = grid.data.iter().copied().collect();
        var.put_values(&values, (0..ndates, 0..npoints))?;
    }

    Ok(())
}

/// Write a full-grid cube: unlimited `time` dimension expressed as days
/// since the 1899-12-31 epoch, fixed `lat`/`lon` dimensions, and a data
/// variable whose NaN cells are stored as the [`FILL_VALUE`] sentinel.
pub fn write_full_grid(
    path: &Path,
    grid: &FullGrid,
    varname: &str,
    identity: Option<&DatasetIdentity>,
) -> Result<()> {
    let ntime = grid.dates.len();
    let (nlat, nlon) = (grid.lat.len(), grid.lon.len());
    info!(path = %path.display(), ntime, nlat, nlon, "writing full-grid file");

    // Fail on a calendar-invalid date before the file is touched
    let time_offsets: Vec<f32> = grid
        .dates
        .iter()
        .map(|&code| dates::days_since_epoch(code).map(|d| d as f32))
        .collect::<Result<_>>()?;

    let mut file = netcdf::create(path)?;
    add_global_attrs(&mut file, identity)?;

    file.add_unlimited_dimension("time")?;
    file.add_dimension("lat", nlat)?;
    file.add_dimension("lon", nlon)?;

    {
        let mut var = file.add_variable::<f32>("time", &["time"])?;
        var.put_attribute("units", format!("days since {} 00:00:00", dates::TIME_EPOCH).as_str())?;
        var.put_attribute("calendar", "standard")?;
        var.put_values(&time_offsets, 0..ntime)?;
    }

    {
        let mut var = file.add_variable::<f32>("lat", &["lat"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_attribute("long_name", "latitude")?;
        var.put_attribute("standard_name", "latitude")?;
        let values: Vec<f32> = grid.lat.to_vec();
        var.put_values(&values, ..)?;
    }

    {
        let mut var = file.add_variable::<f32>("lon", &["lon"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_attribute("long_name", "longitude")?;
        var.put_attribute("standard_name", "longitude")?;
        let values: Vec<f32> = grid.lon.to_vec();
        var.put_values(&values, ..)?;
    }

    {
        let (var_code, long_name) = data_var_names(identity, varname);
        let mut var = file.add_variable::<f32>(var_code, &["time", "lat", "lon"])?;
        var.put_attribute("units", units_for(var_code))?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("missing_value", FILL_VALUE)?;
        var.put_attribute("_FillValue", FILL_VALUE)?;

        let values: Vec<f32> = grid
            .data
            .iter()
            .map(|&v| if v.is_nan() { FILL_VALUE } else { v })
            .collect();
        var.put_values(&values, (0..ntime, 0..nlat, 0..nlon))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_for() {
        assert_eq!(units_for("rr"), "mm");
        assert_eq!(units_for("rain"), "mm");
        assert_eq!(units_for("tmax"), "K");
    }

    #[test]
    fn test_data_var_names() {
        let id = DatasetIdentity::new("NNR", "", "sea", "1", "rain");
        assert_eq!(data_var_names(Some(&id), "unknown"), ("rr", "rain"));
        assert_eq!(data_var_names(None, "tmax"), ("tmax", "tmax"));
    }
}
