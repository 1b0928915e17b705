//! Readers for the month-chunked daily archive and for previously written
//! point-list files.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};
use tracing::debug;

use crate::error::{Result, SdmError};
use crate::grid::PointListGrid;

/// On-disk variable code for a predictand name. Rainfall lives in the
/// archive under the short code `rr`; everything else is stored under its
/// own name. Kept as an explicit lookup so further remappings slot in here.
pub fn archive_var_code(var_name: &str) -> &str {
    match var_name {
        "rain" | "rr" => "rr",
        other => other,
    }
}

/// Directory/file component for a predictand. The calibrated rainfall
/// archive carries a `_calib` suffix.
fn archive_file_code(var_name: &str) -> String {
    match archive_var_code(var_name) {
        "rr" => "rr_calib".to_string(),
        other => other.to_string(),
    }
}

/// Source of one month of daily grids for a variable.
///
/// One call reads exactly one archive file and no cache is kept across
/// calls; de-duplicating repeated month requests is the extraction loop's
/// job.
pub trait MonthReader {
    /// Full daily slab (day, lat, lon) for the variable in `year`/`month`,
    /// with the archive's missing-value sentinel replaced by NaN.
    fn read_month(&self, var_name: &str, year: i32, month: u32) -> Result<Array3<f32>>;
}

/// Reads the gridded daily observation archive, chunked one file per
/// variable and month.
#[derive(Debug, Clone)]
pub struct DailyArchiveReader {
    base_dir: PathBuf,
    resolution: String,
}

impl DailyArchiveReader {
    /// Reader over the default 0.05-degree archive.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_resolution(base_dir, "0.05")
    }

    pub fn with_resolution(base_dir: impl Into<PathBuf>, resolution: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            resolution: resolution.into(),
        }
    }

    /// Path of the archive file covering one variable and month:
    /// `base/daily_<res>/<code>/<code>_daily_<res>.<YYYY><MM>.nc`.
    pub fn archive_path(&self, var_name: &str, year: i32, month: u32) -> PathBuf {
        let file_code = archive_file_code(var_name);
        self.base_dir
            .join(format!("daily_{}", self.resolution))
            .join(&file_code)
            .join(format!(
                "{}_daily_{}.{:04}{:02}.nc",
                file_code, self.resolution, year, month
            ))
    }
}

impl MonthReader for DailyArchiveReader {
    fn read_month(&self, var_name: &str, year: i32, month: u32) -> Result<Array3<f32>> {
        let path = self.archive_path(var_name, year, month);
        if !path.exists() {
            return Err(SdmError::NotFound {
                what: "archive file",
                path,
            });
        }

        debug!(path = %path.display(), "reading archive file");
        let file = netcdf::open(&path)?;

        let var_code = archive_var_code(var_name);
        let var = file.variable(var_code).ok_or_else(|| SdmError::Schema {
            name: var_code.to_string(),
            path: path.clone(),
        })?;

        let dims = var.dimensions();
        if dims.len() != 3 {
            return Err(SdmError::ShapeMismatch(format!(
                "variable '{}' in {} has {} dimensions, expected 3",
                var_code,
                path.display(),
                dims.len()
            )));
        }
        let shape = (dims[0].len(), dims[1].len(), dims[2].len());

        let raw: Vec<f32> = var.get_values(..)?;
        let missing = attr_f32(&var, "missing_value").or_else(|| attr_f32(&var, "_FillValue"));

        let mut data = Array3::from_shape_vec(shape, raw).map_err(|_| {
            SdmError::ShapeMismatch(format!(
                "variable '{}' in {} does not fill its declared shape",
                var_code,
                path.display()
            ))
        })?;

        if let Some(sentinel) = missing {
            data.mapv_inplace(|v| if v == sentinel { f32::NAN } else { v });
        }

        // `file` drops here, releasing the handle before the slab is
        // handed back
        Ok(data)
    }
}

fn attr_f32(var: &netcdf::Variable, name: &str) -> Option<f32> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Float(f) => Some(f),
            netcdf::AttributeValue::Double(d) => Some(d as f32),
            netcdf::AttributeValue::Int(i) => Some(i as f32),
            netcdf::AttributeValue::Short(s) => Some(s as f32),
            _ => None,
        })
}

/// Load a previously written point-list file back into memory.
///
/// The data variable is found by elimination: the one variable that is
/// neither `dates` nor `gpnames`.
pub fn read_point_list(path: &Path) -> Result<PointListGrid> {
    if !path.exists() {
        return Err(SdmError::NotFound {
            what: "point-list file",
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "reading point-list file");
    let file = netcdf::open(path)?;

    let dates_var = file.variable("dates").ok_or_else(|| SdmError::Schema {
        name: "dates".to_string(),
        path: path.to_path_buf(),
    })?;
    let dates: Vec<i32> = dates_var.get_values(..)?;

    let gpnames_var = file.variable("gpnames").ok_or_else(|| SdmError::Schema {
        name: "gpnames".to_string(),
        path: path.to_path_buf(),
    })?;
    let gpnames: Vec<i64> = gpnames_var.get_values(..)?;

    let data_var = file
        .variables()
        .find(|v| v.name() != "dates" && v.name() != "gpnames")
        .ok_or_else(|| SdmError::Schema {
            name: "<data variable>".to_string(),
            path: path.to_path_buf(),
        })?;
    let raw: Vec<f32> = data_var.get_values(..)?;

    let data = Array2::from_shape_vec((dates.len(), gpnames.len()), raw).map_err(|_| {
        SdmError::ShapeMismatch(format!(
            "data variable in {} does not fill a {}x{} matrix",
            path.display(),
            dates.len(),
            gpnames.len()
        ))
    })?;

    PointListGrid::new(data, Array1::from(dates), Array1::from(gpnames))
}
