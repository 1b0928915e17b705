//! Spatial masks selecting the active grid points of a region.

use std::path::{Path, PathBuf};

use ndarray::{s, Array1, Array2};
use tracing::debug;

use crate::error::{Result, SdmError};

/// Occupancy grid over a lat/lon box, with the derived index sets computed
/// once at construction.
///
/// Instances are immutable; `crop` returns a new mask instead of mutating.
/// Active-point gpnames are pairwise distinct for any real lat/lon grid,
/// since no two active cells share a coordinate pair.
#[derive(Debug, Clone)]
pub struct SpatialMask {
    data: Array2<f32>,
    lat: Array1<f32>,
    lon: Array1<f32>,
    /// (row, col) of each active cell, row-major order.
    active_cells: Vec<(usize, usize)>,
    /// Row-major flat index of each active cell.
    flat_indices: Vec<usize>,
    /// Packed location identifier of each active cell.
    gpnames: Vec<i64>,
}

impl SpatialMask {
    /// Build a mask from an occupancy grid (non-zero = active) and its
    /// coordinate vectors. Fails with `ShapeMismatch` when the grid extent
    /// disagrees with the coordinate lengths.
    pub fn new(data: Array2<f32>, lat: Array1<f32>, lon: Array1<f32>) -> Result<Self> {
        if data.nrows() != lat.len() || data.ncols() != lon.len() {
            return Err(SdmError::ShapeMismatch(format!(
                "mask grid is {}x{} but lat/lon are {}/{}",
                data.nrows(),
                data.ncols(),
                lat.len(),
                lon.len()
            )));
        }
        Ok(Self::from_parts(data, lat, lon))
    }

    /// Shape-checked by the caller; derives the cached index sets.
    fn from_parts(data: Array2<f32>, lat: Array1<f32>, lon: Array1<f32>) -> Self {
        let ncols = data.ncols();
        let mut active_cells = Vec::new();
        let mut flat_indices = Vec::new();
        let mut gpnames = Vec::new();

        for ((row, col), &value) in data.indexed_iter() {
            if value != 0.0 {
                active_cells.push((row, col));
                flat_indices.push(row * ncols + col);
                gpnames.push(gpname(lon[col], lat[row]));
            }
        }

        Self {
            data,
            lat,
            lon,
            active_cells,
            flat_indices,
            gpnames,
        }
    }

    /// The occupancy grid.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Latitude of each grid row.
    pub fn lat(&self) -> &Array1<f32> {
        &self.lat
    }

    /// Longitude of each grid column.
    pub fn lon(&self) -> &Array1<f32> {
        &self.lon
    }

    /// (rows, cols) extent of the grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    /// (row, col) coordinates of the active cells, row-major order.
    pub fn active_cells(&self) -> &[(usize, usize)] {
        &self.active_cells
    }

    /// Row-major flat index of each active cell, parallel to
    /// [`active_cells`](Self::active_cells).
    pub fn flat_indices(&self) -> &[usize] {
        &self.flat_indices
    }

    /// Packed location identifier per active cell, parallel to
    /// [`active_cells`](Self::active_cells).
    pub fn gpnames(&self) -> &[i64] {
        &self.gpnames
    }

    /// Number of active cells.
    pub fn active_len(&self) -> usize {
        self.active_cells.len()
    }

    /// New mask restricted to the tight bounding box of the active cells,
    /// both extremes inclusive. The active-point set is unchanged; only the
    /// enclosing extent shrinks, so cropping is idempotent. A mask with no
    /// active cells crops to itself.
    pub fn crop(&self) -> SpatialMask {
        if self.active_cells.is_empty() {
            return self.clone();
        }

        let rows = self.active_cells.iter().map(|&(r, _)| r);
        let cols = self.active_cells.iter().map(|&(_, c)| c);
        let row_min = rows.clone().min().unwrap_or(0);
        let row_max = rows.max().unwrap_or(0) + 1;
        let col_min = cols.clone().min().unwrap_or(0);
        let col_max = cols.max().unwrap_or(0) + 1;

        Self::from_parts(
            self.data.slice(s![row_min..row_max, col_min..col_max]).to_owned(),
            self.lat.slice(s![row_min..row_max]).to_owned(),
            self.lon.slice(s![col_min..col_max]).to_owned(),
        )
    }
}

/// Pack a grid point's coordinates into its integer identifier: longitude in
/// hundredths of a degree shifted four decimal digits left, plus latitude in
/// hundredths of a degree with the sign flipped so the (southern hemisphere)
/// latitudes come out positive.
pub fn gpname(lon: f32, lat: f32) -> i64 {
    let lon_part = (lon as f64 * 100.0).round() as i64;
    let lat_part = (lat as f64 * -100.0).round() as i64;
    lon_part * 10_000 + lat_part
}

/// Loads region masks stored as `mask_<region>.nc` below a base directory.
#[derive(Debug, Clone)]
pub struct MaskReader {
    base_dir: PathBuf,
}

impl MaskReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Full path of the mask file for a region name.
    pub fn mask_path(&self, region: &str) -> PathBuf {
        self.base_dir.join(format!("mask_{}.nc", region))
    }

    /// Load the mask for a region. Fails with `NotFound` when no mask file
    /// exists for the region and `Schema` when one of the `mask`, `lat` or
    /// `lon` variables is absent.
    pub fn read(&self, region: &str) -> Result<SpatialMask> {
        let path = self.mask_path(region);
        if !path.exists() {
            return Err(SdmError::NotFound {
                what: "mask file",
                path,
            });
        }

        debug!(path = %path.display(), "reading mask file");
        let file = netcdf::open(&path)?;

        let lat: Vec<f32> = read_1d(&file, "lat", &path)?;
        let lon: Vec<f32> = read_1d(&file, "lon", &path)?;
        let mask_var = file.variable("mask").ok_or_else(|| SdmError::Schema {
            name: "mask".to_string(),
            path: path.clone(),
        })?;
        let raw: Vec<f32> = mask_var.get_values(..)?;

        let data = Array2::from_shape_vec((lat.len(), lon.len()), raw).map_err(|_| {
            SdmError::ShapeMismatch(format!(
                "mask variable in {} does not fill a {}x{} grid",
                path.display(),
                lat.len(),
                lon.len()
            ))
        })?;

        SpatialMask::new(data, Array1::from(lat), Array1::from(lon))
    }
}

fn read_1d(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<f32>> {
    let var = file.variable(name).ok_or_else(|| SdmError::Schema {
        name: name.to_string(),
        path: path.to_path_buf(),
    })?;
    Ok(var.get_values(..)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashSet;

    fn sample_mask() -> SpatialMask {
        // 3x4 grid with three active cells spread over rows 0..=1, cols 1..=3
        let data = array![
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 0.0],
        ];
        let lat = array![-30.0, -30.05, -30.1];
        let lon = array![140.0, 140.05, 140.1, 140.15];
        SpatialMask::new(data, lat, lon).unwrap()
    }

    #[test]
    fn test_active_cells_and_flat_indices() {
        let mask = sample_mask();
        assert_eq!(mask.active_cells(), &[(0, 1), (1, 2), (1, 3)]);
        assert_eq!(mask.flat_indices(), &[1, 6, 7]);
        assert_eq!(mask.active_len(), 3);
    }

    #[test]
    fn test_gpname_packing() {
        // lon 140.0, lat -30.0: 14000 * 10000 + 3000
        assert_eq!(gpname(140.0, -30.0), 140_003_000);
        assert_eq!(gpname(140.05, -30.05), 140_053_005);
    }

    #[test]
    fn test_gpnames_unique() {
        let mask = sample_mask();
        let unique: HashSet<i64> = mask.gpnames().iter().copied().collect();
        assert_eq!(unique.len(), mask.active_len());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let data = Array2::zeros((2, 2));
        let err = SpatialMask::new(data, array![-30.0], array![140.0, 140.05]).unwrap_err();
        assert!(matches!(err, SdmError::ShapeMismatch(_)));
    }

    #[test]
    fn test_crop_tight_bounds() {
        let cropped = sample_mask().crop();
        assert_eq!(cropped.shape(), (2, 3));
        assert_eq!(cropped.lat().to_vec(), vec![-30.0, -30.05]);
        assert_eq!(cropped.lon().to_vec(), vec![140.05, 140.1, 140.15]);
        assert_eq!(cropped.active_cells(), &[(0, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_crop_preserves_active_points() {
        let mask = sample_mask();
        let cropped = mask.crop();
        assert_eq!(cropped.active_len(), mask.active_len());
        assert_eq!(cropped.gpnames(), mask.gpnames());
    }

    #[test]
    fn test_crop_idempotent() {
        let once = sample_mask().crop();
        let twice = once.crop();
        assert_eq!(once.shape(), twice.shape());
        assert_eq!(once.active_cells(), twice.active_cells());
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_crop_empty_mask() {
        let mask =
            SpatialMask::new(Array2::zeros((2, 2)), array![-30.0, -30.05], array![140.0, 140.05])
                .unwrap();
        let cropped = mask.crop();
        assert_eq!(cropped.shape(), (2, 2));
        assert_eq!(cropped.active_len(), 0);
    }

    #[test]
    fn test_missing_mask_file_is_not_found() {
        let reader = MaskReader::new("/no/such/dir");
        let err = reader.read("sea").unwrap_err();
        assert!(matches!(err, SdmError::NotFound { .. }));
    }
}
