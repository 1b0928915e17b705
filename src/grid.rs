//! The two interchangeable layouts of extracted data and the lossless
//! conversions between them.
//!
//! A [`PointListGrid`] carries one column per active mask point; a
//! [`FullGrid`] carries the whole lat/lon box with inactive cells set to
//! NaN. Built from the same mask and date vector the two hold exactly the
//! same information, and converting either way allocates a fresh value.

use ndarray::{Array1, Array2, Array3};

use crate::error::{Result, SdmError};
use crate::mask::SpatialMask;

/// Data indexed by (date, active grid point).
#[derive(Debug, Clone, PartialEq)]
pub struct PointListGrid {
    /// Matrix of shape (dates, points).
    pub data: Array2<f32>,
    /// Compact date code per row.
    pub dates: Array1<i32>,
    /// Packed location identifier per column.
    pub gpnames: Array1<i64>,
}

impl PointListGrid {
    /// Assemble a point-list grid, checking the index-alignment invariants.
    pub fn new(data: Array2<f32>, dates: Array1<i32>, gpnames: Array1<i64>) -> Result<Self> {
        if data.nrows() != dates.len() || data.ncols() != gpnames.len() {
            return Err(SdmError::ShapeMismatch(format!(
                "data is {}x{} but dates/gpnames are {}/{}",
                data.nrows(),
                data.ncols(),
                dates.len(),
                gpnames.len()
            )));
        }
        Ok(Self {
            data,
            dates,
            gpnames,
        })
    }

    /// Scatter the point columns into the full lat/lon box of `mask`,
    /// filling every inactive cell with NaN.
    ///
    /// The mask must be the one the grid was built against (or its crop):
    /// its active-point count has to match the column count.
    pub fn to_full_grid(&self, mask: &SpatialMask) -> Result<FullGrid> {
        if mask.active_len() != self.gpnames.len() {
            return Err(SdmError::ShapeMismatch(format!(
                "grid has {} point columns but mask has {} active cells",
                self.gpnames.len(),
                mask.active_len()
            )));
        }

        let (nlat, nlon) = mask.shape();
        let ntime = self.dates.len();
        let mut cube = Array3::from_elem((ntime, nlat, nlon), f32::NAN);

        for (point, &(row, col)) in mask.active_cells().iter().enumerate() {
            for t in 0..ntime {
                cube[[t, row, col]] = self.data[[t, point]];
            }
        }

        Ok(FullGrid {
            data: cube,
            dates: self.dates.clone(),
            lat: mask.lat().clone(),
            lon: mask.lon().clone(),
        })
    }
}

/// Data indexed by (date, latitude, longitude), inactive cells NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct FullGrid {
    /// Cube of shape (dates, lat, lon).
    pub data: Array3<f32>,
    /// Compact date code per slab.
    pub dates: Array1<i32>,
    pub lat: Array1<f32>,
    pub lon: Array1<f32>,
}

impl FullGrid {
    /// Assemble a full grid, checking that the cube extent matches the
    /// coordinate vectors.
    pub fn new(
        data: Array3<f32>,
        dates: Array1<i32>,
        lat: Array1<f32>,
        lon: Array1<f32>,
    ) -> Result<Self> {
        let (nt, ny, nx) = data.dim();
        if nt != dates.len() || ny != lat.len() || nx != lon.len() {
            return Err(SdmError::ShapeMismatch(format!(
                "cube is {}x{}x{} but dates/lat/lon are {}/{}/{}",
                nt,
                ny,
                nx,
                dates.len(),
                lat.len(),
                lon.len()
            )));
        }
        Ok(Self {
            data,
            dates,
            lat,
            lon,
        })
    }

    /// Gather the active cells of `mask` back into a point-list matrix,
    /// inverting [`PointListGrid::to_full_grid`].
    pub fn to_point_list(&self, mask: &SpatialMask) -> Result<PointListGrid> {
        let (_, ny, nx) = self.data.dim();
        if (ny, nx) != mask.shape() {
            return Err(SdmError::ShapeMismatch(format!(
                "cube is {}x{} in space but mask is {}x{}",
                ny,
                nx,
                mask.shape().0,
                mask.shape().1
            )));
        }

        let ntime = self.dates.len();
        let mut data = Array2::from_elem((ntime, mask.active_len()), f32::NAN);

        for (point, &(row, col)) in mask.active_cells().iter().enumerate() {
            for t in 0..ntime {
                data[[t, point]] = self.data[[t, row, col]];
            }
        }

        Ok(PointListGrid {
            data,
            dates: self.dates.clone(),
            gpnames: Array1::from(mask.gpnames().to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_mask() -> SpatialMask {
        let data = array![[0.0, 1.0, 0.0], [1.0, 0.0, 1.0]];
        let lat = array![-30.0, -30.05];
        let lon = array![140.0, 140.05, 140.1];
        SpatialMask::new(data, lat, lon).unwrap()
    }

    fn sample_grid(mask: &SpatialMask) -> PointListGrid {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        PointListGrid::new(
            data,
            array![170101, 170102],
            Array1::from(mask.gpnames().to_vec()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_checks_alignment() {
        let err = PointListGrid::new(
            Array2::zeros((2, 3)),
            array![170101],
            Array1::from(vec![1i64, 2, 3]),
        )
        .unwrap_err();
        assert!(matches!(err, SdmError::ShapeMismatch(_)));
    }

    #[test]
    fn test_to_full_grid_scatters_and_fills() {
        let mask = sample_mask();
        let full = sample_grid(&mask).to_full_grid(&mask).unwrap();

        assert_eq!(full.data.dim(), (2, 2, 3));
        assert_eq!(full.data[[0, 0, 1]], 1.0);
        assert_eq!(full.data[[0, 1, 0]], 2.0);
        assert_eq!(full.data[[0, 1, 2]], 3.0);
        assert_eq!(full.data[[1, 0, 1]], 4.0);

        // Every inactive cell is NaN
        assert!(full.data[[0, 0, 0]].is_nan());
        assert!(full.data[[0, 0, 2]].is_nan());
        assert!(full.data[[1, 1, 1]].is_nan());
    }

    #[test]
    fn test_round_trip_exact() {
        let mask = sample_mask();
        let grid = sample_grid(&mask);
        let back = grid.to_full_grid(&mask).unwrap().to_point_list(&mask).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_round_trip_with_cropped_mask() {
        let mask = sample_mask();
        let cropped = mask.crop();
        let grid = sample_grid(&mask);
        let back = grid
            .to_full_grid(&cropped)
            .unwrap()
            .to_point_list(&cropped)
            .unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_missing_cell_survives_conversion() {
        // 3D -> 2D -> 3D must put NaN back at the inactive cell, never a
        // stale or zero value
        let mask = sample_mask();
        let full = sample_grid(&mask).to_full_grid(&mask).unwrap();
        let rebuilt = full
            .to_point_list(&mask)
            .unwrap()
            .to_full_grid(&mask)
            .unwrap();
        assert!(rebuilt.data[[0, 0, 0]].is_nan());
        assert_eq!(rebuilt.data[[0, 0, 1]], 1.0);
    }

    #[test]
    fn test_full_grid_new_checks_extent() {
        let err = FullGrid::new(
            Array3::zeros((1, 2, 2)),
            array![170101],
            array![-30.0],
            array![140.0, 140.05],
        )
        .unwrap_err();
        assert!(matches!(err, SdmError::ShapeMismatch(_)));
    }

    #[test]
    fn test_mask_mismatch_rejected() {
        let mask = sample_mask();
        let grid = PointListGrid::new(
            Array2::zeros((1, 2)),
            array![170101],
            Array1::from(vec![1i64, 2]),
        )
        .unwrap();
        assert!(matches!(
            grid.to_full_grid(&mask),
            Err(SdmError::ShapeMismatch(_))
        ));
    }
}
