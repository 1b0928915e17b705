//! Orchestration: resolve an analog table into masked grid rows.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use tracing::{debug, info};

use crate::cod::CodStore;
use crate::data_io::reader::{DailyArchiveReader, MonthReader};
use crate::dates;
use crate::error::{Result, SdmError};
use crate::grid::{FullGrid, PointListGrid};
use crate::mask::{MaskReader, SpatialMask};
use crate::parameters::DatasetIdentity;

/// Ties the CoD store, mask reader and daily archive together into the
/// extraction pipeline.
#[derive(Debug, Clone)]
pub struct GriddedExtractor {
    cod: CodStore,
    masks: MaskReader,
    archive: DailyArchiveReader,
}

impl GriddedExtractor {
    pub fn new(cod: CodStore, masks: MaskReader, archive: DailyArchiveReader) -> Self {
        Self {
            cod,
            masks,
            archive,
        }
    }

    /// Extract the point-list grid for an identity: analog dates from the
    /// CoD store, active points from the region mask, daily values from the
    /// archive. Row `i` of the result belongs to analog record `i`, dated by
    /// its **result** date.
    pub fn extract(&self, identity: &DatasetIdentity, region: Option<&str>) -> Result<PointListGrid> {
        let cod = self.cod.read(identity)?;
        let mask = self.masks.read(region.unwrap_or(&identity.region))?;
        info!(
            identity = %identity,
            records = cod.len(),
            points = mask.active_len(),
            "extracting gridded data"
        );

        let data = read_analog_rows(&self.archive, identity.var_code(), &cod.source_dates, &mask)?;

        PointListGrid::new(
            data,
            Array1::from(cod.result_dates),
            Array1::from(mask.gpnames().to_vec()),
        )
    }

    /// Extract and convert to the full-grid cube over the cropped mask, so
    /// the output carries no unused border cells.
    pub fn extract_cube(&self, identity: &DatasetIdentity, region: Option<&str>) -> Result<FullGrid> {
        let cod = self.cod.read(identity)?;
        let mask = self.masks.read(region.unwrap_or(&identity.region))?;
        info!(
            identity = %identity,
            records = cod.len(),
            points = mask.active_len(),
            "extracting gridded data as cube"
        );

        let data = read_analog_rows(&self.archive, identity.var_code(), &cod.source_dates, &mask)?;
        let grid = PointListGrid::new(
            data,
            Array1::from(cod.result_dates),
            Array1::from(mask.gpnames().to_vec()),
        )?;

        grid.to_full_grid(&mask.crop())
    }
}

/// Assemble the (record, active point) matrix for a list of source dates.
///
/// Records are grouped by their `YYYYMM` key and each distinct month is
/// fetched from `reader` exactly once, however many records fall in it; the
/// archive is chunked by month and this keeps file opens at one per month
/// instead of one per date. Day-rows land at the row index of the record
/// that requested them, so the original CoD ordering is preserved.
pub fn read_analog_rows<R: MonthReader>(
    reader: &R,
    var_name: &str,
    source_dates: &[i32],
    mask: &SpatialMask,
) -> Result<Array2<f32>> {
    let parts: Vec<dates::DateParts> = source_dates.iter().map(|&c| dates::decompose(c)).collect();

    let mut by_month: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (record, part) in parts.iter().enumerate() {
        by_month.entry(part.year_month).or_default().push(record);
    }
    debug!(
        records = source_dates.len(),
        months = by_month.len(),
        "batching archive reads by month"
    );

    let mut out = Array2::from_elem((source_dates.len(), mask.active_len()), f32::NAN);

    for (&year_month, records) in &by_month {
        let (year, month) = (year_month / 100, (year_month % 100) as u32);
        let slab = reader.read_month(var_name, year, month)?;

        let (ndays, nlat, nlon) = slab.dim();
        if (nlat, nlon) != mask.shape() {
            return Err(SdmError::ShapeMismatch(format!(
                "archive month {} is {}x{} in space but mask is {}x{}",
                year_month,
                nlat,
                nlon,
                mask.shape().0,
                mask.shape().1
            )));
        }

        for &record in records {
            let day = parts[record].day as usize;
            if day == 0 || day > ndays {
                return Err(SdmError::ShapeMismatch(format!(
                    "source date {} asks for day {} of archive month {} holding {} days",
                    source_dates[record], day, year_month, ndays
                )));
            }

            for (point, &(row, col)) in mask.active_cells().iter().enumerate() {
                out[[record, point]] = slab[[day - 1, row, col]];
            }
        }
    }

    Ok(out)
}
