//! CoD (corresponding-dates) analog tables.
//!
//! A CoD file pairs each result date with the historical analog date chosen
//! for it and the similarity distance of that pairing. The first line is a
//! header whose third token is the season marker; every following non-blank
//! line holds `<result_date> <analog_date> <distance>`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SdmError};
use crate::parameters::DatasetIdentity;

/// One season's analog-date table. The three sequences are index-aligned:
/// entry `i` of each refers to the same pairing. Read-only once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogDates {
    /// Season marker from the header line.
    pub season: String,
    /// Target dates of the downscaled series, as compact codes.
    pub result_dates: Vec<i32>,
    /// Historical dates whose grid values stand in for each result date.
    pub source_dates: Vec<i32>,
    /// Similarity distance of each pairing.
    pub distances: Vec<f64>,
}

impl AnalogDates {
    /// Number of analog pairings.
    pub fn len(&self) -> usize {
        self.result_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_dates.is_empty()
    }

    /// Parse a CoD table from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = lines
            .next()
            .transpose()?
            .ok_or_else(|| SdmError::Parse("empty CoD file".to_string()))?;
        let header_fields: Vec<&str> = header.split_whitespace().collect();
        if header_fields.len() != 3 {
            return Err(SdmError::Parse(format!(
                "header must have 3 fields, got {}",
                header_fields.len()
            )));
        }
        let season = header_fields[2].to_string();

        let mut result_dates = Vec::new();
        let mut source_dates = Vec::new();
        let mut distances = Vec::new();

        for (idx, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            // Header is line 1, so data lines start at 2
            let lineno = idx + 2;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(SdmError::Parse(format!(
                    "line {}: expected 3 fields, got {}",
                    lineno,
                    fields.len()
                )));
            }

            result_dates.push(parse_field(fields[0], lineno, "result date")?);
            source_dates.push(parse_field(fields[1], lineno, "analog date")?);
            distances.push(parse_field(fields[2], lineno, "distance")?);
        }

        Ok(Self {
            season,
            result_dates,
            source_dates,
            distances,
        })
    }

    /// Parse a CoD table from a file, failing with `NotFound` when the file
    /// does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SdmError::NotFound {
                what: "CoD file",
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "reading CoD file");
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, lineno: usize, what: &str) -> Result<T> {
    field.parse().map_err(|_| {
        SdmError::Parse(format!("line {}: invalid {}: '{}'", lineno, what, field))
    })
}

/// Resolves and loads CoD files below a base directory.
#[derive(Debug, Clone)]
pub struct CodStore {
    base_dir: PathBuf,
}

impl CodStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Full path of the CoD file for the given identity.
    pub fn cod_path(&self, identity: &DatasetIdentity) -> PathBuf {
        self.base_dir
            .join(identity.output_dir())
            .join(format!("rawfield_analog_{}", identity.season))
    }

    /// Locate and parse the CoD table for the given identity.
    pub fn read(&self, identity: &DatasetIdentity) -> Result<AnalogDates> {
        AnalogDates::from_file(&self.cod_path(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
rawfield analog DJF
170101 161231 0.5
170102 051217 1.25

170103 991231 0.75
";

    #[test]
    fn test_parse_sample() {
        let cod = AnalogDates::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(cod.season, "DJF");
        assert_eq!(cod.result_dates, vec![170101, 170102, 170103]);
        assert_eq!(cod.source_dates, vec![161231, 51217, 991231]);
        assert_eq!(cod.distances, vec![0.5, 1.25, 0.75]);
        assert_eq!(cod.len(), 3);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let cod = AnalogDates::from_reader(Cursor::new("x y 1\n\n\n170101 161231 0.5\n\n"))
            .unwrap();
        assert_eq!(cod.len(), 1);
    }

    #[test]
    fn test_short_line_rejected() {
        let err = AnalogDates::from_reader(Cursor::new("x y 1\n170101 161231\n")).unwrap_err();
        assert!(matches!(err, SdmError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_non_numeric_field_rejected() {
        let err =
            AnalogDates::from_reader(Cursor::new("x y 1\n170101 notadate 0.5\n")).unwrap_err();
        assert!(matches!(err, SdmError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_bad_header_rejected() {
        let err = AnalogDates::from_reader(Cursor::new("onlytwo fields\n")).unwrap_err();
        assert!(matches!(err, SdmError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = AnalogDates::from_file(Path::new("/no/such/cod")).unwrap_err();
        assert!(matches!(err, SdmError::NotFound { .. }), "got {:?}", err);
    }

    #[test]
    fn test_cod_path() {
        let store = CodStore::new("/data/cod");
        let id = DatasetIdentity::new("CCCMA", "rcp45", "sea", "1", "rain");
        assert_eq!(
            store.cod_path(&id),
            PathBuf::from("/data/cod/CCCMA_rcp45/sea/rain/season_1/rawfield_analog_1")
        );
    }
}
