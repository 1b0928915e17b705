//! Identity of one extraction request and the path conventions derived
//! from it.

use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one extraction request: which model run, scenario, region and
/// predictand the analog table refers to. Immutable value; only used to
/// derive paths and output metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetIdentity {
    pub model: String,
    pub scenario: String,
    pub region_type: String,
    pub season: String,
    pub predictand: String,
    /// Region whose mask is applied; defaults to `region_type`.
    pub region: String,
}

impl DatasetIdentity {
    /// Build an identity with `region` defaulting to `region_type`.
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region_type: impl Into<String>,
        season: impl Into<String>,
        predictand: impl Into<String>,
    ) -> Self {
        let region_type = region_type.into();
        Self {
            model: model.into(),
            scenario: scenario.into(),
            region: region_type.clone(),
            region_type,
            season: season.into(),
            predictand: predictand.into(),
        }
    }

    /// Build an identity with an explicit mask region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Combined model/scenario directory component.
    ///
    /// Observational sources (`NNR`, `AWAP`) and validation or empty
    /// scenarios collapse to the bare model name; everything else is
    /// `model_scenario`.
    pub fn model_scenario(&self) -> String {
        if self.model == "NNR" || self.model == "AWAP" {
            return self.model.clone();
        }
        match self.scenario.as_str() {
            "" | "VALID" => self.model.clone(),
            scenario => format!("{}_{}", self.model, scenario),
        }
    }

    /// Directory holding this identity's analog table and outputs:
    /// `modsce/region_type/predictand/season_<season>`.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(self.model_scenario())
            .join(&self.region_type)
            .join(&self.predictand)
            .join(format!("season_{}", self.season))
    }

    /// Relative path of the downscaled point-list file for this identity.
    pub fn downscaled_file(&self) -> PathBuf {
        self.output_dir()
            .join(format!("ds_grid_data_{}.nc", self.season))
    }

    /// On-disk archive variable code for the predictand. Rainfall is stored
    /// under the short code `rr`; everything else keeps its own name.
    pub fn var_code(&self) -> &str {
        if self.predictand == "rain" {
            "rr"
        } else {
            &self.predictand
        }
    }

    /// Recover an identity from the path of a CoD file laid out as
    /// `.../{modsce}/{region_type}/{predictand}/season_{s}/rawfield_analog_{s}`.
    ///
    /// Returns `None` when the path does not have enough components or the
    /// file name is not of the `rawfield_analog_<season>` form.
    pub fn from_cod_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let mut parts = name.splitn(3, '_');
        let (_, _, season) = (parts.next()?, parts.next()?, parts.next()?);

        let season_dir = path.parent()?;
        let predictand = season_dir.parent()?.file_name()?.to_str()?;
        let region_type = season_dir.parent()?.parent()?.file_name()?.to_str()?;
        let modsce = season_dir
            .parent()?
            .parent()?
            .parent()?
            .file_name()?
            .to_str()?;

        let (model, scenario) = match modsce.split_once('_') {
            Some((m, s)) => (m, s),
            None => (modsce, ""),
        };

        Some(Self::new(model, scenario, region_type, season, predictand))
    }

    /// Recover an identity from the path of an output file living in a
    /// `season_<s>` directory, e.g.
    /// `.../{modsce}/{region_type}/{predictand}/season_{s}/ds_grid_data_{s}.nc`.
    pub fn from_output_path(path: &Path) -> Option<Self> {
        let season_dir = path.parent()?;
        let season = season_dir
            .file_name()?
            .to_str()?
            .strip_prefix("season_")?;

        let predictand = season_dir.parent()?.file_name()?.to_str()?;
        let region_type = season_dir.parent()?.parent()?.file_name()?.to_str()?;
        let modsce = season_dir
            .parent()?
            .parent()?
            .parent()?
            .file_name()?
            .to_str()?;

        let (model, scenario) = match modsce.split_once('_') {
            Some((m, s)) => (m, s),
            None => (modsce, ""),
        };

        Some(Self::new(model, scenario, region_type, season, predictand))
    }
}

impl fmt::Display for DatasetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.model, self.scenario, self.region_type, self.season, self.predictand
        )
    }
}
