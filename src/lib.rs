//! Gridded analog-date extraction for statistical downscaling.
//!
//! Given a CoD table pairing target dates with historical analog dates,
//! this crate pulls the analog days out of a month-chunked daily archive,
//! restricts them to a region mask, and serializes the result either as a
//! masked point list or as a full lat/lon cube.

pub mod cod;
pub mod config;
pub mod data_io;
pub mod dates;
pub mod error;
pub mod extractor;
pub mod grid;
pub mod mask;
pub mod parameters;

pub use error::{Result, SdmError};
