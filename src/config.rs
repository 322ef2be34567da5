//! Configuration file parser for the cut study executables

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::BoxErr;
use crate::cuts::{TrackCuts, WeirdBand};

/// Half-open interval with optionally missing ends: `min <= x < max`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Bounds<T> {
    #[serde(default)]
    pub min: Option<T>,
    #[serde(default)]
    pub max: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self { Self { min: None, max: None } }
}

impl<T> Bounds<T> {
    pub fn none() -> Self { Self::default() }
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn contains(&self, x: T) -> bool {
        self.min.map_or(true, |lo| x >= lo) &&
        self.max.map_or(true, |hi| x <  hi)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {

    pub input: Input,

    /// HDF5 file all histograms are written to
    pub output: PathBuf,

    #[serde(default)]
    pub cuts: TrackCuts,

    #[serde(default)]
    pub weird: WeirdBand,

    #[serde(default)]
    pub scan: Scan,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Input {

    /// HDF5 file holding the track and truth tables
    pub file: PathBuf,

    /// Second input with pileup mixed in, analysed alongside the main file
    #[serde(default)]
    pub pileup_file: Option<PathBuf>,

    #[serde(default = "default_track_dataset")]
    pub track_dataset: String,

    #[serde(default = "default_truth_dataset")]
    pub truth_dataset: String,

    /// Which rows of the tables should be loaded
    #[serde(default)]
    pub events: Bounds<usize>,
}

fn default_track_dataset() -> String { "ntp_track" .into() }
fn default_truth_dataset() -> String { "ntp_gtrack".into() }

/// Delta-pt/pt thresholds for the rejection-factor scan
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scan {
    pub thresholds: Vec<f32>,
}

impl Default for Scan {
    fn default() -> Self {
        Self { thresholds: vec![0.5, 0.25, 0.10, 0.05, 0.03, 0.02, 0.01] }
    }
}

pub fn read_config_file(path: &PathBuf) -> BoxErr<Config> {
    let config = fs::read_to_string(path)
        .map_err(|e| format!("Couldn't read config file `{}`: {e}", path.display()))?;
    Ok(toml::from_str(&config)?)
}
