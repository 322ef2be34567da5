//! Track-quality selection: the configurable cuts and the weird-track band.

use serde::Deserialize;

use crate::Value;
use crate::config::Bounds;
use crate::io::hdf5::{TrackRow, TruthRow};

/// The track-quality cuts. Every field is optional; an absent field disables
/// the corresponding check, so an empty `TrackCuts` accepts every track.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TrackCuts {

    /// |vz| < max, in cm
    pub vz_abs_max: Option<Value>,

    /// Bounds on the transverse DCA
    pub dca_xy: Bounds<Value>,

    /// Bounds on the longitudinal DCA
    pub dca_z: Bounds<Value>,

    /// pt > min, in GeV/c
    pub pt_min: Option<Value>,

    /// quality < max
    pub quality_max: Option<Value>,

    /// nintt >= min
    pub nintt_min: Option<u32>,

    /// nlmaps > min
    pub nmvtx_min: Option<u32>,

    /// ntpc > min
    pub ntpc_min: Option<u32>,
}

impl TrackCuts {

    /// The selection used by the delta-pt studies.
    pub fn baseline() -> Self {
        Self {
            vz_abs_max:  Some(10.0),
            pt_min:      Some(0.1),
            quality_max: Some(10.0),
            nintt_min:   Some(1),
            nmvtx_min:   Some(2),
            ntpc_min:    Some(35),
            ..Self::default()
        }
    }

    /// Does the track pass every enabled cut?
    pub fn is_good(&self, trk: &TrackRow) -> bool {
        self.passes(&CutVars::from(trk))
    }

    /// Same selection applied to the matched-track block of a truth row.
    pub fn is_good_matched(&self, tru: &TruthRow) -> bool {
        self.passes(&CutVars::from(tru))
    }

    fn passes(&self, t: &CutVars) -> bool {
        let in_vz   = self.vz_abs_max .map_or(true, |max| t.vz.abs()  < max);
        let in_pt   = self.pt_min     .map_or(true, |min| t.pt        > min);
        let in_qual = self.quality_max.map_or(true, |max| t.quality   < max);
        let in_intt = self.nintt_min  .map_or(true, |min| t.nintt  >= min as Value);
        let in_mvtx = self.nmvtx_min  .map_or(true, |min| t.nlmaps >  min as Value);
        let in_tpc  = self.ntpc_min   .map_or(true, |min| t.ntpc   >  min as Value);
        let in_dxy  = self.dca_xy.contains(t.dca_xy);
        let in_dz   = self.dca_z .contains(t.dca_z);
        in_vz && in_pt && in_qual && in_intt && in_mvtx && in_tpc && in_dxy && in_dz
    }
}

/// The columns the cuts look at; the track and truth tables both provide them.
struct CutVars {
    vz: Value,
    pt: Value,
    quality: Value,
    nintt: Value,
    nlmaps: Value,
    ntpc: Value,
    dca_xy: Value,
    dca_z: Value,
}

impl From<&TrackRow> for CutVars {
    fn from(t: &TrackRow) -> Self {
        Self { vz: t.vz, pt: t.pt, quality: t.quality, nintt: t.nintt,
               nlmaps: t.nlmaps, ntpc: t.ntpc, dca_xy: t.dca3dxy, dca_z: t.dca3dz }
    }
}

impl From<&TruthRow> for CutVars {
    fn from(t: &TruthRow) -> Self {
        Self { vz: t.vz, pt: t.pt, quality: t.quality, nintt: t.nintt,
               nlmaps: t.nlmaps, ntpc: t.ntpc, dca_xy: t.dca3dxy, dca_z: t.dca3dz }
    }
}

/// The band of reco-pt/truth-pt ratios considered well-reconstructed. Tracks
/// whose ratio falls outside it are the "weird" tracks whose rejection the
/// cuts are tuned against.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeirdBand {
    pub min: Value,
    pub max: Value,
}

impl Default for WeirdBand {
    fn default() -> Self { Self { min: 0.20, max: 1.20 } }
}

impl WeirdBand {
    pub fn is_normal(&self, pt_frac: Value) -> bool {
        pt_frac > self.min && pt_frac < self.max
    }

    pub fn is_weird(&self, pt_frac: Value) -> bool { !self.is_normal(pt_frac) }
}
