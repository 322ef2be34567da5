//! The full cut study: every track variable histogrammed before and after
//! the quality cuts, with the weird tracks (reco-pt/truth-pt ratio outside
//! the accepted band) given their own histogram families.

use std::fmt;

use crate::BoxErr;
use crate::cuts::{TrackCuts, WeirdBand};
use crate::hist::{BookedH1, MatchHists, TrackVars, VarHists, Variable, H1};
use crate::io::hdf5::{write_h1, TrackRow, TruthRow};
use crate::utils::group_digits;

/// How many rows ended up where. `weird`/`normal` count tracks which passed
/// the cuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub tracks: u64,
    pub accepted: u64,
    pub normal: u64,
    pub weird: u64,
    pub truth: u64,
    pub primary: u64,
    pub pileup: u64,
    pub pileup_accepted: u64,
}

impl Counts {

    /// Surviving normal tracks per surviving weird track; 0 when none of the
    /// weird tracks survived.
    pub fn rejection(&self) -> f64 {
        if self.weird > 0 { self.normal as f64 / self.weird as f64 } else { 0.0 }
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "tracks            {:>15}", group_digits(self.tracks))?;
        writeln!(f, "  passing cuts    {:>15}", group_digits(self.accepted))?;
        writeln!(f, "    normal        {:>15}", group_digits(self.normal))?;
        writeln!(f, "    weird         {:>15}", group_digits(self.weird))?;
        writeln!(f, "truth particles   {:>15}", group_digits(self.truth))?;
        writeln!(f, "  primary         {:>15}", group_digits(self.primary))?;
        if self.pileup > 0 {
            writeln!(f, "pileup tracks     {:>15}", group_digits(self.pileup))?;
            writeln!(f, "  passing cuts    {:>15}", group_digits(self.pileup_accepted))?;
        }
        write!(f, "rejection factor  {:>15.3}", self.rejection())
    }
}

/// Truth-particle kinematics, the efficiency denominator, and the full
/// variable treatment of the matched-track block, keyed on the truth pt.
struct TruthHists {
    pt: BookedH1,
    eta: BookedH1,
    phi: BookedH1,
    primary_pt: BookedH1,
    matched: VarHists,
}

impl TruthHists {

    fn new() -> Self {
        Self {
            pt:  BookedH1::new(Variable::Pt .binning()),
            eta: BookedH1::new(Variable::Eta.binning()),
            phi: BookedH1::new(Variable::Phi.binning()),
            primary_pt: BookedH1::new(Variable::Pt.binning()),
            matched: VarHists::new(),
        }
    }

    fn fill(&mut self, tru: &TruthRow) {
        self.pt .fill(tru.gpt);
        self.eta.fill(tru.geta);
        self.phi.fill(tru.gphi);
        if tru.gprimary == 1.0 {
            self.primary_pt.fill(tru.gpt);
        }
        if has_matched_track(tru) {
            let mut vars = TrackVars::from(tru);
            vars.pt = tru.gpt;
            self.matched.fill(&vars);
        }
    }

    fn write(&self, parent: &hdf5::Group) -> hdf5::Result<()> {
        write_h1(parent, "pt",  &self.pt .export())?;
        write_h1(parent, "eta", &self.eta.export())?;
        write_h1(parent, "phi", &self.phi.export())?;
        write_h1(parent, "primary_pt", &self.primary_pt.export())?;
        self.matched.write(&parent.create_group("matched")?)?;
        Ok(())
    }
}

/// Truth rows whose particle was never reconstructed carry no matched block.
fn has_matched_track(tru: &TruthRow) -> bool {
    tru.pt.is_finite() && tru.pt > 0.0
}

pub struct CutStudy {
    cuts: TrackCuts,
    band: WeirdBand,
    tracks: VarHists,
    cut_tracks: VarHists,
    weird: VarHists,
    cut_weird: VarHists,
    matches: MatchHists,
    cut_matches: MatchHists,
    truth: TruthHists,
    matched_pt: BookedH1,
    cut_matched_pt: BookedH1,
    pileup: Option<(VarHists, VarHists)>,
    counts: Counts,
}

impl CutStudy {

    pub fn new(cuts: TrackCuts, band: WeirdBand, with_pileup: bool) -> Self {
        Self {
            cuts,
            band,
            tracks: VarHists::new(),
            cut_tracks: VarHists::new(),
            weird: VarHists::new(),
            cut_weird: VarHists::new(),
            matches: MatchHists::new(),
            cut_matches: MatchHists::new(),
            truth: TruthHists::new(),
            matched_pt: BookedH1::new(Variable::Pt.binning()),
            cut_matched_pt: BookedH1::new(Variable::Pt.binning()),
            pileup: with_pileup.then(|| (VarHists::new(), VarHists::new())),
            counts: Counts::default(),
        }
    }

    pub fn counts(&self) -> &Counts { &self.counts }

    pub fn process_track(&mut self, trk: &TrackRow) {
        self.counts.tracks += 1;
        let vars = TrackVars::from(trk);
        let is_weird = self.band.is_weird(trk.pt / trk.gpt);
        // tracks without a truth match have no gpt and stay out of the
        // efficiency numerators
        let matched = trk.gpt.is_finite() && trk.gpt > 0.0;
        self.tracks.fill(&vars);
        self.matches.fill(trk);
        if matched { self.matched_pt.fill(trk.gpt) }
        if is_weird { self.weird.fill(&vars) }

        if !self.cuts.is_good(trk) { return }
        self.counts.accepted += 1;
        self.cut_tracks.fill(&vars);
        self.cut_matches.fill(trk);
        if matched { self.cut_matched_pt.fill(trk.gpt) }
        if is_weird {
            self.counts.weird += 1;
            self.cut_weird.fill(&vars);
        } else {
            self.counts.normal += 1;
        }
    }

    pub fn process_truth(&mut self, tru: &TruthRow) {
        self.counts.truth += 1;
        if tru.gprimary == 1.0 { self.counts.primary += 1 }
        self.truth.fill(tru);
    }

    /// One matched-track row of the pileup sample; rows without a matched
    /// block are skipped.
    pub fn process_pileup(&mut self, tru: &TruthRow) {
        let Some((all, cut)) = &mut self.pileup else { return };
        if !has_matched_track(tru) { return }
        self.counts.pileup += 1;
        let vars = TrackVars::from(tru);
        all.fill(&vars);
        if self.cuts.is_good_matched(tru) {
            self.counts.pileup_accepted += 1;
            cut.fill(&vars);
        }
    }

    /// Tracking efficiency vs truth pt before the cuts.
    pub fn efficiency(&self) -> BoxErr<H1> {
        self.matched_pt.export().divide(&self.truth.primary_pt.export())
    }

    /// Tracking efficiency vs truth pt after the cuts.
    pub fn cut_efficiency(&self) -> BoxErr<H1> {
        self.cut_matched_pt.export().divide(&self.truth.primary_pt.export())
    }

    pub fn write(&self, file: &hdf5::File) -> hdf5::Result<()> {
        self.tracks     .write(&file.create_group("tracks"     )?)?;
        self.cut_tracks .write(&file.create_group("cut_tracks" )?)?;
        self.weird      .write(&file.create_group("weird"      )?)?;
        self.cut_weird  .write(&file.create_group("cut_weird"  )?)?;
        self.matches    .write(&file.create_group("matches"    )?)?;
        self.cut_matches.write(&file.create_group("cut_matches")?)?;
        self.truth      .write(&file.create_group("truth"      )?)?;

        let eff = file.create_group("efficiency")?;
        let before = self.efficiency()    .map_err(|e| hdf5::Error::from(e.to_string()))?;
        let after  = self.cut_efficiency().map_err(|e| hdf5::Error::from(e.to_string()))?;
        write_h1(&eff, "tracks",     &before)?;
        write_h1(&eff, "cut_tracks", &after)?;

        if let Some((all, cut)) = &self.pileup {
            all.write(&file.create_group("pileup"    )?)?;
            cut.write(&file.create_group("cut_pileup")?)?;
        }
        Ok(())
    }
}
