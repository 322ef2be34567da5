//! Histogram booking, filling and ratio arithmetic.
//!
//! Filling goes through `ndhistogram`; the serialised forms `H1`/`H2` are
//! what gets written to (and read back from) the output file, and what the
//! ratio/efficiency arithmetic operates on.

use std::f32::consts::PI;

use float_eq::float_eq;
use ndhistogram::{ndhistogram, axis::Uniform, Histogram, HistND};

use crate::{BoxErr, Value};
use crate::io::hdf5::{write_h1, write_h2, TrackRow, TruthRow};

pub type Hist1 = HistND<(Uniform<Value>,), f64>;
pub type Hist2 = HistND<(Uniform<Value>, Uniform<Value>), f64>;

/// A uniform axis: `bins` equal bins between `lo` and `hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    pub bins: usize,
    pub lo: Value,
    pub hi: Value,
}

impl Binning {

    pub const fn new(bins: usize, lo: Value, hi: Value) -> Self {
        Self { bins, lo, hi }
    }

    pub fn axis(&self) -> Uniform<Value> {
        Uniform::new(self.bins, self.lo, self.hi).expect("valid binning")
    }

    pub fn edges(&self) -> Vec<f64> {
        let width = (self.hi as f64 - self.lo as f64) / self.bins as f64;
        (0..=self.bins).map(|i| self.lo as f64 + i as f64 * width).collect()
    }

    pub fn centre(&self, bin: usize) -> Value {
        let width = (self.hi - self.lo) / self.bins as Value;
        self.lo + (bin as Value + 0.5) * width
    }

    /// Same range with at most `max_bins` bins, for use on 2-D axes.
    pub fn coarse(&self, max_bins: usize) -> Self {
        Self { bins: self.bins.min(max_bins), ..*self }
    }
}

// ----- serialised histograms and their arithmetic -----------------------------------------

/// A 1-D histogram as stored on disk: `edges.len() == values.len() + 1`.
/// Under/overflow are not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct H1 {
    pub edges: Vec<f64>,
    pub values: Vec<f64>,
}

/// A 2-D histogram as stored on disk; `values` is row-major over
/// `(x_bin, y_bin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct H2 {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub values: Vec<f64>,
}

fn same_edges(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() &&
        a.iter().zip(b).all(|(&x, &y)| float_eq!(x, y, ulps <= 4))
}

impl H1 {

    pub fn integral(&self) -> f64 { self.values.iter().sum() }

    /// Bin-by-bin ratio. Bins with a zero denominator are set to 0.
    pub fn divide(&self, den: &H1) -> BoxErr<H1> {
        if !same_edges(&self.edges, &den.edges) {
            return Err("Binning mismatch between ratio numerator and denominator".into());
        }
        let values = self.values.iter().zip(&den.values)
            .map(|(&n, &d)| if d != 0.0 { n / d } else { 0.0 })
            .collect();
        Ok(H1 { edges: self.edges.clone(), values })
    }

    /// Merge groups of `n` adjacent bins; a trailing remainder is folded into
    /// the last merged bin.
    pub fn rebin(&self, n: usize) -> H1 {
        if n <= 1 { return self.clone() }
        let nfull = self.values.len() / n;
        let nout  = nfull.max(1);
        let mut values = vec![0.0; nout];
        for (i, v) in self.values.iter().enumerate() {
            values[(i / n).min(nout - 1)] += v;
        }
        let mut edges: Vec<f64> = self.edges.iter().copied().step_by(n).take(nout).collect();
        edges.push(*self.edges.last().unwrap_or(&0.0));
        H1 { edges, values }
    }

    /// Scale to unit integral. Empty histograms are returned unchanged.
    pub fn normalised(&self) -> H1 {
        let total = self.integral();
        if total == 0.0 { return self.clone() }
        H1 {
            edges: self.edges.clone(),
            values: self.values.iter().map(|v| v / total).collect(),
        }
    }
}

// ----- booked (fillable) histograms --------------------------------------------------------

pub struct BookedH1 {
    binning: Binning,
    hist: Hist1,
}

impl BookedH1 {

    pub fn new(binning: Binning) -> Self {
        Self { binning, hist: ndhistogram!(binning.axis(); f64) }
    }

    pub fn fill(&mut self, x: Value) { self.hist.fill(&x); }

    pub fn export(&self) -> H1 {
        let values = (0..self.binning.bins)
            .map(|i| *self.hist.value(&self.binning.centre(i)).unwrap_or(&0.0))
            .collect();
        H1 { edges: self.binning.edges(), values }
    }
}

pub struct BookedH2 {
    x: Binning,
    y: Binning,
    hist: Hist2,
}

impl BookedH2 {

    pub fn new(x: Binning, y: Binning) -> Self {
        Self { x, y, hist: ndhistogram!(x.axis(), y.axis(); f64) }
    }

    pub fn fill(&mut self, x: Value, y: Value) { self.hist.fill(&(x, y)); }

    pub fn export(&self) -> H2 {
        let mut values = Vec::with_capacity(self.x.bins * self.y.bins);
        for i in 0..self.x.bins {
            for j in 0..self.y.bins {
                let coord = (self.x.centre(i), self.y.centre(j));
                values.push(*self.hist.value(&coord).unwrap_or(&0.0));
            }
        }
        H2 { x_edges: self.x.edges(), y_edges: self.y.edges(), values }
    }
}

// ----- the studied track variables ---------------------------------------------------------

/// Every track quantity the study histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    NMvtx,
    NIntt,
    NTpc,
    NMms,
    NTot,
    PerMvtx,
    PerIntt,
    PerTpc,
    PerMms,
    PerTot,
    Chisq,
    Ndf,
    Quality,
    DcaXy,
    DcaZ,
    Phi,
    Eta,
    Pt,
    DeltaDcaXy,
    DeltaDcaZ,
    DeltaPhi,
    DeltaEta,
    DeltaPt,
}

impl Variable {

    pub const ALL: [Variable; 23] = [
        Variable::NMvtx, Variable::NIntt, Variable::NTpc, Variable::NMms,
        Variable::NTot, Variable::PerMvtx, Variable::PerIntt,
        Variable::PerTpc, Variable::PerMms, Variable::PerTot,
        Variable::Chisq, Variable::Ndf, Variable::Quality,
        Variable::DcaXy, Variable::DcaZ, Variable::Phi, Variable::Eta,
        Variable::Pt, Variable::DeltaDcaXy, Variable::DeltaDcaZ,
        Variable::DeltaPhi, Variable::DeltaEta, Variable::DeltaPt,
    ];

    /// Group name used in the output file.
    pub fn name(self) -> &'static str {
        match self {
            Variable::NMvtx      => "nmvtx",
            Variable::NIntt      => "nintt",
            Variable::NTpc       => "ntpc",
            Variable::NMms       => "nmms",
            Variable::NTot       => "ntot",
            Variable::PerMvtx    => "per_mvtx",
            Variable::PerIntt    => "per_intt",
            Variable::PerTpc     => "per_tpc",
            Variable::PerMms     => "per_mms",
            Variable::PerTot     => "per_tot",
            Variable::Chisq      => "chisq",
            Variable::Ndf        => "ndf",
            Variable::Quality    => "quality",
            Variable::DcaXy      => "dca_xy",
            Variable::DcaZ       => "dca_z",
            Variable::Phi        => "phi",
            Variable::Eta        => "eta",
            Variable::Pt         => "pt",
            Variable::DeltaDcaXy => "delta_dca_xy",
            Variable::DeltaDcaZ  => "delta_dca_z",
            Variable::DeltaPhi   => "delta_phi",
            Variable::DeltaEta   => "delta_eta",
            Variable::DeltaPt    => "delta_pt",
        }
    }

    pub fn binning(self) -> Binning {
        match self {
            Variable::NMvtx      => Binning::new(  10,   0.0,  10.0),
            Variable::NIntt      => Binning::new(  10,   0.0,  10.0),
            Variable::NTpc       => Binning::new(  60,   0.0,  60.0),
            Variable::NMms       => Binning::new(   5,   0.0,   5.0),
            Variable::NTot       => Binning::new(  75,   0.0,  75.0),
            Variable::PerMvtx    => Binning::new( 120,   0.0,   1.2),
            Variable::PerIntt    => Binning::new( 120,   0.0,   1.2),
            Variable::PerTpc     => Binning::new( 120,   0.0,   1.2),
            Variable::PerMms     => Binning::new( 120,   0.0,   1.2),
            Variable::PerTot     => Binning::new( 120,   0.0,   1.2),
            Variable::Chisq      => Binning::new( 200,   0.0, 100.0),
            Variable::Ndf        => Binning::new(  25,   0.0,  25.0),
            Variable::Quality    => Binning::new( 200,   0.0,  50.0),
            Variable::DcaXy      => Binning::new( 200,  -5.0,   5.0),
            Variable::DcaZ       => Binning::new( 200,  -5.0,   5.0),
            Variable::Phi        => Binning::new(  64,   -PI,    PI),
            Variable::Eta        => Binning::new(  50, -1.25,  1.25),
            Variable::Pt         => Binning::new( 500,   0.0,  50.0),
            Variable::DeltaDcaXy => Binning::new( 200, -25.0,  25.0),
            Variable::DeltaDcaZ  => Binning::new( 200, -25.0,  25.0),
            Variable::DeltaPhi   => Binning::new( 200,   0.0,   1.0),
            Variable::DeltaEta   => Binning::new( 200,   0.0,   1.0),
            Variable::DeltaPt    => Binning::new(5000,   0.0,   5.0),
        }
    }

    pub fn value(self, vars: &TrackVars) -> Value {
        match self {
            Variable::NMvtx      => vars.nmvtx,
            Variable::NIntt      => vars.nintt,
            Variable::NTpc       => vars.ntpc,
            Variable::NMms       => vars.nmms,
            Variable::NTot       => vars.ntot,
            Variable::PerMvtx    => vars.per_mvtx,
            Variable::PerIntt    => vars.per_intt,
            Variable::PerTpc     => vars.per_tpc,
            Variable::PerMms     => vars.per_mms,
            Variable::PerTot     => vars.per_tot,
            Variable::Chisq      => vars.chisq,
            Variable::Ndf        => vars.ndf,
            Variable::Quality    => vars.quality,
            Variable::DcaXy      => vars.dca_xy,
            Variable::DcaZ       => vars.dca_z,
            Variable::Phi        => vars.phi,
            Variable::Eta        => vars.eta,
            Variable::Pt         => vars.pt,
            Variable::DeltaDcaXy => vars.delta_dca_xy,
            Variable::DeltaDcaZ  => vars.delta_dca_z,
            Variable::DeltaPhi   => vars.delta_phi,
            Variable::DeltaEta   => vars.delta_eta,
            Variable::DeltaPt    => vars.delta_pt,
        }
    }
}

/// The values of all studied variables for one track. The `per_`s are the
/// fraction of the track's hits in each subsystem (`per_tot`: hits over
/// crossed layers); the `delta_dca`s are DCA significances (value over its
/// uncertainty); `delta_pt` is the pt resolution `deltapt / pt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackVars {
    pub nmvtx: Value,
    pub nintt: Value,
    pub ntpc: Value,
    pub nmms: Value,
    pub ntot: Value,
    pub per_mvtx: Value,
    pub per_intt: Value,
    pub per_tpc: Value,
    pub per_mms: Value,
    pub per_tot: Value,
    pub chisq: Value,
    pub ndf: Value,
    pub quality: Value,
    pub dca_xy: Value,
    pub dca_z: Value,
    pub phi: Value,
    pub eta: Value,
    pub pt: Value,
    pub delta_dca_xy: Value,
    pub delta_dca_z: Value,
    pub delta_phi: Value,
    pub delta_eta: Value,
    pub delta_pt: Value,
}

impl From<&TrackRow> for TrackVars {
    fn from(t: &TrackRow) -> Self {
        Self {
            nmvtx: t.nmaps,
            nintt: t.nintt,
            ntpc: t.ntpc,
            nmms: t.nmms,
            ntot: t.nhits,
            per_mvtx: t.nmaps / t.nhits,
            per_intt: t.nintt / t.nhits,
            per_tpc: t.ntpc / t.nhits,
            per_mms: t.nmms / t.nhits,
            per_tot: t.nhits / t.layers,
            chisq: t.chisq,
            ndf: t.ndf,
            quality: t.quality,
            dca_xy: t.dca3dxy,
            dca_z: t.dca3dz,
            phi: t.phi,
            eta: t.eta,
            pt: t.pt,
            delta_dca_xy: t.dca3dxy / t.dca3dxysigma,
            delta_dca_z: t.dca3dz / t.dca3dzsigma,
            delta_phi: t.deltaphi,
            delta_eta: t.deltaeta,
            delta_pt: t.deltapt / t.pt,
        }
    }
}

// The reco block of the truth table describes the matched track; it feeds
// the same histogram family when analysing the pileup sample.
impl From<&TruthRow> for TrackVars {
    fn from(t: &TruthRow) -> Self {
        Self {
            nmvtx: t.nmaps,
            nintt: t.nintt,
            ntpc: t.ntpc,
            nmms: t.nmms,
            ntot: t.nhits,
            per_mvtx: t.nmaps / t.nhits,
            per_intt: t.nintt / t.nhits,
            per_tpc: t.ntpc / t.nhits,
            per_mms: t.nmms / t.nhits,
            per_tot: t.nhits / t.layers,
            chisq: t.chisq,
            ndf: t.ndf,
            quality: t.quality,
            dca_xy: t.dca3dxy,
            dca_z: t.dca3dz,
            phi: t.phi,
            eta: t.eta,
            pt: t.pt,
            delta_dca_xy: t.dca3dxy / t.dca3dxysigma,
            delta_dca_z: t.dca3dz / t.dca3dzsigma,
            delta_phi: t.deltaphi,
            delta_eta: t.deltaeta,
            delta_pt: t.deltapt / t.pt,
        }
    }
}

// ----- histogram families ------------------------------------------------------------------

/// One 1-D histogram per variable, plus a pt-vs-variable 2-D histogram for
/// everything except pt itself.
pub struct VarHists {
    h1: Vec<(Variable, BookedH1)>,
    vs_pt: Vec<(Variable, BookedH2)>,
}

impl VarHists {

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let h1 = Variable::ALL.iter()
            .map(|&v| (v, BookedH1::new(v.binning())))
            .collect();
        let pt_axis = Variable::Pt.binning().coarse(100);
        let vs_pt = Variable::ALL.iter()
            .filter(|&&v| v != Variable::Pt)
            .map(|&v| (v, BookedH2::new(pt_axis, v.binning().coarse(200))))
            .collect();
        Self { h1, vs_pt }
    }

    pub fn fill(&mut self, vars: &TrackVars) {
        for (v, h) in &mut self.h1    { h.fill(v.value(vars)); }
        for (v, h) in &mut self.vs_pt { h.fill(vars.pt, v.value(vars)); }
    }

    pub fn write(&self, parent: &hdf5::Group) -> hdf5::Result<()> {
        for (v, h) in &self.h1 {
            write_h1(parent, v.name(), &h.export())?;
        }
        for (v, h) in &self.vs_pt {
            write_h2(parent, &format!("pt_vs_{}", v.name()), &h.export())?;
        }
        Ok(())
    }
}

/// Reco-truth comparison for one kinematic quantity: the reco/truth fraction,
/// the relative difference `(truth - reco) / truth`, and the 2-D views
/// against the truth value.
struct MatchSet {
    frac: BookedH1,
    diff: BookedH1,
    tru_vs_rec: BookedH2,
    frac_vs_tru: BookedH2,
    diff_vs_tru: BookedH2,
}

impl MatchSet {

    fn new(axis: Binning, frac: Binning, diff: Binning) -> Self {
        let coarse = axis.coarse(100);
        Self {
            frac: BookedH1::new(frac),
            diff: BookedH1::new(diff),
            tru_vs_rec: BookedH2::new(coarse, coarse),
            frac_vs_tru: BookedH2::new(coarse, frac.coarse(200)),
            diff_vs_tru: BookedH2::new(coarse, diff.coarse(200)),
        }
    }

    fn fill(&mut self, reco: Value, truth: Value) {
        let frac = reco / truth;
        let diff = (truth - reco) / truth;
        self.frac.fill(frac);
        self.diff.fill(diff);
        self.tru_vs_rec.fill(reco, truth);
        self.frac_vs_tru.fill(truth, frac);
        self.diff_vs_tru.fill(truth, diff);
    }

    fn write(&self, parent: &hdf5::Group, quantity: &str) -> hdf5::Result<()> {
        write_h1(parent, &format!("{quantity}_frac"), &self.frac.export())?;
        write_h1(parent, &format!("{quantity}_diff"), &self.diff.export())?;
        write_h2(parent, &format!("truth_vs_reco_{quantity}"), &self.tru_vs_rec.export())?;
        write_h2(parent, &format!("frac_vs_truth_{quantity}"), &self.frac_vs_tru.export())?;
        write_h2(parent, &format!("diff_vs_truth_{quantity}"), &self.diff_vs_tru.export())?;
        Ok(())
    }
}

/// Reco-truth comparisons for pt, eta and phi.
pub struct MatchHists {
    pt: MatchSet,
    eta: MatchSet,
    phi: MatchSet,
}

impl MatchHists {

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let frac = Binning::new(200, 0.0, 4.0);
        let sfrac = Binning::new(200, -4.0, 4.0); // eta/phi change sign
        let diff = Binning::new(200, -2.0, 2.0);
        Self {
            pt:  MatchSet::new(Variable::Pt .binning(), frac,  diff),
            eta: MatchSet::new(Variable::Eta.binning(), sfrac, diff),
            phi: MatchSet::new(Variable::Phi.binning(), sfrac, diff),
        }
    }

    pub fn fill(&mut self, t: &TrackRow) {
        self.pt .fill(t.pt,  t.gpt);
        self.eta.fill(t.eta, t.geta);
        self.phi.fill(t.phi, t.gphi);
    }

    pub fn write(&self, parent: &hdf5::Group) -> hdf5::Result<()> {
        self.pt .write(parent, "pt")?;
        self.eta.write(parent, "eta")?;
        self.phi.write(parent, "phi")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};
    use rstest::rstest;

    fn h1(values: &[f64]) -> H1 {
        let edges = (0..=values.len()).map(|i| i as f64).collect();
        H1 { edges, values: values.to_vec() }
    }

    #[test]
    fn divide_with_zero_denominator_bins() {
        let num = h1(&[1.0, 4.0, 5.0]);
        let den = h1(&[2.0, 0.0, 2.0]);
        let ratio = num.divide(&den).unwrap();
        assert_eq!(ratio.values, vec![0.5, 0.0, 2.5]);
        assert_eq!(ratio.edges, num.edges);
    }

    #[test]
    fn divide_rejects_mismatched_binning() {
        let num = h1(&[1.0, 2.0]);
        let den = h1(&[1.0, 2.0, 3.0]);
        assert!(num.divide(&den).is_err());
    }

    #[rstest(n, expected_values, expected_edges,
        case(1, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        case(2, vec![3.0, 7.0, 11.0],               vec![0.0, 2.0, 4.0, 6.0]),
        case(3, vec![6.0, 15.0],                    vec![0.0, 3.0, 6.0]),
        case(4, vec![21.0],                         vec![0.0, 6.0]), // remainder folded into last bin
    )]
    fn rebin_preserves_content(n: usize, expected_values: Vec<f64>, expected_edges: Vec<f64>) {
        let h = h1(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let r = h.rebin(n);
        assert_eq!(r.values, expected_values);
        assert_eq!(r.edges, expected_edges);
        assert_eq!(r.integral(), h.integral());
    }

    #[test]
    fn normalised_has_unit_integral() {
        let h = h1(&[1.0, 3.0]).normalised();
        assert_eq!(h.integral(), 1.0);
        assert_eq!(h.values, vec![0.25, 0.75]);
        // empty histogram is left alone rather than dividing by zero
        let empty = h1(&[0.0, 0.0]).normalised();
        assert_eq!(empty.values, vec![0.0, 0.0]);
    }

    #[test]
    fn booked_h1_counts_land_in_the_right_bin() {
        let mut h = BookedH1::new(Binning::new(10, 0.0, 10.0));
        h.fill(0.5);
        h.fill(0.7);
        h.fill(9.9);
        h.fill(-1.0); // underflow is dropped on export
        h.fill(11.0); // overflow too
        let out = h.export();
        assert_eq!(out.values[0], 2.0);
        assert_eq!(out.values[9], 1.0);
        assert_eq!(out.integral(), 3.0);
        assert_eq!(out.edges.len(), 11);
    }

    #[test]
    fn booked_h2_counts_land_in_the_right_cell() {
        let mut h = BookedH2::new(Binning::new(2, 0.0, 2.0), Binning::new(3, 0.0, 3.0));
        h.fill(0.5, 2.5);
        h.fill(1.5, 0.5);
        h.fill(1.5, 0.6);
        let out = h.export();
        // row-major (x, y)
        assert_eq!(out.values, vec![0.0, 0.0, 1.0,
                                    2.0, 0.0, 0.0]);
    }

    #[test]
    fn var_hists_fill_once_per_variable() {
        let mut hists = VarHists::new();
        let mut row = TrackRow::default();
        row.pt = 1.0;
        row.deltapt = 0.05;
        row.dca3dxysigma = 1.0;
        row.dca3dzsigma = 1.0;
        row.nmaps = 3.0;
        row.nintt = 4.0;
        row.ntpc = 40.0;
        row.nmms = 1.0;
        row.nhits = 48.0;
        row.layers = 50.0;
        hists.fill(&TrackVars::from(&row));
        for (v, h) in &hists.h1 {
            assert_eq!(h.export().integral(), 1.0, "variable {}", v.name());
        }
    }

    #[test]
    fn hit_fractions_are_ratios_of_counts() {
        let mut row = TrackRow::default();
        row.nmaps = 3.0;
        row.nintt = 4.0;
        row.ntpc = 40.0;
        row.nmms = 1.0;
        row.nhits = 48.0;
        row.layers = 50.0;
        let vars = TrackVars::from(&row);
        assert_eq!(vars.per_mvtx, 3.0  / 48.0);
        assert_eq!(vars.per_intt, 4.0  / 48.0);
        assert_eq!(vars.per_tpc,  40.0 / 48.0);
        assert_eq!(vars.per_mms,  1.0  / 48.0);
        assert_eq!(vars.per_tot,  48.0 / 50.0);
    }
}
