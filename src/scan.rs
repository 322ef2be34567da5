//! Delta-pt cut scan: how aggressively can tracks with a badly measured pt
//! be rejected before well-measured tracks start to suffer?

use itertools::izip;
use ordered_float::NotNan;

use crate::{BoxErr, Value};
use crate::cuts::{TrackCuts, WeirdBand};
use crate::hist::{Binning, BookedH1, BookedH2, Variable, H1};
use crate::io::hdf5::{write_h1, write_h2, TrackRow, TruthRow};

const FRAC_BINNING:  Binning = Binning::new(1000, 0.0, 10.0);

/// The histogram family recorded once inclusively and once per threshold.
struct ThresholdHists {
    delta: BookedH1,
    reco_pt: BookedH1,
    frac: BookedH1,
    matched_truth_pt: BookedH1,
    delta_vs_frac: BookedH2,
    delta_vs_truth: BookedH2,
    delta_vs_reco: BookedH2,
    truth_vs_reco: BookedH2,
}

impl ThresholdHists {

    fn new() -> Self {
        let pt = Variable::Pt.binning();
        let pt_coarse = pt.coarse(100);
        let delta = Variable::DeltaPt.binning();
        let delta_coarse = delta.coarse(200);
        Self {
            delta: BookedH1::new(delta),
            reco_pt: BookedH1::new(pt),
            frac: BookedH1::new(FRAC_BINNING),
            matched_truth_pt: BookedH1::new(pt),
            delta_vs_frac: BookedH2::new(FRAC_BINNING.coarse(200), delta_coarse),
            delta_vs_truth: BookedH2::new(pt_coarse, delta_coarse),
            delta_vs_reco: BookedH2::new(pt_coarse, delta_coarse),
            truth_vs_reco: BookedH2::new(pt_coarse, pt_coarse),
        }
    }

    fn fill(&mut self, delta: Value, frac: Value, reco_pt: Value, truth_pt: Value) {
        self.delta.fill(delta);
        self.reco_pt.fill(reco_pt);
        self.frac.fill(frac);
        // unmatched tracks have no truth pt and stay out of the efficiency
        // numerator
        if truth_pt.is_finite() && truth_pt > 0.0 {
            self.matched_truth_pt.fill(truth_pt);
        }
        self.delta_vs_frac.fill(frac, delta);
        self.delta_vs_truth.fill(truth_pt, delta);
        self.delta_vs_reco.fill(reco_pt, delta);
        self.truth_vs_reco.fill(reco_pt, truth_pt);
    }

    fn write(&self, parent: &hdf5::Group) -> hdf5::Result<()> {
        write_h1(parent, "delta_pt", &self.delta.export())?;
        write_h1(parent, "reco_pt", &self.reco_pt.export())?;
        write_h1(parent, "pt_frac", &self.frac.export())?;
        write_h1(parent, "matched_truth_pt", &self.matched_truth_pt.export())?;
        write_h2(parent, "delta_pt_vs_pt_frac", &self.delta_vs_frac.export())?;
        write_h2(parent, "delta_pt_vs_truth_pt", &self.delta_vs_truth.export())?;
        write_h2(parent, "delta_pt_vs_reco_pt", &self.delta_vs_reco.export())?;
        write_h2(parent, "truth_vs_reco_pt", &self.truth_vs_reco.export())?;
        Ok(())
    }
}

pub struct DeltaPtScan {
    cuts: TrackCuts,
    band: WeirdBand,
    thresholds: Vec<Value>,
    inclusive: ThresholdHists,
    per_cut: Vec<ThresholdHists>,
    n_normal: Vec<u64>,
    n_weird: Vec<u64>,
    truth_pt: BookedH1,
}

impl DeltaPtScan {

    /// Thresholds are deduplicated and kept in ascending order, i.e. most
    /// restrictive first.
    pub fn new(cuts: TrackCuts, band: WeirdBand, thresholds: &[Value]) -> BoxErr<Self> {
        let mut sorted = thresholds.iter()
            .map(|&t| NotNan::new(t).map_err(|_| "NaN delta-pt threshold"))
            .collect::<Result<Vec<_>, _>>()?;
        sorted.sort();
        sorted.dedup();
        let thresholds: Vec<Value> = sorted.into_iter().map(NotNan::into_inner).collect();
        let n = thresholds.len();
        Ok(Self {
            cuts,
            band,
            thresholds,
            inclusive: ThresholdHists::new(),
            per_cut: (0..n).map(|_| ThresholdHists::new()).collect(),
            n_normal: vec![0; n],
            n_weird: vec![0; n],
            truth_pt: BookedH1::new(Variable::Pt.binning()),
        })
    }

    pub fn thresholds(&self) -> &[Value] { &self.thresholds }

    pub fn process_track(&mut self, trk: &TrackRow) {
        if !self.cuts.is_good(trk) { return }

        let frac  = trk.pt / trk.gpt;
        let delta = trk.deltapt / trk.pt;
        self.inclusive.fill(delta, frac, trk.pt, trk.gpt);

        let normal = self.band.is_normal(frac);
        for (i, &t) in self.thresholds.iter().enumerate() {
            if delta < t {
                self.per_cut[i].fill(delta, frac, trk.pt, trk.gpt);
                if normal { self.n_normal[i] += 1 }
                else      { self.n_weird [i] += 1 }
            }
        }
    }

    /// Only primary particles enter the efficiency denominator.
    pub fn process_truth(&mut self, tru: &TruthRow) {
        if tru.gprimary == 1.0 {
            self.truth_pt.fill(tru.gpt);
        }
    }

    pub fn counts(&self) -> impl Iterator<Item = (Value, u64, u64)> + '_ {
        izip!(&self.thresholds, &self.n_normal, &self.n_weird)
            .map(|(&t, &n, &w)| (t, n, w))
    }

    /// `(threshold, normal / weird)` per threshold, ascending; 0 when no
    /// weird track survives.
    pub fn rejection_factors(&self) -> Vec<(Value, f64)> {
        self.counts()
            .map(|(t, n, w)| (t, if w > 0 { n as f64 / w as f64 } else { 0.0 }))
            .collect()
    }

    /// Tracking efficiency vs truth pt, before any delta-pt cut.
    pub fn inclusive_efficiency(&self) -> BoxErr<H1> {
        self.inclusive.matched_truth_pt.export().divide(&self.truth_pt.export())
    }

    /// Tracking efficiency vs truth pt at each threshold.
    pub fn efficiencies(&self) -> BoxErr<Vec<(Value, H1)>> {
        let truth = self.truth_pt.export();
        self.thresholds.iter().zip(&self.per_cut)
            .map(|(&t, h)| Ok((t, h.matched_truth_pt.export().divide(&truth)?)))
            .collect()
    }

    pub fn write(&self, file: &hdf5::File) -> hdf5::Result<()> {
        let group = file.create_group("inclusive")?;
        self.inclusive.write(&group)?;

        for (&t, hists) in self.thresholds.iter().zip(&self.per_cut) {
            let group = file.create_group(&threshold_group(t))?;
            hists.write(&group)?;
        }

        let truth = file.create_group("truth")?;
        write_h1(&truth, "pt", &self.truth_pt.export())?;

        let eff = file.create_group("efficiency")?;
        let inclusive = self.inclusive_efficiency()
            .map_err(|e| hdf5::Error::from(e.to_string()))?;
        write_h1(&eff, "inclusive", &inclusive)?;
        for (t, h) in self.efficiencies().map_err(|e| hdf5::Error::from(e.to_string()))? {
            write_h1(&eff, &threshold_group(t), &h)?;
        }

        let rej = file.create_group("rejection")?;
        let (thresholds, factors): (Vec<f64>, Vec<f64>) = self.rejection_factors()
            .into_iter()
            .map(|(t, r)| (t as f64, r))
            .unzip();
        rej.new_dataset_builder().with_data(&thresholds).create("thresholds")?;
        rej.new_dataset_builder().with_data(&factors).create("factors")?;
        Ok(())
    }
}

/// Group name for one scan point, e.g. 0.05 -> `dpt0p05`. Built from the
/// full decimal representation, so distinct thresholds never share a group.
fn threshold_group(t: Value) -> String {
    format!("dpt{}", t.to_string().replace('.', "p"))
}
