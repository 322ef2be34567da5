//! End-to-end run over a small synthetic sample: write the evaluator tables,
//! run the study and the scan, and check the stored histograms.

use trackcut::config::Bounds;
use trackcut::cuts::{TrackCuts, WeirdBand};
use trackcut::io::hdf5::{read_h1, read_table, TrackRow, TruthRow};
use trackcut::scan::DeltaPtScan;
use trackcut::study::CutStudy;

type BoxErr<T> = Result<T, Box<dyn std::error::Error>>;

/// A track which passes the baseline quality cuts.
fn good_track(pt: f32, gpt: f32, deltapt: f32) -> TrackRow {
    TrackRow {
        pt, gpt, deltapt,
        quality: 5.0,
        nintt: 2.0,
        nlmaps: 3.0,
        nmaps: 3.0,
        ntpc: 40.0,
        nmms: 1.0,
        nhits: 46.0,
        layers: 50.0,
        dca3dxysigma: 1.0,
        dca3dzsigma: 1.0,
        ..TrackRow::default()
    }
}

/// A primary truth particle which was also reconstructed.
fn primary(gpt: f32) -> TruthRow {
    TruthRow {
        gpt,
        gprimary: 1.0,
        pt: gpt,
        nmaps: 3.0,
        nintt: 2.0,
        ntpc: 40.0,
        nmms: 1.0,
        nhits: 46.0,
        layers: 50.0,
        dca3dxysigma: 1.0,
        dca3dzsigma: 1.0,
        ..TruthRow::default()
    }
}

/// 200 normal tracks with delta-pt/pt spread over the scan range, plus 20
/// weird ones (reco pt five times the truth pt) with tiny delta-pt, so that
/// every threshold keeps all of them.
fn synthetic_tracks() -> Vec<TrackRow> {
    let mut tracks = vec![];
    for i in 0..200 {
        let pt = 1.05 + (i % 10) as f32 * 0.1;
        let delta = 0.0015 + 0.004 * (i % 100) as f32;
        tracks.push(good_track(pt, pt, delta * pt));
    }
    for _ in 0..20 {
        tracks.push(good_track(5.0, 1.05, 5.0 * 0.005));
    }
    tracks
}

fn synthetic_truth() -> Vec<TruthRow> {
    let mut truth = vec![];
    for i in 0..400 {
        truth.push(primary(1.05 + (i % 10) as f32 * 0.1));
    }
    for _ in 0..50 {
        truth.push(TruthRow { gpt: 1.05, gprimary: 0.0, ..TruthRow::default() });
    }
    truth
}

fn write_input(path: &std::path::Path) -> BoxErr<()> {
    let file = hdf5::File::create(path)?;
    file.new_dataset_builder().with_data(&synthetic_tracks()).create("ntp_track")?;
    file.new_dataset_builder().with_data(&synthetic_truth()).create("ntp_gtrack")?;
    Ok(())
}

#[test]
fn study_over_synthetic_sample() -> BoxErr<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("tracks.h5");
    let output = dir.path().join("study.h5");
    write_input(&input)?;

    let tracks = read_table::<TrackRow>(&input, "ntp_track", Bounds::none())?;
    let truth = read_table::<TruthRow>(&input, "ntp_gtrack", Bounds::none())?;
    assert_eq!(tracks.len(), 220);
    assert_eq!(truth.len(), 450);

    let mut study = CutStudy::new(TrackCuts::baseline(), WeirdBand::default(), false);
    for trk in &tracks { study.process_track(trk) }
    for tru in &truth { study.process_truth(tru) }

    let counts = study.counts();
    assert_eq!(counts.tracks, 220);
    assert_eq!(counts.accepted, 220);
    assert_eq!(counts.normal, 200);
    assert_eq!(counts.weird, 20);
    assert_eq!(counts.rejection(), 10.0);
    assert_eq!(counts.primary, 400);

    study.write(&hdf5::File::create(&output)?)?;

    // every track fills the pt histogram exactly once
    let pt = read_h1(&output, "tracks/pt")?;
    assert_eq!(pt.integral(), 220.0);
    let cut_pt = read_h1(&output, "cut_tracks/pt")?;
    assert_eq!(cut_pt.integral(), 220.0);

    // the hit-fraction family fills too, and the matched-block truth
    // family sees every reconstructed primary
    assert_eq!(read_h1(&output, "tracks/per_tpc")?.integral(), 220.0);
    assert_eq!(read_h1(&output, "truth/matched/pt")?.integral(), 400.0);

    // all 20 weird tracks pass the cuts in this sample
    assert_eq!(read_h1(&output, "weird/pt")?.integral(), 20.0);
    assert_eq!(read_h1(&output, "cut_weird/pt")?.integral(), 20.0);

    // efficiencies are genuine fractions
    let eff = read_h1(&output, "efficiency/tracks")?;
    assert!(eff.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    // 20 normal + 20 weird tracks match a truth pt of 1.05, and that bin
    // holds 40 primaries
    assert_eq!(eff.values[10], 1.0);
    assert_eq!(read_h1(&output, "truth/primary_pt")?.integral(), 400.0);
    Ok(())
}

#[test]
fn scan_over_synthetic_sample() -> BoxErr<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("tracks.h5");
    let output = dir.path().join("scan.h5");
    write_input(&input)?;

    let tracks = read_table::<TrackRow>(&input, "ntp_track", Bounds::none())?;
    let truth = read_table::<TruthRow>(&input, "ntp_gtrack", Bounds::none())?;

    let thresholds = [0.5, 0.25, 0.10, 0.05, 0.03, 0.02, 0.01];
    let mut scan = DeltaPtScan::new(TrackCuts::baseline(), WeirdBand::default(), &thresholds)?;
    for trk in &tracks { scan.process_track(trk) }
    for tru in &truth { scan.process_truth(tru) }

    // every threshold keeps all 20 weird tracks; the loosest keeps all
    // normal tracks as well
    let counts: Vec<_> = scan.counts().collect();
    assert!(counts.iter().all(|&(_, _, w)| w == 20));
    assert_eq!(counts.last(), Some(&(0.5, 200, 20)));

    let rejection = scan.rejection_factors();
    for pair in rejection.windows(2) {
        assert!(pair[1].1 >= pair[0].1);
    }
    assert_eq!(rejection.last().map(|&(_, r)| r), Some(10.0));

    scan.write(&hdf5::File::create(&output)?)?;

    let eff = read_h1(&output, "efficiency/inclusive")?;
    assert!(eff.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    let delta = read_h1(&output, "inclusive/delta_pt")?;
    assert_eq!(delta.integral(), 220.0);
    Ok(())
}
