//! HDF5 row tables and histogram (de)serialisation.
//!
//! The evaluator writes one row per reconstructed track (`ntp_track`) and one
//! row per simulated particle (`ntp_gtrack`), every column a 32-bit float.
//! The row structs below mirror those tables field for field, so a whole
//! table can be read as a compound dataset in one call.

use std::path::Path;

use ndarray::{s, Array1, Array2};

use crate::config::Bounds;
use crate::hist::{H1, H2};

/// Read `dataset` from `filename`, optionally restricted to a row range.
pub fn read_table<T: hdf5::H5Type>(
    filename: &dyn AsRef<Path>,
    dataset: &str,
    rows: Bounds<usize>,
) -> hdf5::Result<Array1<T>> {
    let file = hdf5::File::open(filename)?;
    let dataset = file.dataset(dataset)?;
    let Bounds { min, max } = rows;
    let data = match (min, max) {
        (None    , None    ) => dataset.read_slice_1d::<T,_>(s![  ..  ])?,
        (Some(lo), None    ) => dataset.read_slice_1d::<T,_>(s![lo..  ])?,
        (None    , Some(hi)) => dataset.read_slice_1d::<T,_>(s![  ..hi])?,
        (Some(lo), Some(hi)) => dataset.read_slice_1d::<T,_>(s![lo..hi])?,
    };
    Ok(data)
}

/// One row of the reconstructed-track table. Fields ending in `sigma` are
/// uncertainties on the preceding quantity; the `g`-prefixed block mirrors
/// the truth particle matched to this track.
#[derive(hdf5::H5Type, Clone, PartialEq, Debug, Default)]
#[repr(C)]
pub struct TrackRow {
    pub event: f32,
    pub seed: f32,
    pub trackid: f32,
    pub crossing: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub deltapt: f32,
    pub deltaeta: f32,
    pub deltaphi: f32,
    pub charge: f32,
    pub quality: f32,
    pub chisq: f32,
    pub ndf: f32,
    pub nhits: f32,
    pub nmaps: f32,
    pub nintt: f32,
    pub ntpc: f32,
    pub nmms: f32,
    pub ntpc1: f32,
    pub ntpc11: f32,
    pub ntpc2: f32,
    pub ntpc3: f32,
    pub nlmaps: f32,
    pub nlintt: f32,
    pub nltpc: f32,
    pub nlmms: f32,
    pub layers: f32,
    pub vertexid: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub dca2d: f32,
    pub dca2dsigma: f32,
    pub dca3dxy: f32,
    pub dca3dxysigma: f32,
    pub dca3dz: f32,
    pub dca3dzsigma: f32,
    pub pcax: f32,
    pub pcay: f32,
    pub pcaz: f32,
    pub gtrackid: f32,
    pub gflavor: f32,
    pub gnhits: f32,
    pub gnmaps: f32,
    pub gnintt: f32,
    pub gntpc: f32,
    pub gnmms: f32,
    pub gnlmaps: f32,
    pub gnlintt: f32,
    pub gnltpc: f32,
    pub gnlmms: f32,
    pub gpx: f32,
    pub gpy: f32,
    pub gpz: f32,
    pub gpt: f32,
    pub geta: f32,
    pub gphi: f32,
    pub gvx: f32,
    pub gvy: f32,
    pub gvz: f32,
    pub gvt: f32,
    pub gfpx: f32,
    pub gfpy: f32,
    pub gfpz: f32,
    pub gfx: f32,
    pub gfy: f32,
    pub gfz: f32,
    pub gembed: f32,
    pub gprimary: f32,
    pub nfromtruth: f32,
    pub nwrong: f32,
    pub ntrumaps: f32,
    pub ntruintt: f32,
    pub ntrutpc: f32,
    pub ntrumms: f32,
    pub ntrutpc1: f32,
    pub ntrutpc11: f32,
    pub ntrutpc2: f32,
    pub ntrutpc3: f32,
    pub layersfromtruth: f32,
    pub nhittpcall: f32,
    pub nhittpcin: f32,
    pub nhittpcmid: f32,
    pub nhittpcout: f32,
    pub nclusall: f32,
    pub nclustpc: f32,
    pub nclusintt: f32,
    pub nclusmaps: f32,
    pub nclusmms: f32,
}

/// One row of the truth-particle table. The unprefixed reco block describes
/// the best-matched reconstructed track, when there is one.
#[derive(hdf5::H5Type, Clone, PartialEq, Debug, Default)]
#[repr(C)]
pub struct TruthRow {
    pub event: f32,
    pub seed: f32,
    pub gntracks: f32,
    pub gtrackid: f32,
    pub gflavor: f32,
    pub gnhits: f32,
    pub gnmaps: f32,
    pub gnintt: f32,
    pub gnmms: f32,
    pub gnintt1: f32,
    pub gnintt2: f32,
    pub gnintt3: f32,
    pub gnintt4: f32,
    pub gnintt5: f32,
    pub gnintt6: f32,
    pub gnintt7: f32,
    pub gnintt8: f32,
    pub gntpc: f32,
    pub gnlmaps: f32,
    pub gnlintt: f32,
    pub gnltpc: f32,
    pub gnlmms: f32,
    pub gpx: f32,
    pub gpy: f32,
    pub gpz: f32,
    pub gpt: f32,
    pub geta: f32,
    pub gphi: f32,
    pub gvx: f32,
    pub gvy: f32,
    pub gvz: f32,
    pub gvt: f32,
    pub gfpx: f32,
    pub gfpy: f32,
    pub gfpz: f32,
    pub gfx: f32,
    pub gfy: f32,
    pub gfz: f32,
    pub gembed: f32,
    pub gprimary: f32,
    pub trackid: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub deltapt: f32,
    pub deltaeta: f32,
    pub deltaphi: f32,
    pub charge: f32,
    pub quality: f32,
    pub chisq: f32,
    pub ndf: f32,
    pub nhits: f32,
    pub layers: f32,
    pub nmaps: f32,
    pub nintt: f32,
    pub ntpc: f32,
    pub nmms: f32,
    pub ntpc1: f32,
    pub ntpc11: f32,
    pub ntpc2: f32,
    pub ntpc3: f32,
    pub nlmaps: f32,
    pub nlintt: f32,
    pub nltpc: f32,
    pub nlmms: f32,
    pub vertexid: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub dca2d: f32,
    pub dca2dsigma: f32,
    pub dca3dxy: f32,
    pub dca3dxysigma: f32,
    pub dca3dz: f32,
    pub dca3dzsigma: f32,
    pub pcax: f32,
    pub pcay: f32,
    pub pcaz: f32,
    pub nfromtruth: f32,
    pub nwrong: f32,
    pub ntrumaps: f32,
    pub ntruintt: f32,
    pub ntrutpc: f32,
    pub ntrumms: f32,
    pub ntrutpc1: f32,
    pub ntrutpc11: f32,
    pub ntrutpc2: f32,
    pub ntrutpc3: f32,
    pub layersfromtruth: f32,
    pub nhittpcall: f32,
    pub nhittpcin: f32,
    pub nhittpcmid: f32,
    pub nhittpcout: f32,
    pub nclusall: f32,
    pub nclustpc: f32,
    pub nclusintt: f32,
    pub nclusmaps: f32,
    pub nclusmms: f32,
}

// ----- histogram (de)serialisation ---------------------------------------------------------

/// Write `h` as a group holding `edges` and `values` datasets.
pub fn write_h1(parent: &hdf5::Group, name: &str, h: &H1) -> hdf5::Result<()> {
    let group = parent.create_group(name)?;
    group.new_dataset_builder().with_data(&h.edges ).create("edges" )?;
    group.new_dataset_builder().with_data(&h.values).create("values")?;
    Ok(())
}

/// Write `h` as a group holding `x_edges`, `y_edges` and a 2-D `values` dataset.
pub fn write_h2(parent: &hdf5::Group, name: &str, h: &H2) -> hdf5::Result<()> {
    let group = parent.create_group(name)?;
    group.new_dataset_builder().with_data(&h.x_edges).create("x_edges")?;
    group.new_dataset_builder().with_data(&h.y_edges).create("y_edges")?;
    let nx = h.x_edges.len() - 1;
    let ny = h.y_edges.len() - 1;
    let values = Array2::from_shape_vec((nx, ny), h.values.clone())
        .map_err(|e| hdf5::Error::from(e.to_string()))?;
    group.new_dataset_builder().with_data(&values).create("values")?;
    Ok(())
}

/// Read a histogram previously written by `write_h1`. `path` is the full
/// in-file group path, e.g. `cut_track/dca_xy`.
pub fn read_h1(filename: &dyn AsRef<Path>, path: &str) -> hdf5::Result<H1> {
    let file = hdf5::File::open(filename)?;
    let group = file.group(path)?;
    let edges  = group.dataset("edges" )?.read_1d::<f64>()?.to_vec();
    let values = group.dataset("values")?.read_1d::<f64>()?.to_vec();
    Ok(H1 { edges, values })
}

pub fn read_h2(filename: &dyn AsRef<Path>, path: &str) -> hdf5::Result<H2> {
    let file = hdf5::File::open(filename)?;
    let group = file.group(path)?;
    let x_edges = group.dataset("x_edges")?.read_1d::<f64>()?.to_vec();
    let y_edges = group.dataset("y_edges")?.read_1d::<f64>()?.to_vec();
    let values  = group.dataset("values" )?.read_2d::<f64>()?.into_iter().collect();
    Ok(H2 { x_edges, y_edges, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn table_roundtrip() -> hdf5::Result<()> {
        let dir = tempfile::tempdir().map_err(|e| hdf5::Error::from(e.to_string()))?;
        let file_path = dir.path().join("tracks.h5");

        let test_data = vec![
            TrackRow { pt: 1.0, gpt: 1.1, vz:  2.0, ..TrackRow::default() },
            TrackRow { pt: 4.5, gpt: 4.0, vz: -7.5, ..TrackRow::default() },
        ];

        hdf5::File::create(&file_path)?
            .new_dataset_builder()
            .with_data(&test_data)
            .create("ntp_track")?;

        let read_back = read_table::<TrackRow>(&file_path, "ntp_track", Bounds::none())?.to_vec();
        assert_eq!(test_data, read_back);

        // row bounds restrict what is loaded
        let tail = read_table::<TrackRow>(
            &file_path, "ntp_track", Bounds { min: Some(1), max: None })?;
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].pt, 4.5);
        Ok(())
    }

    #[test]
    fn histogram_roundtrip() -> hdf5::Result<()> {
        let dir = tempfile::tempdir().map_err(|e| hdf5::Error::from(e.to_string()))?;
        let file_path = dir.path().join("hists.h5");

        let h = H1 { edges: vec![0.0, 1.0, 2.0], values: vec![3.0, 4.0] };
        {
            let file = hdf5::File::create(&file_path)?;
            let group = file.create_group("track")?;
            write_h1(&group, "pt", &h)?;
        }
        let read_back = read_h1(&file_path, "track/pt")?;
        assert_eq!(h, read_back);
        Ok(())
    }

    #[test]
    fn histogram_2d_roundtrip() -> hdf5::Result<()> {
        let dir = tempfile::tempdir().map_err(|e| hdf5::Error::from(e.to_string()))?;
        let file_path = dir.path().join("hists.h5");

        let h = H2 {
            x_edges: vec![0.0, 1.0, 2.0],
            y_edges: vec![0.0, 0.5, 1.0, 1.5],
            values: (0..6).map(|i| i as f64).collect(),
        };
        {
            let file = hdf5::File::create(&file_path)?;
            let group = file.create_group("track")?;
            write_h2(&group, "pt_vs_eta", &h)?;
        }
        let read_back = read_h2(&file_path, "track/pt_vs_eta")?;
        assert_eq!(h, read_back);
        Ok(())
    }
}
