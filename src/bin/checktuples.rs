use std::fs;
use std::path::PathBuf;

use clap::Parser;

use trackcut::BoxErr;
use trackcut::config::Bounds;
use trackcut::hist::{BookedH1, Variable};
use trackcut::io::hdf5::{read_table, write_h1, TrackRow, TruthRow};
use trackcut::utils::group_digits;

#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "checktuples",
    about = "Verify that a batch of evaluator files is readable and non-empty",
)]
pub struct Cli {

    /// HDF5 files to check
    pub infiles: Vec<PathBuf>,

    /// Optional output file for the combined pt histogram of the good files
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Track dataset expected in each file
    #[clap(long, default_value = "ntp_track")]
    pub track_dataset: String,

    /// Truth dataset expected in each file
    #[clap(long, default_value = "ntp_gtrack")]
    pub truth_dataset: String,

    /// Write the names of the usable files here, one per line
    #[clap(long)]
    pub good_list: Option<PathBuf>,

    /// Write the names of the unusable files here, one per line
    #[clap(long)]
    pub bad_list: Option<PathBuf>,
}

/// A file is usable when both datasets can be read and the track table is
/// not empty.
fn check(cli: &Cli, file: &PathBuf, pt: &mut BookedH1) -> Result<usize, String> {
    let tracks = read_table::<TrackRow>(file, &cli.track_dataset, Bounds::none())
        .map_err(|e| e.to_string())?;
    read_table::<TruthRow>(file, &cli.truth_dataset, Bounds::none())
        .map_err(|e| e.to_string())?;
    if tracks.is_empty() { return Err("empty track table".into()) }
    for row in &tracks { pt.fill(row.pt) }
    Ok(tracks.len())
}

fn write_list(path: &Option<PathBuf>, files: &[&PathBuf]) -> BoxErr<()> {
    if let Some(path) = path {
        let lines = files.iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(path, lines + "\n")?;
    }
    Ok(())
}

fn main() -> BoxErr<()> {
    let cli = Cli::parse();

    let mut good = vec![];
    let mut bad  = vec![];
    let mut pt = BookedH1::new(Variable::Pt.binning());

    for file in &cli.infiles {
        match check(&cli, file, &mut pt) {
            Ok(n_rows) => {
                println!("{:>12} rows  {}", group_digits(n_rows), file.display());
                good.push(file);
            }
            Err(reason) => {
                println!("BAD  {}: {reason}", file.display());
                bad.push(file);
            }
        }
    }
    println!("{} of {} files are usable", good.len(), cli.infiles.len());

    write_list(&cli.good_list, &good)?;
    write_list(&cli.bad_list, &bad)?;

    if let Some(out) = &cli.out {
        let file = hdf5::File::create(out)?;
        let group = file.create_group("checked")?;
        write_h1(&group, "pt", &pt.export())?;
        println!("Combined pt histogram written to {}", out.display());
    }

    if bad.is_empty() { Ok(()) } else { Err("Some input files are unusable".into()) }
}
