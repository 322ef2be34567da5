use std::path::PathBuf;

use clap::Parser;
use indicatif::ProgressBar;

use trackcut::BoxErr;
use trackcut::config::{read_config_file, Bounds};
use trackcut::io::hdf5::{read_table, TrackRow, TruthRow};
use trackcut::scan::DeltaPtScan;
use trackcut::utils::{group_digits, parse_bounds, timing::Stopwatch};

#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "dptscan",
    about = "Scan delta-pt/pt thresholds for weird-track rejection",
)]
pub struct Cli {

    /// TOML configuration file
    pub config: PathBuf,

    /// Override the input file named in the config
    #[clap(short, long)]
    pub input: Option<PathBuf>,

    /// Override the output file named in the config
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Row range to process, e.g. '1000..2000'
    #[clap(short, long, value_parser = parse_bounds)]
    pub events: Option<Bounds<usize>>,
}

fn main() -> BoxErr<()> {
    let cli = Cli::parse();
    let mut config = read_config_file(&cli.config)?;
    if let Some(file)   = cli.input  { config.input.file   = file   }
    if let Some(file)   = cli.out    { config.output       = file   }
    if let Some(events) = cli.events { config.input.events = events }
    let input = &config.input;

    let mut timer = Stopwatch::new();
    timer.start(&format!("Reading tables from {}", input.file.display()));
    let tracks = read_table::<TrackRow>(&input.file, &input.track_dataset, input.events)?;
    let truth  = read_table::<TruthRow>(&input.file, &input.truth_dataset, input.events)?;
    timer.done();

    let mut scan = DeltaPtScan::new(config.cuts, config.weird, &config.scan.thresholds)?;

    let progress = ProgressBar::new((tracks.len() + truth.len()) as u64);
    for trk in &tracks { scan.process_track(trk); progress.inc(1); }
    for tru in &truth  { scan.process_truth(tru); progress.inc(1); }
    progress.finish_and_clear();

    println!("delta-pt/pt       normal        weird    rejection");
    for ((threshold, normal, weird), (_, rejection)) in
        scan.counts().zip(scan.rejection_factors())
    {
        println!("{threshold:>11.2} {:>12} {:>12} {rejection:>12.3}",
                 group_digits(normal), group_digits(weird));
    }

    timer.start(&format!("Writing histograms to {}", config.output.display()));
    let file = hdf5::File::create(&config.output)?;
    scan.write(&file)?;
    timer.done();
    Ok(())
}
