use std::path::PathBuf;

use clap::Parser;
use indicatif::ProgressBar;

use trackcut::BoxErr;
use trackcut::config::{read_config_file, Bounds};
use trackcut::io::hdf5::{read_table, TrackRow, TruthRow};
use trackcut::study::CutStudy;
use trackcut::utils::{group_digits, parse_bounds, timing::Stopwatch};

#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "cutstudy",
    about = "Histogram every track variable before and after the quality cuts",
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

    let pileup = match &input.pileup_file {
        Some(file) => {
            timer.start(&format!("Reading pileup table from {}", file.display()));
            let rows = read_table::<TruthRow>(file, &input.truth_dataset, input.events)?;
            timer.done();
            Some(rows)
        }
        None => None,
    };

    let mut study = CutStudy::new(config.cuts, config.weird, pileup.is_some());

    let n_rows = tracks.len() + truth.len() + pileup.as_ref().map_or(0, |p| p.len());
    let progress = ProgressBar::new(n_rows as u64);
    for trk in &tracks { study.process_track(trk); progress.inc(1); }
    for tru in &truth  { study.process_truth(tru); progress.inc(1); }
    if let Some(pileup) = &pileup {
        for tru in pileup { study.process_pileup(tru); progress.inc(1); }
    }
    progress.finish_and_clear();
    println!("Processed {} rows", group_digits(n_rows));

    timer.start(&format!("Writing histograms to {}", config.output.display()));
    let file = hdf5::File::create(&config.output)?;
    study.write(&file)?;
    timer.done();

    println!("{}", study.counts());
    Ok(())
}
