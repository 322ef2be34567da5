use std::path::PathBuf;

use clap::Parser;

use trackcut::BoxErr;
use trackcut::hist::H1;
use trackcut::io::hdf5::{read_h1, write_h1};

#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "histratio",
    about = "Divide stored histograms by a common denominator",
)]
pub struct Cli {

    /// In-file group paths of the numerator histograms, e.g. 'cut_tracks/pt'
    #[clap(required = true)]
    pub num: Vec<String>,

    /// HDF5 file holding the numerators
    #[clap(short, long)]
    pub file: PathBuf,

    /// In-file group path of the denominator histogram
    #[clap(long)]
    pub den: String,

    /// File holding the denominator, when not the numerator file
    #[clap(long)]
    pub den_file: Option<PathBuf>,

    /// Output file for the ratios
    #[clap(short, long)]
    pub out: PathBuf,

    /// Merge groups of this many adjacent bins before dividing
    #[clap(long, default_value = "1")]
    pub rebin: usize,

    /// Scale numerators and denominator to unit integral before dividing
    #[clap(long)]
    pub normalise: bool,
}

fn main() -> BoxErr<()> {
    let cli = Cli::parse();
    let prepare = |h: H1| {
        let h = h.rebin(cli.rebin);
        if cli.normalise { h.normalised() } else { h }
    };

    let den_file = cli.den_file.as_ref().unwrap_or(&cli.file);
    let den = prepare(read_h1(den_file, &cli.den)?);

    let out = hdf5::File::create(&cli.out)?;
    let group = out.create_group("ratios")?;
    write_h1(&group, "denominator", &den)?;
    for path in &cli.num {
        let num = prepare(read_h1(&cli.file, path)?);
        let ratio = num.divide(&den)?;
        write_h1(&group, &path.replace('/', "_"), &ratio)?;
        println!("{path} / {}: integral {:.3}", cli.den, ratio.integral());
    }
    Ok(())
}
