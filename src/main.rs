use std::path::PathBuf;
use std::process;

use log::{error, info};
use structopt::StructOpt;

use shatter::logger;
use shatter::sim::{self, SimulationConfig};

#[derive(Debug, StructOpt)]
#[structopt(name = "shatter", about = "Shatters a chromosome into fragments of the given size, and randomly reassembles a subset of them")]
struct Opt {
    /// Reference genome FASTA
    #[structopt(short, long, parse(from_os_str))]
    reference: PathBuf,

    /// Chromosome to shatter
    #[structopt(short, long)]
    chr: String,

    /// Bases at each chromosome end left out of the rearrangement
    #[structopt(short, long, default_value = "10000")]
    padding: u64,

    /// Number of genomic fragments to assemble
    #[structopt(short = "n", long, default_value = "1000")]
    fragments: usize,

    /// Size of each fragment
    #[structopt(short = "s", long, default_value = "2000")]
    fragment_size: u64,

    /// Random seed
    #[structopt(long, default_value = "0")]
    seed: u64,

    /// Frame the rearranged sequence with the untouched flanking reference
    #[structopt(long)]
    include_reference: bool,

    /// Uncompressed RepeatMasker output; one side of each fragment will be the given repeat
    #[structopt(long = "repeatmasker", alias = "rm", parse(from_os_str))]
    repeatmasker: Option<PathBuf>,

    /// Repeat class/family as output by RepeatMasker
    #[structopt(long = "class-family", alias = "cf", default_value = "SINE/Alu")]
    class_family: String,

    /// Output FASTA for the rearranged sequence
    #[structopt(short, long, parse(from_os_str))]
    fasta: PathBuf,

    /// Output VCF with the breakpoint truth set
    #[structopt(short, long, parse(from_os_str))]
    vcf: PathBuf,

    /// Debug logging
    #[structopt(long)]
    verbose: bool,
}

impl From<Opt> for SimulationConfig {
    fn from(opt: Opt) -> Self {
        SimulationConfig {
            reference: opt.reference,
            chromosome: opt.chr,
            padding: opt.padding,
            fragment_size: opt.fragment_size,
            fragments: opt.fragments,
            seed: opt.seed,
            include_reference: opt.include_reference,
            repeatmasker: opt.repeatmasker,
            class_family: opt.class_family,
            fasta: opt.fasta,
            vcf: opt.vcf,
        }
    }
}

fn main() {
    let opt = Opt::from_args();
    if let Err(e) = logger::init_logger(logger::level_for(opt.verbose)) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let config = SimulationConfig::from(opt);
    match sim::run(&config) {
        Ok(summary) => {
            info!(
                "{}: placed {} of {} fragments, {} breakpoints, {} bases",
                summary.record_name,
                summary.placed,
                summary.pool,
                summary.breakpoints,
                summary.sequence_len
            );
        }
        Err(e) => {
            error!("{} (chromosome {}, fragment size {}, fragments {}, seed {})",
                   e, config.chromosome, config.fragment_size, config.fragments, config.seed);
            process::exit(1);
        }
    }
}
