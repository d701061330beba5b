use std::path::PathBuf;

use log::info;

use crate::assemble::{Assembler, Assembly, SelectionPolicy};
use crate::error::{Error, Result};
use crate::fragment::{ChromosomeRegion, Fragment, Partitioner, RepeatAnchoredPartitioner, UniformPartitioner};
use crate::output::{record_name, OutputFiles, VcfHeader};
use crate::random::RandomSource;
use crate::repeat::{AnnotationSource, RepeatMaskerAnnotations};
use crate::seq::{FastaReference, GenomeAccess};

pub const DEFAULT_PADDING: u64 = 10_000;
pub const DEFAULT_FRAGMENTS: usize = 1_000;
pub const DEFAULT_FRAGMENT_SIZE: u64 = 2_000;
pub const DEFAULT_CLASS_FAMILY: &str = "SINE/Alu";

/// Everything a chromothripsis run is parameterised by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Reference FASTA
    pub reference: PathBuf,
    pub chromosome: String,
    /// Bases left untouched at each chromosome end
    pub padding: u64,
    pub fragment_size: u64,
    /// Number of fragments to reassemble
    pub fragments: usize,
    pub seed: u64,
    /// Frame the rearranged sequence with the untouched flanking reference
    pub include_reference: bool,
    /// RepeatMasker `.out` file; when set every fragment starts at a repeat
    pub repeatmasker: Option<PathBuf>,
    pub class_family: String,
    pub fasta: PathBuf,
    pub vcf: PathBuf,
}

impl SimulationConfig {
    pub fn new(
        reference: impl Into<PathBuf>,
        chromosome: impl Into<String>,
        fasta: impl Into<PathBuf>,
        vcf: impl Into<PathBuf>,
    ) -> Self {
        SimulationConfig {
            reference: reference.into(),
            chromosome: chromosome.into(),
            padding: DEFAULT_PADDING,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            fragments: DEFAULT_FRAGMENTS,
            seed: 0,
            include_reference: false,
            repeatmasker: None,
            class_family: DEFAULT_CLASS_FAMILY.to_string(),
            fasta: fasta.into(),
            vcf: vcf.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chromosome.is_empty() {
            return Err(Error::Config("chromosome name is empty".to_string()));
        }
        if self.fragment_size == 0 {
            return Err(Error::Config("fragment size must be positive".to_string()));
        }
        if self.fragments == 0 {
            return Err(Error::Config("fragment count must be positive".to_string()));
        }
        if self.repeatmasker.is_some() && self.class_family.is_empty() {
            return Err(Error::Config(
                "repeat class/family is required with a RepeatMasker file".to_string(),
            ));
        }
        if self.fasta == self.vcf {
            return Err(Error::Config(format!(
                "FASTA and VCF outputs both point at {}",
                self.fasta.display()
            )));
        }
        Ok(())
    }

    pub fn record_name(&self) -> String {
        record_name(&self.chromosome, self.seed, self.fragments, self.fragment_size)
    }
}

/// Output of the in-memory pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub region: ChromosomeRegion,
    pub pool: Vec<Fragment>,
    pub assembly: Assembly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub record_name: String,
    pub region: ChromosomeRegion,
    pub pool: usize,
    pub placed: usize,
    pub breakpoints: usize,
    pub sequence_len: usize,
}

/// Partitions and reassembles one chromosome without touching the filesystem.
/// Uniform tiling is used unless `annotations` are given.
pub fn simulate<G: GenomeAccess + ?Sized>(
    config: &SimulationConfig,
    genome: &G,
    annotations: Option<&dyn AnnotationSource>,
    selection: SelectionPolicy,
) -> Result<Simulation> {
    config.validate()?;

    let length = genome.length(&config.chromosome)?;
    let region = ChromosomeRegion::padded(&config.chromosome, length, config.padding, config.fragment_size)?;

    let partitioner: Box<dyn Partitioner + '_> = match annotations {
        Some(annotations) => Box::new(RepeatAnchoredPartitioner::new(annotations, config.class_family.as_str())),
        None => Box::new(UniformPartitioner),
    };
    let pool = partitioner.partition(&region, config.fragment_size)?;

    let mut rng = RandomSource::new(config.seed);
    let assembly = Assembler::new(selection).assemble(
        &pool,
        config.fragments,
        config.include_reference,
        genome,
        &mut rng,
    )?;

    Ok(Simulation {
        region,
        pool,
        assembly,
    })
}

/// Full run: reads the inputs named in `config` and writes both outputs.
pub fn run(config: &SimulationConfig) -> Result<SimulationSummary> {
    config.validate()?;
    info!(
        "Shattering {} from {} (seed {})",
        config.chromosome,
        config.reference.display(),
        config.seed
    );

    let reference = FastaReference::open(&config.reference)?;
    let annotations = config
        .repeatmasker
        .as_ref()
        .map(RepeatMaskerAnnotations::from_path)
        .transpose()?;

    let simulation = simulate(
        config,
        &reference,
        annotations.as_ref().map(|a| a as &dyn AnnotationSource),
        SelectionPolicy::default(),
    )?;

    let name = config.record_name();
    let header = VcfHeader {
        chromosome: &config.chromosome,
        length: reference.length(&config.chromosome)?,
        reference: Some(reference.path()),
    };
    let outputs = OutputFiles {
        fasta: config.fasta.clone(),
        vcf: config.vcf.clone(),
    };
    let assembly = &simulation.assembly;
    outputs.commit(&name, &assembly.sequence, &header, &assembly.breakpoints)?;

    Ok(SimulationSummary {
        record_name: name,
        region: simulation.region,
        pool: simulation.pool.len(),
        placed: assembly.plan.len(),
        breakpoints: assembly.breakpoints.len(),
        sequence_len: assembly.sequence.len(),
    })
}
