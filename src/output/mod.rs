use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::assemble::{Breakend, BreakpointRecord};
use crate::error::{Error, Result};
use crate::seq::Strand;

pub const FASTA_LINE_WIDTH: usize = 60;

/// Name of the synthetic FASTA record for a run.
pub fn record_name(chromosome: &str, seed: u64, fragments: usize, fragment_size: u64) -> String {
    format!(
        "chromothripsis.{}.seed{}.fragments{}.size{}",
        chromosome, seed, fragments, fragment_size
    )
}

pub fn write_fasta<W: Write>(writer: &mut W, name: &str, sequence: &[u8]) -> io::Result<()> {
    writeln!(writer, ">{}", name)?;
    for line in sequence.chunks(FASTA_LINE_WIDTH) {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Reference facts echoed into the VCF header.
#[derive(Debug, Clone)]
pub struct VcfHeader<'a> {
    pub chromosome: &'a str,
    pub length: u64,
    pub reference: Option<&'a Path>,
}

/// Breakend ALT in VCF bracket notation. `t` is the exit base, the bracket
/// direction comes from the entry strand and its side from the exit strand.
pub fn breakend_alt(exit: &Breakend, entry: &Breakend) -> String {
    let t = exit.base as char;
    let mate = format!("{}:{}", entry.chromosome, entry.position + 1);
    let bracket = match entry.strand {
        Strand::Forward => '[',
        Strand::Reverse => ']',
    };
    match exit.strand {
        Strand::Forward => format!("{t}{bracket}{mate}{bracket}"),
        Strand::Reverse => format!("{bracket}{mate}{bracket}{t}"),
    }
}

pub fn write_vcf<W: Write>(
    writer: &mut W,
    header: &VcfHeader,
    breakpoints: &[BreakpointRecord],
) -> io::Result<()> {
    writeln!(writer, "##fileformat=VCFv4.2")?;
    writeln!(writer, "##source={}-{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    if let Some(reference) = header.reference {
        writeln!(writer, "##reference=file://{}", reference.display())?;
    }
    writeln!(writer, "##contig=<ID={},length={}>", header.chromosome, header.length)?;
    writeln!(
        writer,
        "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">"
    )?;
    writeln!(
        writer,
        "##INFO=<ID=FRAGMENTS,Number=2,Type=Integer,Description=\"Partition indices of the fragments joined at this breakpoint\">"
    )?;
    writeln!(
        writer,
        "##INFO=<ID=STRANDS,Number=1,Type=String,Description=\"Orientation of the exiting and entering fragment\">"
    )?;
    writeln!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")?;

    for (i, bp) in breakpoints.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\tchromothripsis{}\t{}\t{}\t.\tPASS\tSVTYPE=BND;FRAGMENTS={},{};STRANDS={}{}",
            bp.exit.chromosome,
            bp.exit.position + 1,
            i,
            bp.exit.base as char,
            breakend_alt(&bp.exit, &bp.entry),
            bp.from_fragment,
            bp.to_fragment,
            bp.exit.strand,
            bp.entry.strand,
        )?;
    }
    Ok(())
}

/// Destination paths for the sequence and the truth set.
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub fasta: PathBuf,
    pub vcf: PathBuf,
}

fn stage<F>(path: &Path, fill: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(e, dir))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        fill(&mut writer).map_err(|e| Error::io(e, path))?;
        writer.flush().map_err(|e| Error::io(e, path))?;
    }
    debug!("Staged {} at {}", path.display(), tmp.path().display());
    Ok(tmp)
}

impl OutputFiles {
    /// Writes both files next to their destinations and only moves them into
    /// place once both are complete. A failure leaves no output behind.
    pub fn commit(
        &self,
        name: &str,
        sequence: &[u8],
        header: &VcfHeader,
        breakpoints: &[BreakpointRecord],
    ) -> Result<()> {
        for path in [&self.fasta, &self.vcf] {
            if path.is_dir() {
                return Err(Error::io(
                    io::Error::new(io::ErrorKind::AlreadyExists, "destination is a directory"),
                    path,
                ));
            }
        }

        let fasta = stage(&self.fasta, |w| write_fasta(w, name, sequence))?;
        let vcf = stage(&self.vcf, |w| write_vcf(w, header, breakpoints))?;

        fasta
            .persist(&self.fasta)
            .map_err(|e| Error::io(e.error, &self.fasta))?;
        if let Err(e) = vcf.persist(&self.vcf) {
            // a lone FASTA must not pass for a finished run
            if let Err(rm) = fs::remove_file(&self.fasta) {
                warn!("Could not remove {}: {}", self.fasta.display(), rm);
            }
            return Err(Error::io(e.error, &self.vcf));
        }

        info!(
            "Wrote {} bases to {} and {} breakpoints to {}",
            sequence.len(),
            self.fasta.display(),
            breakpoints.len(),
            self.vcf.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakend(position: u64, strand: Strand, base: u8) -> Breakend {
        Breakend {
            chromosome: "chr1".to_string(),
            position,
            strand,
            base,
        }
    }

    fn record(exit: Strand, entry: Strand) -> BreakpointRecord {
        BreakpointRecord {
            exit: breakend(1_999, exit, b'G'),
            entry: breakend(6_000, entry, b'T'),
            from_fragment: 0,
            to_fragment: 3,
        }
    }

    #[test]
    fn record_name_is_deterministic() {
        assert_eq!(
            record_name("chr12", 7, 1000, 2000),
            "chromothripsis.chr12.seed7.fragments1000.size2000"
        );
    }

    #[test]
    fn fasta_wraps_lines() {
        let mut out = Vec::new();
        let seq = vec![b'A'; 130];
        write_fasta(&mut out, "synthetic", &seq).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">synthetic");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn bracket_notation_per_orientation() {
        use Strand::{Forward, Reverse};
        let alts: Vec<String> = [(Forward, Forward), (Forward, Reverse), (Reverse, Forward), (Reverse, Reverse)]
            .iter()
            .map(|&(a, b)| {
                let r = record(a, b);
                breakend_alt(&r.exit, &r.entry)
            })
            .collect();
        assert_eq!(alts, vec!["G[chr1:6001[", "G]chr1:6001]", "[chr1:6001[G", "]chr1:6001]G"]);
    }

    #[test]
    fn vcf_records_keep_derivation_order() {
        let header = VcfHeader {
            chromosome: "chr1",
            length: 10_000,
            reference: Some(Path::new("/ref/hg38.fa")),
        };
        let mut later = record(Strand::Reverse, Strand::Forward);
        later.exit.position = 99;
        let records = vec![record(Strand::Forward, Strand::Reverse), later];

        let mut out = Vec::new();
        write_vcf(&mut out, &header, &records).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("##fileformat=VCFv4.2\n"));
        assert!(text.contains("##contig=<ID=chr1,length=10000>\n"));
        assert!(text.contains("##reference=file:///ref/hg38.fa\n"));
        let body: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            body,
            vec![
                "chr1\t2000\tchromothripsis0\tG\tG]chr1:6001]\t.\tPASS\tSVTYPE=BND;FRAGMENTS=0,3;STRANDS=+-",
                "chr1\t100\tchromothripsis1\tG\t[chr1:6001[G\t.\tPASS\tSVTYPE=BND;FRAGMENTS=0,3;STRANDS=-+",
            ]
        );
    }

    #[test]
    fn commit_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles {
            fasta: dir.path().join("out.fa"),
            vcf: dir.path().join("out.vcf"),
        };
        let header = VcfHeader {
            chromosome: "chr1",
            length: 10_000,
            reference: None,
        };
        files
            .commit("synthetic", b"ACGT", &header, &[record(Strand::Forward, Strand::Forward)])
            .unwrap();

        assert_eq!(std::fs::read_to_string(&files.fasta).unwrap(), ">synthetic\nACGT\n");
        let vcf = std::fs::read_to_string(&files.vcf).unwrap();
        assert_eq!(vcf.lines().filter(|l| !l.starts_with('#')).count(), 1);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn commit_leaves_nothing_when_a_destination_is_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles {
            fasta: dir.path().join("out.fa"),
            vcf: dir.path().join("missing").join("out.vcf"),
        };
        let header = VcfHeader {
            chromosome: "chr1",
            length: 10_000,
            reference: None,
        };
        assert!(files.commit("synthetic", b"ACGT", &header, &[]).is_err());
        assert!(!files.fasta.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn commit_refuses_a_directory_as_vcf_destination() {
        let dir = tempfile::tempdir().unwrap();
        let vcf_dir = dir.path().join("out.vcf");
        std::fs::create_dir(&vcf_dir).unwrap();
        std::fs::write(vcf_dir.join("keep.txt"), b"x").unwrap();
        let files = OutputFiles {
            fasta: dir.path().join("out.fa"),
            vcf: vcf_dir.clone(),
        };
        let header = VcfHeader {
            chromosome: "chr1",
            length: 10_000,
            reference: None,
        };

        assert!(matches!(
            files.commit("synthetic", b"ACGT", &header, &[]),
            Err(Error::Io { .. })
        ));
        assert!(!files.fasta.exists());
        assert!(vcf_dir.join("keep.txt").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
