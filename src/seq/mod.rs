use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::Mmap;

use crate::error::{Error, Result};

/// Orientation a fragment is inserted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Read access to a reference genome. Coordinates are 0-based, half-open.
pub trait GenomeAccess {
    fn length(&self, chromosome: &str) -> Result<u64>;
    fn sequence(&self, chromosome: &str, start: u64, end: u64) -> Result<Vec<u8>>;
}

struct Complementer;
trait Complement {
    fn complement(&self, value: u8) -> u8;
}

impl Complement for Complementer {
    fn complement(&self, value: u8) -> u8 {
        match value {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'a' => b't',
            b'c' => b'g',
            b'g' => b'c',
            b't' => b'a',
            // IUPAC ambiguity codes
            b'R' => b'Y',
            b'Y' => b'R',
            b'K' => b'M',
            b'M' => b'K',
            b'B' => b'V',
            b'V' => b'B',
            b'D' => b'H',
            b'H' => b'D',
            b'r' => b'y',
            b'y' => b'r',
            b'k' => b'm',
            b'm' => b'k',
            b'b' => b'v',
            b'v' => b'b',
            b'd' => b'h',
            b'h' => b'd',
            other => other, // N, S, W and gaps are self-complementary
        }
    }
}

pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    static COMPLEMENTER: Complementer = Complementer;
    sequence
        .iter()
        .rev()
        .map(|&b| COMPLEMENTER.complement(b))
        .collect()
}

fn check_range(chromosome: &str, start: u64, end: u64, length: u64) -> Result<()> {
    if start > end || end > length {
        return Err(Error::Fasta(format!(
            "requested {}:{}-{} outside chromosome of length {}",
            chromosome, start, end, length
        )));
    }
    Ok(())
}

/// Chromosomes held fully in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGenome {
    chromosomes: HashMap<String, Vec<u8>>,
}

impl InMemoryGenome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bases: impl Into<Vec<u8>>) {
        self.chromosomes.insert(name.into(), bases.into());
    }

    fn bases(&self, chromosome: &str) -> Result<&[u8]> {
        self.chromosomes
            .get(chromosome)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownChromosome(chromosome.to_string()))
    }
}

impl GenomeAccess for InMemoryGenome {
    fn length(&self, chromosome: &str) -> Result<u64> {
        Ok(self.bases(chromosome)?.len() as u64)
    }

    fn sequence(&self, chromosome: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let bases = self.bases(chromosome)?;
        check_range(chromosome, start, end, bases.len() as u64)?;
        Ok(bases[start as usize..end as usize].to_vec())
    }
}

/// Location of one FASTA record inside the mapped file, as in a `.fai` index.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    bases: u64,
    offset: usize,
    line_bases: u64,
    line_width: u64,
}

#[derive(Debug)]
struct EntryBuilder {
    name: String,
    entry: IndexEntry,
    short_line_seen: bool,
}

/// Memory-mapped FASTA reference with random access through a faidx-style index.
///
/// Every line of a record must carry the same number of bases except the last.
pub struct FastaReference {
    path: PathBuf,
    mmap: Mmap,
    index: HashMap<String, IndexEntry>,
    names: Vec<String>,
}

impl FastaReference {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        // SAFETY: the reference is opened read-only and not expected to change
        // while the simulation runs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(e, path))?;
        let (index, names) = build_index(&mmap, path)?;
        debug!("Indexed {} records in {}", names.len(), path.display());
        Ok(FastaReference {
            path: path.to_path_buf(),
            mmap,
            index,
            names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn entry(&self, chromosome: &str) -> Result<&IndexEntry> {
        self.index
            .get(chromosome)
            .ok_or_else(|| Error::UnknownChromosome(chromosome.to_string()))
    }
}

impl GenomeAccess for FastaReference {
    fn length(&self, chromosome: &str) -> Result<u64> {
        Ok(self.entry(chromosome)?.bases)
    }

    fn sequence(&self, chromosome: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let entry = self.entry(chromosome)?;
        check_range(chromosome, start, end, entry.bases)?;

        let mut out = Vec::with_capacity((end - start) as usize);
        let mut i = start;
        while i < end {
            let column = i % entry.line_bases;
            let take = (entry.line_bases - column).min(end - i);
            let at = entry.offset + ((i / entry.line_bases) * entry.line_width + column) as usize;
            out.extend_from_slice(&self.mmap[at..at + take as usize]);
            i += take;
        }
        Ok(out)
    }
}

fn finish(
    builder: Option<EntryBuilder>,
    index: &mut HashMap<String, IndexEntry>,
    names: &mut Vec<String>,
    path: &Path,
) -> Result<()> {
    if let Some(b) = builder {
        if index.insert(b.name.clone(), b.entry).is_some() {
            return Err(Error::Fasta(format!(
                "duplicate record '{}' in {}",
                b.name,
                path.display()
            )));
        }
        names.push(b.name);
    }
    Ok(())
}

fn build_index(data: &[u8], path: &Path) -> Result<(HashMap<String, IndexEntry>, Vec<String>)> {
    let mut index = HashMap::new();
    let mut names = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut pos = 0;
    let mut line_num = 0;

    while pos < data.len() {
        line_num += 1;
        let line_end = data[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(data.len(), |i| pos + i);
        let raw = &data[pos..line_end];
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        let next = (line_end + 1).min(data.len());

        if let Some(header) = line.strip_prefix(b">") {
            finish(current.take(), &mut index, &mut names, path)?;
            let name = String::from_utf8_lossy(header)
                .split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Fasta(format!(
                        "empty record name at {}:{}",
                        path.display(),
                        line_num
                    ))
                })?;
            current = Some(EntryBuilder {
                name,
                entry: IndexEntry {
                    bases: 0,
                    offset: next,
                    line_bases: 0,
                    line_width: 0,
                },
                short_line_seen: false,
            });
        } else if let Some(b) = current.as_mut() {
            let n = line.len() as u64;
            if n > 0 && b.short_line_seen {
                return Err(Error::Fasta(format!(
                    "record '{}' has uneven line lengths at {}:{}",
                    b.name,
                    path.display(),
                    line_num
                )));
            }
            if b.entry.line_bases == 0 {
                b.entry.line_bases = n;
                b.entry.line_width = raw.len() as u64 + 1;
            } else if n > b.entry.line_bases {
                return Err(Error::Fasta(format!(
                    "record '{}' has uneven line lengths at {}:{}",
                    b.name,
                    path.display(),
                    line_num
                )));
            }
            if n < b.entry.line_bases || n == 0 {
                b.short_line_seen = true;
            }
            b.entry.bases += n;
        } else if !line.is_empty() {
            return Err(Error::Fasta(format!(
                "sequence data before first header at {}:{}",
                path.display(),
                line_num
            )));
        }

        if line_end == data.len() {
            break;
        }
        pos = next;
    }
    finish(current, &mut index, &mut names, path)?;

    if names.is_empty() {
        return Err(Error::Fasta(format!("no records in {}", path.display())));
    }
    Ok((index, names))
}
