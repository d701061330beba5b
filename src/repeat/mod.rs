use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::seq::Strand;

/// An annotated repeat element, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatInterval {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub name: String,
    pub class_family: String,
}

/// Supplies repeat intervals of one class/family, ascending by start.
pub trait AnnotationSource {
    fn intervals(&self, chromosome: &str, class_family: &str) -> Result<Vec<RepeatInterval>>;
}

/// Repeat annotations loaded from RepeatMasker `.out` output.
#[derive(Debug, Default, Clone)]
pub struct RepeatMaskerAnnotations {
    by_chromosome: HashMap<String, Vec<RepeatInterval>>,
}

impl RepeatMaskerAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chromosome: impl Into<String>, interval: RepeatInterval) {
        let list = self.by_chromosome.entry(chromosome.into()).or_default();
        let at = list.partition_point(|r| r.start <= interval.start);
        list.insert(at, interval);
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let annotations = Self::from_reader(BufReader::new(file), path)?;
        info!(
            "Loaded {} repeat annotations from {}",
            annotations.len(),
            path.display()
        );
        Ok(annotations)
    }

    /// Parses RepeatMasker `.out` lines. Column layout:
    /// score, div, del, ins, query, begin, end, (left), strand, repeat, class/family, ...
    /// Header and blank lines are skipped; begin/end are 1-based inclusive.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut by_chromosome: HashMap<String, Vec<RepeatInterval>> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(e, path))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 11 || fields[0].parse::<f64>().is_err() {
                continue;
            }

            let malformed = |what: &str| {
                Error::RepeatMasker(format!(
                    "{} at {}:{}",
                    what,
                    path.display(),
                    line_num + 1
                ))
            };
            let begin: u64 = fields[5]
                .parse()
                .map_err(|_| malformed("invalid begin coordinate"))?;
            let end: u64 = fields[6]
                .parse()
                .map_err(|_| malformed("invalid end coordinate"))?;
            if begin == 0 || end < begin {
                return Err(malformed("empty or inverted interval"));
            }
            let strand = match fields[8] {
                "+" => Strand::Forward,
                "C" | "-" => Strand::Reverse,
                _ => return Err(malformed("invalid strand")),
            };

            by_chromosome
                .entry(fields[4].to_string())
                .or_default()
                .push(RepeatInterval {
                    start: begin - 1,
                    end,
                    strand,
                    name: fields[9].to_string(),
                    class_family: fields[10].to_string(),
                });
        }

        for list in by_chromosome.values_mut() {
            list.sort_by_key(|r| (r.start, r.end));
        }
        Ok(RepeatMaskerAnnotations { by_chromosome })
    }

    pub fn len(&self) -> usize {
        self.by_chromosome.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnnotationSource for RepeatMaskerAnnotations {
    fn intervals(&self, chromosome: &str, class_family: &str) -> Result<Vec<RepeatInterval>> {
        let found: Vec<RepeatInterval> = self
            .by_chromosome
            .get(chromosome)
            .map(|list| {
                list.iter()
                    .filter(|r| r.class_family == class_family)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(
            "{} '{}' intervals on {}",
            found.len(),
            class_family,
            chromosome
        );
        Ok(found)
    }
}
