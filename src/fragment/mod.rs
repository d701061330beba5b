use log::{debug, info};

use crate::error::{Error, Result};
use crate::repeat::{AnnotationSource, RepeatInterval};

/// Shortest trailing fragment the uniform tiling keeps.
pub const MIN_FRAGMENT_LEN: u64 = 1;

/// The part of a chromosome that gets shattered, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeRegion {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub padding: u64,
}

impl ChromosomeRegion {
    /// `[padding, length - padding)`, with padding clamped to the chromosome.
    /// `fragment_size` only feeds the error raised when nothing is left.
    pub fn padded(chromosome: &str, length: u64, padding: u64, fragment_size: u64) -> Result<Self> {
        let start = padding.min(length);
        let end = length.saturating_sub(padding);
        if start >= end {
            return Err(Error::InsufficientReference {
                chromosome: chromosome.to_string(),
                region_len: 0,
                padding,
                fragment_size,
            });
        }
        Ok(ChromosomeRegion {
            chromosome: chromosome.to_string(),
            start,
            end,
            padding,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn require_fragment(&self, fragment_size: u64) -> Result<()> {
        if fragment_size == 0 {
            return Err(Error::Config("fragment size must be positive".to_string()));
        }
        if self.len() < fragment_size {
            return Err(Error::InsufficientReference {
                chromosome: self.chromosome.clone(),
                region_len: self.len(),
                padding: self.padding,
                fragment_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    /// Position in partition order.
    pub index: usize,
    pub anchor: Option<RepeatInterval>,
}

impl Fragment {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Splits a region into ordered, non-overlapping fragments.
pub trait Partitioner {
    fn partition(&self, region: &ChromosomeRegion, fragment_size: u64) -> Result<Vec<Fragment>>;
}

/// Fixed-size tiling of the whole region.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformPartitioner;

impl Partitioner for UniformPartitioner {
    fn partition(&self, region: &ChromosomeRegion, fragment_size: u64) -> Result<Vec<Fragment>> {
        region.require_fragment(fragment_size)?;

        let mut fragments = Vec::with_capacity((region.len() / fragment_size) as usize + 1);
        let mut start = region.start;
        while start < region.end {
            let end = (start + fragment_size).min(region.end);
            if end - start < MIN_FRAGMENT_LEN {
                debug!("Dropping {} base remainder at {}:{}", end - start, region.chromosome, start);
                break;
            }
            fragments.push(Fragment {
                chromosome: region.chromosome.clone(),
                start,
                end,
                index: fragments.len(),
                anchor: None,
            });
            start = end;
        }

        info!(
            "Tiled {}:{}-{} into {} fragments of {} bases",
            region.chromosome,
            region.start,
            region.end,
            fragments.len(),
            fragment_size
        );
        Ok(fragments)
    }
}

/// Fragments that each start at an annotated repeat of one class/family.
pub struct RepeatAnchoredPartitioner<'a, A: AnnotationSource + ?Sized> {
    annotations: &'a A,
    class_family: String,
}

impl<'a, A: AnnotationSource + ?Sized> RepeatAnchoredPartitioner<'a, A> {
    pub fn new(annotations: &'a A, class_family: impl Into<String>) -> Self {
        RepeatAnchoredPartitioner {
            annotations,
            class_family: class_family.into(),
        }
    }
}

impl<A: AnnotationSource + ?Sized> Partitioner for RepeatAnchoredPartitioner<'_, A> {
    fn partition(&self, region: &ChromosomeRegion, fragment_size: u64) -> Result<Vec<Fragment>> {
        region.require_fragment(fragment_size)?;

        let repeats = self
            .annotations
            .intervals(&region.chromosome, &self.class_family)?;
        if repeats.is_empty() {
            return Err(Error::NoAnnotations {
                chromosome: region.chromosome.clone(),
                class_family: self.class_family.clone(),
            });
        }

        let mut fragments = Vec::new();
        let mut cursor = region.start;
        for repeat in repeats {
            if repeat.start >= region.end {
                break;
            }
            if repeat.start < cursor {
                continue;
            }
            let end = (repeat.start + fragment_size).min(region.end);
            fragments.push(Fragment {
                chromosome: region.chromosome.clone(),
                start: repeat.start,
                end,
                index: fragments.len(),
                anchor: Some(repeat),
            });
            cursor = end;
        }

        info!(
            "Anchored {} fragments of up to {} bases on '{}' repeats in {}:{}-{}",
            fragments.len(),
            fragment_size,
            self.class_family,
            region.chromosome,
            region.start,
            region.end
        );
        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repeat::RepeatMaskerAnnotations;
    use crate::seq::Strand;

    fn region(start: u64, end: u64) -> ChromosomeRegion {
        ChromosomeRegion {
            chromosome: "chr1".to_string(),
            start,
            end,
            padding: start,
        }
    }

    fn alu(start: u64, end: u64) -> RepeatInterval {
        RepeatInterval {
            start,
            end,
            strand: Strand::Forward,
            name: "AluY".to_string(),
            class_family: "SINE/Alu".to_string(),
        }
    }

    fn assert_tiles(fragments: &[Fragment]) {
        for (i, f) in fragments.iter().enumerate() {
            assert_eq!(f.index, i);
            assert!(f.start < f.end);
        }
        for pair in fragments.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
    }

    #[test]
    fn padded_region_clamps() {
        let r = ChromosomeRegion::padded("chr1", 100_000, 10_000, 2_000).unwrap();
        assert_eq!((r.start, r.end, r.len()), (10_000, 90_000, 80_000));

        let r = ChromosomeRegion::padded("chr1", 5_000, 0, 2_000).unwrap();
        assert_eq!((r.start, r.end), (0, 5_000));

        assert!(matches!(
            ChromosomeRegion::padded("chr1", 5_000, 2_500, 2_000),
            Err(Error::InsufficientReference { .. })
        ));
        assert!(matches!(
            ChromosomeRegion::padded("chr1", 5_000, 1_000_000, 2_000),
            Err(Error::InsufficientReference { .. })
        ));
    }

    #[test]
    fn collapsed_region_reports_padding_and_fragment_size() {
        let err = ChromosomeRegion::padded("chr1", 4_000, 10_000, 2_000).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientReference {
                region_len: 0,
                padding: 10_000,
                fragment_size: 2_000,
                ..
            }
        ));
        let message = err.to_string();
        assert!(message.contains("10000 bases of padding"), "{}", message);
        assert!(message.contains("fragment of 2000 bases"), "{}", message);
    }

    #[test]
    fn uniform_exact_multiple() {
        let fragments = UniformPartitioner.partition(&region(0, 10_000), 2_000).unwrap();
        assert_eq!(fragments.len(), 5);
        assert!(fragments.iter().all(|f| f.len() == 2_000));
        assert_eq!(fragments[4].end, 10_000);
        assert_tiles(&fragments);
    }

    #[test]
    fn uniform_keeps_short_remainder() {
        // The floor is a single base, so the 1000 base tail survives.
        let fragments = UniformPartitioner.partition(&region(0, 10_000), 3_000).unwrap();
        assert_eq!(fragments.len(), 4);
        assert!(fragments[..3].iter().all(|f| f.len() == 3_000));
        assert_eq!((fragments[3].start, fragments[3].end), (9_000, 10_000));
        assert_tiles(&fragments);
    }

    #[test]
    fn uniform_covers_region() {
        for (start, end, size) in [(0, 10_000, 7), (123, 98_765, 1_000), (5, 6, 1)] {
            let fragments = UniformPartitioner.partition(&region(start, end), size).unwrap();
            let total: u64 = fragments.iter().map(Fragment::len).sum();
            assert_eq!(total, end - start);
            assert_eq!(fragments[0].start, start);
            assert_tiles(&fragments);
        }
    }

    #[test]
    fn uniform_too_small_region() {
        assert!(matches!(
            UniformPartitioner.partition(&region(0, 1_999), 2_000),
            Err(Error::InsufficientReference {
                region_len: 1_999,
                fragment_size: 2_000,
                ..
            })
        ));
    }

    #[test]
    fn anchored_fragments_start_at_repeats() {
        let mut annotations = RepeatMaskerAnnotations::new();
        for r in [alu(50, 80), alu(1_000, 1_300), alu(1_500, 1_800), alu(4_000, 4_300), alu(9_500, 9_800)] {
            annotations.insert("chr1", r);
        }
        let partitioner = RepeatAnchoredPartitioner::new(&annotations, "SINE/Alu");
        let fragments = partitioner.partition(&region(100, 10_000), 2_000).unwrap();

        // 50 lies before the region; 1500 falls inside the first fragment
        let spans: Vec<(u64, u64)> = fragments.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(spans, vec![(1_000, 3_000), (4_000, 6_000), (9_500, 10_000)]);
        assert_eq!(fragments[1].anchor.as_ref().map(|a| a.start), Some(4_000));
        assert_tiles(&fragments);
    }

    #[test]
    fn anchored_with_no_repeats_in_region_is_empty() {
        let mut annotations = RepeatMaskerAnnotations::new();
        annotations.insert("chr1", alu(20_000, 20_300));
        let partitioner = RepeatAnchoredPartitioner::new(&annotations, "SINE/Alu");
        let fragments = partitioner.partition(&region(0, 10_000), 2_000).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn anchored_without_annotations_fails() {
        let mut annotations = RepeatMaskerAnnotations::new();
        annotations.insert(
            "chr1",
            RepeatInterval {
                class_family: "LINE/L1".to_string(),
                ..alu(1_000, 2_000)
            },
        );
        let partitioner = RepeatAnchoredPartitioner::new(&annotations, "SINE/Alu");
        assert!(matches!(
            partitioner.partition(&region(0, 10_000), 2_000),
            Err(Error::NoAnnotations { .. })
        ));
    }
}
