use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::random::RandomSource;
use crate::seq::{reverse_complement, GenomeAccess, Strand};

/// What to do when more fragments are requested than were partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Use every available fragment.
    #[default]
    Clamp,
    /// Fail with `InsufficientFragments`.
    Strict,
}

/// A selected fragment and the orientation it is inserted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub fragment: Fragment,
    pub strand: Strand,
}

/// Reference bases at the low and high coordinate of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeBases {
    low: u8,
    high: u8,
}

impl EdgeBases {
    fn of(forward: &[u8]) -> Self {
        EdgeBases {
            low: forward.first().copied().unwrap_or(b'N'),
            high: forward.last().copied().unwrap_or(b'N'),
        }
    }
}

impl Placement {
    /// Last reference base read before leaving the fragment.
    fn exit(&self, edges: EdgeBases) -> Breakend {
        match self.strand {
            Strand::Forward => self.breakend(self.fragment.end - 1, edges.high),
            Strand::Reverse => self.breakend(self.fragment.start, edges.low),
        }
    }

    /// First reference base read on entering the fragment.
    fn entry(&self, edges: EdgeBases) -> Breakend {
        match self.strand {
            Strand::Forward => self.breakend(self.fragment.start, edges.low),
            Strand::Reverse => self.breakend(self.fragment.end - 1, edges.high),
        }
    }

    fn breakend(&self, position: u64, base: u8) -> Breakend {
        Breakend {
            chromosome: self.fragment.chromosome.clone(),
            position,
            strand: self.strand,
            base,
        }
    }
}

/// Ordered selection of fragments to stitch together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyPlan {
    pub placements: Vec<Placement>,
}

impl AssemblyPlan {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Partition indices in plan order.
    pub fn indices(&self) -> Vec<usize> {
        self.placements.iter().map(|p| p.fragment.index).collect()
    }
}

/// One side of a junction. `position` is the 0-based reference base at the
/// junction and `base` the reference base found there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakend {
    pub chromosome: String,
    pub position: u64,
    pub strand: Strand,
    pub base: u8,
}

/// Junction between two fragments adjacent in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRecord {
    pub exit: Breakend,
    pub entry: Breakend,
    pub from_fragment: usize,
    pub to_fragment: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub plan: AssemblyPlan,
    pub sequence: Vec<u8>,
    pub breakpoints: Vec<BreakpointRecord>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    selection: SelectionPolicy,
}

impl Assembler {
    pub fn new(selection: SelectionPolicy) -> Self {
        Assembler { selection }
    }

    /// Selects `requested` fragments in random order and orientation, stitches
    /// their bases together and derives one breakpoint per adjacent pair.
    ///
    /// With `include_reference` the untouched chromosome sequence before and
    /// after the span of `fragments` frames the result. No junction is
    /// recorded at those boundaries.
    pub fn assemble<G: GenomeAccess + ?Sized>(
        &self,
        fragments: &[Fragment],
        requested: usize,
        include_reference: bool,
        genome: &G,
        rng: &mut RandomSource,
    ) -> Result<Assembly> {
        let available = fragments.len();
        if available == 0 {
            return Err(Error::InsufficientFragments {
                requested,
                available,
            });
        }
        for fragment in fragments {
            if fragment.start >= fragment.end {
                return Err(Error::InvalidFragment {
                    chromosome: fragment.chromosome.clone(),
                    index: fragment.index,
                    start: fragment.start,
                    end: fragment.end,
                });
            }
        }

        let count = if requested > available {
            match self.selection {
                SelectionPolicy::Clamp => {
                    warn!(
                        "Requested {} fragments but only {} available; using all of them",
                        requested, available
                    );
                    available
                }
                SelectionPolicy::Strict => {
                    return Err(Error::InsufficientFragments {
                        requested,
                        available,
                    })
                }
            }
        } else {
            requested
        };

        let mut order: Vec<usize> = (0..available).collect();
        rng.shuffle(&mut order);
        order.truncate(count);

        let placements: Vec<Placement> = order
            .iter()
            .map(|&i| Placement {
                fragment: fragments[i].clone(),
                strand: if rng.next_bool() {
                    Strand::Reverse
                } else {
                    Strand::Forward
                },
            })
            .collect();
        debug!(
            "Drew plan of {} fragments after {} random draws from seed {}",
            placements.len(),
            rng.draws(),
            rng.seed()
        );

        let chromosome = &fragments[0].chromosome;
        let span_start = fragments.iter().map(|f| f.start).min().unwrap_or(0);
        let span_end = fragments.iter().map(|f| f.end).max().unwrap_or(0);

        let mut sequence = Vec::new();
        if include_reference {
            sequence.extend(genome.sequence(chromosome, 0, span_start)?);
        }
        let mut edges = Vec::with_capacity(placements.len());
        for placement in &placements {
            let f = &placement.fragment;
            let forward = genome.sequence(&f.chromosome, f.start, f.end)?;
            match placement.strand {
                Strand::Forward => sequence.extend_from_slice(&forward),
                Strand::Reverse => sequence.extend(reverse_complement(&forward)),
            }
            edges.push(EdgeBases::of(&forward));
        }
        if include_reference {
            let length = genome.length(chromosome)?;
            sequence.extend(genome.sequence(chromosome, span_end, length)?);
        }

        let breakpoints: Vec<BreakpointRecord> = placements
            .windows(2)
            .zip(edges.windows(2))
            .map(|(pair, ends)| BreakpointRecord {
                exit: pair[0].exit(ends[0]),
                entry: pair[1].entry(ends[1]),
                from_fragment: pair[0].fragment.index,
                to_fragment: pair[1].fragment.index,
            })
            .collect();

        info!(
            "Assembled {} of {} fragments into {} bases with {} breakpoints",
            placements.len(),
            available,
            sequence.len(),
            breakpoints.len()
        );
        Ok(Assembly {
            plan: AssemblyPlan { placements },
            sequence,
            breakpoints,
        })
    }
}
