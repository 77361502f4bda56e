use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexSet;

use super::structs::{Alignment, AlignmentSet, TaggedSymbol};
use crate::structs::Form;

const INDEL_COST: usize = 1;
const SUBSTITUTION_COST: usize = 2;

/// Memoized edit-distance engine that enumerates every co-optimal
/// alignment of a pair of forms.
///
/// The memo is owned by the engine instance: create one `Aligner` per
/// run, or call [`Aligner::clear`] between plats, so the cache cannot
/// grow unbounded across runs.
#[derive(Default)]
pub struct Aligner {
    memo: HashMap<(Form, Form), Rc<AlignmentSet>>,
}

impl Aligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Minimum edit cost between two forms, along with the complete set
    /// of alignments achieving it.
    ///
    /// Matching trailing symbols cost 0, a substitution costs 2, and
    /// each insertion or deletion costs 1, so one substitution ties one
    /// deletion plus one insertion. The near-tie regularly produces
    /// several co-optimal alignments, and all of them are returned.
    pub fn align(&mut self, a: &Form, b: &Form) -> Rc<AlignmentSet> {
        let key = (a.clone(), b.clone());
        if let Some(hit) = self.memo.get(&key) {
            return Rc::clone(hit);
        }

        let result = Rc::new(align_prefixes(a, b));
        self.memo.insert(key, Rc::clone(&result));
        result
    }
}

/// Bottom-up dynamic program over the prefix-length lattice: cell
/// (i, j) holds the cost and the co-optimal alignments of a's first i
/// symbols against b's first j symbols. Every recurrence branch that
/// achieves the joint minimum contributes its alignments.
fn align_prefixes(a: &Form, b: &Form) -> AlignmentSet {
    let xs: Vec<char> = a.symbols().collect();
    let ys: Vec<char> = b.symbols().collect();

    let mut table: Vec<Vec<AlignmentSet>> = Vec::with_capacity(xs.len() + 1);

    for i in 0..=xs.len() {
        let mut row: Vec<AlignmentSet> = Vec::with_capacity(ys.len() + 1);

        for j in 0..=ys.len() {
            let cell = if i == 0 || j == 0 {
                // aligning against an empty prefix: one alignment, every
                // symbol unmatched
                let mut alignments = IndexSet::new();
                alignments.insert(Alignment {
                    left: unmatched(&xs[..i]),
                    right: unmatched(&ys[..j]),
                });
                AlignmentSet {
                    cost: (i + j) * INDEL_COST,
                    alignments,
                }
            } else {
                let matched = xs[i - 1] == ys[j - 1];
                let substitution = if matched { 0 } else { SUBSTITUTION_COST };

                let drop_left = table[i - 1][j].cost + INDEL_COST;
                let drop_right = row[j - 1].cost + INDEL_COST;
                let drop_both = table[i - 1][j - 1].cost + substitution;

                let cost = drop_left.min(drop_right).min(drop_both);
                let mut alignments = IndexSet::new();

                if drop_left == cost {
                    for alignment in &table[i - 1][j].alignments {
                        let mut extended = alignment.clone();
                        extended.left.push(TaggedSymbol {
                            symbol: xs[i - 1],
                            matched: false,
                        });
                        alignments.insert(extended);
                    }
                }
                if drop_right == cost {
                    for alignment in &row[j - 1].alignments {
                        let mut extended = alignment.clone();
                        extended.right.push(TaggedSymbol {
                            symbol: ys[j - 1],
                            matched: false,
                        });
                        alignments.insert(extended);
                    }
                }
                if drop_both == cost {
                    for alignment in &table[i - 1][j - 1].alignments {
                        let mut extended = alignment.clone();
                        extended.left.push(TaggedSymbol {
                            symbol: xs[i - 1],
                            matched,
                        });
                        extended.right.push(TaggedSymbol {
                            symbol: ys[j - 1],
                            matched,
                        });
                        alignments.insert(extended);
                    }
                }

                AlignmentSet { cost, alignments }
            };

            row.push(cell);
        }

        table.push(row);
    }

    std::mem::take(&mut table[xs.len()][ys.len()])
}

fn unmatched(symbols: &[char]) -> Vec<TaggedSymbol> {
    symbols
        .iter()
        .map(|&symbol| TaggedSymbol {
            symbol,
            matched: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_alignment() {
        let mut aligner = Aligner::new();
        let form = Form::new("sing");

        let result = aligner.align(&form, &form);

        assert_eq!(result.cost, 0);
        assert_eq!(result.alignments.len(), 1);
        let alignment = result.alignments.first().unwrap();
        assert!(alignment.left.iter().all(|tagged| tagged.matched));
        assert!(alignment.right.iter().all(|tagged| tagged.matched));
        assert_eq!(alignment.theme(), form);
    }

    #[test]
    fn test_empty_side() {
        let mut aligner = Aligner::new();

        let result = aligner.align(&Form::new("abc"), &Form::new(""));

        assert_eq!(result.cost, 3);
        assert_eq!(result.alignments.len(), 1);
        let alignment = result.alignments.first().unwrap();
        assert_eq!(alignment.left_residue(), Form::new("abc"));
        assert!(alignment.right.is_empty());
    }

    #[test]
    fn test_known_cost() {
        let mut aligner = Aligner::new();
        let cost = aligner
            .align(&Form::new("kitten"), &Form::new("sitting"))
            .cost;
        assert_eq!(cost, 5);
    }

    #[test]
    fn test_symmetric_cost() {
        let mut aligner = Aligner::new();
        let pairs = [("singt", "sangt"), ("abc", "acb"), ("walk", "walks")];

        for (a, b) in pairs {
            let forward = aligner.align(&Form::new(a), &Form::new(b));
            let backward = aligner.align(&Form::new(b), &Form::new(a));
            assert_eq!(forward.cost, backward.cost);
            assert_eq!(forward.themes(), backward.themes());
        }
    }

    #[test]
    fn test_co_optimal_alignments_are_all_kept() {
        let mut aligner = Aligner::new();

        // deleting 'c' or deleting 'b' both cost 2, leaving two optimal
        // alignments with distinct skeletons
        let result = aligner.align(&Form::new("abc"), &Form::new("acb"));

        assert_eq!(result.cost, 2);
        assert_eq!(result.alignments.len(), 2);
        let themes = result.themes();
        assert!(themes.contains(&Form::new("ab")));
        assert!(themes.contains(&Form::new("ac")));
    }

    #[test]
    fn test_memo_returns_shared_result() {
        let mut aligner = Aligner::new();
        let a = Form::new("casa");
        let b = Form::new("case");

        let first = aligner.align(&a, &b);
        let second = aligner.align(&a, &b);

        assert!(Rc::ptr_eq(&first, &second));
    }
}
