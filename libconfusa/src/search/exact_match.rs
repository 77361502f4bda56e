use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use thiserror::Error;

use super::queue::{best_first_search, SearchNode};

/// Raised by alternative exact-matching backends (e.g. an integer
/// program solver) when the solver cannot certify an optimal solution.
/// The built-in search never produces it.
#[derive(Error, Debug)]
#[error("matching backend reported a non-optimal status: {status}")]
pub struct SolverInfeasibleError {
    pub status: String,
}

/// Contract for exact bijection-constrained maximum matching: find the
/// largest set of column indices whose per-position symbol pairs can
/// all be accepted under one consistent symbol bijection.
pub trait UnifiedMatcher {
    fn max_unified_match(
        &self,
        columns_a: &[Vec<usize>],
        columns_b: &[Vec<usize>],
    ) -> Result<Vec<usize>>;
}

/// The built-in best-first branch-and-bound backend.
pub struct AStarMatcher;

impl UnifiedMatcher for AStarMatcher {
    fn max_unified_match(
        &self,
        columns_a: &[Vec<usize>],
        columns_b: &[Vec<usize>],
    ) -> Result<Vec<usize>> {
        Ok(max_unified_match(columns_a, columns_b).accepted)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Decision {
    Undecided,
    Rejected,
    Accepted,
}

/// Result of a maximum unified match.
#[derive(Debug)]
pub struct MatchOutcome {
    /// The accepted column indices, ascending.
    pub accepted: Vec<usize>,
    /// The realized bijection, row-A symbol to row-B symbol.
    pub assignments: BTreeMap<usize, usize>,
}

#[derive(Clone)]
struct MatchNode<'a> {
    columns_a: &'a [Vec<usize>],
    columns_b: &'a [Vec<usize>],
    decisions: Vec<Decision>,
    assignments: BTreeMap<usize, usize>,
    assigned_b: BTreeSet<usize>,
}

impl MatchNode<'_> {
    fn count(&self, decision: Decision) -> i64 {
        self.decisions.iter().filter(|&&d| d == decision).count() as i64
    }

    /// Merge one column's symbol pairs into the bijection. Fails when a
    /// row-A symbol is already mapped elsewhere or a row-B symbol is
    /// already claimed by a different row-A symbol.
    fn merge_column(
        &self,
        column: usize,
        assignments: &mut BTreeMap<usize, usize>,
        assigned_b: &mut BTreeSet<usize>,
    ) -> bool {
        for (&sym_a, &sym_b) in self.columns_a[column].iter().zip(&self.columns_b[column]) {
            match assignments.get(&sym_a) {
                None if !assigned_b.contains(&sym_b) => {
                    assignments.insert(sym_a, sym_b);
                    assigned_b.insert(sym_b);
                }
                Some(&mapped) if mapped == sym_b => {}
                _ => return false,
            }
        }
        true
    }

    /// How an undecided column resolves against a fixed bijection:
    /// accepted when every pair is already consistent, rejected on any
    /// conflict, undecided only when it would need fresh commitments.
    fn classify(
        &self,
        column: usize,
        assignments: &BTreeMap<usize, usize>,
        assigned_b: &BTreeSet<usize>,
    ) -> Decision {
        for (&sym_a, &sym_b) in self.columns_a[column].iter().zip(&self.columns_b[column]) {
            match assignments.get(&sym_a) {
                None if !assigned_b.contains(&sym_b) => return Decision::Undecided,
                Some(&mapped) if mapped == sym_b => {}
                _ => return Decision::Rejected,
            }
        }
        Decision::Accepted
    }
}

impl SearchNode for MatchNode<'_> {
    type Key = Vec<Decision>;
    type Priority = i64;

    fn key(&self) -> Vec<Decision> {
        self.decisions.clone()
    }

    /// Cost is the negated accepted count; the admissible heuristic
    /// optimistically counts every undecided column as acceptable.
    fn priority(&self) -> i64 {
        -self.count(Decision::Accepted) - self.count(Decision::Undecided)
    }

    fn is_complete(&self) -> bool {
        !self.decisions.contains(&Decision::Undecided)
    }

    fn successors(&self) -> Vec<Self> {
        let Some(column) = self
            .decisions
            .iter()
            .position(|&d| d == Decision::Undecided)
        else {
            return vec![];
        };

        // rejecting the branch column is always possible
        let mut rejected = self.clone();
        rejected.decisions[column] = Decision::Rejected;
        let mut result = vec![rejected];

        // accepting it is possible only if its pairs merge cleanly
        let mut assignments = self.assignments.clone();
        let mut assigned_b = self.assigned_b.clone();
        if !self.merge_column(column, &mut assignments, &mut assigned_b) {
            return result;
        }

        let mut decisions = self.decisions.clone();
        decisions[column] = Decision::Accepted;

        // eager propagation: resolve every other undecided column that
        // the extended bijection already decides
        for other in 0..decisions.len() {
            if decisions[other] == Decision::Undecided {
                decisions[other] = self.classify(other, &assignments, &assigned_b);
            }
        }

        result.push(MatchNode {
            columns_a: self.columns_a,
            columns_b: self.columns_b,
            decisions,
            assignments,
            assigned_b,
        });
        result
    }
}

/// Find the largest subset of columns that match simultaneously under
/// one symbol bijection, along with the bijection that realizes it.
/// Always terminates and always succeeds: in the worst case every
/// column is rejected.
pub fn max_unified_match(columns_a: &[Vec<usize>], columns_b: &[Vec<usize>]) -> MatchOutcome {
    assert_eq!(
        columns_a.len(),
        columns_b.len(),
        "both rows must carry the same columns"
    );

    let start = MatchNode {
        columns_a,
        columns_b,
        decisions: vec![Decision::Undecided; columns_a.len()],
        assignments: BTreeMap::new(),
        assigned_b: BTreeSet::new(),
    };

    let best = match best_first_search(start, None) {
        Some(node) => node,
        // every incomplete state has a reject successor, so the
        // frontier cannot empty before a complete state is popped
        None => panic!("exact match search exhausted without a terminal state"),
    };

    let accepted = best
        .decisions
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == Decision::Accepted)
        .map(|(idx, _)| idx)
        .collect();

    MatchOutcome {
        accepted,
        assignments: best.assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(data: &[&[usize]]) -> Vec<Vec<usize>> {
        data.iter().map(|col| col.to_vec()).collect()
    }

    #[test]
    fn test_identical_rows_fully_match() {
        let row = columns(&[&[1, 2], &[2, 3], &[3, 4]]);
        let outcome = max_unified_match(&row, &row);

        assert_eq!(outcome.accepted, vec![0, 1, 2]);
        assert_eq!(
            outcome.assignments,
            BTreeMap::from([(1, 1), (2, 2), (3, 3), (4, 4)])
        );
    }

    #[test]
    fn test_renamed_rows_fully_match() {
        let row_a = columns(&[&[1, 2], &[2, 3], &[3, 4]]);
        let row_b = columns(&[&[9, 10], &[10, 11], &[11, 12]]);

        let outcome = max_unified_match(&row_a, &row_b);
        assert_eq!(outcome.accepted, vec![0, 1, 2]);
    }

    #[test]
    fn test_only_first_column_matches() {
        let row_a = columns(&[&[1, 2], &[2, 3], &[3, 4]]);
        let row_b = columns(&[&[9, 10], &[9, 10], &[9, 10]]);

        // the bijection 1->9, 2->10 is consumed by the first column and
        // every later column conflicts with it
        let outcome = max_unified_match(&row_a, &row_b);
        assert_eq!(outcome.accepted, vec![0]);
        assert_eq!(outcome.assignments, BTreeMap::from([(1, 9), (2, 10)]));
    }

    #[test]
    fn test_two_columns_match() {
        let row_a = columns(&[&[1, 2], &[2, 3], &[3, 4]]);
        let row_b = columns(&[&[9, 10], &[10, 11], &[9, 10]]);

        let outcome = max_unified_match(&row_a, &row_b);
        assert_eq!(outcome.accepted, vec![0, 1]);
    }

    #[test]
    fn test_three_of_four_columns_match() {
        let row_a = columns(&[&[1, 2], &[2, 3], &[3, 4], &[1, 4]]);
        let row_b = columns(&[&[9, 10], &[10, 11], &[12, 11], &[9, 11]]);

        let outcome = max_unified_match(&row_a, &row_b);
        assert_eq!(outcome.accepted, vec![0, 2, 3]);
        assert_eq!(
            outcome.assignments,
            BTreeMap::from([(1, 9), (2, 10), (3, 12), (4, 11)])
        );
    }

    #[test]
    fn test_column_order_does_not_change_the_count() {
        let row_a = columns(&[&[1, 2], &[3, 4], &[1, 4], &[2, 3]]);
        let row_b = columns(&[&[9, 10], &[12, 11], &[9, 11], &[10, 11]]);

        let outcome = max_unified_match(&row_a, &row_b);
        assert_eq!(outcome.accepted.len(), 3);
    }

    #[test]
    fn test_no_columns() {
        let outcome = max_unified_match(&[], &[]);
        assert!(outcome.accepted.is_empty());
        assert!(outcome.assignments.is_empty());
    }

    #[test]
    fn test_trait_backend_agrees() {
        let row_a = columns(&[&[1, 2], &[2, 3], &[3, 4]]);
        let row_b = columns(&[&[9, 10], &[9, 10], &[9, 10]]);

        let accepted = AStarMatcher.max_unified_match(&row_a, &row_b).unwrap();
        assert_eq!(accepted, vec![0]);
    }
}
