use std::collections::BTreeSet;

use anyhow::Result;
use indexmap::IndexSet;

use super::{prune_subsumed, theme_subsets, McSet, ThemeSubsets};
use crate::align::Aligner;
use crate::structs::{Form, Plat, Row};
use crate::util::combinations;

/// The columns present under both themes whose distinguisher sets share
/// at least one member.
fn compare_two_sets(
    aligner: &mut Aligner,
    row_a: &Row,
    row_b: &Row,
    theme_a: &Form,
    columns_a: &[usize],
    theme_b: &Form,
    columns_b: &[usize],
) -> Result<BTreeSet<usize>> {
    let mut columns = BTreeSet::new();

    for &column in columns_a {
        if !columns_b.contains(&column) {
            continue;
        }

        let dists_a = aligner.distinguishers(theme_a, row_a.form(column))?;
        let dists_b = aligner.distinguishers(theme_b, row_b.form(column))?;
        if dists_a.iter().any(|dist| dists_b.contains(dist)) {
            columns.insert(column);
        }
    }

    Ok(columns)
}

/// The maximally confusable subsets between two rows: every theme pair
/// is compared, and candidates subsumed by a larger candidate from the
/// same pair of rows are pruned.
fn compare_two_rows(
    aligner: &mut Aligner,
    row_a: &Row,
    row_b: &Row,
    subsets_a: &ThemeSubsets,
    subsets_b: &ThemeSubsets,
) -> Result<Vec<McSet>> {
    let mut sets: Vec<McSet> = vec![];

    for (theme_a, columns_a) in subsets_a {
        for (theme_b, columns_b) in subsets_b {
            let shared = compare_two_sets(
                aligner, row_a, row_b, theme_a, columns_a, theme_b, columns_b,
            )?;
            if shared.is_empty() {
                continue;
            }

            let set = McSet::from_columns(shared);
            if !sets.contains(&set) {
                sets.push(set);
            }
        }
    }

    Ok(prune_subsumed(sets))
}

/// Discover every maximally confusable subset of the plat.
///
/// Seeds come from comparing every ordered row pair; each row's
/// worklist is then closed under intersections over combinations of
/// growing size until no new set appears. The union of every seed and
/// derived set across all rows is the final collection.
pub fn find_confusable_subsets(aligner: &mut Aligner, plat: &Plat) -> Result<IndexSet<McSet>> {
    let subsets: Vec<ThemeSubsets> = plat
        .rows()
        .iter()
        .map(|row| theme_subsets(aligner, row))
        .collect();

    let mut by_row: Vec<Vec<McSet>> = vec![Vec::new(); plat.num_rows()];
    for i in 0..plat.num_rows() {
        for j in (i + 1)..plat.num_rows() {
            let pairwise =
                compare_two_rows(aligner, plat.row(i), plat.row(j), &subsets[i], &subsets[j])?;
            for set in pairwise {
                if !by_row[i].contains(&set) {
                    by_row[i].push(set);
                }
            }
        }
    }

    let mut discovered: IndexSet<McSet> = IndexSet::new();
    for worklist in &by_row {
        let mut frontier: IndexSet<McSet> = worklist.iter().cloned().collect();
        let mut size = 2;

        while !frontier.is_empty() {
            discovered.extend(frontier.iter().cloned());

            let members: Vec<McSet> = frontier.into_iter().collect();
            let mut next: IndexSet<McSet> = IndexSet::new();
            for combination in combinations(&members, size) {
                let mut intersection = combination[0].clone();
                for set in &combination[1..] {
                    intersection = intersection.intersection(set);
                }
                if !intersection.is_empty() && !discovered.contains(&intersection) {
                    next.insert(intersection);
                }
            }

            frontier = next;
            size += 1;
        }
    }

    Ok(discovered)
}
