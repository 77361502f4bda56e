use std::collections::BTreeSet;

use anyhow::{anyhow, bail, Result};
use indexmap::IndexSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{prune_subsumed, theme_subsets, McSet, ThemeSubsets};
use crate::align::Aligner;
use crate::search::{approximate_multialign, max_unified_match, LayerSequence, MultialignParams};
use crate::structs::{Form, Plat, Row};
use crate::util::combinations;

/// One discovered subset together with every row's re-encoded
/// distinguishers: `rows[r][c]` is row r's layer-index sequence for the
/// subset's c-th column in ascending column order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubsetEncoding {
    pub subset: McSet,
    pub rows: Vec<Vec<LayerSequence>>,
}

/// Pick one member of a non-empty option set.
fn sample_form<R: Rng>(rng: &mut R, options: &IndexSet<Form>) -> Option<Form> {
    if options.is_empty() {
        return None;
    }
    options.get_index(rng.gen_range(0..options.len())).cloned()
}

fn sample_distinguisher<R: Rng>(
    aligner: &mut Aligner,
    rng: &mut R,
    theme: &Form,
    form: &Form,
) -> Result<Form> {
    let options = aligner.distinguishers(theme, form)?;
    sample_form(rng, &options).ok_or_else(|| anyhow!("no distinguisher for \"{form}\""))
}

/// The columns shared by both themes' subsets that the exact matcher
/// accepts simultaneously, once each column's sampled distinguishers
/// are re-encoded over shared layers.
#[allow(clippy::too_many_arguments)]
fn compare_two_sets_deidentified<R: Rng>(
    aligner: &mut Aligner,
    rng: &mut R,
    params: &MultialignParams,
    row_a: &Row,
    row_b: &Row,
    theme_a: &Form,
    columns_a: &[usize],
    theme_b: &Form,
    columns_b: &[usize],
) -> Result<BTreeSet<usize>> {
    let shared: Vec<usize> = columns_a
        .iter()
        .copied()
        .filter(|column| columns_b.contains(column))
        .collect();
    if shared.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut dists_a = Vec::with_capacity(shared.len());
    let mut dists_b = Vec::with_capacity(shared.len());
    for &column in &shared {
        dists_a.push(sample_distinguisher(
            aligner,
            rng,
            theme_a,
            row_a.form(column),
        )?);
        dists_b.push(sample_distinguisher(
            aligner,
            rng,
            theme_b,
            row_b.form(column),
        )?);
    }

    let encoded_a = approximate_multialign(&dists_a, params)?;
    let encoded_b = approximate_multialign(&dists_b, params)?;

    let outcome = max_unified_match(&encoded_a, &encoded_b);
    Ok(outcome
        .accepted
        .iter()
        .map(|&position| shared[position])
        .collect())
}

/// Deidentified pairwise comparison of two rows. Candidates of size one
/// carry no confusability and are discarded; the survivors are pruned
/// for strict subsumption.
fn compare_two_rows_deidentified<R: Rng>(
    aligner: &mut Aligner,
    rng: &mut R,
    params: &MultialignParams,
    row_a: &Row,
    row_b: &Row,
    subsets_a: &ThemeSubsets,
    subsets_b: &ThemeSubsets,
) -> Result<Vec<McSet>> {
    let mut sets: Vec<McSet> = vec![];

    for (theme_a, columns_a) in subsets_a {
        for (theme_b, columns_b) in subsets_b {
            let shared = compare_two_sets_deidentified(
                aligner, rng, params, row_a, row_b, theme_a, columns_a, theme_b, columns_b,
            )?;
            if shared.len() <= 1 {
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

/// Discover maximally confusable subsets under the deidentified
/// encoding: one sampled theme and distinguisher per form, layer-index
/// re-encoding, and cross-row agreement decided by the exact matcher
/// over all candidate columns at once.
///
/// Unlike the plain discovery, the per-row closure intersects pairs
/// only, and sets of size one are discarded throughout.
pub fn find_confusable_subsets_deidentified<R: Rng>(
    aligner: &mut Aligner,
    plat: &Plat,
    rng: &mut R,
    params: &MultialignParams,
) -> Result<IndexSet<McSet>> {
    let subsets: Vec<ThemeSubsets> = plat
        .rows()
        .iter()
        .map(|row| theme_subsets(aligner, row))
        .collect();

    let mut by_row: Vec<Vec<McSet>> = vec![Vec::new(); plat.num_rows()];
    for i in 0..plat.num_rows() {
        for j in (i + 1)..plat.num_rows() {
            let pairwise = compare_two_rows_deidentified(
                aligner,
                rng,
                params,
                plat.row(i),
                plat.row(j),
                &subsets[i],
                &subsets[j],
            )?;
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

        while !frontier.is_empty() {
            discovered.extend(frontier.iter().cloned());

            let members: Vec<McSet> = frontier.into_iter().collect();
            let mut next: IndexSet<McSet> = IndexSet::new();
            for pair in combinations(&members, 2) {
                let intersection = pair[0].intersection(&pair[1]);
                if intersection.len() > 1 && !discovered.contains(&intersection) {
                    next.insert(intersection);
                }
            }

            frontier = next;
        }
    }

    Ok(discovered)
}

/// Re-encode every row's forms for every discovered subset: one valid
/// theme sampled for the row's forms over the subset's columns, one
/// distinguisher sampled per form, and the distinguishers aligned onto
/// shared layers. This is the artifact the deidentified entropy pass
/// consumes.
pub fn deidentified_encodings<R: Rng>(
    aligner: &mut Aligner,
    plat: &Plat,
    sets: &[McSet],
    rng: &mut R,
    params: &MultialignParams,
) -> Result<Vec<SubsetEncoding>> {
    let mut encodings = Vec::with_capacity(sets.len());

    for set in sets {
        if set.columns().any(|column| column == 0 || column >= plat.width()) {
            bail!("subset {set:?} names columns outside the plat");
        }

        let mut rows = Vec::with_capacity(plat.num_rows());
        for (row_idx, row) in plat.rows().iter().enumerate() {
            let forms: Vec<Form> = set.columns().map(|column| row.form(column).clone()).collect();

            let themes = aligner.valid_themes_for_set(&forms);
            let theme = sample_form(rng, &themes)
                .ok_or_else(|| anyhow!("no valid theme for row {row_idx} over {set:?}"))?;

            let mut dists = Vec::with_capacity(forms.len());
            for form in &forms {
                dists.push(sample_distinguisher(aligner, rng, &theme, form)?);
            }

            rows.push(approximate_multialign(&dists, params)?);
        }

        encodings.push(SubsetEncoding {
            subset: set.clone(),
            rows,
        });
    }

    Ok(encodings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn plat(rows: &[&[&str]]) -> Plat {
        Plat::new(
            rows.iter()
                .map(|cells| Row::new(cells.iter().map(|cell| Form::new(cell)).collect()))
                .collect(),
        )
        .unwrap()
    }

    fn sample_plat() -> Plat {
        plat(&[
            &["a", "sing", "sang"],
            &["b", "ring", "rang"],
            &["c", "walk", "walks"],
            &["d", "talk", "talks"],
        ])
    }

    #[test]
    fn test_deidentified_discovery() {
        let plat = sample_plat();
        let mut aligner = Aligner::new();
        let mut rng = Pcg64::seed_from_u64(42);

        let discovered = find_confusable_subsets_deidentified(
            &mut aligner,
            &plat,
            &mut rng,
            &MultialignParams::default(),
        )
        .unwrap();

        // every sampled option set is a singleton here, so the outcome
        // does not depend on the seed
        let expected: IndexSet<McSet> = [McSet::from_columns([1, 2])].into_iter().collect();
        assert_eq!(discovered, expected);
    }

    #[test]
    fn test_single_column_sets_are_discarded() {
        let plat = sample_plat();
        let mut aligner = Aligner::new();
        let mut rng = Pcg64::seed_from_u64(7);

        let discovered = find_confusable_subsets_deidentified(
            &mut aligner,
            &plat,
            &mut rng,
            &MultialignParams::default(),
        )
        .unwrap();

        assert!(discovered.iter().all(|set| set.len() > 1));
    }

    #[test]
    fn test_encodings_cover_every_row_and_column() {
        let plat = sample_plat();
        let sets = vec![McSet::from_columns([1, 2])];
        let mut aligner = Aligner::new();
        let mut rng = Pcg64::seed_from_u64(42);

        let encodings = deidentified_encodings(
            &mut aligner,
            &plat,
            &sets,
            &mut rng,
            &MultialignParams::default(),
        )
        .unwrap();

        assert_eq!(encodings.len(), 1);
        assert_eq!(encodings[0].rows.len(), plat.num_rows());
        for row in &encodings[0].rows {
            assert_eq!(row.len(), 2);
        }
    }

    #[test]
    fn test_round_trip_never_accepts_more_than_the_subset_holds() {
        let plat = sample_plat();
        let sets = vec![McSet::from_columns([1, 2])];
        let mut aligner = Aligner::new();
        let mut rng = Pcg64::seed_from_u64(42);

        let encodings = deidentified_encodings(
            &mut aligner,
            &plat,
            &sets,
            &mut rng,
            &MultialignParams::default(),
        )
        .unwrap();

        let rows = &encodings[0].rows;
        for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                let outcome = max_unified_match(&rows[i], &rows[j]);
                assert!(outcome.accepted.len() <= encodings[0].subset.len());
            }
        }
    }

    #[test]
    fn test_out_of_range_subset_is_rejected() {
        let plat = sample_plat();
        let sets = vec![McSet::from_columns([1, 9])];
        let mut aligner = Aligner::new();
        let mut rng = Pcg64::seed_from_u64(42);

        let result = deidentified_encodings(
            &mut aligner,
            &plat,
            &sets,
            &mut rng,
            &MultialignParams::default(),
        );
        assert!(result.is_err());
    }
}
