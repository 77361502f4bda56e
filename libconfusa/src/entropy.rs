use anyhow::{bail, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::align::Aligner;
use crate::confusable::{McSet, SubsetEncoding};
use crate::search::max_unified_match;
use crate::structs::{Form, Plat};

/// Rows-by-subsets matrix of confusability entropies, stored row by
/// row in a flat vector. Cell (r, s) is log2 of the number of rows
/// confusable with row r under subset s, the row itself included.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntropyMatrix {
    num_rows: usize,
    num_sets: usize,
    values: Vec<f64>,
}

impl EntropyMatrix {
    pub fn new(num_rows: usize, num_sets: usize) -> Self {
        EntropyMatrix {
            num_rows,
            num_sets,
            values: vec![0.0; num_rows * num_sets],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    pub fn get(&self, row: usize, set: usize) -> f64 {
        self.values[row * self.num_sets + set]
    }

    fn fill_counts(&mut self, set: usize, counts: &[usize]) {
        for (row, &count) in counts.iter().enumerate() {
            self.values[row * self.num_sets + set] = (count as f64).log2();
        }
    }
}

/// Per-row distinguisher sets, one table per valid theme of the row's
/// forms over one subset's columns.
type RowDistinguishers = Vec<Vec<IndexSet<Form>>>;

/// Entropy of the plain pipeline. Two rows are confusable under a
/// subset when some pair of their valid themes yields distinguisher
/// sets that intersect in every one of the subset's columns; each
/// confusable pair increments both rows' counts once.
pub fn entropy_matrix(
    aligner: &mut Aligner,
    plat: &Plat,
    sets: &[McSet],
) -> Result<EntropyMatrix> {
    let mut matrix = EntropyMatrix::new(plat.num_rows(), sets.len());

    for (set_idx, set) in sets.iter().enumerate() {
        if set.columns().any(|column| column == 0 || column >= plat.width()) {
            bail!("subset {set:?} names columns outside the plat");
        }

        let mut by_row: Vec<RowDistinguishers> = Vec::with_capacity(plat.num_rows());
        for row in plat.rows() {
            let forms: Vec<Form> = set.columns().map(|column| row.form(column).clone()).collect();
            let themes = aligner.valid_themes_for_set(&forms);

            let mut per_theme: RowDistinguishers = Vec::with_capacity(themes.len());
            for theme in &themes {
                let dists: Vec<IndexSet<Form>> = forms
                    .iter()
                    .map(|form| aligner.distinguishers(theme, form))
                    .collect::<Result<_, _>>()?;
                per_theme.push(dists);
            }
            by_row.push(per_theme);
        }

        let mut counts = vec![1usize; plat.num_rows()];
        for i in 0..plat.num_rows() {
            for j in (i + 1)..plat.num_rows() {
                let confusable = by_row[i].iter().any(|dists_i| {
                    by_row[j].iter().any(|dists_j| {
                        dists_i
                            .iter()
                            .zip(dists_j)
                            .all(|(a, b)| a.iter().any(|dist| b.contains(dist)))
                    })
                });
                if confusable {
                    counts[i] += 1;
                    counts[j] += 1;
                }
            }
        }

        matrix.fill_counts(set_idx, &counts);
    }

    Ok(matrix)
}

/// Entropy of the deidentified pipeline. Two rows are confusable under
/// a subset when the exact matcher accepts every one of the subset's
/// columns between their layer encodings.
pub fn entropy_matrix_deidentified(
    num_rows: usize,
    encodings: &[SubsetEncoding],
) -> Result<EntropyMatrix> {
    let mut matrix = EntropyMatrix::new(num_rows, encodings.len());

    for (set_idx, encoding) in encodings.iter().enumerate() {
        if encoding.rows.len() != num_rows {
            bail!(
                "encoding for {:?} covers {} rows, expected {num_rows}",
                encoding.subset,
                encoding.rows.len()
            );
        }
        for row in &encoding.rows {
            if row.len() != encoding.subset.len() {
                bail!(
                    "encoding for {:?} holds {} columns, expected {}",
                    encoding.subset,
                    row.len(),
                    encoding.subset.len()
                );
            }
        }

        let mut counts = vec![1usize; num_rows];
        for i in 0..num_rows {
            for j in (i + 1)..num_rows {
                let outcome = max_unified_match(&encoding.rows[i], &encoding.rows[j]);
                if outcome.accepted.len() == encoding.subset.len() {
                    counts[i] += 1;
                    counts[j] += 1;
                }
            }
        }

        matrix.fill_counts(set_idx, &counts);
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confusable::deidentified_encodings;
    use crate::search::MultialignParams;
    use crate::structs::Row;
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

    #[test]
    fn test_plain_entropy_with_two_confusable_families() {
        let plat = plat(&[
            &["a", "sing", "sang"],
            &["b", "ring", "rang"],
            &["c", "walk", "walks"],
            &["d", "talk", "talks"],
        ]);
        let sets = vec![McSet::from_columns([1, 2])];

        let mut aligner = Aligner::new();
        let matrix = entropy_matrix(&mut aligner, &plat, &sets).unwrap();

        // each row is confusable with exactly one partner: log2(2) = 1
        for row in 0..plat.num_rows() {
            assert_eq!(matrix.get(row, 0), 1.0);
        }
    }

    #[test]
    fn test_partnerless_row_has_zero_entropy() {
        let plat = plat(&[
            &["a", "sing", "sang", "sung"],
            &["b", "ring", "rang", "rung"],
            &["c", "brings", "brought", "brought"],
        ]);
        let sets = vec![McSet::from_columns([1, 2, 3])];

        let mut aligner = Aligner::new();
        let matrix = entropy_matrix(&mut aligner, &plat, &sets).unwrap();

        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(1, 0), 1.0);
        assert_eq!(matrix.get(2, 0), 0.0);
    }

    #[test]
    fn test_deidentified_entropy() {
        let plat = plat(&[
            &["a", "sing", "sang"],
            &["b", "ring", "rang"],
            &["c", "walk", "walks"],
            &["d", "talk", "talks"],
        ]);
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

        let matrix = entropy_matrix_deidentified(plat.num_rows(), &encodings).unwrap();

        // under the deidentified encoding the empty distinguisher of
        // "walk" constrains nothing, so all four rows collapse into one
        // confusable family: log2(4) = 2
        for row in 0..plat.num_rows() {
            assert_eq!(matrix.get(row, 0), 2.0);
        }
    }

    #[test]
    fn test_row_count_mismatch_is_rejected() {
        let encodings = vec![SubsetEncoding {
            subset: McSet::from_columns([1, 2]),
            rows: vec![vec![vec![0], vec![1]]],
        }];

        assert!(entropy_matrix_deidentified(3, &encodings).is_err());
    }

    #[test]
    fn test_matrix_serialization_round_trip() {
        let mut matrix = EntropyMatrix::new(2, 1);
        matrix.fill_counts(0, &[2, 1]);

        let json = serde_json::to_string(&matrix).unwrap();
        let parsed: EntropyMatrix = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.num_rows(), 2);
        assert_eq!(parsed.get(0, 0), 1.0);
        assert_eq!(parsed.get(1, 0), 0.0);
    }
}
