use indexmap::IndexMap;

use crate::align::Aligner;
use crate::structs::{Form, Row};

/// Per-row mapping from each theme in the row's closure to the columns
/// whose forms validate it.
pub type ThemeSubsets = IndexMap<Form, Vec<usize>>;

/// Map every theme achievable within the row to the maximal set of
/// columns validating it. Themes that validate no column keep an empty
/// column list.
pub fn theme_subsets(aligner: &mut Aligner, row: &Row) -> ThemeSubsets {
    let universe = aligner.theme_closure(row.forms());

    let mut subsets = ThemeSubsets::new();
    for theme in universe {
        let columns: Vec<usize> = row
            .columns()
            .filter(|&column| aligner.theme_validity(&theme, row.form(column)))
            .collect();
        subsets.insert(theme, columns);
    }
    subsets
}
