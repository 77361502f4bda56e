use indexmap::IndexSet;
use thiserror::Error;

use super::structs::Alignment;
use super::Aligner;
use crate::structs::Form;

#[derive(Error, Debug)]
#[error("\"{theme}\" is not a valid theme for \"{form}\"")]
pub struct InvalidThemeError {
    pub theme: Form,
    pub form: Form,
}

impl Aligner {
    /// Every shared skeleton achievable by some optimal alignment of
    /// the pair.
    pub fn pairwise_themes(&mut self, a: &Form, b: &Form) -> IndexSet<Form> {
        self.align(a, b).themes()
    }

    /// A theme is valid for a form iff it is the unique achievable
    /// skeleton of the two: no optimal alignment of theme against form
    /// leaves a different shared subsequence. The empty theme and the
    /// form itself are always valid.
    pub fn theme_validity(&mut self, theme: &Form, form: &Form) -> bool {
        self.pairwise_themes(theme, form)
            .iter()
            .all(|candidate| candidate == theme)
    }

    /// The residues separating a form from a validated theme, one per
    /// optimal alignment. A theme that does not validate against the
    /// form is reported as an error so callers can skip it or retry
    /// with another candidate.
    pub fn distinguishers(
        &mut self,
        theme: &Form,
        form: &Form,
    ) -> Result<IndexSet<Form>, InvalidThemeError> {
        if !self.theme_validity(theme, form) {
            return Err(InvalidThemeError {
                theme: theme.clone(),
                form: form.clone(),
            });
        }

        Ok(self
            .align(theme, form)
            .alignments
            .iter()
            .map(Alignment::right_residue)
            .collect())
    }

    /// Inverse projection of [`Aligner::distinguishers`]: the candidate
    /// skeletons left in a form once a residue is accounted for.
    pub fn themes_for(&mut self, distinguisher: &Form, form: &Form) -> IndexSet<Form> {
        self.align(distinguisher, form)
            .alignments
            .iter()
            .map(Alignment::right_residue)
            .collect()
    }

    /// Fixpoint of pairwise themes over a set of forms: seed with every
    /// pairwise theme among the forms, then fold themes of themes back
    /// in until nothing new appears. Terminates because themes never
    /// grow past their sources.
    pub fn theme_closure(&mut self, forms: &[Form]) -> IndexSet<Form> {
        let mut frontier: IndexSet<Form> = IndexSet::new();
        for i in 0..forms.len() {
            for j in (i + 1)..forms.len() {
                frontier.extend(self.pairwise_themes(&forms[i], &forms[j]));
            }
        }

        let mut themes: IndexSet<Form> = IndexSet::new();
        while !frontier.is_empty() {
            themes.extend(frontier.iter().cloned());

            let members: Vec<Form> = frontier.into_iter().collect();
            let mut next: IndexSet<Form> = IndexSet::new();
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    for theme in self.pairwise_themes(&members[i], &members[j]) {
                        if !themes.contains(&theme) {
                            next.insert(theme);
                        }
                    }
                }
            }
            frontier = next;
        }

        themes
    }

    /// The closure filtered down to themes valid against every form of
    /// the set.
    pub fn valid_themes_for_set(&mut self, forms: &[Form]) -> IndexSet<Form> {
        self.theme_closure(forms)
            .into_iter()
            .filter(|theme| forms.iter().all(|form| self.theme_validity(theme, form)))
            .collect()
    }
}
