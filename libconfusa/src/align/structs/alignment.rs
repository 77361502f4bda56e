use std::fmt::{Debug, Formatter};

use indexmap::IndexSet;

use crate::structs::Form;

/// One symbol on one side of an alignment, tagged with whether it is
/// paired with an equal symbol on the other side.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaggedSymbol {
    pub symbol: char,
    pub matched: bool,
}

/// A single optimal alignment between two forms: both sides in full,
/// each symbol tagged matched or unmatched.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub left: Vec<TaggedSymbol>,
    pub right: Vec<TaggedSymbol>,
}

impl Alignment {
    /// The shared skeleton: the matched symbols, in order. Both sides
    /// agree on it by construction.
    pub fn theme(&self) -> Form {
        Form::from_symbols(
            self.left
                .iter()
                .filter(|tagged| tagged.matched)
                .map(|tagged| tagged.symbol),
        )
    }

    /// The unmatched symbols of the left side, in order.
    pub fn left_residue(&self) -> Form {
        Self::residue(&self.left)
    }

    /// The unmatched symbols of the right side, in order.
    pub fn right_residue(&self) -> Form {
        Self::residue(&self.right)
    }

    fn residue(side: &[TaggedSymbol]) -> Form {
        Form::from_symbols(
            side.iter()
                .filter(|tagged| !tagged.matched)
                .map(|tagged| tagged.symbol),
        )
    }
}

impl Debug for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let render = |side: &[TaggedSymbol]| {
            side.iter()
                .map(|tagged| {
                    if tagged.matched {
                        tagged.symbol.to_string()
                    } else {
                        format!("[{}]", tagged.symbol)
                    }
                })
                .collect::<String>()
        };
        write!(f, "{} / {}", render(&self.left), render(&self.right))
    }
}

/// The complete set of co-optimal alignments for one pair of forms,
/// together with their shared edit cost.
#[derive(Clone, Debug, Default)]
pub struct AlignmentSet {
    pub cost: usize,
    pub alignments: IndexSet<Alignment>,
}

impl AlignmentSet {
    /// Every distinct shared skeleton across the co-optimal alignments.
    pub fn themes(&self) -> IndexSet<Form> {
        self.alignments.iter().map(Alignment::theme).collect()
    }
}
