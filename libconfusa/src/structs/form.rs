use std::fmt::{Debug, Display, Formatter};

/// An ordered sequence of symbols: one word form, one theme, or one
/// distinguisher. Immutable once built. Symbols are Unicode scalar
/// values, so equality and length are symbol-wise, not byte-wise.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Form(String);

impl Form {
    pub fn new(symbols: &str) -> Self {
        Form(symbols.to_string())
    }

    pub fn from_symbols(symbols: impl IntoIterator<Item = char>) -> Self {
        Form(symbols.into_iter().collect())
    }

    /// The number of symbols in the form.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Form {
    fn from(symbols: &str) -> Self {
        Form::new(symbols)
    }
}

impl Display for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}
