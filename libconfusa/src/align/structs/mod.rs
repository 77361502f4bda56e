mod alignment;
pub use alignment::{Alignment, AlignmentSet, TaggedSymbol};
