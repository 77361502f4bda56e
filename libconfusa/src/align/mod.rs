pub mod structs;

mod edit_distance;
pub use edit_distance::Aligner;

mod theme;
pub use theme::InvalidThemeError;
