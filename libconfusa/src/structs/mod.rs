pub mod form;
pub use form::Form;

pub mod plat;
pub use plat::{Plat, Row};
