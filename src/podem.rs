//! 5-valued test generation: D-algebra and the PODEM justification engine

mod justify;
mod logic;

pub use justify::{Justifier, TestVector};
pub use logic::Logic5;
