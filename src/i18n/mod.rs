//! Bilingual vocabulary shared by every stage of the pipeline.
//!
//! - `language`: the English/French pair and the column suffixes they map to
//! - `lexicon`: the seven NOC element categories and their fixed labels

mod language;
mod lexicon;

pub use language::Language;
pub use lexicon::{label_in_other, Category};
