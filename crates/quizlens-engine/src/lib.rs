//! Page-side question matching engine.
//!
//! Takes a parsed snapshot of a quiz page and an externally supplied corpus
//! of question/answer records, finds the page questions that match the
//! corpus, and decorates them in place: matched questions get a highlight
//! and a hidden answer tooltip, located answer options get a highlight and a
//! check badge. Driven through an action-tagged JSON message surface.

pub mod api;
pub mod dom;
pub mod extract;
pub mod highlight;
pub mod locate;
pub mod normalize;
pub mod run;
pub mod similarity;

pub use run::{Engine, EngineConfig, MatchResult, RunOutcome};
