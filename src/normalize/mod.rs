//! Parsing and correction of raw place text.

pub mod countries;
pub mod parser;
pub mod pipeline;
pub mod text;

pub use parser::{parse, ParsedPlace};
pub use pipeline::Pipeline;
