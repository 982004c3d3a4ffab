//! Sample ingestion: source discovery plus parsing of per-server sample files
//! and single-column auxiliary files.

pub mod discover;
pub mod parse;
pub mod row;

pub use discover::discover_sources;
pub use parse::{parse_integer_column, parse_sample_file};
pub use row::Sample;
