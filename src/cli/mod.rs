//! Command-line interface support

pub mod output;

pub use output::format_summary;
