pub mod fulltext_parser;
pub use fulltext_parser::*;
