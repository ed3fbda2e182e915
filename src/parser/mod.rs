pub mod query_parser;
pub use query_parser::*;

pub mod ast;

pub mod clause;
pub use clause::*;

pub mod word_comparer;
pub use word_comparer::*;

pub mod query_comparers;
pub use query_comparers::*;

pub mod select_list_parser;
pub use select_list_parser::*;

pub mod sql_parser;
pub use sql_parser::*;
