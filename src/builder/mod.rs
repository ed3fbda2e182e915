pub mod field_names;
pub use field_names::*;

pub mod diagnostics;
pub use diagnostics::*;

pub mod query_builder;
pub use query_builder::*;

pub mod mechanisms;
pub use mechanisms::replace_table_name_by_alias;

pub mod filter;
pub use filter::*;

pub mod alias_matcher;
pub mod ordering;
