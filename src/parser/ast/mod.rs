pub mod collection;
pub use collection::*;

pub mod join;
pub use join::*;

pub mod group_by;
pub use group_by::*;

pub mod order_by;
pub use order_by::*;

pub mod limit_offset_parser;
pub use limit_offset_parser::*;

pub mod select_field;
pub use select_field::*;

pub mod parsed_query;
pub use parsed_query::*;
