pub mod query_serializer;
pub use query_serializer::*;
