pub mod error;
pub use error::{CatalogError, InvalidQueryError, ProviderError};

pub mod logging;

pub mod parser;
pub use parser::{ast::ParsedQuery, SqlParser};

pub mod database;
pub use database::{PolicyProvider, RequestContext, SchemaProvider, Settings, StaticCatalog};

pub mod condition;
pub mod fulltext;

pub mod builder;
pub use builder::{FilterSpec, QueryBuilder};

pub mod serializer;
pub use serializer::QuerySerializer;
