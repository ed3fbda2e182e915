pub mod schema;
pub use schema::*;

pub mod policy;
pub use policy::*;

pub mod config;
pub use config::*;

pub mod context;
pub use context::*;

pub mod catalog;
pub use catalog::*;
