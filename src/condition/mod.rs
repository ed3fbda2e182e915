pub mod quoting;
pub use quoting::*;

pub mod operator;
pub use operator::*;

pub mod condition;
pub use condition::*;

pub mod compiler;
pub use compiler::*;
