pub mod common;
pub mod persona;
pub mod query;

pub use common::*;
pub use persona::*;
pub use query::*;
