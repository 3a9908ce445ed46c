pub mod error;
pub mod memory;
pub mod postgres;
pub mod status;
pub mod traits;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use status::*;
pub use traits::*;
