pub mod docs;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;

pub use envelope::*;
pub use error::*;
pub use handlers::*;
pub use routes::*;
