pub mod api;
pub mod error;
pub mod id;
pub mod models;

pub use error::{ConceptError, ErrorKind, Result};
pub use id::{Id, PostId, UserId};
