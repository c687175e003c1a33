//! Wire contract of the Smart Task REST backend.

mod payload;
mod routes;

pub use payload::*;
pub use routes::*;
