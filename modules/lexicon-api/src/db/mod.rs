pub mod cases;

pub use cases::{CaseLookup, PgCaseLookup};
