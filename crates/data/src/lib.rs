//! Loading and validation of the card catalog and round rules.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
