//! Safe SQL builder: identifiers from the schema only, values as parameters.

pub mod builder;
pub mod params;
pub mod query;

pub use builder::QueryBuf;
pub use params::*;
pub use query::*;
