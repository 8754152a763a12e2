//! Resource pipeline: translate filters, assemble rows, resolve relationships, write back.

pub mod adapter;
pub mod assembler;
pub mod coerce;
pub mod relationships;
pub mod translate;

pub use adapter::{ResourceAdapter, ResourceList, ResourcePayload};
pub use assembler::{format_resource, ResourceAssembler};
pub use relationships::RelationshipResolver;
pub use translate::{QueryTranslator, TranslatedQuery};
