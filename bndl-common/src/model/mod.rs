// bndl-common/src/model/mod.rs
pub mod index;
pub mod resolved;
pub mod source_id;
pub mod spec;

pub use index::Index;
pub use resolved::ResolvedSet;
pub use source_id::SourceId;
pub use spec::{Spec, SpecMetadata};
