//! Core data model: fragments, the reference map and tangling.

mod fragment;
mod properties;
mod reference_id;
mod reference_map;
mod reference_name;
pub mod tangle;

pub use fragment::{split_lines, Fragment};
pub use properties::{parse_properties, Properties, Property};
pub use reference_id::ReferenceId;
pub use reference_map::ReferenceMap;
pub use reference_name::ReferenceName;
pub use tangle::{Annotation, CycleDetector, Expansion, OutputLine, Tangler};
