//! Annotation protocol and the stitching reader.
//!
//! Tangled files are annotated with begin/end comments around every fragment
//! occurrence. Reading those markers back gives the fragment identity and the
//! edited content of each occurrence.

mod protocol;
mod stitch;

pub use protocol::{AnnotationSyntax, CloseMarker, OpenMarker};
pub use stitch::{read_fragments, read_fragments_from, FragmentReader, StitchedFragment};
