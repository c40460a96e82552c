//! Annotation method configuration.

use serde::{Deserialize, Serialize};

/// How tangled output is annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMethod {
    /// Begin/end marker comments around every fragment; supports stitching.
    #[default]
    Standard,

    /// No annotations, just the code.
    Naked,

    /// No annotations, but a blank line between fragments.
    Bare,
}

impl AnnotationMethod {
    /// Returns true if this method produces annotations.
    pub fn has_annotations(&self) -> bool {
        matches!(self, AnnotationMethod::Standard)
    }

    /// Output that cannot be stitched back.
    pub fn is_one_way(&self) -> bool {
        !self.has_annotations()
    }
}

impl std::str::FromStr for AnnotationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(AnnotationMethod::Standard),
            "naked" => Ok(AnnotationMethod::Naked),
            "bare" => Ok(AnnotationMethod::Bare),
            other => Err(format!("unknown annotation method `{}`", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(AnnotationMethod::default(), AnnotationMethod::Standard);
        assert!(AnnotationMethod::Standard.has_annotations());
        assert!(AnnotationMethod::Naked.is_one_way());
        assert!(AnnotationMethod::Bare.is_one_way());
    }

    #[test]
    fn test_serde() {
        let naked: AnnotationMethod = serde_json::from_str("\"naked\"").unwrap();
        assert_eq!(naked, AnnotationMethod::Naked);

        let bare: AnnotationMethod = serde_json::from_str("\"bare\"").unwrap();
        assert_eq!(bare, AnnotationMethod::Bare);

        assert!(serde_json::from_str::<AnnotationMethod>("\"fancy\"").is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Bare".parse::<AnnotationMethod>(), Ok(AnnotationMethod::Bare));
        assert!("other".parse::<AnnotationMethod>().is_err());
    }
}
