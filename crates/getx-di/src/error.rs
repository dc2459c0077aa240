#![forbid(unsafe_code)]

//! Errors from container lookups and removals.

/// Errors from [`Container`](crate::Container) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Nothing is registered under this type and tag.
    NotFound {
        type_name: &'static str,
        tag: Option<String>,
    },
    /// The entry is permanent; use `force_delete`.
    Permanent {
        type_name: &'static str,
        tag: Option<String>,
    },
    /// A builder produced a value of a different type than registered.
    TypeMismatch { type_name: &'static str },
}

fn describe(type_name: &str, tag: &Option<String>) -> String {
    match tag {
        Some(tag) => format!("\"{type_name}\" with tag \"{tag}\""),
        None => format!("\"{type_name}\""),
    }
}

impl std::fmt::Display for DiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { type_name, tag } => {
                write!(f, "{} not found; register it before use", describe(type_name, tag))
            }
            Self::Permanent { type_name, tag } => {
                write!(f, "{} is permanent and was not deleted", describe(type_name, tag))
            }
            Self::TypeMismatch { type_name } => {
                write!(f, "registered builder did not produce \"{type_name}\"")
            }
        }
    }
}

impl std::error::Error for DiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_tag() {
        let err = DiError::NotFound {
            type_name: "Api",
            tag: Some("v2".into()),
        };
        assert_eq!(
            err.to_string(),
            "\"Api\" with tag \"v2\" not found; register it before use"
        );
        let err = DiError::Permanent {
            type_name: "Api",
            tag: None,
        };
        assert_eq!(err.to_string(), "\"Api\" is permanent and was not deleted");
    }
}
