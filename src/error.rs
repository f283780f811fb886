//! Resolution error kinds.
//!
//! Forward rewriting and the lenient reverse entry points never surface these;
//! they exist for strict callers (batch import) and for internal control flow.

use thiserror::Error;

/// Why a token or URL could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    /// Value does not match the token grammar.
    #[error("no macro token in `{0}`")]
    TokenNotFound(String),

    /// Type is not listed in the type registry.
    #[error("type `{0}` is not registered for macros")]
    TypeUnmapped(String),

    /// Type path is not known to the model catalog (configuration error).
    #[error("unknown model type `{0}`")]
    UnknownType(String),

    /// Accessor name is not declared for the type.
    #[error("type `{type_ref}` has no accessor `{accessor}`")]
    UnknownAccessor { type_ref: String, accessor: String },

    /// No object with this primary key.
    #[error("no `{type_ref}` with primary key `{primary_key}`")]
    ObjectNotFound {
        type_ref: String,
        primary_key: String,
    },

    /// URL is unknown: not in the snapshot, not routable, or the view did not
    /// produce an object.
    #[error("url `{0}` not found")]
    UrlNotFound(String),

    /// Value already is a resolvable macro.
    #[error("`{0}` already is a macro")]
    AlreadyMacro(String),

    /// Value has only a query and/or a fragment.
    #[error("`{0}` has no path")]
    NoPath(String),

    /// Scheme or host is not served by this site.
    #[error("`{0}` points to a foreign site")]
    ForeignUrl(String),

    /// The routed view has no view mapping.
    #[error("view `{view}` for `{url}` is not registered")]
    Unregistered { url: String, view: String },

    /// The routed view is explicitly disabled.
    #[error("view `{view}` for `{url}` is disabled")]
    DisabledView { url: String, view: String },

    /// A redirect chain revisited a URL.
    #[error("redirect cycle at `{0}`")]
    RedirectCycle(String),

    /// A redirect response carried no usable target.
    #[error("redirect from `{0}` has no location")]
    RedirectFailed(String),

    /// The probe request panicked or returned an unusable status.
    #[error("probe of `{url}` failed with status {status}")]
    ProbeFailed { url: String, status: u16 },
}

impl ReplaceError {
    /// Kinds meaning "stop, the value is already fine": callers keep the value.
    pub fn keeps_value(&self) -> bool {
        matches!(
            self,
            Self::AlreadyMacro(_) | Self::NoPath(_) | Self::ForeignUrl(_)
        )
    }

    /// Configuration problems, as opposed to missing content.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::UnknownType(_) | Self::UnknownAccessor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_value() {
        assert!(ReplaceError::AlreadyMacro("x".into()).keeps_value());
        assert!(ReplaceError::NoPath("#a".into()).keeps_value());
        assert!(ReplaceError::ForeignUrl("http://a.com/".into()).keeps_value());
        assert!(!ReplaceError::RedirectCycle("/a".into()).keeps_value());
        assert!(!ReplaceError::UrlNotFound("/a".into()).keeps_value());
    }

    #[test]
    fn test_display() {
        let err = ReplaceError::ObjectNotFound {
            type_ref: "example.models.Page".into(),
            primary_key: "99".into(),
        };
        assert_eq!(
            err.to_string(),
            "no `example.models.Page` with primary key `99`"
        );
        assert!(ReplaceError::UnknownType("a.B".into()).is_config_error());
    }
}
