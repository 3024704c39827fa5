//! Error types for pagebench.
//!
//! All public APIs return `PageResult<T>`. No panics in library code.

use thiserror::Error;

/// Unified error type for generation, strategies and the harness.
#[derive(Debug, Error)]
pub enum PageError {
    /// Store unreachable, connection closed or authentication failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Unique/foreign-key conflict, including deferred checks at commit
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Malformed or rejected statement
    #[error("query error: {message}\nContext: {context}")]
    Query { message: String, context: String },

    /// Result row or document missing an expected column (schema drift)
    #[error("shape error: {0}")]
    Shape(String),

    /// Invalid arguments
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Performance regression detected
    #[error("performance regression detected for '{name}': baseline={baseline:.2}ms, current={current:.2}ms, ratio={ratio:.2}x")]
    PerformanceRegression {
        name: String,
        baseline: f64,
        current: f64,
        ratio: f64,
    },
}

/// Result type alias for all pagebench operations.
pub type PageResult<T> = Result<T, PageError>;

impl PageError {
    /// Wraps a store error with the statement (or step) that produced it.
    pub fn query(err: postgres::Error, context: impl Into<String>) -> Self {
        match PageError::from(err) {
            PageError::Query {
                message,
                context: detail,
            } => PageError::Query {
                message,
                context: format!("{} [{detail}]", context.into()),
            },
            other => other,
        }
    }

    /// True for errors that make the rest of a benchmark run pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageError::Connection(_))
    }
}

/// SQLSTATE classes: 08 connection exception, 28 invalid authorization,
/// 23 integrity constraint violation.
fn classify_sqlstate(code: &str, message: String) -> Result<PageError, String> {
    match code.get(..2) {
        Some("08") | Some("28") => Ok(PageError::Connection(message)),
        Some("23") => Ok(PageError::ConstraintViolation(message)),
        _ => Err(message),
    }
}

impl From<postgres::Error> for PageError {
    fn from(err: postgres::Error) -> Self {
        if let Some(db) = err.as_db_error() {
            let message = match db.detail() {
                Some(detail) => format!("{} ({detail})", db.message()),
                None => db.message().to_string(),
            };
            return classify_sqlstate(db.code().code(), message).unwrap_or_else(|message| {
                PageError::Query {
                    message,
                    context: format!("SQLSTATE {}", db.code().code()),
                }
            });
        }

        let io_source = std::error::Error::source(&err)
            .is_some_and(|source| source.downcast_ref::<std::io::Error>().is_some());
        if err.is_closed() || io_source {
            return PageError::Connection(err.to_string());
        }

        PageError::Query {
            message: err.to_string(),
            context: "client".to_string(),
        }
    }
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        PageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_connection() {
        let err = PageError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "connection error: refused");
        assert!(err.is_fatal());
    }

    #[test]
    fn error_display_query() {
        let err = PageError::Query {
            message: "syntax error at or near \"selec\"".to_string(),
            context: "offset-limit page".to_string(),
        };
        assert!(err.to_string().contains("query error"));
        assert!(err.to_string().contains("offset-limit page"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn error_display_shape() {
        let err = PageError::Shape("column 7 (_address_count) missing".to_string());
        assert_eq!(
            err.to_string(),
            "shape error: column 7 (_address_count) missing"
        );
    }

    #[test]
    fn sqlstate_classes_map_to_taxonomy() {
        assert!(matches!(
            classify_sqlstate("23505", "dup".to_string()),
            Ok(PageError::ConstraintViolation(_))
        ));
        assert!(matches!(
            classify_sqlstate("28P01", "auth".to_string()),
            Ok(PageError::Connection(_))
        ));
        assert!(matches!(
            classify_sqlstate("08006", "gone".to_string()),
            Ok(PageError::Connection(_))
        ));
        assert_eq!(
            classify_sqlstate("42601", "syntax".to_string()).unwrap_err(),
            "syntax"
        );
        assert!(classify_sqlstate("", "empty".to_string()).is_err());
    }

    #[test]
    fn error_display_regression() {
        let err = PageError::PerformanceRegression {
            name: "offset-limit".to_string(),
            baseline: 10.0,
            current: 25.0,
            ratio: 2.5,
        };
        assert!(err.to_string().contains("offset-limit"));
        assert!(err.to_string().contains("2.50x"));
    }

    #[test]
    fn serde_json_error_converts() {
        let err: PageError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, PageError::Serialization(_)));
    }
}
