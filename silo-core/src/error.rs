use serde_json::json;
use thiserror::Error;

/// Failure taxonomy of the layer.
///
/// Every store operation reports its outcome through these variants instead
/// of sentinel return values: integrity violations and schema bugs always
/// reach the caller, transient connection trouble surfaces after the single
/// bounded retry, and the "first match" lookups turn an empty result into
/// [`Error::NotFound`].
#[derive(Error, Debug)]
pub enum Error {
    /// A required schema field was missing at construction time.
    #[error("no {0} provided")]
    MissingField(&'static str),

    /// A first-match lookup found zero rows.
    #[error("does not exist")]
    NotFound,

    /// Uniqueness or foreign-key violation, caller-actionable.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Unknown column, malformed SQL or a value/type mismatch: a bug in
    /// query synthesis or in an entity schema, not a runtime condition.
    #[error("schema error: {0}")]
    Schema(String),

    /// Connection-level failure that survived the one reconnect attempt.
    #[error("transient database failure: {0}")]
    Transient(String),

    /// Everything else.
    #[error("{0}")]
    Fatal(String),
}

impl Error {
    /// Serializable projection suitable for surfacing to an API caller.
    ///
    /// [`Error::NotFound`] always renders the fixed payload
    /// `{"msg": "Does not exist", "success": false}`.
    pub fn payload(&self) -> serde_json::Value {
        let msg = match self {
            Error::NotFound => "Does not exist".to_string(),
            other => other.to_string(),
        };
        json!({ "msg": msg, "success": false })
    }
}
