use crate::store::StoreError;
use uuid::Uuid;

/// Error taxonomy for the resolution-and-access core.
///
/// Every variant is a typed outcome the calling UI can branch on; none of them
/// is a transport fault. In particular [`CoreError::NotFound`] ("no such
/// record") and [`CoreError::Denied`] ("you are not permitted") are distinct so
/// callers can present them differently.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("no record matches the supplied code")]
    NotFound,
    #[error("access denied: {0}")]
    Denied(String),
    #[error("emergency record is already converted")]
    AlreadyConverted {
        /// Store key of the Patient the record was promoted into, when the
        /// link is known. Callers treat this error as success-equivalent and
        /// follow the link.
        linked_patient: Option<Uuid>,
    },
    #[error("could not allocate a unique code within {0} attempts")]
    GenerationExhausted(u32),
    #[error("visit is already completed")]
    VisitClosed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
            // A conflict that reaches this conversion was not handled by a
            // corrective retry loop, so it is surfaced as a store fault.
            StoreError::Conflict => {
                CoreError::StoreUnavailable("conflicting concurrent write".into())
            }
        }
    }
}

impl From<medconnect_codes::CodeError> for CoreError {
    fn from(err: medconnect_codes::CodeError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<medconnect_types::TextError> for CoreError {
    fn from(err: medconnect_types::TextError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
