use thiserror::Error;

/// Auth domain errors.
///
/// Normal negative outcomes (missing/expired/used token) are NOT errors -
/// the actions return `Ok(None)` for those so callers can answer with a
/// uniform "invalid or expired" message. Only rule violations and
/// infrastructure faults surface here.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("phone number already registered")]
    Conflict,

    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] anyhow::Error),
}
