#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid severity type code: {0}")]
    InvalidTypeCode(i32),
}
