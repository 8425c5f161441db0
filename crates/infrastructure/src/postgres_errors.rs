use schedly_core::AppError;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error to an application error.
///
/// Pool exhaustion, connection loss and transaction contention surface as
/// retryable `StorageUnavailable`; everything else is `Internal`.
pub(crate) fn storage_error(context: &str, error: sqlx::Error) -> AppError {
    let transient = match &error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(database_error) => matches!(
            database_error.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        ),
        _ => false,
    };

    if transient {
        AppError::StorageUnavailable(format!("{context}: {error}"))
    } else {
        AppError::Internal(format!("{context}: {error}"))
    }
}

/// Returns whether the error is a unique constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some(UNIQUE_VIOLATION);
    }

    false
}

/// Converts a stored integer column that must be non-negative.
pub(crate) fn non_negative(column: &str, value: i32) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::Internal(format!("stored {column} is negative: {value}")))
}
