use parkline_core::CoreError;
use tracing::error;

/// Translate a sqlx failure into the domain taxonomy.
///
/// `what` names the entity for constraint messages, e.g. "username or email".
pub(crate) fn map_db_error(err: sqlx::Error, what: &str) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CoreError::Integrity(format!("{} already exists", what));
        }
        if db.is_foreign_key_violation() {
            return CoreError::NotFound(format!("referenced {} does not exist", what));
        }
    }
    storage(err)
}

pub(crate) fn storage(err: sqlx::Error) -> CoreError {
    error!("Database error: {}", err);
    CoreError::Storage(err.to_string())
}

/// Rows carry enums as text; a value outside the CHECK set means the
/// database was written by something else.
pub(crate) fn corrupt(err: CoreError) -> CoreError {
    CoreError::Storage(format!("Corrupt row: {}", err))
}
