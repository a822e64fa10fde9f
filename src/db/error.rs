use rusqlite::{ffi, Error as SqlError};
use thiserror::Error;

/// Everything that can go wrong between a view and the SQLite store. Each
/// variant renders a message that is safe to show in the footer as-is.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("{action}: {source}")]
    Sqlite {
        action: &'static str,
        #[source]
        source: SqlError,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{0}")]
    Constraint(String),
    #[error("no copies of \"{title}\" are available")]
    Unavailable { title: String },
    #[error("{0}")]
    Invalid(String),
    #[error("failed to prepare data directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = DataAccessError> = std::result::Result<T, E>;

/// Attach a short description of the query that failed, mirroring the
/// `.context("failed to ...")` calls used at the application edge.
pub(crate) trait SqlContext<T> {
    fn during(self, action: &'static str) -> Result<T>;
}

impl<T> SqlContext<T> for std::result::Result<T, SqlError> {
    fn during(self, action: &'static str) -> Result<T> {
        self.map_err(|source| DataAccessError::Sqlite { action, source })
    }
}

/// Which constraint a failed statement tripped, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    Check,
    ForeignKey,
    Other,
}

pub(crate) fn violation(err: &SqlError) -> Option<Violation> {
    let code = err.sqlite_error()?;
    if code.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }
    Some(match code.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Violation::Unique,
        ffi::SQLITE_CONSTRAINT_CHECK => Violation::Check,
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
        _ => Violation::Other,
    })
}
