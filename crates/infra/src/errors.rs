//! Conversions from external infrastructure errors into domain errors.

use mktsync_common::CryptoError;
use mktsync_domain::MarketplaceError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MarketplaceError);

impl From<InfraError> for MarketplaceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MarketplaceError> for InfraError {
    fn from(value: MarketplaceError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMarketplaceError {
    fn into_marketplace(self) -> MarketplaceError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → MarketplaceError */
/* -------------------------------------------------------------------------- */

impl IntoMarketplaceError for SqlError {
    fn into_marketplace(self) -> MarketplaceError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        MarketplaceError::Storage("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        MarketplaceError::Storage("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        MarketplaceError::Storage("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        MarketplaceError::Storage("foreign key constraint violation".into())
                    }
                    _ => MarketplaceError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                MarketplaceError::Storage("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                MarketplaceError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                MarketplaceError::Storage(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                MarketplaceError::Storage("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidQuery => MarketplaceError::Storage("invalid SQL query".into()),
            other => MarketplaceError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_marketplace())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → MarketplaceError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(MarketplaceError::Storage(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MarketplaceError */
/* -------------------------------------------------------------------------- */

impl IntoMarketplaceError for HttpError {
    fn into_marketplace(self) -> MarketplaceError {
        if self.is_timeout() {
            return MarketplaceError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MarketplaceError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => MarketplaceError::Auth { message, status: Some(code) },
                429 => MarketplaceError::RateLimited(message),
                _ => MarketplaceError::Api { message, status: code },
            };
        }

        MarketplaceError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_marketplace())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → MarketplaceError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(MarketplaceError::Internal(format!("JSON serialization failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* CryptoError → MarketplaceError */
/* -------------------------------------------------------------------------- */

impl From<CryptoError> for InfraError {
    fn from(value: CryptoError) -> Self {
        InfraError(MarketplaceError::Security(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
