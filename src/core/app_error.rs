use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::aliases::DieselError;

/// Application-level error taxonomy. Validation failures are raised before
/// any transaction is opened; everything else surfaces after rollback.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{field} already exists")]
    Conflict { field: &'static str },
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    ForbiddenResource(String),
    #[error("{0} is unreachable")]
    ServiceUnreachable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Maps a unique-constraint name onto the field it guards, so a race that
/// slips past a pre-check still produces the same Conflict-by-field answer.
fn constraint_field(constraint: Option<&str>) -> &'static str {
    let name = constraint.unwrap_or_default();
    for field in ["phone", "email", "gst", "fssai", "code"] {
        if name.ends_with(field) {
            return field;
        }
    }
    "record"
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                AppError::Conflict {
                    field: constraint_field(info.constraint_name()),
                }
            }
            other => AppError::Other(other.into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Full detail stays server-side; callers get a generic message.
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!("internal error: {err:#}");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        let field = match &self {
            AppError::Conflict { field } => Some(*field),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                ok: false,
                field,
                message,
            }),
        )
            .into_response()
    }
}

/// Standard success envelope shared by every endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_name_maps_to_field() {
        assert_eq!(constraint_field(Some("uq_merchants_phone")), "phone");
        assert_eq!(constraint_field(Some("uq_merchants_gst")), "gst");
        assert_eq!(constraint_field(Some("uq_merchants_fssai")), "fssai");
        assert_eq!(constraint_field(Some("uq_users_email")), "email");
        assert_eq!(constraint_field(Some("uq_delivery_boys_user")), "record");
        assert_eq!(constraint_field(None), "record");
    }
}
