use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::pg::Pg;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::core::app_error::{AppError, StdResponse};
use crate::core::app_state::AppState;
use crate::core::middleware;
use crate::models::UserEntity;
use crate::reconcile::{self, Role};
use crate::schema::users;

/// Defines admin-facing identity routes with OpenAPI specs. These edit
/// the identity record directly and never write back to role profiles.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/users",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_users))
            .routes(utoipa_axum::routes!(set_user_status))
            .routes(utoipa_axum::routes!(set_user_kyc))
            .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
    )
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

fn user_list_query(params: &UserListQuery) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table.into_boxed();

    // Unknown filter values mean "no filter", not an error.
    if let Some(role) = params.role.as_deref().and_then(Role::parse) {
        query = query.filter(users::role.eq(role.as_str()));
    }
    if let Some(status) = params
        .status
        .as_deref()
        .filter(|s| reconcile::is_identity_status(s))
    {
        query = query.filter(users::status.eq(status.to_string()));
    }
    if let Some(search) = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let like = format!("%{search}%");
        query = query.filter(
            users::name
                .ilike(like.clone())
                .or(users::phone.ilike(like.clone()))
                .or(users::email.ilike(like)),
        );
    }

    query
}

#[derive(Serialize, ToSchema)]
pub struct UserListRes {
    pub count: usize,
    pub users: Vec<UserEntity>,
}

/// List identity records across all roles, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    params(UserListQuery),
    responses(
        (status = 200, description = "Matching identities", body = StdResponse<UserListRes, String>)
    )
)]
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let users: Vec<UserEntity> = user_list_query(&params)
        .order(users::created_at.desc())
        .select(UserEntity::as_select())
        .load(conn)
        .await
        .context("Failed to list users")?;

    Ok(StdResponse {
        data: Some(UserListRes {
            count: users.len(),
            users,
        }),
        message: Some("Get users successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UserStatusBody {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserStatusRes {
    pub status: String,
}

/// Set an identity's status directly (active or suspended).
#[utoipa::path(
    put,
    path = "/{id}/status",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "User ID to update")
    ),
    request_body = UserStatusBody,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<UserStatusRes, String>),
        (status = 404, description = "User not found")
    )
)]
async fn set_user_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UserStatusBody>,
) -> Result<impl IntoResponse, AppError> {
    let status = body.status.trim().to_lowercase();
    if !matches!(status.as_str(), "active" | "suspended") {
        return Err(AppError::BadRequest("Invalid status".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(users::table.find(id))
        .set((
            users::status.eq(&status),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(UserStatusRes { status }),
        message: Some("Status updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UserKycBody {
    pub kyc_status: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserKycRes {
    pub kyc_status: String,
}

/// Set an identity's KYC verification state.
#[utoipa::path(
    put,
    path = "/{id}/kyc",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "User ID to update")
    ),
    request_body = UserKycBody,
    responses(
        (status = 200, description = "KYC status updated", body = StdResponse<UserKycRes, String>),
        (status = 404, description = "User not found")
    )
)]
async fn set_user_kyc(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UserKycBody>,
) -> Result<impl IntoResponse, AppError> {
    let kyc = body.kyc_status.trim().to_lowercase();
    if !reconcile::is_kyc_state(&kyc) {
        return Err(AppError::BadRequest("Invalid KYC status".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(users::table.find(id))
        .set((
            users::kyc_status.eq(&kyc),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(UserKycRes { kyc_status: kyc }),
        message: Some("KYC status updated successfully"),
    })
}
