use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;

use crate::core::app_error::{AppError, StdResponse};
use crate::core::app_state::AppState;
use crate::core::middleware;
use crate::models::{AppSettingsEntity, PatchAppSettingsEntity};
use crate::schema::app_settings;

/// Marketplace configuration lives in a single seeded row.
const SETTINGS_ROW: i32 = 1;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/settings",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_settings))
            .routes(utoipa_axum::routes!(update_settings))
            .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
    )
}

/// Read the full settings record.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Settings"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current settings", body = StdResponse<AppSettingsEntity, String>)
    )
)]
async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let settings: AppSettingsEntity = app_settings::table
        .find(SETTINGS_ROW)
        .select(AppSettingsEntity::as_select())
        .get_result(conn)
        .await
        .context("Settings row missing")?;

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Get settings successfully"),
    })
}

/// Patch the settings record; absent fields keep their stored value.
#[utoipa::path(
    put,
    path = "/",
    tags = ["Settings"],
    security(("bearerAuth" = [])),
    request_body = PatchAppSettingsEntity,
    responses(
        (status = 200, description = "Updated settings", body = StdResponse<AppSettingsEntity, String>)
    )
)]
async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<PatchAppSettingsEntity>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cycle) = body.payout_cycle.as_deref() {
        if !matches!(cycle, "weekly" | "monthly") {
            return Err(AppError::BadRequest(
                "payout_cycle must be weekly|monthly".into(),
            ));
        }
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let settings: AppSettingsEntity = diesel::update(app_settings::table.find(SETTINGS_ROW))
        .set((body, app_settings::updated_at.eq(diesel::dsl::now)))
        .returning(AppSettingsEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(settings),
        message: Some("Settings updated successfully"),
    })
}
