use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::pg::Pg;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::core::app_error::{AppError, StdResponse};
use crate::core::app_state::AppState;
use crate::core::middleware;
use crate::models::{CreateMerchantEntity, MerchantEntity, UpdateMerchantEntity};
use crate::pagination::{self, PageRes};
use crate::reconcile::{self, EnsureIdentity, Role};
use crate::schema::merchants;
use crate::validate;

/// Defines admin-facing merchant routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/merchants",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_merchant))
            .routes(utoipa_axum::routes!(list_merchants))
            .routes(utoipa_axum::routes!(get_merchant))
            .routes(utoipa_axum::routes!(update_merchant))
            .routes(utoipa_axum::routes!(set_merchant_status))
            .routes(utoipa_axum::routes!(approve_merchant))
            .routes(utoipa_axum::routes!(set_merchant_open))
            .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
    )
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MerchantBody {
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub gst: Option<String>,
    pub fssai: String,
    pub status: Option<String>,
}

/// Field-format checks shared by create and update. Runs before any
/// transaction is opened.
fn validate_merchant_body(body: &MerchantBody) -> Result<(), AppError> {
    if body.store_name.trim().is_empty()
        || body.owner_name.trim().is_empty()
        || body.city.trim().is_empty()
        || body.category.trim().is_empty()
    {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }
    if !validate::is_phone10(&body.phone) {
        return Err(AppError::BadRequest("Phone must be 10 digits".into()));
    }
    if let Some(email) = body.email.as_deref() {
        if !email.trim().is_empty() && !validate::is_email(email) {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
    }
    if let Some(gst) = body.gst.as_deref() {
        if !gst.trim().is_empty() && !validate::is_gstin(gst) {
            return Err(AppError::BadRequest("Invalid GSTIN format".into()));
        }
    }
    if !validate::is_fssai(&body.fssai) {
        return Err(AppError::BadRequest("Invalid FSSAI (14 digits required)".into()));
    }
    Ok(())
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Serialize, ToSchema)]
pub struct CreateMerchantRes {
    pub id: i32,
    pub merchant_code: String,
    pub user_id: i32,
}

/// Onboard a merchant: reconcile the identity row and insert the profile
/// in one transaction.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    request_body = MerchantBody,
    responses(
        (status = 200, description = "Merchant created", body = StdResponse<CreateMerchantRes, String>),
        (status = 409, description = "Phone/email/GST/FSSAI already used")
    )
)]
async fn create_merchant(
    State(state): State<AppState>,
    Json(body): Json<MerchantBody>,
) -> Result<impl IntoResponse, AppError> {
    validate_merchant_body(&body)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let status = reconcile::safe_merchant_status(body.status.as_deref());
    let store_name = body.store_name.trim().to_string();
    let owner_name = body.owner_name.trim().to_string();
    let phone = body.phone.trim().to_string();
    let email = clean_optional(body.email.as_deref());
    let address = clean_optional(body.address.as_deref());
    let city = body.city.trim().to_string();
    let category = body.category.trim().to_string();
    let gst = clean_optional(body.gst.as_deref()).map(|g| g.to_uppercase());
    let fssai = body.fssai.trim().to_string();

    let (id, code, user_id) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                reconcile::check_merchant_uniqueness(
                    conn,
                    &phone,
                    email.as_deref(),
                    gst.as_deref(),
                    &fssai,
                    None,
                )
                .await?;

                let user_id = reconcile::ensure_identity_for_role(
                    conn,
                    EnsureIdentity {
                        phone: &phone,
                        email: email.as_deref(),
                        name_candidates: &[Some(&owner_name), Some(&store_name)],
                        address: address.as_deref(),
                        role: Role::Merchant,
                        status,
                    },
                )
                .await?;

                let id: i32 = diesel::insert_into(merchants::table)
                    .values(CreateMerchantEntity {
                        user_id,
                        store_name,
                        owner_name,
                        phone,
                        email,
                        address,
                        city,
                        category,
                        gst,
                        fssai,
                        status: status.to_string(),
                    })
                    .returning(merchants::id)
                    .get_result(conn)
                    .await?;

                let code = reconcile::merchant_code(id);
                diesel::update(merchants::table.find(id))
                    .set(merchants::merchant_code.eq(&code))
                    .execute(conn)
                    .await?;

                Ok::<(i32, String, i32), AppError>((id, code, user_id))
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(CreateMerchantRes {
            id,
            merchant_code: code,
            user_id,
        }),
        message: Some("Merchant created successfully"),
    })
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct MerchantListQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

fn merchant_list_query(params: &MerchantListQuery) -> merchants::BoxedQuery<'static, Pg> {
    let mut query = merchants::table.into_boxed();

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let like = format!("%{q}%");
        query = query.filter(
            merchants::store_name
                .ilike(like.clone())
                .or(merchants::owner_name.ilike(like.clone()))
                .or(merchants::phone.ilike(like.clone()))
                .or(merchants::email.ilike(like.clone()))
                .or(merchants::gst.ilike(like.clone()))
                .or(merchants::fssai.ilike(like)),
        );
    }
    if let Some(city) = params.city.as_deref().filter(|c| !c.is_empty()) {
        query = query.filter(merchants::city.eq(city.to_string()));
    }
    if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
        query = query.filter(merchants::category.eq(category.to_string()));
    }
    // Unknown status values mean "no filter", not an error.
    if let Some(status @ ("active" | "inactive")) = params.status.as_deref() {
        query = query.filter(merchants::status.eq(status.to_string()));
    }

    query
}

/// List merchant profiles, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(MerchantListQuery),
    responses(
        (status = 200, description = "Paginated merchants", body = StdResponse<PageRes<MerchantEntity>, String>)
    )
)]
async fn list_merchants(
    State(state): State<AppState>,
    Query(params): Query<MerchantListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let page = pagination::clamp_page(params.page);
    let page_size = pagination::clamp_page_size(params.page_size, pagination::MERCHANT_MAX_PAGE_SIZE);

    let total: i64 = merchant_list_query(&params)
        .count()
        .get_result(conn)
        .await
        .context("Failed to count merchants")?;

    let rows: Vec<MerchantEntity> = merchant_list_query(&params)
        .order(merchants::id.desc())
        .limit(page_size)
        .offset(pagination::offset(page, page_size))
        .select(MerchantEntity::as_select())
        .load(conn)
        .await
        .context("Failed to list merchants")?;

    Ok(StdResponse {
        data: Some(PageRes {
            page,
            page_size,
            total,
            rows,
        }),
        message: Some("Get merchants successfully"),
    })
}

/// Fetch a single merchant profile.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Merchant ID to fetch")
    ),
    responses(
        (status = 200, description = "Merchant found", body = StdResponse<MerchantEntity, String>),
        (status = 404, description = "Merchant not found")
    )
)]
async fn get_merchant(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let merchant: MerchantEntity = merchants::table
        .find(id)
        .select(MerchantEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(merchant),
        message: Some("Get merchant successfully"),
    })
}

#[derive(Serialize, ToSchema)]
pub struct UpdateMerchantRes {
    pub user_id: i32,
}

/// Replace a merchant profile and re-sync its identity row.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Merchant ID to update")
    ),
    request_body = MerchantBody,
    responses(
        (status = 200, description = "Merchant updated", body = StdResponse<UpdateMerchantRes, String>),
        (status = 404, description = "Merchant not found"),
        (status = 409, description = "Phone/email/GST/FSSAI already used")
    )
)]
async fn update_merchant(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<MerchantBody>,
) -> Result<impl IntoResponse, AppError> {
    validate_merchant_body(&body)?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let status = reconcile::safe_merchant_status(body.status.as_deref());
    let store_name = body.store_name.trim().to_string();
    let owner_name = body.owner_name.trim().to_string();
    let phone = body.phone.trim().to_string();
    let email = clean_optional(body.email.as_deref());
    let address = clean_optional(body.address.as_deref());
    let city = body.city.trim().to_string();
    let category = body.category.trim().to_string();
    let gst = clean_optional(body.gst.as_deref()).map(|g| g.to_uppercase());
    let fssai = body.fssai.trim().to_string();

    let user_id = conn
        .transaction(move |conn| {
            Box::pin(async move {
                reconcile::check_merchant_uniqueness(
                    conn,
                    &phone,
                    email.as_deref(),
                    gst.as_deref(),
                    &fssai,
                    Some(id),
                )
                .await?;

                let user_id = reconcile::ensure_identity_for_role(
                    conn,
                    EnsureIdentity {
                        phone: &phone,
                        email: email.as_deref(),
                        name_candidates: &[Some(&owner_name), Some(&store_name)],
                        address: address.as_deref(),
                        role: Role::Merchant,
                        status,
                    },
                )
                .await?;

                let updated = diesel::update(merchants::table.find(id))
                    .set((
                        UpdateMerchantEntity {
                            user_id: Some(user_id),
                            store_name,
                            owner_name,
                            phone,
                            email,
                            address,
                            city,
                            category,
                            gst,
                            fssai,
                            status: status.to_string(),
                        },
                        merchants::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Err(AppError::NotFound);
                }

                Ok::<i32, AppError>(user_id)
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(UpdateMerchantRes { user_id }),
        message: Some("Merchant updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MerchantStatusBody {
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MerchantStatusRes {
    pub status: String,
}

/// Set the profile status and mirror it onto the identity record.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Merchant ID to update")
    ),
    request_body = MerchantStatusBody,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<MerchantStatusRes, String>),
        (status = 404, description = "Merchant not found")
    )
)]
async fn set_merchant_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<MerchantStatusBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let status = reconcile::safe_merchant_status(body.status.as_deref());

    conn.transaction(move |conn| {
        Box::pin(async move {
            let updated = diesel::update(merchants::table.find(id))
                .set((
                    merchants::status.eq(status),
                    merchants::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
            if updated == 0 {
                return Err(AppError::NotFound);
            }

            let (user_id, phone, email): (Option<i32>, String, Option<String>) = merchants::table
                .find(id)
                .select((merchants::user_id, merchants::phone, merchants::email))
                .first(conn)
                .await?;
            reconcile::sync_identity_status(conn, user_id, &phone, email.as_deref(), status).await?;

            Ok::<(), AppError>(())
        })
    })
    .await?;

    Ok(StdResponse {
        data: Some(MerchantStatusRes {
            status: status.to_string(),
        }),
        message: Some("Status updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MerchantApproveBody {
    pub approved: Option<bool>,
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MerchantApproveRes {
    pub approved: bool,
}

/// Approve or unapprove a merchant; an optional status in the body is
/// applied to the profile and mirrored onto the identity record.
#[utoipa::path(
    patch,
    path = "/{id}/approve",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Merchant ID to approve")
    ),
    request_body = MerchantApproveBody,
    responses(
        (status = 200, description = "Approval updated", body = StdResponse<MerchantApproveRes, String>),
        (status = 404, description = "Merchant not found")
    )
)]
async fn approve_merchant(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<MerchantApproveBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    // Missing flag keeps the historical default of approving.
    let approved = body.approved.unwrap_or(true);
    let status = body
        .status
        .as_deref()
        .map(|s| reconcile::safe_merchant_status(Some(s)));
    let approved_at = approved.then(Utc::now);

    conn.transaction(move |conn| {
        Box::pin(async move {
            let updated = match status {
                Some(s) => {
                    diesel::update(merchants::table.find(id))
                        .set((
                            merchants::approved_at.eq(approved_at),
                            merchants::status.eq(s),
                            merchants::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?
                }
                None => {
                    diesel::update(merchants::table.find(id))
                        .set((
                            merchants::approved_at.eq(approved_at),
                            merchants::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?
                }
            };
            if updated == 0 {
                return Err(AppError::NotFound);
            }

            if let Some(s) = status {
                let (user_id, phone, email): (Option<i32>, String, Option<String>) =
                    merchants::table
                        .find(id)
                        .select((merchants::user_id, merchants::phone, merchants::email))
                        .first(conn)
                        .await?;
                reconcile::sync_identity_status(conn, user_id, &phone, email.as_deref(), s).await?;
            }

            Ok::<(), AppError>(())
        })
    })
    .await?;

    Ok(StdResponse {
        data: Some(MerchantApproveRes { approved }),
        message: Some("Approval updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct MerchantOpenBody {
    #[serde(alias = "open")]
    pub is_open: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MerchantOpenRes {
    pub is_open: bool,
}

/// Toggle the operating flag; independent of profile status and never
/// propagated to the identity record.
#[utoipa::path(
    patch,
    path = "/{id}/open",
    tags = ["Merchants"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Merchant ID to toggle")
    ),
    request_body = MerchantOpenBody,
    responses(
        (status = 200, description = "Operating flag updated", body = StdResponse<MerchantOpenRes, String>),
        (status = 404, description = "Merchant not found")
    )
)]
async fn set_merchant_open(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<MerchantOpenBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(merchants::table.find(id))
        .set((
            merchants::is_open.eq(body.is_open),
            merchants::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(MerchantOpenRes {
            is_open: body.is_open,
        }),
        message: Some("Operating flag updated successfully"),
    })
}
