use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::dsl::{IntoBoxed, LeftJoin};
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
use crate::models::{
    CreateDeliveryBoyEntity, DeliveryBoyEntity, PatchDeliveryBoyBankEntity, PatchDeliveryBoyEntity,
    PatchUserEntity, UserEntity,
};
use crate::pagination::{self, PageRes};
use crate::reconcile::{self, EnsureIdentity, Role};
use crate::schema::{delivery_boys, users};
use crate::validate;

/// Defines admin-facing rider routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/riders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_rider))
            .routes(utoipa_axum::routes!(list_riders))
            .routes(utoipa_axum::routes!(get_rider))
            .routes(utoipa_axum::routes!(update_rider_profile))
            .routes(utoipa_axum::routes!(update_rider_bank))
            .routes(utoipa_axum::routes!(set_rider_online))
            .routes(utoipa_axum::routes!(set_rider_kyc))
            .routes(utoipa_axum::routes!(set_rider_approval))
            .routes(utoipa_axum::routes!(set_rider_status))
            .routes(utoipa_axum::routes!(delete_rider))
            .route_layer(axum::middleware::from_fn(middleware::admin_authorization)),
    )
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateRiderBody {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub vehicle: Option<String>,
    #[serde(alias = "vehicle_no")]
    pub vehicle_number: Option<String>,
    pub license_no: Option<String>,
    pub aadhaar: Option<String>,
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub ifsc: Option<String>,
    pub upi: Option<String>,
    pub area: Option<String>,
    pub online: Option<bool>,
    pub status: Option<String>,
    pub kyc_status: Option<String>,
    pub approval_status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateRiderRes {
    pub id: i32,
    pub rider_id: i32,
}

/// Onboard a rider: identity plus profile in one transaction. The phone
/// must be unused across all identities, not just rider profiles.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    request_body = CreateRiderBody,
    responses(
        (status = 200, description = "Rider created", body = StdResponse<CreateRiderRes, String>),
        (status = 409, description = "Phone already exists")
    )
)]
async fn create_rider(
    State(state): State<AppState>,
    Json(body): Json<CreateRiderBody>,
) -> Result<impl IntoResponse, AppError> {
    let phone = body.phone.trim().to_string();
    if !validate::is_phone10(&phone) {
        return Err(AppError::BadRequest("Valid 10-digit phone required".into()));
    }
    if let Some(email) = body.email.as_deref() {
        if !email.trim().is_empty() && !validate::is_email(email) {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let status = reconcile::safe_identity_status(body.status.as_deref());
    let kyc_status = body
        .kyc_status
        .as_deref()
        .filter(|s| reconcile::is_review_state(s))
        .unwrap_or("pending")
        .to_string();
    // New riders start pending unless explicitly created as approved.
    let approval_status = body
        .approval_status
        .as_deref()
        .filter(|s| reconcile::is_review_state(s))
        .unwrap_or("pending")
        .to_string();
    let approved_at = (approval_status == "approved").then(Utc::now);
    let online = body.online.unwrap_or(false);

    let (id, rider_id) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let taken: i64 = users::table
                    .filter(users::phone.eq(&phone))
                    .count()
                    .get_result(conn)
                    .await?;
                if taken > 0 {
                    return Err(AppError::Conflict { field: "phone" });
                }

                let user_id = reconcile::ensure_identity_for_role(
                    conn,
                    EnsureIdentity {
                        phone: &phone,
                        email: body.email.as_deref(),
                        name_candidates: &[body.name.as_deref()],
                        address: body.address.as_deref(),
                        role: Role::Rider,
                        status,
                    },
                )
                .await?;

                let rider_id: i32 = diesel::insert_into(delivery_boys::table)
                    .values(CreateDeliveryBoyEntity {
                        user_id,
                        vehicle: body.vehicle.unwrap_or("Bike".to_string()),
                        vehicle_number: body.vehicle_number,
                        license_no: body.license_no,
                        aadhaar: body.aadhaar,
                        bank_name: body.bank_name,
                        account_no: body.account_no,
                        ifsc: body.ifsc,
                        upi: body.upi,
                        area: body.area,
                        online_status: if online { "online" } else { "offline" }.to_string(),
                        kyc_status,
                        approval_status,
                        approved_at,
                    })
                    .returning(delivery_boys::id)
                    .get_result(conn)
                    .await?;

                Ok::<(i32, i32), AppError>((user_id, rider_id))
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(CreateRiderRes { id, rider_id }),
        message: Some("Rider created successfully"),
    })
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct RiderListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub kyc: Option<String>,
    pub approval: Option<String>,
    pub online: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

type RiderListSource = IntoBoxed<'static, LeftJoin<users::table, delivery_boys::table>, Pg>;

fn rider_list_query(params: &RiderListQuery) -> RiderListSource {
    let mut query = users::table.left_join(delivery_boys::table).into_boxed();
    query = query.filter(users::role.eq("rider"));

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let like = format!("%{q}%");
        query = query.filter(
            users::name
                .ilike(like.clone())
                .or(users::phone.ilike(like.clone()))
                .or(users::email.ilike(like.clone()))
                .or(delivery_boys::area.ilike(like.clone()))
                .or(delivery_boys::vehicle_number.ilike(like.clone()))
                .or(delivery_boys::license_no.ilike(like)),
        );
    }
    // Unknown filter values mean "no filter", not an error.
    if let Some(status) = params.status.as_deref().filter(|s| reconcile::is_identity_status(s)) {
        query = query.filter(users::status.eq(status.to_string()));
    }
    if let Some(kyc) = params.kyc.as_deref().filter(|s| reconcile::is_review_state(s)) {
        query = query.filter(delivery_boys::kyc_status.eq(kyc.to_string()));
    }
    if let Some(approval) = params
        .approval
        .as_deref()
        .filter(|s| reconcile::is_review_state(s))
    {
        query = query.filter(delivery_boys::approval_status.eq(approval.to_string()));
    }
    match params.online.as_deref() {
        Some("1") => query = query.filter(delivery_boys::online_status.eq("online")),
        Some("0") => query = query.filter(delivery_boys::online_status.eq("offline")),
        _ => {}
    }

    query
}

#[derive(Serialize, ToSchema)]
pub struct RiderRow {
    pub user: UserEntity,
    pub profile: Option<DeliveryBoyEntity>,
}

/// List rider identities with their profiles, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(RiderListQuery),
    responses(
        (status = 200, description = "Paginated riders", body = StdResponse<PageRes<RiderRow>, String>)
    )
)]
async fn list_riders(
    State(state): State<AppState>,
    Query(params): Query<RiderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let page = pagination::clamp_page(params.page);
    let page_size = pagination::clamp_page_size(params.page_size, pagination::RIDER_MAX_PAGE_SIZE);

    let total: i64 = rider_list_query(&params)
        .count()
        .get_result(conn)
        .await
        .context("Failed to count riders")?;

    let rows: Vec<(UserEntity, Option<DeliveryBoyEntity>)> = rider_list_query(&params)
        .order(users::id.desc())
        .limit(page_size)
        .offset(pagination::offset(page, page_size))
        .select((
            UserEntity::as_select(),
            Option::<DeliveryBoyEntity>::as_select(),
        ))
        .load(conn)
        .await
        .context("Failed to list riders")?;

    let rows = rows
        .into_iter()
        .map(|(user, profile)| RiderRow { user, profile })
        .collect();

    Ok(StdResponse {
        data: Some(PageRes {
            page,
            page_size,
            total,
            rows,
        }),
        message: Some("Get riders successfully"),
    })
}

/// Fetch a single rider with profile data.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to fetch")
    ),
    responses(
        (status = 200, description = "Rider found", body = StdResponse<RiderRow, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn get_rider(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (user, profile): (UserEntity, Option<DeliveryBoyEntity>) = users::table
        .left_join(delivery_boys::table)
        .filter(users::id.eq(id))
        .filter(users::role.eq("rider"))
        .select((
            UserEntity::as_select(),
            Option::<DeliveryBoyEntity>::as_select(),
        ))
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(RiderRow { user, profile }),
        message: Some("Get rider successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RiderProfileBody {
    pub name: Option<String>,
    pub address: Option<String>,
    pub vehicle: Option<String>,
    #[serde(alias = "vehicle_no")]
    pub vehicle_number: Option<String>,
    pub license_no: Option<String>,
    pub aadhaar: Option<String>,
    pub area: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RiderOkRes {
    pub id: i32,
}

/// Patch the non-bank profile fields; absent slots stay untouched.
#[utoipa::path(
    patch,
    path = "/{id}/profile",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to update")
    ),
    request_body = RiderProfileBody,
    responses(
        (status = 200, description = "Profile updated", body = StdResponse<RiderOkRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn update_rider_profile(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<RiderProfileBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    conn.transaction(move |conn| {
        Box::pin(async move {
            let updated = diesel::update(users::table.find(id).filter(users::role.eq("rider")))
                .set((
                    PatchUserEntity {
                        name: body.name,
                        address: body.address,
                    },
                    users::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
            if updated == 0 {
                return Err(AppError::NotFound);
            }

            diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
                .set((
                    PatchDeliveryBoyEntity {
                        vehicle: body.vehicle,
                        vehicle_number: body.vehicle_number,
                        license_no: body.license_no,
                        aadhaar: body.aadhaar,
                        area: body.area,
                    },
                    delivery_boys::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;

            Ok::<(), AppError>(())
        })
    })
    .await?;

    Ok(StdResponse {
        data: Some(RiderOkRes { id }),
        message: Some("Profile updated successfully"),
    })
}

/// Patch the payout details; absent slots stay untouched.
#[utoipa::path(
    patch,
    path = "/{id}/bank",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to update")
    ),
    request_body = PatchDeliveryBoyBankEntity,
    responses(
        (status = 200, description = "Bank details updated", body = StdResponse<RiderOkRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn update_rider_bank(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<PatchDeliveryBoyBankEntity>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
        .set((body, delivery_boys::updated_at.eq(diesel::dsl::now)))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(RiderOkRes { id }),
        message: Some("Bank details updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RiderOnlineBody {
    pub online: bool,
}

#[derive(Serialize, ToSchema)]
pub struct RiderOnlineRes {
    pub online: bool,
}

/// Toggle the rider's operating flag.
#[utoipa::path(
    patch,
    path = "/{id}/online",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to toggle")
    ),
    request_body = RiderOnlineBody,
    responses(
        (status = 200, description = "Online status updated", body = StdResponse<RiderOnlineRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn set_rider_online(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<RiderOnlineBody>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let online_status = if body.online { "online" } else { "offline" };
    let updated = diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
        .set((
            delivery_boys::online_status.eq(online_status),
            delivery_boys::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(RiderOnlineRes {
            online: body.online,
        }),
        message: Some("Online status updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RiderKycBody {
    pub kyc_status: String,
}

#[derive(Serialize, ToSchema)]
pub struct RiderKycRes {
    pub kyc_status: String,
}

/// Set the rider's KYC verification state.
#[utoipa::path(
    patch,
    path = "/{id}/kyc",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to update")
    ),
    request_body = RiderKycBody,
    responses(
        (status = 200, description = "KYC status updated", body = StdResponse<RiderKycRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn set_rider_kyc(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<RiderKycBody>,
) -> Result<impl IntoResponse, AppError> {
    let kyc = body.kyc_status.trim().to_lowercase();
    if !reconcile::is_review_state(&kyc) {
        return Err(AppError::BadRequest(
            "kyc_status must be pending|approved|rejected".into(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
        .set((
            delivery_boys::kyc_status.eq(&kyc),
            delivery_boys::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(RiderKycRes { kyc_status: kyc }),
        message: Some("KYC status updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RiderApprovalBody {
    pub approval_status: String,
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RiderApprovalRes {
    pub approval_status: String,
}

/// Move the order-eligibility gate. Approval stamps `approved_at` and
/// clears the rejection reason; rejection does the reverse; pending
/// clears both.
#[utoipa::path(
    patch,
    path = "/{id}/approval",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to update")
    ),
    request_body = RiderApprovalBody,
    responses(
        (status = 200, description = "Approval status updated", body = StdResponse<RiderApprovalRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn set_rider_approval(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<RiderApprovalBody>,
) -> Result<impl IntoResponse, AppError> {
    let approval = body.approval_status.trim().to_lowercase();
    if !reconcile::is_review_state(&approval) {
        return Err(AppError::BadRequest(
            "approval_status must be pending|approved|rejected".into(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (approved_at, rejected_reason) =
        reconcile::approval_fields(&approval, body.reason, Utc::now());

    let updated = diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
        .set((
            delivery_boys::approval_status.eq(&approval),
            delivery_boys::approved_at.eq(approved_at),
            delivery_boys::rejected_reason.eq(rejected_reason),
            delivery_boys::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(RiderApprovalRes {
            approval_status: approval,
        }),
        message: Some("Approval status updated successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RiderStatusBody {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct RiderStatusRes {
    pub status: String,
}

/// Set the identity status for a rider account.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to update")
    ),
    request_body = RiderStatusBody,
    responses(
        (status = 200, description = "Status updated", body = StdResponse<RiderStatusRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn set_rider_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<RiderStatusBody>,
) -> Result<impl IntoResponse, AppError> {
    let status = body.status.trim().to_lowercase();
    if !reconcile::is_identity_status(&status) {
        return Err(AppError::BadRequest(
            "status must be active|inactive|suspended".into(),
        ));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let updated = diesel::update(users::table.find(id).filter(users::role.eq("rider")))
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
        data: Some(RiderStatusRes { status }),
        message: Some("Status updated successfully"),
    })
}

/// Soft delete: the identity goes inactive, the profile goes offline and
/// back to pending. No rows are removed.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Riders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Rider user ID to deactivate")
    ),
    responses(
        (status = 200, description = "Rider deactivated", body = StdResponse<RiderStatusRes, String>),
        (status = 404, description = "Rider not found")
    )
)]
async fn delete_rider(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    conn.transaction(move |conn| {
        Box::pin(async move {
            let updated = diesel::update(users::table.find(id).filter(users::role.eq("rider")))
                .set((
                    users::status.eq("inactive"),
                    users::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
            if updated == 0 {
                return Err(AppError::NotFound);
            }

            diesel::update(delivery_boys::table.filter(delivery_boys::user_id.eq(id)))
                .set((
                    delivery_boys::online_status.eq("offline"),
                    delivery_boys::approval_status.eq("pending"),
                    delivery_boys::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;

            Ok::<(), AppError>(())
        })
    })
    .await?;

    Ok(StdResponse {
        data: Some(RiderStatusRes {
            status: "inactive".to_string(),
        }),
        message: Some("Rider deactivated successfully"),
    })
}
