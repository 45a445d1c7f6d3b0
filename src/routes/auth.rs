use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::api;
use crate::core::app_error::{AppError, StdResponse};
use crate::core::app_state::AppState;
use crate::core::{config, token};
use crate::models::{CreateOtpEntity, MerchantEntity, OtpEntity, UserEntity};
use crate::reconcile;
use crate::schema::{merchants, otps};
use crate::validate;

/// Public OTP login routes.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/auth",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(send_otp))
            .routes(utoipa_axum::routes!(verify_otp)),
    )
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SendOtpBody {
    pub phone: String,
}

#[derive(Serialize, ToSchema)]
pub struct SendOtpRes {
    pub sent: bool,
}

/// Issue a fresh OTP for a phone. The identity is upserted on first
/// contact; previously issued unused codes are invalidated.
#[utoipa::path(
    post,
    path = "/send-otp",
    tags = ["Auth"],
    request_body = SendOtpBody,
    responses(
        (status = 200, description = "OTP issued", body = StdResponse<SendOtpRes, String>)
    )
)]
async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let phone = body.phone.trim().to_string();
    if !validate::is_mobile(&phone) {
        return Err(AppError::BadRequest("Invalid phone".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let code = validate::generate_otp();
    let ttl = config::otp_ttl_min();
    let expires_at = Utc::now() + chrono::Duration::minutes(ttl);

    {
        let phone = phone.clone();
        let code = code.clone();
        conn.transaction(move |conn| {
            Box::pin(async move {
                reconcile::upsert_identity_by_phone(conn, &phone).await?;

                diesel::update(
                    otps::table
                        .filter(otps::phone.eq(&phone))
                        .filter(otps::used.eq(false)),
                )
                .set(otps::used.eq(true))
                .execute(conn)
                .await?;

                diesel::insert_into(otps::table)
                    .values(CreateOtpEntity {
                        phone: phone.clone(),
                        code,
                        expires_at,
                    })
                    .execute(conn)
                    .await?;

                Ok::<(), AppError>(())
            })
        })
        .await?;
    }

    // Delivery is best-effort; the code stays valid either way.
    if let Err(err) = api::sms::send_otp_sms(state.http_client.clone(), &phone, &code, ttl).await {
        tracing::warn!("SMS delivery failed for {phone}: {err:#}");
    }

    Ok(StdResponse {
        data: Some(SendOtpRes { sent: true }),
        message: Some("OTP sent"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyOtpBody {
    pub phone: String,
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyOtpRes {
    pub token: String,
    pub role: String,
    pub user: UserEntity,
    pub merchant: Option<MerchantEntity>,
}

/// Verify an OTP and issue a bearer credential. Merchant identities get
/// their profile attached so clients can route to the right dashboard.
#[utoipa::path(
    post,
    path = "/verify",
    tags = ["Auth"],
    request_body = VerifyOtpBody,
    responses(
        (status = 200, description = "Credential issued", body = StdResponse<VerifyOtpRes, String>),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 403, description = "Account not active")
    )
)]
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let phone = body.phone.trim().to_string();
    if !validate::is_mobile(&phone) || !validate::is_otp_code(&body.code) {
        return Err(AppError::BadRequest("Invalid data".into()));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let otp: Option<OtpEntity> = otps::table
        .filter(otps::phone.eq(&phone))
        .filter(otps::code.eq(body.code.trim()))
        .filter(otps::used.eq(false))
        .order(otps::id.desc())
        .select(OtpEntity::as_select())
        .first(conn)
        .await
        .optional()?;

    let Some(otp) = otp else {
        return Err(AppError::BadRequest("Invalid OTP".into()));
    };
    if otp.expires_at < Utc::now() {
        return Err(AppError::BadRequest("OTP expired".into()));
    }

    diesel::update(otps::table.find(otp.id))
        .set(otps::used.eq(true))
        .execute(conn)
        .await?;

    let user = reconcile::upsert_identity_by_phone(conn, &phone).await?;
    if user.status != "active" {
        return Err(AppError::ForbiddenResource("Account not active".into()));
    }

    let merchant: Option<MerchantEntity> = if user.role == "merchant" {
        merchants::table
            .filter(merchants::user_id.eq(user.id))
            .select(MerchantEntity::as_select())
            .first(conn)
            .await
            .optional()?
    } else {
        None
    };

    let token = token::issue(
        user.id,
        &user.role,
        &user.phone,
        merchant.as_ref().map(|m| m.id),
    )?;

    Ok(StdResponse {
        data: Some(VerifyOtpRes {
            token,
            role: user.role.clone(),
            user,
            merchant,
        }),
        message: Some("Login successful"),
    })
}
