use chrono::{DateTime, Utc};
use diesel::prelude::{AsChangeset, Identifiable, Insertable, Queryable};
use diesel::Selectable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// Users (identity records)

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub phone: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub status: String,
    pub kyc_status: String,
    pub aadhaar: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub phone: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub status: String,
    pub kyc_status: String,
}

/// Changeset applied to an existing identity when a profile claims it:
/// role and status are forced, name/address only fill empty slots (the
/// caller passes `None` to preserve an existing value).
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct SyncUserEntity<'a> {
    pub role: &'a str,
    pub status: &'a str,
    pub name: Option<&'a str>,
    pub address: Option<&'a str>,
}

/// Partial identity update; absent slots leave the column untouched.
#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::users)]
pub struct PatchUserEntity {
    pub name: Option<String>,
    pub address: Option<String>,
}

// Merchants

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::merchants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MerchantEntity {
    pub id: i32,
    pub user_id: Option<i32>,
    pub merchant_code: Option<String>,
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub gst: Option<String>,
    pub fssai: String,
    pub status: String,
    pub is_open: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::merchants)]
pub struct CreateMerchantEntity {
    pub user_id: i32,
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub gst: Option<String>,
    pub fssai: String,
    pub status: String,
}

/// Full-row replacement used by the admin PUT endpoint; `None` writes NULL.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::merchants, treat_none_as_null = true)]
pub struct UpdateMerchantEntity {
    pub user_id: Option<i32>,
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub gst: Option<String>,
    pub fssai: String,
    pub status: String,
}

// Delivery boys (rider profiles)

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::delivery_boys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryBoyEntity {
    pub id: i32,
    pub user_id: i32,
    pub vehicle: String,
    pub vehicle_number: Option<String>,
    pub license_no: Option<String>,
    pub aadhaar: Option<String>,
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub ifsc: Option<String>,
    pub upi: Option<String>,
    pub area: Option<String>,
    pub online_status: String,
    pub kyc_status: String,
    pub approval_status: String,
    pub rejected_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::delivery_boys)]
pub struct CreateDeliveryBoyEntity {
    pub user_id: i32,
    pub vehicle: String,
    pub vehicle_number: Option<String>,
    pub license_no: Option<String>,
    pub aadhaar: Option<String>,
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub ifsc: Option<String>,
    pub upi: Option<String>,
    pub area: Option<String>,
    pub online_status: String,
    pub kyc_status: String,
    pub approval_status: String,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Non-bank profile fields; absent slots leave the column untouched.
#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::delivery_boys)]
pub struct PatchDeliveryBoyEntity {
    pub vehicle: Option<String>,
    #[serde(alias = "vehicle_no")]
    pub vehicle_number: Option<String>,
    pub license_no: Option<String>,
    pub aadhaar: Option<String>,
    pub area: Option<String>,
}

/// Payout details; absent slots leave the column untouched.
#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::delivery_boys)]
pub struct PatchDeliveryBoyBankEntity {
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub ifsc: Option<String>,
    pub upi: Option<String>,
}

// OTPs

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::otps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OtpEntity {
    pub id: i32,
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::otps)]
pub struct CreateOtpEntity {
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

// App settings (single row)

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::app_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AppSettingsEntity {
    pub id: i32,
    pub zones: Option<Value>,
    pub operating_hours: Option<String>,
    pub base_delivery_fee: f64,
    pub per_km_fee: f64,
    pub cancellation_mins: i32,
    pub maintenance: bool,
    pub announcement: Option<String>,
    pub merchant_commission_pct: f64,
    pub rider_commission_pct: f64,
    pub payout_cycle: String,
    pub support_phone: Option<String>,
    pub support_email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Settings patch over the recognized field set; absent slots keep their
/// stored value.
#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::app_settings)]
pub struct PatchAppSettingsEntity {
    pub zones: Option<Value>,
    pub operating_hours: Option<String>,
    pub base_delivery_fee: Option<f64>,
    pub per_km_fee: Option<f64>,
    pub cancellation_mins: Option<i32>,
    pub maintenance: Option<bool>,
    pub announcement: Option<String>,
    pub merchant_commission_pct: Option<f64>,
    pub rider_commission_pct: Option<f64>,
    pub payout_cycle: Option<String>,
    pub support_phone: Option<String>,
    pub support_email: Option<String>,
}
