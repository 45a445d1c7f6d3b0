//! Reconciliation between identity records (`users`) and role profiles
//! (`merchants`, `delivery_boys`): a profile is only ever created or
//! updated together with the identity row it references, inside the
//! caller's transaction.

use chrono::{DateTime, Utc};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::core::app_error::AppError;
use crate::models::{CreateUserEntity, SyncUserEntity, UserEntity};
use crate::schema::{admins, delivery_boys, merchants, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Merchant,
    Rider,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Merchant => "merchant",
            Role::Rider => "rider",
            Role::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "merchant" => Some(Role::Merchant),
            "rider" => Some(Role::Rider),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

/// Default role for a first-contact identity, decided from what the
/// stores already know about the phone. Priority: existing identity,
/// merchant profile, rider profile, admin record, customer fallback.
pub fn infer_role(
    existing: Option<Role>,
    has_merchant: bool,
    has_rider: bool,
    has_admin: bool,
) -> Role {
    if let Some(role) = existing {
        return role;
    }
    if has_merchant {
        Role::Merchant
    } else if has_rider {
        Role::Rider
    } else if has_admin {
        Role::Admin
    } else {
        Role::Customer
    }
}

pub async fn infer_role_by_phone(
    conn: &mut AsyncPgConnection,
    phone: &str,
) -> Result<Role, AppError> {
    let existing: Option<String> = users::table
        .filter(users::phone.eq(phone))
        .select(users::role)
        .first(conn)
        .await
        .optional()?;

    let merchant_hits: i64 = merchants::table
        .filter(merchants::phone.eq(phone))
        .count()
        .get_result(conn)
        .await?;

    let rider_hits: i64 = delivery_boys::table
        .inner_join(users::table)
        .filter(users::phone.eq(phone))
        .count()
        .get_result(conn)
        .await?;

    let admin_hits: i64 = admins::table
        .filter(admins::phone.eq(phone))
        .count()
        .get_result(conn)
        .await?;

    Ok(infer_role(
        existing.as_deref().and_then(Role::parse),
        merchant_hits > 0,
        rider_hits > 0,
        admin_hits > 0,
    ))
}

/// Merchant profile status only knows two values; anything unexpected
/// falls back to active.
pub fn safe_merchant_status(s: Option<&str>) -> &'static str {
    match s {
        Some("inactive") => "inactive",
        _ => "active",
    }
}

/// Identity status accepts the full set; anything unexpected falls back
/// to active.
pub fn safe_identity_status(s: Option<&str>) -> &'static str {
    match s {
        Some("inactive") => "inactive",
        Some("suspended") => "suspended",
        _ => "active",
    }
}

pub fn is_identity_status(s: &str) -> bool {
    matches!(s, "active" | "inactive" | "suspended")
}

pub fn is_review_state(s: &str) -> bool {
    matches!(s, "pending" | "approved" | "rejected")
}

pub fn is_kyc_state(s: &str) -> bool {
    matches!(s, "pending" | "verified" | "rejected")
}

/// Human-readable merchant identifier derived from the row id.
pub fn merchant_code(id: i32) -> String {
    format!("RST-{id:06}")
}

/// First candidate that is non-empty after trimming.
pub fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

/// A candidate value only fills an empty slot; a non-empty stored value
/// is never overwritten.
fn fill_empty<'a>(current: Option<&str>, candidate: Option<&'a str>) -> Option<&'a str> {
    match current {
        Some(v) if !v.trim().is_empty() => None,
        _ => candidate.map(str::trim).filter(|s| !s.is_empty()),
    }
}

/// Timestamp and reason slots for a rider approval transition. Approval
/// stamps `approved_at` and clears the reason; rejection stores the
/// reason and clears the stamp; pending clears both.
pub fn approval_fields(
    approval: &str,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<String>) {
    match approval {
        "approved" => (Some(now), None),
        "rejected" => (None, reason),
        _ => (None, None),
    }
}

pub struct EnsureIdentity<'a> {
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub name_candidates: &'a [Option<&'a str>],
    pub address: Option<&'a str>,
    pub role: Role,
    pub status: &'a str,
}

/// Finds or creates the identity row for a role profile and returns its
/// id. An existing identity matched by phone or email is promoted to the
/// target role (single-role design) and its status updated; name and
/// address are only filled when empty. Must run inside the same
/// transaction as the profile write so a concurrent duplicate either
/// serializes or trips the unique constraint.
pub async fn ensure_identity_for_role(
    conn: &mut AsyncPgConnection,
    req: EnsureIdentity<'_>,
) -> Result<i32, AppError> {
    let display_name = first_non_empty(req.name_candidates);
    let email = req.email.map(str::trim).filter(|e| !e.is_empty());

    let existing: Option<(i32, Option<String>, Option<String>)> = users::table
        .filter(
            users::phone
                .eq(req.phone)
                .or(users::email.eq(email.unwrap_or(""))),
        )
        .select((users::id, users::name, users::address))
        .first(conn)
        .await
        .optional()?;

    if let Some((id, name, address)) = existing {
        let sync = SyncUserEntity {
            role: req.role.as_str(),
            status: req.status,
            name: fill_empty(name.as_deref(), display_name),
            address: fill_empty(address.as_deref(), req.address),
        };
        diesel::update(users::table.find(id))
            .set((sync, users::updated_at.eq(diesel::dsl::now)))
            .execute(conn)
            .await?;
        return Ok(id);
    }

    let id = diesel::insert_into(users::table)
        .values(CreateUserEntity {
            phone: req.phone.to_string(),
            email: email.map(str::to_string),
            name: display_name.map(str::to_string),
            address: req.address.map(str::to_string),
            role: req.role.as_str().to_string(),
            status: req.status.to_string(),
            kyc_status: "pending".to_string(),
        })
        .returning(users::id)
        .get_result(conn)
        .await?;

    Ok(id)
}

/// Returns the identity for a phone, creating one on first contact with
/// the inferred role, active status and pending KYC.
pub async fn upsert_identity_by_phone(
    conn: &mut AsyncPgConnection,
    phone: &str,
) -> Result<UserEntity, AppError> {
    let existing: Option<UserEntity> = users::table
        .filter(users::phone.eq(phone))
        .select(UserEntity::as_select())
        .first(conn)
        .await
        .optional()?;
    if let Some(user) = existing {
        return Ok(user);
    }

    let role = infer_role_by_phone(conn, phone).await?;
    let user = diesel::insert_into(users::table)
        .values(CreateUserEntity {
            phone: phone.to_string(),
            email: None,
            name: None,
            address: None,
            role: role.as_str().to_string(),
            status: "active".to_string(),
            kyc_status: "pending".to_string(),
        })
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(user)
}

/// Mirrors an admin status change onto the identity record. Legacy
/// profiles may lack the identity linkage, so resolution falls back
/// through a fixed chain: user_id first, else phone, else email.
pub async fn sync_identity_status(
    conn: &mut AsyncPgConnection,
    user_id: Option<i32>,
    phone: &str,
    email: Option<&str>,
    status: &str,
) -> Result<usize, AppError> {
    if let Some(id) = user_id {
        let n = diesel::update(users::table.find(id))
            .set((
                users::status.eq(status),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await?;
        if n > 0 {
            return Ok(n);
        }
    }

    let n = diesel::update(users::table.filter(users::phone.eq(phone)))
        .set((
            users::status.eq(status),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    if n > 0 {
        return Ok(n);
    }

    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        let n = diesel::update(users::table.filter(users::email.eq(email)))
            .set((
                users::status.eq(status),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await?;
        return Ok(n);
    }

    Ok(0)
}

/// Pre-checks merchant uniqueness in a fixed order so the caller can name
/// the offending field. Empty values never collide; `exclude_id` makes
/// the check usable for updates. A race that slips past this check is
/// caught by the unique constraints and mapped to the same error.
pub async fn check_merchant_uniqueness(
    conn: &mut AsyncPgConnection,
    phone: &str,
    email: Option<&str>,
    gst: Option<&str>,
    fssai: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let mut q = merchants::table.into_boxed();
    q = q.filter(merchants::phone.eq(phone));
    if let Some(id) = exclude_id {
        q = q.filter(merchants::id.ne(id));
    }
    let taken: i64 = q.count().get_result(conn).await?;
    if taken > 0 {
        return Err(AppError::Conflict { field: "phone" });
    }

    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        let mut q = merchants::table.into_boxed();
        q = q.filter(merchants::email.eq(email));
        if let Some(id) = exclude_id {
            q = q.filter(merchants::id.ne(id));
        }
        let taken: i64 = q.count().get_result(conn).await?;
        if taken > 0 {
            return Err(AppError::Conflict { field: "email" });
        }
    }

    if let Some(gst) = gst.map(str::trim).filter(|g| !g.is_empty()) {
        let mut q = merchants::table.into_boxed();
        q = q.filter(merchants::gst.eq(gst));
        if let Some(id) = exclude_id {
            q = q.filter(merchants::id.ne(id));
        }
        let taken: i64 = q.count().get_result(conn).await?;
        if taken > 0 {
            return Err(AppError::Conflict { field: "gst" });
        }
    }

    let mut q = merchants::table.into_boxed();
    q = q.filter(merchants::fssai.eq(fssai));
    if let Some(id) = exclude_id {
        q = q.filter(merchants::id.ne(id));
    }
    let taken: i64 = q.count().get_result(conn).await?;
    if taken > 0 {
        return Err(AppError::Conflict { field: "fssai" });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_code_is_prefixed_and_zero_padded() {
        assert_eq!(merchant_code(123), "RST-000123");
        assert_eq!(merchant_code(1), "RST-000001");
        assert_eq!(merchant_code(1234567), "RST-1234567");
    }

    #[test]
    fn role_inference_priority() {
        assert_eq!(
            infer_role(Some(Role::Customer), true, true, true),
            Role::Customer
        );
        assert_eq!(infer_role(None, true, true, true), Role::Merchant);
        assert_eq!(infer_role(None, false, true, true), Role::Rider);
        assert_eq!(infer_role(None, false, false, true), Role::Admin);
        assert_eq!(infer_role(None, false, false, false), Role::Customer);
    }

    #[test]
    fn role_round_trips() {
        for role in [Role::Admin, Role::Merchant, Role::Rider, Role::Customer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("vendor"), None);
    }

    #[test]
    fn first_non_empty_skips_blank_candidates() {
        assert_eq!(
            first_non_empty(&[None, Some("  "), Some("Asha"), Some("Store")]),
            Some("Asha")
        );
        assert_eq!(first_non_empty(&[None, Some("")]), None);
    }

    #[test]
    fn fill_empty_never_overwrites() {
        assert_eq!(fill_empty(Some("Asha"), Some("New")), None);
        assert_eq!(fill_empty(Some("  "), Some("New")), Some("New"));
        assert_eq!(fill_empty(None, Some("New")), Some("New"));
        assert_eq!(fill_empty(None, None), None);
    }

    #[test]
    fn approval_transition_fields() {
        let now = Utc::now();
        let (at, reason) = approval_fields("approved", Some("stale".into()), now);
        assert_eq!(at, Some(now));
        assert_eq!(reason, None);

        let (at, reason) = approval_fields("rejected", Some("blurry licence".into()), now);
        assert_eq!(at, None);
        assert_eq!(reason.as_deref(), Some("blurry licence"));

        let (at, reason) = approval_fields("pending", Some("ignored".into()), now);
        assert_eq!(at, None);
        assert_eq!(reason, None);
    }

    #[test]
    fn status_normalization() {
        assert_eq!(safe_merchant_status(Some("inactive")), "inactive");
        assert_eq!(safe_merchant_status(Some("suspended")), "active");
        assert_eq!(safe_merchant_status(None), "active");
        assert_eq!(safe_identity_status(Some("suspended")), "suspended");
        assert_eq!(safe_identity_status(Some("bogus")), "active");
    }
}
