use serde::Serialize;
use utoipa::ToSchema;

pub const MERCHANT_MAX_PAGE_SIZE: i64 = 200;
pub const RIDER_MAX_PAGE_SIZE: i64 = 100;

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Paginated list envelope: `{ page, pageSize, total, rows }`.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageRes<T> {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub rows: Vec<T>,
}

/// Zero and negative pages clamp to the first page.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

pub fn clamp_page_size(page_size: Option<i64>, max: i64) -> i64 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max)
}

pub fn offset(page: i64, page_size: i64) -> i64 {
    (page - 1) * page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_to_one() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(Some(7)), 7);
    }

    #[test]
    fn page_size_is_bounded() {
        assert_eq!(clamp_page_size(None, RIDER_MAX_PAGE_SIZE), 20);
        assert_eq!(clamp_page_size(Some(500), RIDER_MAX_PAGE_SIZE), 100);
        assert_eq!(clamp_page_size(Some(500), MERCHANT_MAX_PAGE_SIZE), 200);
        assert_eq!(clamp_page_size(Some(0), RIDER_MAX_PAGE_SIZE), 1);
        assert_eq!(clamp_page_size(Some(-1), MERCHANT_MAX_PAGE_SIZE), 1);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(offset(1, 20), 0);
        assert_eq!(offset(3, 50), 100);
    }
}
