//! The `{message, data, meta}` envelope returned by every handler.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Paging block. Unset fields are left out of the JSON, so a non-list
/// response carries `"meta": {}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_next: Option<bool>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total.max(0) + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            total_pages: Some(total_pages),
            has_next: Some(page < total_pages),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// One page of a list; `per_page` is the normalised limit.
    pub fn paginated(
        message: impl Into<String>,
        data: T,
        page: i64,
        per_page: i64,
        total: i64,
    ) -> Self {
        Self::success(message, data, Some(Meta::new(page, per_page, total)))
    }
}

impl ApiResponse<Value> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(message, Value::Object(Default::default()), Some(Meta::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_count_rounds_up() {
        let meta = Meta::new(1, 20, 41);
        assert_eq!(meta.total_pages, Some(3));
        assert_eq!(meta.has_next, Some(true));

        let last = Meta::new(3, 20, 41);
        assert_eq!(last.has_next, Some(false));
    }

    #[test]
    fn empty_list_has_no_pages() {
        let meta = Meta::new(1, 20, 0);
        assert_eq!(meta.total_pages, Some(0));
        assert_eq!(meta.has_next, Some(false));
    }

    #[test]
    fn message_only_envelope() {
        let body = serde_json::to_value(ApiResponse::message("Review deleted")).unwrap();
        assert_eq!(
            body,
            json!({ "message": "Review deleted", "data": {}, "meta": {} })
        );
    }

    #[test]
    fn paginated_envelope_carries_paging_fields() {
        let body = serde_json::to_value(ApiResponse::paginated("Items", vec![1, 2], 2, 2, 5)).unwrap();
        assert_eq!(
            body["meta"],
            json!({ "page": 2, "per_page": 2, "total": 5, "total_pages": 3, "has_next": true })
        );
    }
}
