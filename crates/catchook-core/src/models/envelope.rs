//! Response envelopes shared by every endpoint.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for single resources
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub limit: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// Envelope for list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paginated_response() {
        let json = r#"{
            "success": true,
            "data": [1, 2, 3],
            "pagination": {"currentPage": 2, "totalPages": 5, "total": 43, "limit": 10, "hasNext": true, "hasPrev": true}
        }"#;
        let resp: PaginatedResponse<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data, vec![1, 2, 3]);
        assert_eq!(resp.pagination.current_page, 2);
        assert_eq!(resp.pagination.total, 43);
        assert!(resp.pagination.has_prev);
    }

    #[test]
    fn test_parse_null_data() {
        let json = r#"{"success": true, "data": null, "message": "deleted"}"#;
        let resp: ApiResponse<Option<u32>> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.message.as_deref(), Some("deleted"));
    }
}
