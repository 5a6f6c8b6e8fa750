use axum::http::HeaderMap;
use bastion_proto::USER_HEADER;

use crate::service::database::DatabaseError;

/// Caller id from the user header. Empty or missing means unauthorized.
pub fn user_id(headers: &HeaderMap) -> Result<String, DatabaseError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or(DatabaseError::Unauthorized)
}

pub fn map_id(raw: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(raw)
        .map_err(|cause| DatabaseError::InvalidBody(format!("Invalid mapId: {cause}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_user_id_requires_non_empty_header() {
        let mut headers = HeaderMap::new();
        assert!(user_id(&headers).is_err());
        headers.insert(USER_HEADER, HeaderValue::from_static("  "));
        assert!(user_id(&headers).is_err());
        headers.insert(USER_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(user_id(&headers).unwrap(), "alice");
    }
}
