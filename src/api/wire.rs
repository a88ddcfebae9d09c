//! Wire types for the update endpoint.

use serde::{Deserialize, Serialize};

/// Success body of `POST /sol/v2/nft/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<UpdateResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub encoded_transaction: Option<String>,
    #[serde(default)]
    pub mint: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Best-effort extraction of the remote error message.
    pub fn message_from(body: &str) -> Option<String> {
        let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
        parsed.message.or_else(|| match parsed.error? {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_response_deserialize() {
        let body = r#"{
            "success": true,
            "message": "NFT update request generated successfully",
            "result": { "encoded_transaction": "AQID", "mint": "abc" }
        }"#;
        let resp: UpdateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            resp.result.unwrap().encoded_transaction.as_deref(),
            Some("AQID")
        );
    }

    #[test]
    fn test_update_response_without_result() {
        let resp: UpdateResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            ApiErrorBody::message_from(r#"{"success":false,"message":"Invalid token"}"#),
            Some("Invalid token".to_string())
        );
        assert_eq!(
            ApiErrorBody::message_from(r#"{"success":false,"error":"bad royalty"}"#),
            Some("bad royalty".to_string())
        );
        assert_eq!(ApiErrorBody::message_from("<html>502</html>"), None);
    }
}
