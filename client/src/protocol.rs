//! JSON-RPC envelope and result shapes of the validation service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: &'static str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Result of the check and autocomplete methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireCheck {
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub predictions: Vec<Map<String, Value>>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Result of `splitStreet`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSplit {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house_number: String,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_missing_params() {
        let req = RpcRequest::new(7, "doAccounting", None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "id": 7, "method": "doAccounting"}));
    }

    #[test]
    fn response_parses_result_or_error() {
        let ok: RpcResponse =
            serde_json::from_value(json!({"id": 3, "result": {"status": ["email_correct"]}})).unwrap();
        assert_eq!(ok.id, Some(3));
        let check: WireCheck = serde_json::from_value(ok.result.unwrap()).unwrap();
        assert_eq!(check.status, vec!["email_correct".to_string()]);
        assert!(check.predictions.is_empty());

        let err: RpcResponse =
            serde_json::from_value(json!({"id": 4, "error": {"code": -32000, "message": "quota"}}))
                .unwrap();
        assert_eq!(err.error.unwrap().message, "quota");
    }

    #[test]
    fn split_result_uses_camel_case() {
        let split: WireSplit =
            serde_json::from_value(json!({"street": "Main Street", "houseNumber": "5"})).unwrap();
        assert_eq!(split.house_number, "5");
        assert!(split.additional_info.is_none());
    }
}
