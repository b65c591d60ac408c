//! Bridge wire messages
//!
//! Every request carries a fresh correlation id; the matching response
//! echoes it back unchanged. The method set is a closed allow-list:
//! anything else is rejected at the relay hop and never reaches the
//! wallet service.

use crate::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Correlation id tying a response to its request
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The methods a page may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMethod {
    /// Identify the wallet's account and network
    Connect,
    /// Balance, network and token holdings
    GetAccountInfo,
    /// Build, sign and execute a transfer
    SendTransaction,
    /// Sign an arbitrary message
    SignMessage,
}

impl BridgeMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeMethod::Connect => "connect",
            BridgeMethod::GetAccountInfo => "getAccountInfo",
            BridgeMethod::SendTransaction => "sendTransaction",
            BridgeMethod::SignMessage => "signMessage",
        }
    }
}

impl FromStr for BridgeMethod {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(BridgeMethod::Connect),
            "getAccountInfo" => Ok(BridgeMethod::GetAccountInfo),
            "sendTransaction" => Ok(BridgeMethod::SendTransaction),
            "signMessage" => Ok(BridgeMethod::SignMessage),
            other => Err(BridgeError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for BridgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page-originated request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Correlation id, echoed in the response
    pub id: RequestId,
    /// Requested method name, validated against [`BridgeMethod`]
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

impl BridgeRequest {
    /// Build a request with a fresh correlation id
    pub fn new(method: BridgeMethod, params: serde_json::Value) -> Self {
        Self {
            id: RequestId::generate(),
            method: method.as_str().to_string(),
            params,
        }
    }
}

/// A wallet-originated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Correlation id of the request this answers
    pub id: RequestId,
    /// Successful result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Stable error code when the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BridgeResponse {
    /// Successful response
    pub fn ok(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            message: None,
        }
    }

    /// Failed response carrying the error's stable code
    pub fn err(id: RequestId, error: &BridgeError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.code().to_string()),
            message: Some(error.to_string()),
        }
    }

    /// Whether the request succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A framed bridge message for transports that carry both directions
/// on one pipe. Tagged so either side can tell requests from responses
/// without peeking at fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    Request(BridgeRequest),
    Response(BridgeResponse),
}

impl From<BridgeRequest> for WireMessage {
    fn from(request: BridgeRequest) -> Self {
        WireMessage::Request(request)
    }
}

impl From<BridgeResponse> for WireMessage {
    fn from(response: BridgeResponse) -> Self {
        WireMessage::Response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_allow_list_is_closed() {
        assert_eq!("connect".parse::<BridgeMethod>().unwrap(), BridgeMethod::Connect);
        assert_eq!(
            "sendTransaction".parse::<BridgeMethod>().unwrap(),
            BridgeMethod::SendTransaction
        );

        let err = "eval".parse::<BridgeMethod>().unwrap_err();
        assert_eq!(err.code(), "UnsupportedMethodError");

        // Case matters on the wire
        assert!("CONNECT".parse::<BridgeMethod>().is_err());
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    #[test]
    fn test_response_roundtrip() {
        let id = RequestId::generate();
        let response = BridgeResponse::ok(id.clone(), serde_json::json!({"balance": 42}));

        let wire = serde_json::to_string(&response).unwrap();
        assert!(!wire.contains("error"));

        let decoded: BridgeResponse = serde_json::from_str(&wire).unwrap();
        assert_eq!(decoded.id, id);
        assert!(decoded.is_ok());
    }

    #[test]
    fn test_wire_message_is_type_tagged() {
        let frame = WireMessage::from(BridgeRequest::new(BridgeMethod::Connect, serde_json::json!({})));
        let wire = serde_json::to_value(&frame).unwrap();
        assert_eq!(wire["type"], "request");
        assert_eq!(wire["method"], "connect");

        let decoded: WireMessage = serde_json::from_value(wire).unwrap();
        assert!(matches!(decoded, WireMessage::Request(_)));
    }

    #[test]
    fn test_error_response_carries_code() {
        let err = BridgeError::UnsupportedMethod("eval".to_string());
        let response = BridgeResponse::err(RequestId::generate(), &err);
        assert_eq!(response.error.as_deref(), Some("UnsupportedMethodError"));
        assert!(!response.is_ok());
    }
}
