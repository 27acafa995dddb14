use serde::{Deserialize, Serialize};

use crate::model::SelectionContext;

/// Requests accepted by the coordinator over the runtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    UserActivity,
    OpenClaire(OpenClaireRequest),
    CloseSidePanel,
    Ping,
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::UserActivity => "USER_ACTIVITY",
            Request::OpenClaire(_) => "OPEN_CLAIRE",
            Request::CloseSidePanel => "CLOSE_SIDE_PANEL",
            Request::Ping => "PING",
        }
    }
}

/// Payload of an OPEN_CLAIRE request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenClaireRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<SelectionContext>,
}

/// Responses returned over the runtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ack(AckResponse),
    Pong(PingResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack(AckResponse {
            success: true,
            error: None,
            message: None,
        })
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Response::Ack(AckResponse {
            success: true,
            error: None,
            message: Some(message.into()),
        })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Response::Ack(AckResponse {
            success: false,
            error: Some(error.into()),
            message: None,
        })
    }

    pub fn pong(version: Option<String>) -> Self {
        Response::Pong(PingResponse {
            status: "ok".to_string(),
            version,
        })
    }

    /// True for a successful acknowledgement or any pong.
    pub fn is_success(&self) -> bool {
        match self {
            Response::Ack(ack) => ack.success,
            Response::Pong(pong) => pong.status == "ok",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Ack(ack) => ack.error.as_deref(),
            Response::Pong(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "type": "OPEN_CLAIRE",
            "text": "hello",
            "url": "https://example.com",
            "pageTitle": "Example",
            "context": "text_selection"
        }))
        .unwrap();

        assert_eq!(
            request,
            Request::OpenClaire(OpenClaireRequest {
                text: "hello".into(),
                url: Some("https://example.com".into()),
                page_title: Some("Example".into()),
                context: Some(SelectionContext::TextSelection),
            })
        );

        let ping: Request = serde_json::from_value(json!({"type": "PING"})).unwrap();
        assert_eq!(ping, Request::Ping);
        assert_eq!(
            serde_json::to_value(Request::UserActivity).unwrap(),
            json!({"type": "USER_ACTIVITY"})
        );
        assert_eq!(Request::CloseSidePanel.kind(), "CLOSE_SIDE_PANEL");
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        assert!(serde_json::from_value::<Request>(json!({"type": "NOPE"})).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(Response::failure("No window ID found")).unwrap(),
            json!({"success": false, "error": "No window ID found"})
        );
        assert_eq!(
            serde_json::to_value(Response::pong(Some("1.2.0".into()))).unwrap(),
            json!({"status": "ok", "version": "1.2.0"})
        );
    }

    #[test]
    fn test_response_untagged_roundtrip_picks_variant() {
        let pong: Response = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(matches!(pong, Response::Pong(_)));
        assert!(pong.is_success());

        let failure: Response =
            serde_json::from_value(json!({"success": false, "error": "boom"})).unwrap();
        assert!(!failure.is_success());
        assert_eq!(failure.error(), Some("boom"));
    }
}
