use serde::Serialize;
use axum::Json;

#[derive(Serialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn success() -> Json<StatusReply> {
    Json(StatusReply {
        status: "success".to_string(),
        message: None,
    })
}
