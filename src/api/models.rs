use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ChatRequest {
    // A missing or malformed message is treated as empty.
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub index: usize,
    pub status: String,
    #[serde(default)]
    pub form_type: Option<String>,
}

/// Delete request. POSTed to `/api/submissions` by the admin dashboard.
#[derive(Deserialize)]
pub struct DeleteSubmissionRequest {
    pub index: usize,
    #[serde(default)]
    pub form_type: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmissionsQuery {
    #[serde(rename = "type", default)]
    pub form_type: Option<String>,
}
