//! Response envelope shared by the API handlers.

use axum::Json;
use serde::Serialize;

/// `{ "success": true, "data": T }`, the shape the web client expects.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

pub fn message(text: &str) -> Json<ApiResponse<Message>> {
    ok(Message {
        message: text.to_string(),
    })
}
