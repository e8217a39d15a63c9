//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::application::services::CreateMessageDto;
use crate::domain::Attachment;

/// Send message request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub content: String,

    #[validate(length(min = 1, max = 128, message = "clientMessageId must be 1-128 characters"))]
    pub client_message_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 attachments per message"))]
    pub attachments: Vec<Attachment>,
}

impl From<SendMessageRequest> for CreateMessageDto {
    fn from(req: SendMessageRequest) -> Self {
        Self {
            receiver_id: req.receiver_id,
            content: req.content,
            client_message_id: req.client_message_id,
            attachments: req.attachments,
        }
    }
}

/// History query parameters
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}
