use serde::{Deserialize, Serialize};

/// Greeting pushed to every client right after it connects to the gateway.
pub const GREETING: &str = "Welcome to Voca!";

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Sent once to a newly connected client
    Hello { message: String },

    /// A new message was stored
    MessageCreate {
        id: i64,
        user_id: i64,
        group_id: String,
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GatewayEvent {
    pub fn hello() -> Self {
        Self::Hello {
            message: GREETING.to_string(),
        }
    }
}
