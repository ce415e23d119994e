//! Chat Transport Interface
//!
//! Outbound message delivery. The chat protocol itself (Telegram, webhook,
//! whatever) lives behind this trait; the core only pushes text at users.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::UserId;

/// Outbound side of the chat transport
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one text message to a user.
    async fn send_message(&self, user_id: &UserId, text: &str) -> Result<()>;

    /// Transport name, for logs
    fn name(&self) -> &str;
}
