use async_trait::async_trait;

/// A text message received from a channel.
///
/// `sender` identifies where the reply goes (for Telegram, the chat id).
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: String,
    pub sender: String,
    pub content: String,
    pub channel: String,
    pub timestamp: u64,
}

/// Core channel trait — implement for any messaging platform
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name
    fn name(&self) -> &str;

    /// Send a text message through this channel
    async fn send(&self, message: &str, recipient: &str) -> anyhow::Result<()>;

    /// Start listening for incoming messages (long-running)
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()>;

    /// Check if channel is healthy
    async fn health_check(&self) -> bool {
        true
    }

    fn max_message_length(&self) -> usize {
        usize::MAX
    }

    /// Longest caption the channel accepts on a photo, if it can send one.
    fn max_caption_length(&self) -> usize {
        0
    }

    async fn send_typing(&self, _recipient: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Send a photo by URL with a caption.
    async fn send_photo(
        &self,
        _photo_url: &str,
        _caption: &str,
        _recipient: &str,
    ) -> anyhow::Result<()> {
        anyhow::bail!("photo sending not supported by this channel")
    }
}
