//! ボードを書き込むチャットチャンネルの抽象。

use almanac_core::Embed;
use serenity::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// メッセージまたはチャンネルが存在しない
    #[error("Message or channel not found")]
    NotFound,

    /// チャンネル全体に対する権限不足
    #[error("Missing permission on channel")]
    Forbidden,

    #[error("Channel request failed: {0}")]
    Transient(String),
}

/// 送信済みメッセージの ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

/// メッセージの送信・取得・編集ができるチャンネル。
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, embed: &Embed) -> Result<MessageHandle, ChannelError>;

    async fn fetch(&self, id: MessageHandle) -> Result<MessageHandle, ChannelError>;

    async fn edit(&self, handle: MessageHandle, embed: &Embed) -> Result<(), ChannelError>;
}

impl From<serenity::Error> for ChannelError {
    fn from(error: serenity::Error) -> Self {
        if let serenity::Error::Http(http) = &error {
            match http.status_code().map(|status| status.as_u16()) {
                Some(404) => return ChannelError::NotFound,
                Some(403) => return ChannelError::Forbidden,
                _ => {}
            }
        }
        ChannelError::Transient(error.to_string())
    }
}
