use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use almanac_core::Embed;
use anyhow::{Context, Result};
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateEmbed, CreateMessage, EditMessage, GatewayIntents,
    Http, MessageId, Timestamp,
};
use serenity::async_trait;
use serenity::builder::CreateEmbedFooter;
use serenity::client::Context as SerenityContext;
use serenity::prelude::*;
use tracing::{error, info, warn};

use crate::board::{SeasonBoard, WeatherBoard};
use crate::channel::{ChannelError, MessageChannel, MessageHandle};
use crate::config::Config;
use crate::reconcile::Reconciler;
use crate::store::StateStore;

/// serenity の HTTP API を使ったテキストチャンネル。
pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordChannel {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId::new(channel_id),
        }
    }
}

fn message_id(handle: MessageHandle) -> Result<MessageId, ChannelError> {
    // 0 は Discord の ID として不正なので、存在しないメッセージとして扱う
    if handle.0 == 0 {
        return Err(ChannelError::NotFound);
    }
    Ok(MessageId::new(handle.0))
}

fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new()
        .title(&embed.title)
        .description(&embed.description)
        .colour(embed.colour)
        .fields(
            embed
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone(), field.inline)),
        )
        .footer(CreateEmbedFooter::new(&embed.footer));

    if let Ok(timestamp) = Timestamp::from_unix_timestamp(embed.timestamp.timestamp()) {
        builder = builder.timestamp(timestamp);
    }

    builder
}

#[async_trait]
impl MessageChannel for DiscordChannel {
    async fn send(&self, embed: &Embed) -> Result<MessageHandle, ChannelError> {
        let message = CreateMessage::new().embed(build_embed(embed));
        let sent = self.channel_id.send_message(&self.http, message).await?;
        Ok(MessageHandle(sent.id.get()))
    }

    async fn fetch(&self, id: MessageHandle) -> Result<MessageHandle, ChannelError> {
        let message = self
            .channel_id
            .message(&self.http, message_id(id)?)
            .await?;
        Ok(MessageHandle(message.id.get()))
    }

    async fn edit(&self, handle: MessageHandle, embed: &Embed) -> Result<(), ChannelError> {
        let edit = EditMessage::new().embed(build_embed(embed));
        self.channel_id
            .edit_message(&self.http, message_id(handle)?, edit)
            .await?;
        Ok(())
    }
}

pub struct Handler {
    config: Config,
    /// 再接続で ready が再度呼ばれてもループを二重に起動しない
    started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: SerenityContext, ready: serenity::model::gateway::Ready) {
        info!(user = %ready.user.name, user_id = ready.user.id.get(), "Bot connected");

        if self.started.swap(true, Ordering::SeqCst) {
            info!("Board loops already running");
            return;
        }

        let log_channel = self.config.discord.log_channel_id.filter(|id| *id != 0);
        info!(
            seasons = self.config.seasons.channel_id,
            weather = self.config.weather.board.channel_id,
            log = ?log_channel,
            "Configured channels"
        );

        if let Some(id) = log_channel {
            diagnose_channel(&ctx.http, id, "log").await;
        }
        diagnose_channel(&ctx.http, self.config.seasons.channel_id, "seasons").await;
        diagnose_channel(&ctx.http, self.config.weather.board.channel_id, "weather").await;

        if let Some(id) = log_channel {
            let message = CreateMessage::new().content("✅ Bot opérationnel (saisons + météo).");
            if let Err(e) = ChannelId::new(id).send_message(&ctx.http, message).await {
                warn!(error = %e, "Failed to send startup message to log channel");
            }
        }

        self.spawn_boards(ctx.http.clone());
    }
}

impl Handler {
    fn spawn_boards(&self, http: Arc<Http>) {
        let pause = self.config.pacing.pause;

        let seasons = &self.config.seasons;
        let reconciler = Reconciler::new(
            DiscordChannel::new(http.clone(), seasons.channel_id),
            SeasonBoard::new(seasons.interval),
            load_store(&seasons.state_path),
            pause,
        );
        tokio::spawn(reconciler.run(seasons.interval));

        let weather = &self.config.weather;
        let reconciler = Reconciler::new(
            DiscordChannel::new(http, weather.board.channel_id),
            WeatherBoard::new(weather.board.interval, weather.jitter),
            load_store(&weather.board.state_path),
            pause,
        );
        tokio::spawn(reconciler.run(weather.board.interval));
    }
}

/// 状態ファイルが読めない場合は空の状態から始める。
fn load_store(path: &Path) -> StateStore {
    match StateStore::load(path) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, path = ?path, "Failed to load state, starting empty");
            StateStore::empty(path)
        }
    }
}

/// チャンネルが取得でき、ギルドのテキストチャンネルであることを確認する。
async fn diagnose_channel(http: &Http, channel_id: u64, label: &str) {
    if channel_id == 0 {
        warn!(label, "Channel id is not set");
        return;
    }

    match ChannelId::new(channel_id).to_channel(http).await {
        Ok(Channel::Guild(channel)) if channel.kind == ChannelType::Text => {
            info!(
                label,
                channel = %channel.name,
                guild_id = channel.guild_id.get(),
                "Channel OK"
            );
        }
        Ok(_) => warn!(label, channel_id, "Channel is not a guild text channel"),
        Err(e) => {
            match ChannelError::from(e) {
                ChannelError::Forbidden => {
                    warn!(label, channel_id, "No permission to view channel");
                }
                ChannelError::NotFound => warn!(label, channel_id, "Channel not found"),
                ChannelError::Transient(e) => {
                    warn!(label, channel_id, error = %e, "Failed to fetch channel");
                }
            }
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let intents = GatewayIntents::GUILDS;
    let handler = Handler {
        config: config.clone(),
        started: AtomicBool::new(false),
    };

    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create client")?;

    info!("Starting bot");
    client.start().await.context("Client error")?;

    Ok(())
}
