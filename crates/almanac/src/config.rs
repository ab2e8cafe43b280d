use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOKEN_PLACEHOLDER: &str = "YOUR_DISCORD_BOT_TOKEN";
const TOKEN_ENV: &str = "DISCORD_TOKEN";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub seasons: BoardConfig,
    pub weather: WeatherConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            seasons: BoardConfig {
                channel_id: 0,
                interval: default_interval(),
                state_path: PathBuf::from("season_state.json"),
            },
            weather: WeatherConfig {
                board: BoardConfig {
                    channel_id: 0,
                    interval: default_interval(),
                    state_path: PathBuf::from("meteo_daily_state.json"),
                },
                jitter: JitterMode::default(),
            },
            pacing: PacingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscordConfig {
    pub token: String,
    /// 起動診断メッセージを送るチャンネル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_channel_id: Option<u64>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: TOKEN_PLACEHOLDER.to_string(),
            log_channel_id: None,
        }
    }
}

/// 1 種類のボード (季節 or 天気) の設定。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BoardConfig {
    pub channel_id: u64,
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,
    pub state_path: PathBuf,
}

fn default_interval() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherConfig {
    #[serde(flatten)]
    pub board: BoardConfig,
    #[serde(default)]
    pub jitter: JitterMode,
}

/// 気温の揺らぎをいつ引き直すか。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterMode {
    /// 更新のたびに引き直す
    #[default]
    PerTick,
    /// ローカル日付ごとに固定する
    Daily,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PacingConfig {
    /// 地域ごとの API 呼び出しの間隔
    #[serde(with = "humantime_serde")]
    pub pause: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// `DISCORD_TOKEN` が設定されていれば設定ファイルのトークンより優先する。
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            self.discord.token = token.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let token = self.discord.token.trim();
        if token.is_empty() || token == TOKEN_PLACEHOLDER {
            bail!("Discord token is missing (set discord.token or {TOKEN_ENV})");
        }
        if self.seasons.channel_id == 0 {
            bail!("seasons.channel_id is not set");
        }
        if self.weather.board.channel_id == 0 {
            bail!("weather.channel_id is not set");
        }
        Ok(())
    }
}

pub fn open_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let mut config: Config =
        toml::from_str(&content).context("Failed to parse configuration file")?;
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let content =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
    Ok(())
}
