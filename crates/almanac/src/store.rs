//! 地域ごとのメッセージ ID と最後に表示した内容のシグネチャを永続化するストア。

use std::{
    collections::HashMap,
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use almanac_core::Region;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tempfile::NamedTempFile;

use crate::channel::MessageHandle;

/// 状態ファイルの中身。キーは地域の表示名。
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    /// 地域 -> 現在のメッセージ ID
    #[serde_as(as = "HashMap<DisplayFromStr, _>")]
    #[serde(default)]
    pub messages: HashMap<Region, u64>,
    /// 地域 -> 最後に表示した内容のシグネチャ
    #[serde_as(as = "HashMap<DisplayFromStr, _>")]
    #[serde(default, rename = "last_sig")]
    pub last_signature: HashMap<Region, String>,
    /// 地域 -> 最後に表示したローカル日付 (YYYYMMDD、天気のみ)
    #[serde_as(as = "HashMap<DisplayFromStr, _>")]
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_date: HashMap<Region, String>,
}

/// 1 種類のボードの状態を管理するストア。
pub struct StateStore {
    path: PathBuf,
    state: BoardState,
}

impl StateStore {
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: BoardState::default(),
        }
    }

    /// ストアを読み込む。ファイルが存在しない場合は空のストアを作成する。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read state file")?;
            serde_json::from_str(&content).context("Failed to parse state file")?
        } else {
            BoardState::default()
        };
        Ok(Self { path, state })
    }

    /// 同じディレクトリの一時ファイルに書いてからリネームする。
    /// 既存ファイルのパーミッションは引き継ぐ。
    pub fn save(&self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.state).context("Failed to serialize state")?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).context("Failed to create temporary state file")?;
        temp.write_all(content.as_bytes())
            .context("Failed to write state file")?;
        if let Ok(metadata) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .context("Failed to copy state file permissions")?;
        }
        temp.persist(&self.path)
            .context("Failed to replace state file")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn message(&self, region: Region) -> Option<MessageHandle> {
        self.state.messages.get(&region).copied().map(MessageHandle)
    }

    pub fn last_signature(&self, region: Region) -> Option<&str> {
        self.state.last_signature.get(&region).map(String::as_str)
    }

    pub fn last_date(&self, region: Region) -> Option<&str> {
        self.state.last_date.get(&region).map(String::as_str)
    }

    /// 新しく送信したメッセージを記録する。既存の ID は上書きされる。
    pub fn record_message(
        &mut self,
        region: Region,
        message: MessageHandle,
        signature: &str,
        date: Option<&str>,
    ) {
        self.state.messages.insert(region, message.0);
        self.record_signature(region, signature, date);
    }

    pub fn record_signature(&mut self, region: Region, signature: &str, date: Option<&str>) {
        self.state
            .last_signature
            .insert(region, signature.to_string());
        if let Some(date) = date {
            self.state.last_date.insert(region, date.to_string());
        }
    }
}
