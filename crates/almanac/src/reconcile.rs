//! 地域ごとに 1 つのメッセージを維持し、定期的に編集するループ。
//!
//! 保存済みの ID がなければ送信し、あれば取得して編集する。
//! メッセージが削除されていた場合は作り直して ID を上書きする。
//! 権限エラーはチャンネル全体の問題なので、その回の残りの地域は処理しない。

use std::time::Duration;

use almanac_core::Region;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::board::Board;
use crate::channel::{ChannelError, MessageChannel, MessageHandle};
use crate::store::StateStore;

/// 1 地域の処理結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Edited,
    Recreated,
}

/// 1 回のパスの集計。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub created: usize,
    pub edited: usize,
    pub recreated: usize,
    pub failed: usize,
    /// 権限エラーで途中終了したか
    pub aborted: bool,
}

pub struct Reconciler<C, B> {
    channel: C,
    board: B,
    store: StateStore,
    regions: Vec<Region>,
    pause: Duration,
}

impl<C: MessageChannel, B: Board> Reconciler<C, B> {
    pub fn new(channel: C, board: B, store: StateStore, pause: Duration) -> Self {
        Self {
            channel,
            board,
            store,
            regions: Region::ALL.to_vec(),
            pause,
        }
    }

    #[cfg(test)]
    fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    /// `interval` ごとにパスを実行し続ける。
    pub async fn run(mut self, interval: Duration) {
        info!(
            kind = self.board.kind(),
            interval = %humantime::format_duration(interval),
            state = ?self.store.path(),
            "Starting board loop"
        );

        loop {
            let summary = self.run_pass(Utc::now()).await;
            info!(
                kind = self.board.kind(),
                created = summary.created,
                edited = summary.edited,
                recreated = summary.recreated,
                failed = summary.failed,
                aborted = summary.aborted,
                "Board pass finished"
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// 全地域を順番に 1 回処理する。地域ごとの失敗は次の地域に影響しない。
    pub async fn run_pass(&mut self, now: DateTime<Utc>) -> PassSummary {
        let mut summary = PassSummary::default();
        let regions = self.regions.clone();

        for (index, region) in regions.into_iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            match self.reconcile_region(region, now).await {
                Ok(Outcome::Created) => summary.created += 1,
                Ok(Outcome::Edited) => summary.edited += 1,
                Ok(Outcome::Recreated) => summary.recreated += 1,
                Err(ChannelError::Forbidden) => {
                    error!(
                        kind = self.board.kind(),
                        region = %region,
                        "Missing permission to send or edit in channel, skipping the rest of this pass"
                    );
                    summary.aborted = true;
                    break;
                }
                Err(e) => {
                    warn!(kind = self.board.kind(), region = %region, error = %e, "Failed to update region");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    async fn reconcile_region(
        &mut self,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ChannelError> {
        let kind = self.board.kind();
        let report = self.board.render(region, now);
        let signature = report.fingerprint.to_string();
        let date = self
            .board
            .tracks_date()
            .then(|| report.local.format("%Y%m%d").to_string());

        if let (Some(date), Some(last)) = (date.as_deref(), self.store.last_date(region))
            && date != last
        {
            info!(kind, region = %region, date, previous = last, "New local day");
        }

        let Some(message) = self.store.message(region) else {
            let created = self.channel.send(&report.embed).await?;
            self.store
                .record_message(region, created, &signature, date.as_deref());
            self.persist();
            info!(kind, region = %region, message_id = created.0, "Message created");
            return Ok(Outcome::Created);
        };

        match self.refresh(message, &report.embed).await {
            Ok(()) => {
                if self.store.last_signature(region) != Some(signature.as_str()) {
                    info!(kind, region = %region, "Content changed, signature updated");
                    self.store
                        .record_signature(region, &signature, date.as_deref());
                    self.persist();
                } else {
                    debug!(kind, region = %region, "Timers refreshed");
                }
                Ok(Outcome::Edited)
            }
            Err(ChannelError::NotFound) => {
                warn!(kind, region = %region, message_id = message.0, "Previous message is gone, recreating");
                let created = self.channel.send(&report.embed).await?;
                self.store
                    .record_message(region, created, &signature, date.as_deref());
                self.persist();
                Ok(Outcome::Recreated)
            }
            Err(e) => Err(e),
        }
    }

    /// 保存済みメッセージを取得して本文を書き換える。
    async fn refresh(
        &self,
        message: MessageHandle,
        embed: &almanac_core::Embed,
    ) -> Result<(), ChannelError> {
        let handle = self.channel.fetch(message).await?;
        self.channel.edit(handle, embed).await
    }

    fn persist(&self) {
        if let Err(e) = self.store.save() {
            error!(kind = self.board.kind(), error = %e, path = ?self.store.path(), "Failed to save state");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    use almanac_core::Embed;
    use chrono::TimeZone as _;
    use serenity::async_trait;

    use super::*;
    use crate::board::{SeasonBoard, WeatherBoard};
    use crate::config::JitterMode;

    #[derive(Default)]
    struct MockState {
        next_id: u64,
        live: HashSet<u64>,
        sends: usize,
        fetches: usize,
        edits: usize,
        forbidden: bool,
        transient_sends: usize,
    }

    /// メモリ上のチャンネル。
    #[derive(Default)]
    struct MockChannel {
        state: Mutex<MockState>,
    }

    impl MockChannel {
        fn counts(&self) -> (usize, usize, usize) {
            let state = self.state.lock().unwrap();
            (state.sends, state.fetches, state.edits)
        }

        fn delete(&self, message: MessageHandle) {
            self.state.lock().unwrap().live.remove(&message.0);
        }
    }

    #[async_trait]
    impl MessageChannel for MockChannel {
        async fn send(&self, _embed: &Embed) -> Result<MessageHandle, ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.sends += 1;
            if state.forbidden {
                return Err(ChannelError::Forbidden);
            }
            if state.transient_sends > 0 {
                state.transient_sends -= 1;
                return Err(ChannelError::Transient("gateway timeout".to_string()));
            }
            state.next_id += 1;
            let id = 1000 + state.next_id;
            state.live.insert(id);
            Ok(MessageHandle(id))
        }

        async fn fetch(&self, id: MessageHandle) -> Result<MessageHandle, ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            if state.live.contains(&id.0) {
                Ok(id)
            } else {
                Err(ChannelError::NotFound)
            }
        }

        async fn edit(&self, handle: MessageHandle, _embed: &Embed) -> Result<(), ChannelError> {
            let mut state = self.state.lock().unwrap();
            state.edits += 1;
            if state.forbidden {
                return Err(ChannelError::Forbidden);
            }
            if state.live.contains(&handle.0) {
                Ok(())
            } else {
                Err(ChannelError::NotFound)
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 8, 22, 0, 0).unwrap()
    }

    fn reconciler(path: &Path) -> Reconciler<MockChannel, SeasonBoard> {
        Reconciler::new(
            MockChannel::default(),
            SeasonBoard::new(Duration::from_secs(300)),
            StateStore::load(path).unwrap(),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn first_pass_sends_and_stores_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("season_state.json");
        let mut reconciler = reconciler(&path).with_regions(vec![Region::Europe]);

        let summary = reconciler.run_pass(now()).await;

        assert_eq!(summary.created, 1);
        assert_eq!(reconciler.channel.counts(), (1, 0, 0));

        let saved = StateStore::load(&path).unwrap();
        assert_eq!(saved.message(Region::Europe), Some(MessageHandle(1001)));
        assert!(saved.last_signature(Region::Europe).is_some());
    }

    #[tokio::test]
    async fn second_pass_edits_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let mut reconciler =
            reconciler(&dir.path().join("state.json")).with_regions(vec![Region::Europe]);

        reconciler.run_pass(now()).await;
        let summary = reconciler
            .run_pass(now() + chrono::TimeDelta::minutes(5))
            .await;

        assert_eq!(summary.edited, 1);
        assert_eq!(summary.created, 0);
        // 送信は 1 回目の 1 回だけ
        assert_eq!(reconciler.channel.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn deleted_message_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut reconciler = reconciler(&path).with_regions(vec![Region::Europe]);

        reconciler.run_pass(now()).await;
        reconciler.channel.delete(MessageHandle(1001));

        let summary = reconciler.run_pass(now()).await;

        assert_eq!(summary.recreated, 1);
        assert_eq!(reconciler.channel.counts(), (2, 1, 0));
        let saved = StateStore::load(&path).unwrap();
        assert_eq!(saved.message(Region::Europe), Some(MessageHandle(1002)));
    }

    #[tokio::test]
    async fn forbidden_aborts_rest_of_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut reconciler = reconciler(&dir.path().join("state.json"));

        reconciler.run_pass(now()).await;
        reconciler.channel.state.lock().unwrap().forbidden = true;

        let summary = reconciler.run_pass(now()).await;

        assert!(summary.aborted);
        assert_eq!(summary.edited, 0);
        // 最初の地域で止まる
        assert_eq!(reconciler.channel.counts(), (5, 1, 1));
    }

    #[tokio::test]
    async fn transient_failure_only_skips_that_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut reconciler = reconciler(&path);
        reconciler.channel.state.lock().unwrap().transient_sends = 1;

        let summary = reconciler.run_pass(now()).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 4);
        assert!(!summary.aborted);

        let saved = StateStore::load(&path).unwrap();
        assert!(saved.message(Region::ALL[0]).is_none());
        for region in &Region::ALL[1..] {
            assert!(saved.message(*region).is_some(), "{region}");
        }

        // 次のパスで失敗した地域だけ作成される
        let summary = reconciler.run_pass(now()).await;
        assert_eq!(summary.created, 1);
        assert_eq!(summary.edited, 4);
    }

    #[tokio::test]
    async fn signature_changes_when_season_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut reconciler = reconciler(&path).with_regions(vec![Region::Europe]);

        // ローカル 8 日 23:00 (冬) から 9 日 0:00 (春) へ
        reconciler.run_pass(now() - chrono::TimeDelta::hours(1)).await;
        let winter = StateStore::load(&path)
            .unwrap()
            .last_signature(Region::Europe)
            .map(str::to_string);

        reconciler.run_pass(now()).await;
        let spring = StateStore::load(&path)
            .unwrap()
            .last_signature(Region::Europe)
            .map(str::to_string);

        assert_ne!(winter, spring);
        assert_eq!(reconciler.channel.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        reconciler(&path).run_pass(now()).await;

        let mut restarted = reconciler(&path);
        // 新しいモックは何も知らないので、既存 ID を生かしておく
        {
            let mut state = restarted.channel.state.lock().unwrap();
            state.live.extend(1001..=1005);
            state.next_id = 5;
        }
        let summary = restarted.run_pass(now()).await;

        assert_eq!(summary.edited, 5);
        assert_eq!(restarted.channel.counts(), (0, 5, 5));
    }

    #[tokio::test]
    async fn weather_state_tracks_local_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meteo_daily_state.json");
        let mut reconciler = Reconciler::new(
            MockChannel::default(),
            WeatherBoard::new(Duration::from_secs(300), JitterMode::Daily),
            StateStore::load(&path).unwrap(),
            Duration::ZERO,
        )
        .with_regions(vec![Region::Europe]);

        // Europe のローカルで 8 日 23:00
        let evening = Utc.with_ymd_and_hms(2026, 8, 8, 21, 0, 0).unwrap();
        let summary = reconciler.run_pass(evening).await;
        assert_eq!(summary.created, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"last_date\""));
        let first = StateStore::load(&path).unwrap();
        assert_eq!(first.last_date(Region::Europe), Some("20260808"));
        let message = first.message(Region::Europe);
        let signature = first.last_signature(Region::Europe).map(str::to_string);

        // 同じ日のうちは内容が変わらず、編集だけ行う
        let summary = reconciler
            .run_pass(evening + chrono::TimeDelta::minutes(5))
            .await;
        assert_eq!(summary.edited, 1);
        assert_eq!(reconciler.channel.counts(), (1, 1, 1));
        let same_day = StateStore::load(&path).unwrap();
        assert_eq!(same_day.last_date(Region::Europe), Some("20260808"));
        assert_eq!(
            same_day.last_signature(Region::Europe).map(str::to_string),
            signature
        );

        // ローカル 9 日 1:05 で日付が進む
        let summary = reconciler
            .run_pass(evening + chrono::TimeDelta::minutes(125))
            .await;
        assert_eq!(summary.edited, 1);
        assert_eq!(reconciler.channel.counts(), (1, 2, 2));
        let next_day = StateStore::load(&path).unwrap();
        assert_eq!(next_day.last_date(Region::Europe), Some("20260809"));
        assert_eq!(next_day.message(Region::Europe), message);
        assert_ne!(
            next_day.last_signature(Region::Europe).map(str::to_string),
            signature
        );
    }
}
