//! 季節ボードと天気ボード。時刻と地域からメッセージ本文を描画する。

use std::time::Duration;

use almanac_core::report::{season_report, weather_report};
use almanac_core::weather::{TemperatureTable, daily_rng};
use almanac_core::{Region, Report};
use chrono::{DateTime, TimeDelta, Utc};
use rand::{SeedableRng as _, rngs::StdRng};

use crate::config::JitterMode;

/// 1 種類のメッセージ (季節 or 天気) の描画方法。
pub trait Board: Send {
    /// ログに出す種別名
    fn kind(&self) -> &'static str;

    fn render(&mut self, region: Region, now: DateTime<Utc>) -> Report;

    /// ローカル日付を状態ファイルに記録するか
    fn tracks_date(&self) -> bool {
        false
    }
}

fn refresh_delta(interval: Duration) -> TimeDelta {
    TimeDelta::from_std(interval).unwrap_or(TimeDelta::minutes(5))
}

pub struct SeasonBoard {
    refresh: TimeDelta,
}

impl SeasonBoard {
    pub fn new(interval: Duration) -> Self {
        Self {
            refresh: refresh_delta(interval),
        }
    }
}

impl Board for SeasonBoard {
    fn kind(&self) -> &'static str {
        "season"
    }

    fn render(&mut self, region: Region, now: DateTime<Utc>) -> Report {
        season_report(region, now, self.refresh)
    }
}

pub struct WeatherBoard {
    table: TemperatureTable,
    refresh: TimeDelta,
    jitter: JitterMode,
    rng: StdRng,
}

impl WeatherBoard {
    pub fn new(interval: Duration, jitter: JitterMode) -> Self {
        Self {
            table: TemperatureTable::builtin(),
            refresh: refresh_delta(interval),
            jitter,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Board for WeatherBoard {
    fn kind(&self) -> &'static str {
        "weather"
    }

    fn render(&mut self, region: Region, now: DateTime<Utc>) -> Report {
        match self.jitter {
            JitterMode::PerTick => {
                weather_report(&self.table, region, now, self.refresh, &mut self.rng)
            }
            JitterMode::Daily => {
                let local = almanac_core::clock::local_instant(region, now);
                let mut rng = daily_rng(region, local.date());
                weather_report(&self.table, region, now, self.refresh, &mut rng)
            }
        }
    }

    fn tracks_date(&self) -> bool {
        true
    }
}
