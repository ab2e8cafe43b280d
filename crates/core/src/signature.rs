//! 表示内容の変化を検出するためのシグネチャ。
//!
//! カウントダウンのように毎回変わる部分は含めず、季節や気温など
//! 意味のある値だけをハッシュする。

use std::fmt;

use chrono::NaiveDate;
use sha2::{Digest as _, Sha256};

use crate::region::Region;
use crate::season::Season;
use crate::weather::ZoneReading;

/// SHA-256 の 16 進文字列。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn of(payload: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(payload.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn season_fingerprint(region: Region, season: Season, local_date: NaiveDate) -> Fingerprint {
    Fingerprint::of(&format!(
        "{region}|{season}|{}",
        local_date.format("%Y-%m-%d")
    ))
}

/// 描画したゾーンを順番通りに連結してハッシュする。
pub fn weather_fingerprint(
    region: Region,
    local_date: NaiveDate,
    readings: &[ZoneReading],
) -> Fingerprint {
    let flat = readings
        .iter()
        .map(|r| {
            format!(
                "{}:{}:{}",
                r.zone.short_name(),
                r.temperature,
                r.icon.emoji()
            )
        })
        .collect::<Vec<_>>()
        .join("|");
    Fingerprint::of(&format!(
        "{region}|{}|{flat}",
        local_date.format("%Y-%m-%d")
    ))
}
