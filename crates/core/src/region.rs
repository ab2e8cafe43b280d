//! 地域 (大陸) とバイオームゾーンの定義。

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use thiserror::Error;

/// 季節と天気を表示する 5 つの地域。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Afrique,
    Amerique,
    Asie,
    Europe,
    Oceanie,
}

/// 地域の UTC オフセット。時と分の両方に符号を持つ (例: -6 時間 -30 分)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    pub hours: i64,
    pub minutes: i64,
}

impl UtcOffset {
    pub const fn new(hours: i64, minutes: i64) -> Self {
        Self { hours, minutes }
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::hours(self.hours) + TimeDelta::minutes(self.minutes)
    }
}

/// 地域に属するバイオームゾーン。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    /// 表示ラベル (絵文字付き)
    pub label: &'static str,
}

impl Zone {
    const fn new(label: &'static str) -> Self {
        Self { label }
    }

    /// 気温テーブルのキーとなる短縮名を返す。
    ///
    /// `"🌳 Zones Forestières"` -> `"Forestières"`
    pub fn short_name(&self) -> &'static str {
        let name = match self.label.split_once(' ') {
            Some((_, rest)) => rest,
            None => self.label,
        };
        name.strip_prefix("Zones ").unwrap_or(name).trim()
    }
}

const AFRIQUE_ZONES: &[Zone] = &[
    Zone::new("🌾 Zones Savanes"),
    Zone::new("🌵 Zones Deserts"),
    Zone::new("🦜 Zones Tropicales"),
    Zone::new("🌱 Zones Marécageuses"),
    Zone::new("🏙️ Zones Urbaines"),
];

const AMERIQUE_ZONES: &[Zone] = &[
    Zone::new("🌳 Zones Forestières"),
    Zone::new("🌾 Zones Clairière"),
    Zone::new("🌵 Zones Deserts"),
    Zone::new("⛰️ Zones Montagneuses"),
    Zone::new("❄️ Zones Enneigées"),
    Zone::new("🦜 Zones Tropicales"),
    Zone::new("🌱 Zones Mangroves"),
    Zone::new("🏙️ Zones Urbaines"),
];

const ASIE_ZONES: &[Zone] = &[
    Zone::new("🦜 Zones Tropicales"),
    Zone::new("🌾 Zones Prairies"),
    Zone::new("⛰️ Zones Montagneuses"),
    Zone::new("❄️ Zones Enneigées"),
    Zone::new("🌳 Zones Forestières"),
    Zone::new("🏙️ Zones Urbaines"),
];

const EUROPE_ZONES: &[Zone] = &[
    Zone::new("🌳 Zones Forestières"),
    Zone::new("⛰️ Zones Montagneuses"),
    Zone::new("❄️ Zones Enneigées"),
    Zone::new("🌾 Zones Prairies"),
    Zone::new("🏙️ Zones Urbaines"),
];

const OCEANIE_ZONES: &[Zone] = &[
    Zone::new("🌴 Zones Insulaires"),
    Zone::new("🌾 Zones Savanes"),
    Zone::new("🦜 Zones Tropicales"),
    Zone::new("🌵 Zones Deserts"),
    Zone::new("⛰️ Zones Montagneuses"),
    Zone::new("🏙️ Zones Urbaines"),
];

impl Region {
    /// 処理順序を兼ねた全地域の一覧。
    pub const ALL: [Region; 5] = [
        Region::Afrique,
        Region::Amerique,
        Region::Asie,
        Region::Europe,
        Region::Oceanie,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Region::Afrique => "Afrique",
            Region::Amerique => "Amérique",
            Region::Asie => "Asie",
            Region::Europe => "Europe",
            Region::Oceanie => "Océanie",
        }
    }

    /// 地域ローカル時刻の計算に使う固定オフセット。夏時間は考慮しない。
    pub fn offset(self) -> UtcOffset {
        match self {
            Region::Afrique => UtcOffset::new(1, 30),
            Region::Amerique => UtcOffset::new(-6, -30),
            Region::Asie => UtcOffset::new(7, 0),
            Region::Europe => UtcOffset::new(2, 0),
            Region::Oceanie => UtcOffset::new(4, 15),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Region::Afrique => "🦁",
            Region::Amerique => "🐿️",
            Region::Asie => "🐼",
            Region::Europe => "🐺",
            Region::Oceanie => "🐹",
        }
    }

    pub fn zones(self) -> &'static [Zone] {
        match self {
            Region::Afrique => AFRIQUE_ZONES,
            Region::Amerique => AMERIQUE_ZONES,
            Region::Asie => ASIE_ZONES,
            Region::Europe => EUROPE_ZONES,
            Region::Oceanie => OCEANIE_ZONES,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown region: {0}")]
pub struct ParseRegionError(pub String);

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.name() == s)
            .ok_or_else(|| ParseRegionError(s.to_string()))
    }
}
