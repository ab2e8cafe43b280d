//! 合成天気モデル。
//!
//! 地域・ゾーン・季節ごとの基準気温テーブルから、季節の境目付近で
//! 次の季節の気温と混ぜ合わせ、ランダムな揺らぎを加えて日々の気温を作る。
//! アイコンはゾーン名の部分一致と季節、気温から決める。

use std::collections::HashMap;

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng as _, rngs::StdRng};
use sha2::{Digest as _, Sha256};

use crate::region::{Region, Zone};
use crate::season::Season;

/// 揺らぎの最大幅 (°C)。
pub const JITTER: i32 = 2;

/// 基準気温 (°C)。値は冬・春・夏・秋の順。
const BASE_TEMPERATURES: &[(Region, &str, [i32; 4])] = &[
    (Region::Afrique, "Savanes", [24, 26, 27, 25]),
    (Region::Afrique, "Deserts", [20, 30, 38, 28]),
    (Region::Afrique, "Tropicales", [27, 28, 28, 27]),
    (Region::Afrique, "Marécageuses", [25, 26, 26, 25]),
    (Region::Afrique, "Urbaines", [26, 28, 29, 27]),
    (Region::Amerique, "Forestières", [0, 10, 20, 9]),
    (Region::Amerique, "Clairière", [-2, 12, 24, 10]),
    (Region::Amerique, "Deserts", [10, 25, 35, 20]),
    (Region::Amerique, "Montagneuses", [-5, 5, 12, 3]),
    (Region::Amerique, "Enneigées", [-15, -2, 8, -5]),
    (Region::Amerique, "Tropicales", [25, 27, 28, 26]),
    (Region::Amerique, "Mangroves", [26, 27, 27, 26]),
    (Region::Amerique, "Urbaines", [1, 12, 22, 11]),
    (Region::Asie, "Tropicales", [26, 28, 29, 27]),
    (Region::Asie, "Prairies", [5, 15, 24, 14]),
    (Region::Asie, "Montagneuses", [-2, 6, 12, 4]),
    (Region::Asie, "Enneigées", [-10, 0, 8, -2]),
    (Region::Asie, "Forestières", [2, 12, 20, 10]),
    (Region::Asie, "Urbaines", [3, 14, 23, 12]),
    (Region::Europe, "Forestières", [2, 13, 19, 9]),
    (Region::Europe, "Montagneuses", [-4, 5, 12, 3]),
    (Region::Europe, "Enneigées", [-10, 1, 10, 0]),
    (Region::Europe, "Prairies", [1, 12, 22, 10]),
    (Region::Europe, "Urbaines", [3, 14, 23, 11]),
    (Region::Oceanie, "Insulaires", [18, 22, 26, 22]),
    (Region::Oceanie, "Savanes", [22, 26, 30, 24]),
    (Region::Oceanie, "Tropicales", [26, 27, 28, 27]),
    (Region::Oceanie, "Deserts", [18, 28, 36, 24]),
    (Region::Oceanie, "Montagneuses", [5, 10, 16, 8]),
    (Region::Oceanie, "Urbaines", [19, 23, 27, 23]),
];

/// (地域, ゾーン短縮名, 季節) -> 基準気温 のテーブル。
#[derive(Debug, Clone, Default)]
pub struct TemperatureTable {
    entries: HashMap<(Region, String, Season), i32>,
}

impl TemperatureTable {
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (region, zone, temperatures) in BASE_TEMPERATURES {
            for (season, temperature) in Season::ALL.into_iter().zip(temperatures) {
                table.insert(*region, zone, season, *temperature);
            }
        }
        table
    }

    pub fn insert(&mut self, region: Region, zone: &str, season: Season, temperature: i32) {
        self.entries
            .insert((region, zone.to_string(), season), temperature);
    }

    /// 基準気温を返す。`None` はそのゾーンがこの季節ではモデル化されていないことを表す。
    pub fn base_temperature(&self, region: Region, zone: &str, season: Season) -> Option<i32> {
        self.entries
            .get(&(region, zone.to_string(), season))
            .copied()
    }
}

/// 季節の境目付近で次の季節の気温を混ぜる割合。
pub fn blend_factor(day: u32) -> f64 {
    match day {
        8 | 15 | 23 => 0.2,
        9 | 16 | 24 => 0.8,
        _ => 0.0,
    }
}

pub fn blended_temperature(current: i32, next: i32, alpha: f64, jitter: i32) -> i32 {
    let blended = (1.0 - alpha) * f64::from(current) + alpha * f64::from(next);
    (blended + f64::from(jitter)).round() as i32
}

pub fn sample_jitter<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(-JITTER..=JITTER)
}

/// 地域とローカル日付から決まる乱数生成器。同じ日のうちは同じ揺らぎを返す。
pub fn daily_rng(region: Region, date: NaiveDate) -> StdRng {
    let digest = Sha256::digest(format!("{region}|{}", date.format("%Y-%m-%d")));
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    StdRng::seed_from_u64(u64::from_le_bytes(seed))
}

/// 天気アイコン。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Sunny,
    MostlySunny,
    PartlyCloudy,
    Overcast,
    Showers,
    Rain,
    Snow,
    DryStorm,
    Thunderstorm,
    Tornado,
    Fog,
    Wind,
}

impl Icon {
    pub fn emoji(self) -> &'static str {
        match self {
            Icon::Sunny => "☀️",
            Icon::MostlySunny => "🌤️",
            Icon::PartlyCloudy => "⛅",
            Icon::Overcast => "🌥️",
            Icon::Showers => "🌦️",
            Icon::Rain => "🌧️",
            Icon::Snow => "🌨️",
            Icon::DryStorm => "🌩️",
            Icon::Thunderstorm => "⛈️",
            Icon::Tornado => "🌪️",
            Icon::Fog => "🌫️",
            Icon::Wind => "💨",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Icon::Sunny => "Ciel dégagé, chaleur marquée",
            Icon::MostlySunny => "Soleil dominant, quelques nuages",
            Icon::PartlyCloudy => "Partiellement nuageux",
            Icon::Overcast => "Nuages épais majoritaires",
            Icon::Showers => "Éclaircies et averses",
            Icon::Rain => "Averses fréquentes",
            Icon::Snow => "Neige",
            Icon::DryStorm => "Orage sec",
            Icon::Thunderstorm => "Orage avec averse",
            Icon::Tornado => "Vents très violents, tornades possibles",
            Icon::Fog => "Brouillard épais",
            Icon::Wind => "Vent fort",
        }
    }
}

struct IconRule {
    /// 小文字化したゾーン名・季節・気温で判定する
    matches: fn(&str, Season, i32) -> bool,
    icon: fn(Season, i32) -> Icon,
}

fn has_any(zone: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| zone.contains(keyword))
}

fn is_warm(season: Season) -> bool {
    matches!(season, Season::Printemps | Season::Ete)
}

/// 上から順に評価し、最初に一致したルールのアイコンを使う。
const ICON_RULES: &[IconRule] = &[
    // 寒冷
    IconRule {
        matches: |zone, season, t| {
            t <= 0
                || (zone.contains("enneig") && matches!(season, Season::Hiver | Season::Automne))
                || (zone.contains("montagne") && season == Season::Hiver)
        },
        icon: |_, _| Icon::Snow,
    },
    // 砂漠
    IconRule {
        matches: |zone, _, _| has_any(zone, &["désert", "desert"]),
        icon: |season, _| if is_warm(season) { Icon::Sunny } else { Icon::Wind },
    },
    // 熱帯・マングローブ
    IconRule {
        matches: |zone, _, _| has_any(zone, &["tropic", "mangrove"]),
        icon: |season, _| {
            if is_warm(season) {
                Icon::Thunderstorm
            } else {
                Icon::Rain
            }
        },
    },
    // 湿地
    IconRule {
        matches: |zone, _, _| has_any(zone, &["maréc", "marec"]),
        icon: |_, _| Icon::Showers,
    },
    // 都市
    IconRule {
        matches: |zone, _, _| zone.contains("urbain"),
        icon: |season, _| {
            if is_warm(season) {
                Icon::PartlyCloudy
            } else {
                Icon::Overcast
            }
        },
    },
    // 山岳
    IconRule {
        matches: |zone, _, _| zone.contains("montagne"),
        icon: |season, _| {
            if season == Season::Hiver {
                Icon::Snow
            } else {
                Icon::Overcast
            }
        },
    },
    // 森林・草原など
    IconRule {
        matches: |zone, _, _| {
            has_any(
                zone,
                &["forêt", "forest", "prairie", "clairière", "insulaire", "savane"],
            )
        },
        icon: |season, t| match season {
            Season::Ete if t >= 24 => Icon::Sunny,
            Season::Ete => Icon::PartlyCloudy,
            Season::Printemps => Icon::MostlySunny,
            Season::Automne => Icon::Overcast,
            Season::Hiver if t <= 3 => Icon::Fog,
            Season::Hiver => Icon::PartlyCloudy,
        },
    },
];

/// ゾーンのカテゴリ・季節・気温からアイコンを選ぶ。
pub fn icon_for(zone_short_name: &str, season: Season, temperature: i32) -> Icon {
    let zone = zone_short_name.to_lowercase();
    ICON_RULES
        .iter()
        .find(|rule| (rule.matches)(&zone, season, temperature))
        .map(|rule| (rule.icon)(season, temperature))
        .unwrap_or(Icon::PartlyCloudy)
}

/// 1 ゾーン分の天気。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneReading {
    pub zone: Zone,
    pub temperature: i32,
    pub icon: Icon,
}

/// 地域の全ゾーンの天気を計算する。
///
/// 現在または次の季節の基準気温がないゾーンは出力に含めない。
pub fn zone_readings<R: Rng + ?Sized>(
    table: &TemperatureTable,
    region: Region,
    local: NaiveDateTime,
    rng: &mut R,
) -> Vec<ZoneReading> {
    let season = Season::of_day(local.day());
    let next = season.next();
    let alpha = blend_factor(local.day());

    region
        .zones()
        .iter()
        .filter_map(|zone| {
            let short = zone.short_name();
            let current = table.base_temperature(region, short, season)?;
            let upcoming = table.base_temperature(region, short, next)?;
            let temperature = blended_temperature(current, upcoming, alpha, sample_jitter(rng));
            Some(ZoneReading {
                zone: *zone,
                temperature,
                icon: icon_for(short, season, temperature),
            })
        })
        .collect()
}
