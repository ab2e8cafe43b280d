//! 季節・天気メッセージの本文を組み立てる。

use chrono::{DateTime, Datelike as _, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rand::Rng;

use crate::clock::{DISPLAY_TZ, local_instant, relative_label, to_display_zone, to_utc};
use crate::region::Region;
use crate::season::{Season, next_season_boundary};
use crate::signature::{Fingerprint, season_fingerprint, weather_fingerprint};
use crate::weather::{TemperatureTable, zone_readings};

pub const SEASON_COLOUR: u32 = 0xE67E22;
pub const WEATHER_COLOUR: u32 = 0x3498DB;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// チャットプラットフォームに依存しないメッセージ本文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub timestamp: DateTime<Utc>,
    pub footer: String,
    pub colour: u32,
}

/// 描画結果。本文とシグネチャ、計算に使ったローカル時刻を持つ。
#[derive(Debug, Clone)]
pub struct Report {
    pub embed: Embed,
    pub fingerprint: Fingerprint,
    pub local: NaiveDateTime,
}

/// 毎回変わるカウントダウン部分。
fn schedule_lines(now: DateTime<Utc>, next_label: &str, next: DateTime<Utc>, refresh: TimeDelta) -> String {
    let now_display = to_display_zone(&now);
    let next_display = to_display_zone(&next);
    let refresh_display = to_display_zone(&(now + refresh));

    format!(
        "**Horaires ({DISPLAY_TZ})**\n\
         • {next_label} : {}\n\
         • Dernière actualisation : {}\n\
         • Prochaine actualisation : {}",
        relative_label(&now_display, &next_display, true),
        now_display.format("%H:%M"),
        relative_label(&now_display, &refresh_display, true),
    )
}

pub fn season_report(region: Region, now: DateTime<Utc>, refresh: TimeDelta) -> Report {
    let local = local_instant(region, now);
    let season = Season::of_day(local.day());
    let next_utc = to_utc(region, next_season_boundary(local));

    let description = format!(
        "{} **{season}**\n_Date locale de référence :_ **{}**\n\n{}",
        season.emoji(),
        local.format("%d %b %Y"),
        schedule_lines(now, "Prochaine saison", next_utc, refresh),
    );

    Report {
        embed: Embed {
            title: format!("{region} — Saison actuelle"),
            description,
            fields: Vec::new(),
            timestamp: now,
            footer: format!("Heure affichée : {DISPLAY_TZ}"),
            colour: SEASON_COLOUR,
        },
        fingerprint: season_fingerprint(region, season, local.date()),
        local,
    }
}

pub fn weather_report<R: Rng + ?Sized>(
    table: &TemperatureTable,
    region: Region,
    now: DateTime<Utc>,
    refresh: TimeDelta,
    rng: &mut R,
) -> Report {
    let local = local_instant(region, now);
    let season = Season::of_day(local.day());
    let readings = zone_readings(table, region, local, rng);

    let fields = readings
        .iter()
        .map(|reading| EmbedField {
            name: reading.zone.label.to_string(),
            value: format!(
                "🌡️ **{} °C**\nMétéo : {}\n*({})*",
                reading.temperature,
                reading.icon.emoji(),
                reading.icon.caption()
            ),
            inline: true,
        })
        .collect();

    let next_midnight = (local.date() + TimeDelta::days(1)).and_time(NaiveTime::MIN);
    let next_utc = to_utc(region, next_midnight);

    Report {
        embed: Embed {
            title: format!("{} {region} — Météo régionale", region.icon()),
            description: schedule_lines(now, "Prochaine météo", next_utc, refresh),
            fields,
            timestamp: now,
            footer: format!("Heure affichée : {DISPLAY_TZ} • Saison : {season}"),
            colour: WEATHER_COLOUR,
        },
        fingerprint: weather_fingerprint(region, local.date(), &readings),
        local,
    }
}
