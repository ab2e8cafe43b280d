//! 地域ローカル時刻と表示用タイムゾーンの変換。

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{Europe::Paris, Tz};

use crate::region::Region;

/// カウントダウン表示に使う固定タイムゾーン。
pub const DISPLAY_TZ: Tz = Paris;

/// 基準時刻 (UTC) を地域ローカル時刻に変換する。
///
/// オフセットを単純に加算するだけで、タイムゾーンデータベースや夏時間は参照しない。
pub fn local_instant(region: Region, reference: DateTime<Utc>) -> NaiveDateTime {
    reference.naive_utc() + region.offset().as_delta()
}

/// [`local_instant`] の逆変換。同じオフセットを減算する。
pub fn to_utc(region: Region, local: NaiveDateTime) -> DateTime<Utc> {
    (local - region.offset().as_delta()).and_utc()
}

pub fn to_display_zone<T: TimeZone>(instant: &DateTime<T>) -> DateTime<Tz> {
    instant.with_timezone(&DISPLAY_TZ)
}

/// 2 つの時刻の差を「dans 2 j 3 h 05 min」形式で表す。
///
/// 上位の単位が 0 の場合は省略し、負の差は 0 として扱う。
/// 分は四捨五入する。
pub fn relative_label<T: TimeZone>(now: &DateTime<T>, target: &DateTime<T>, is_future: bool) -> String {
    let delta = if is_future {
        target.clone() - now.clone()
    } else {
        now.clone() - target.clone()
    };
    let seconds = delta.num_seconds().max(0);
    let total_minutes = (seconds + 30) / 60;

    let days = total_minutes / (24 * 60);
    let hours = total_minutes / 60 % 24;
    let minutes = total_minutes % 60;

    let amount = if days > 0 {
        format!("{days} j {hours} h {minutes:02} min")
    } else if hours > 0 {
        format!("{hours} h {minutes:02} min")
    } else {
        format!("{minutes} min")
    };

    if is_future {
        format!("dans {amount}")
    } else {
        format!("il y a {amount}")
    }
}
