//! 日付から季節を決めるモデル。
//!
//! 1 か月を 4 つに区切り、1〜8 日を冬、9〜15 日を春、16〜23 日を夏、
//! 24 日以降を秋とする。

use std::fmt;

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Hiver,
    Printemps,
    Ete,
    Automne,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Hiver,
        Season::Printemps,
        Season::Ete,
        Season::Automne,
    ];

    /// ローカル日付 (1〜31) から季節を求める。
    pub fn of_day(day: u32) -> Self {
        match day {
            ..=8 => Season::Hiver,
            9..=15 => Season::Printemps,
            16..=23 => Season::Ete,
            _ => Season::Automne,
        }
    }

    /// 巡回順で次の季節。秋の次は冬。
    pub fn next(self) -> Self {
        match self {
            Season::Hiver => Season::Printemps,
            Season::Printemps => Season::Ete,
            Season::Ete => Season::Automne,
            Season::Automne => Season::Hiver,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Hiver => "Hiver",
            Season::Printemps => "Printemps",
            Season::Ete => "Été",
            Season::Automne => "Automne",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Season::Hiver => "❄️",
            Season::Printemps => "🌱",
            Season::Ete => "☀️",
            Season::Automne => "🍂",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 次の季節の境界 (9 日, 16 日, 24 日, 翌月 1 日のいずれか) のローカル 0 時を返す。
pub fn next_season_boundary(local: NaiveDateTime) -> NaiveDateTime {
    let date = local.date();
    let boundary = match date.day() {
        ..=8 => date.with_day(9),
        9..=15 => date.with_day(16),
        16..=23 => date.with_day(24),
        _ => first_of_next_month(date),
    };
    boundary.unwrap_or(date).and_time(NaiveTime::MIN)
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, TimeZone as _, Utc};

    use super::*;
    use crate::clock::{local_instant, to_utc};
    use crate::region::Region;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn of_day_thresholds() {
        assert_eq!(Season::of_day(1), Season::Hiver);
        assert_eq!(Season::of_day(8), Season::Hiver);
        assert_eq!(Season::of_day(9), Season::Printemps);
        assert_eq!(Season::of_day(15), Season::Printemps);
        assert_eq!(Season::of_day(16), Season::Ete);
        assert_eq!(Season::of_day(23), Season::Ete);
        assert_eq!(Season::of_day(24), Season::Automne);
        assert_eq!(Season::of_day(31), Season::Automne);
    }

    #[test]
    fn of_day_covers_all_seasons() {
        let mut seen: Vec<Season> = (1..=31).map(Season::of_day).collect();
        seen.dedup();
        assert_eq!(seen, Season::ALL.to_vec());
    }

    #[test]
    fn next_has_period_four() {
        for season in Season::ALL {
            assert_ne!(season.next(), season);
            assert_eq!(season.next().next().next().next(), season);
        }
        assert_eq!(Season::Automne.next(), Season::Hiver);
    }

    #[test]
    fn boundary_moves_to_next_threshold() {
        assert_eq!(next_season_boundary(at(2026, 4, 1, 0, 0)), at(2026, 4, 9, 0, 0));
        assert_eq!(next_season_boundary(at(2026, 4, 8, 23, 59)), at(2026, 4, 9, 0, 0));
        assert_eq!(next_season_boundary(at(2026, 4, 9, 0, 0)), at(2026, 4, 16, 0, 0));
        assert_eq!(next_season_boundary(at(2026, 4, 20, 12, 0)), at(2026, 4, 24, 0, 0));
        assert_eq!(next_season_boundary(at(2026, 4, 30, 18, 0)), at(2026, 5, 1, 0, 0));
        assert_eq!(next_season_boundary(at(2026, 2, 28, 1, 0)), at(2026, 3, 1, 0, 0));
    }

    #[test]
    fn boundary_rolls_over_year() {
        assert_eq!(
            next_season_boundary(at(2026, 12, 27, 9, 30)),
            at(2027, 1, 1, 0, 0)
        );
    }

    #[test]
    fn europe_midnight_on_day_nine() {
        // Europe は +2:00 なので 8 日 22:00 UTC がローカル 9 日 0 時
        let reference = Utc.with_ymd_and_hms(2026, 8, 8, 22, 0, 0).unwrap();
        let local = local_instant(Region::Europe, reference);
        assert_eq!(local, at(2026, 8, 9, 0, 0));
        assert_eq!(Season::of_day(local.day()), Season::Printemps);

        let boundary = next_season_boundary(local);
        assert_eq!(boundary, at(2026, 8, 16, 0, 0));
        assert_eq!(
            to_utc(Region::Europe, boundary),
            Utc.with_ymd_and_hms(2026, 8, 15, 22, 0, 0).unwrap()
        );
    }
}
