//! 季節・天気ボードのドメインモデル。
//!
//! 時刻から地域ごとの季節と合成天気を計算し、メッセージ本文と
//! 変化検出用のシグネチャを作る。I/O は持たない。

pub mod clock;
pub mod region;
pub mod report;
pub mod season;
pub mod signature;
pub mod weather;

pub use region::{ParseRegionError, Region, Zone};
pub use report::{Embed, EmbedField, Report};
pub use season::Season;
pub use signature::Fingerprint;
