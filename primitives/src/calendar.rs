//! UTC calendar bucketing
//!
//! Rate limits are keyed on calendar buckets, not rolling windows: one action per
//! calendar day and one spend envelope per calendar month. Days are encoded as
//! `year * 10000 + month * 100 + day` and months as `year * 12 + month`, so both keys
//! grow monotonically with time and `0` can stand for "never".

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day key of a record that never acted.
pub const NEVER: u32 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate {
  pub year: u32,
  pub month: u32,
  pub day: u32,
}

impl CalendarDate {
  /// Validated constructor, `None` for dates that do not exist.
  pub fn new(year: u32, month: u32, day: u32) -> Option<Self> {
    let year_signed = i32::try_from(year).ok()?;
    NaiveDate::from_ymd_opt(year_signed, month, day)?;
    Some(Self { year, month, day })
  }

  /// UTC date containing `secs`. `None` when the timestamp is outside chrono's range.
  pub fn from_unix_secs(secs: u64) -> Option<Self> {
    let secs = i64::try_from(secs).ok()?;
    let date = DateTime::from_timestamp(secs, 0)?.date_naive();
    Self::from_naive(date)
  }

  fn from_naive(date: NaiveDate) -> Option<Self> {
    Some(Self {
      year: u32::try_from(date.year()).ok()?,
      month: date.month(),
      day: date.day(),
    })
  }

  fn to_naive(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::try_from(self.year).ok()?, self.month, self.day)
  }

  pub fn day_key(&self) -> u32 {
    self
      .year
      .saturating_mul(10_000)
      .saturating_add(self.month.saturating_mul(100))
      .saturating_add(self.day)
  }

  pub fn period_key(&self) -> u32 {
    self.year.saturating_mul(12).saturating_add(self.month)
  }

  /// First second of this day, UTC.
  pub fn start_of_day_unix(&self) -> Option<u64> {
    let ts = self.to_naive()?.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
    u64::try_from(ts).ok()
  }

  /// Following calendar day. A keeper can use
  /// `date.next_day()?.start_of_day_unix()` to learn when a config that acted on
  /// `date` becomes eligible again.
  pub fn next_day(&self) -> Option<Self> {
    Self::from_naive(self.to_naive()?.succ_opt()?)
  }
}
