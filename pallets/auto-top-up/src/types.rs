use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::Saturating;
use primitives::NEVER;

/// Owner-editable limits of one top-up configuration.
#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub struct TopUpPolicy<Balance> {
  /// Balance the agent is refilled to, at most once per calendar day.
  pub daily_limit: Balance,
  /// Ceiling on the sum of top-ups credited within one calendar month.
  pub monthly_limit: Balance,
  pub enabled: bool,
}

/// Engine-owned bookkeeping of one top-up configuration.
///
/// `agent` and `asset` are fixed when the record is created and never change.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct TopUpState<AccountId, AssetId, Balance> {
  pub agent: AccountId,
  pub asset: AssetId,
  pub last_top_up_day: u32,
  pub period_spent: Balance,
  pub last_reset_period: u32,
}

impl<AccountId, AssetId, Balance: Default + Copy + Saturating> TopUpState<AccountId, AssetId, Balance> {
  pub fn new(agent: AccountId, asset: AssetId) -> Self {
    Self {
      agent,
      asset,
      last_top_up_day: NEVER,
      period_spent: Balance::default(),
      last_reset_period: NEVER,
    }
  }

  /// Applies a completed top-up of `amount` on `day` within `period`.
  pub fn record_top_up(&mut self, amount: Balance, day: u32, period: u32) {
    self.last_top_up_day = day;
    if period > self.last_reset_period {
      self.period_spent = amount;
      self.last_reset_period = period;
    } else {
      self.period_spent = self.period_spent.saturating_add(amount);
    }
  }
}
