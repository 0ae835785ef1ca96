//! Pure eligibility check for a single collection.

use crate::types::{CollectPolicy, CollectState};
use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::{Saturating, Zero};
use primitives::CalendarDate;

#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum CollectBlock {
  NotEnabled,
  AlreadyCollectedToday,
  ZeroBalance,
  BelowThreshold,
  NothingToCollect,
}

impl CollectBlock {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NotEnabled => "not enabled",
      Self::AlreadyCollectedToday => "already acted today",
      Self::ZeroBalance => "balance is zero",
      Self::BelowThreshold => "balance below threshold",
      Self::NothingToCollect => "collect amount would be zero",
    }
  }
}

#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum CollectCheck<Balance> {
  Ready { amount: Balance, day: u32 },
  Blocked(CollectBlock),
}

impl<Balance> CollectCheck<Balance> {
  pub fn is_ready(&self) -> bool {
    matches!(self, Self::Ready { .. })
  }

  pub fn reason(&self) -> Option<&'static str> {
    match self {
      Self::Ready { .. } => None,
      Self::Blocked(block) => Some(block.as_str()),
    }
  }
}

/// What a sweep of `balance` would move while keeping `minimum_remaining` behind.
pub fn collectable_amount<Balance: AtLeast32BitUnsigned>(
  balance: Balance,
  minimum_remaining: Balance,
) -> Balance {
  balance.saturating_sub(minimum_remaining)
}

/// Decides whether a service account holding `balance` may be swept on `date`.
///
/// `threshold` and `minimum_remaining` compose: when the floor is above the
/// threshold the floor becomes the effective trigger point.
pub fn evaluate_collection<AccountId, AssetId, Balance>(
  policy: &CollectPolicy<AccountId, Balance>,
  state: &CollectState<AssetId>,
  balance: Balance,
  date: &CalendarDate,
) -> CollectCheck<Balance>
where
  Balance: AtLeast32BitUnsigned + Copy,
{
  if !policy.enabled {
    return CollectCheck::Blocked(CollectBlock::NotEnabled);
  }
  let day = date.day_key();
  if day <= state.last_collect_day {
    return CollectCheck::Blocked(CollectBlock::AlreadyCollectedToday);
  }
  if balance.is_zero() {
    return CollectCheck::Blocked(CollectBlock::ZeroBalance);
  }
  if balance < policy.threshold {
    return CollectCheck::Blocked(CollectBlock::BelowThreshold);
  }
  let amount = collectable_amount(balance, policy.minimum_remaining);
  if amount.is_zero() {
    return CollectCheck::Blocked(CollectBlock::NothingToCollect);
  }
  CollectCheck::Ready { amount, day }
}
