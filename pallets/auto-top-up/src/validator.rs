//! Pure eligibility check for a single top-up.

use crate::types::{TopUpPolicy, TopUpState};
use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::{Saturating, Zero};
use primitives::CalendarDate;

/// Why a top-up cannot run right now.
#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum TopUpBlock {
  NotEnabled,
  AlreadyToppedUpToday,
  BalanceSufficient,
  MonthlyLimitReached,
  InsufficientMainBalance,
}

impl TopUpBlock {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NotEnabled => "not enabled",
      Self::AlreadyToppedUpToday => "already acted today",
      Self::BalanceSufficient => "balance sufficient",
      Self::MonthlyLimitReached => "monthly limit reached",
      Self::InsufficientMainBalance => "insufficient source balance",
    }
  }
}

#[derive(
  Clone, Copy, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum TopUpCheck<Balance> {
  Ready { amount: Balance, day: u32, period: u32 },
  Blocked(TopUpBlock),
}

impl<Balance> TopUpCheck<Balance> {
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

/// Decides whether `state` may be topped up on `date` and by how much.
///
/// Rules apply in order and the first failing one wins. The month counter is reset
/// only logically here; it is written back by the engine after a successful transfer.
pub fn evaluate_top_up<AccountId, AssetId, Balance>(
  policy: &TopUpPolicy<Balance>,
  state: &TopUpState<AccountId, AssetId, Balance>,
  agent_balance: Balance,
  main_balance: Balance,
  date: &CalendarDate,
) -> TopUpCheck<Balance>
where
  Balance: AtLeast32BitUnsigned + Copy,
{
  if !policy.enabled {
    return TopUpCheck::Blocked(TopUpBlock::NotEnabled);
  }
  let day = date.day_key();
  if day <= state.last_top_up_day {
    return TopUpCheck::Blocked(TopUpBlock::AlreadyToppedUpToday);
  }
  let period = date.period_key();
  let spent = if period > state.last_reset_period {
    Balance::zero()
  } else {
    state.period_spent
  };
  if agent_balance >= policy.daily_limit {
    return TopUpCheck::Blocked(TopUpBlock::BalanceSufficient);
  }
  let wanted = policy.daily_limit.saturating_sub(agent_balance);
  let amount = wanted.min(policy.monthly_limit.saturating_sub(spent));
  if amount.is_zero() {
    return TopUpCheck::Blocked(TopUpBlock::MonthlyLimitReached);
  }
  if main_balance < amount {
    return TopUpCheck::Blocked(TopUpBlock::InsufficientMainBalance);
  }
  TopUpCheck::Ready { amount, day, period }
}
