use frame::prelude::*;
use primitives::NEVER;

/// Owner-editable parameters of one collection.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct CollectPolicy<AccountId, Balance> {
  /// Account that receives the swept funds.
  pub target: AccountId,
  /// Smallest balance that triggers a sweep. Zero means any non-zero balance.
  pub threshold: Balance,
  /// Balance left behind on the service account. Zero sweeps everything.
  pub minimum_remaining: Balance,
  pub enabled: bool,
}

#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct CollectState<AssetId> {
  pub asset: AssetId,
  pub last_collect_day: u32,
}

impl<AssetId> CollectState<AssetId> {
  pub fn new(asset: AssetId) -> Self {
    Self {
      asset,
      last_collect_day: NEVER,
    }
  }

  pub fn record_collection(&mut self, day: u32) {
    self.last_collect_day = day;
  }
}
