//! Adapter traits for the host environment
//!
//! Both pallets reach token balances and the host account's execution primitive
//! only through these traits, so the runtime decides which ledger backs an asset.

use alloc::vec::Vec;
use polkadot_sdk::sp_runtime::DispatchError;

/// Read-only asset queries.
pub trait AssetOps<AccountId, AssetId, Balance> {
  /// Whether `asset` names a live asset. Unknown assets are rejected at configuration time.
  fn asset_exists(asset: AssetId) -> bool;

  fn balance(who: &AccountId, asset: AssetId) -> Balance;
}

/// Execution primitive of the host account.
///
/// Moves `amount` of `asset` from `from` to `to` on behalf of `from` and hands back the
/// raw return data of the underlying token call. The data is interpreted with
/// [`crate::interpret_transfer_return`]; an `Err` means the call itself reverted.
pub trait TransferExecutor<AccountId, AssetId, Balance> {
  fn execute_transfer(
    from: &AccountId,
    asset: AssetId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<Vec<u8>, DispatchError>;
}

/// No-op `AssetOps`: no asset exists and every balance is zero.
impl<AccountId, AssetId, Balance: Default> AssetOps<AccountId, AssetId, Balance> for () {
  fn asset_exists(_: AssetId) -> bool {
    false
  }

  fn balance(_: &AccountId, _: AssetId) -> Balance {
    Balance::default()
  }
}

/// Unconfigured executor, every transfer reverts.
impl<AccountId, AssetId, Balance> TransferExecutor<AccountId, AssetId, Balance> for () {
  fn execute_transfer(
    _: &AccountId,
    _: AssetId,
    _: &AccountId,
    _: Balance,
  ) -> Result<Vec<u8>, DispatchError> {
    Err(DispatchError::Other("TransferExecutor not configured"))
  }
}
