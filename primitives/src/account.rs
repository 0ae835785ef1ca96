use codec::Decode;
use polkadot_sdk::sp_runtime::traits::TrailingZeroInput;

/// The all-zero account of a given `AccountId` type.
///
/// Decoding from an endless stream of zero bytes yields the account that plays the
/// role of "no account" for any SCALE-encoded account type.
pub fn null_account<AccountId: Decode>() -> Option<AccountId> {
  AccountId::decode(&mut TrailingZeroInput::zeroes()).ok()
}

/// Whether `who` is the all-zero account.
pub fn is_null_account<AccountId: Decode + PartialEq>(who: &AccountId) -> bool {
  null_account::<AccountId>().is_some_and(|null| &null == who)
}
