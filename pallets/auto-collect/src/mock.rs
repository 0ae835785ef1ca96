extern crate alloc;

use crate as pallet_auto_collect;
use alloc::{vec, vec::Vec};
use core::{cell::RefCell, time::Duration};
use polkadot_sdk::frame_support::traits::fungibles::{Inspect, Mutate};
use polkadot_sdk::frame_support::traits::tokens::Preservation;
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl,
  traits::{ConstU32, ConstU128, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetOps, CalendarDate, TransferExecutor, abi_bool};
use std::collections::BTreeMap;

pub type AccountId = u64;
pub type AssetId = u32;
pub type Balance = u128;

pub const SERVICE: AccountId = 1;
pub const TREASURY: AccountId = 2;
pub const VAULT: AccountId = 3;
pub const KEEPER: AccountId = 5;
pub const OTHER_SERVICE: AccountId = 6;

pub const USDC: AssetId = 1;
pub const DAI: AssetId = 2;
pub const WETH: AssetId = 3;
pub const EURC: AssetId = 4;
pub const UNKNOWN_ASSET: AssetId = 99;

const ASSETS: [AssetId; 4] = [USDC, DAI, WETH, EURC];

/// How the mocked token answers a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenBehaviour {
  /// Moves funds and returns ABI `true`.
  Standard,
  /// Moves funds and returns nothing, like legacy tokens.
  NoReturnData,
  /// Moves nothing and returns ABI `false`.
  ReturnsFalse,
  /// Moves funds, then returns a single byte.
  Malformed,
  Reverts,
  /// Calls back into `trigger_all_collections` before moving funds.
  Reenter,
}

thread_local! {
  static BEHAVIOURS: RefCell<BTreeMap<AssetId, TokenBehaviour>> = const { RefCell::new(BTreeMap::new()) };
  static NOW_SECS: RefCell<u64> = const { RefCell::new(0) };
  static NESTED_RESULTS: RefCell<Vec<DispatchResult>> = const { RefCell::new(Vec::new()) };
}

pub fn set_token_behaviour(asset: AssetId, behaviour: TokenBehaviour) {
  BEHAVIOURS.with(|b| b.borrow_mut().insert(asset, behaviour));
}

fn token_behaviour(asset: AssetId) -> TokenBehaviour {
  BEHAVIOURS.with(|b| b.borrow().get(&asset).copied().unwrap_or(TokenBehaviour::Standard))
}

pub fn nested_trigger_results() -> Vec<DispatchResult> {
  NESTED_RESULTS.with(|r| r.borrow().clone())
}

pub fn set_unix_time(secs: u64) {
  NOW_SECS.with(|n| *n.borrow_mut() = secs);
}

/// Noon UTC of the given day.
pub fn set_date(year: u32, month: u32, day: u32) {
  let start = CalendarDate::new(year, month, day)
    .and_then(|date| date.start_of_day_unix())
    .expect("valid test date");
  set_unix_time(start + 12 * 3600);
}

pub fn balance_of(who: AccountId, asset: AssetId) -> Balance {
  <Assets as Inspect<AccountId>>::balance(asset, &who)
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    AutoCollect: pallet_auto_collect,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = Balance;
  type AssetId = AssetId;
  type AssetIdParameter = AssetId;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

pub struct MockAssetOps;
impl AssetOps<AccountId, AssetId, Balance> for MockAssetOps {
  fn asset_exists(asset: AssetId) -> bool {
    <Assets as Inspect<AccountId>>::asset_exists(asset)
  }

  fn balance(who: &AccountId, asset: AssetId) -> Balance {
    <Assets as Inspect<AccountId>>::balance(asset, who)
  }
}

/// Stand-in for the host execution primitive, backed by `pallet_assets` so that
/// storage-layer rollback is observable in balances.
pub struct MockTransferExecutor;

impl MockTransferExecutor {
  fn move_funds(
    from: &AccountId,
    asset: AssetId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    <Assets as Mutate<AccountId>>::transfer(asset, from, to, amount, Preservation::Expendable)?;
    Ok(())
  }
}

impl TransferExecutor<AccountId, AssetId, Balance> for MockTransferExecutor {
  fn execute_transfer(
    from: &AccountId,
    asset: AssetId,
    to: &AccountId,
    amount: Balance,
  ) -> Result<Vec<u8>, DispatchError> {
    match token_behaviour(asset) {
      TokenBehaviour::Standard => {
        Self::move_funds(from, asset, to, amount)?;
        Ok(abi_bool(true).to_vec())
      }
      TokenBehaviour::NoReturnData => {
        Self::move_funds(from, asset, to, amount)?;
        Ok(Vec::new())
      }
      TokenBehaviour::ReturnsFalse => Ok(abi_bool(false).to_vec()),
      TokenBehaviour::Malformed => {
        Self::move_funds(from, asset, to, amount)?;
        Ok(vec![1u8])
      }
      TokenBehaviour::Reverts => Err(DispatchError::Other("TokenReverted")),
      TokenBehaviour::Reenter => {
        let nested = AutoCollect::trigger_all_collections(RuntimeOrigin::signed(KEEPER), *from);
        NESTED_RESULTS.with(|r| r.borrow_mut().push(nested));
        Self::move_funds(from, asset, to, amount)?;
        Ok(abi_bool(true).to_vec())
      }
    }
  }
}

pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> Duration {
    Duration::from_secs(NOW_SECS.with(|n| *n.borrow()))
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, AssetId, Balance> for MockBenchmarkHelper {
  fn funded_asset(
    owner: &AccountId,
    index: u32,
    amount: Balance,
  ) -> Result<AssetId, DispatchError> {
    let asset = ASSETS[index as usize % ASSETS.len()];
    <Assets as Mutate<AccountId>>::mint_into(asset, owner, amount)?;
    Ok(asset)
  }
}

impl pallet_auto_collect::Config for Test {
  type AssetId = AssetId;
  type Balance = Balance;
  type AssetOps = MockAssetOps;
  type TransferExecutor = MockTransferExecutor;
  type UnixTime = MockTime;
  type AdminOrigin = frame_system::EnsureRoot<AccountId>;
  type MaxConfigsPerAccount = ConstU32<3>;
  type MaxSeedConfigs = ConstU32<4>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![(SERVICE, 1_000), (OTHER_SERVICE, 1_000), (KEEPER, 1_000)],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: ASSETS.iter().map(|&asset| (asset, KEEPER, true, 1)).collect(),
    metadata: vec![],
    accounts: vec![],
    reserves: vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  BEHAVIOURS.with(|b| b.borrow_mut().clear());
  NESTED_RESULTS.with(|r| r.borrow_mut().clear());

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    set_date(2025, 1, 15);
  });
  ext
}
