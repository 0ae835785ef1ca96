#![cfg(feature = "runtime-benchmarks")]

extern crate alloc;

use crate::*;
use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;
use primitives::ConfigId;

const FUNDS: u32 = 1_000_000;

#[benchmarks]
mod benches {
  use super::*;

  fn policy<T: Config>() -> CollectPolicyOf<T> {
    CollectPolicy {
      target: account("target", 0, 0),
      threshold: 100u32.into(),
      minimum_remaining: 10u32.into(),
      enabled: true,
    }
  }

  fn installed_owner<T: Config>() -> T::AccountId {
    let owner: T::AccountId = whitelisted_caller();
    Pallet::<T>::install(
      RawOrigin::Signed(owner.clone()).into(),
      BoundedVec::default(),
      BoundedVec::default(),
    )
    .unwrap();
    owner
  }

  fn funded_assets<T: Config>(owner: &T::AccountId, n: u32) -> Vec<T::AssetId> {
    (0..n)
      .map(|i| T::BenchmarkHelper::funded_asset(owner, i, FUNDS.into()).unwrap())
      .collect()
  }

  fn seed_configs<T: Config>(owner: &T::AccountId, n: u32) -> Vec<ConfigId> {
    funded_assets::<T>(owner, n)
      .into_iter()
      .map(|asset| Pallet::<T>::do_configure(owner, asset, policy::<T>()).unwrap())
      .collect()
  }

  #[benchmark]
  fn install(n: Linear<0, { T::MaxSeedConfigs::get().min(T::MaxConfigsPerAccount::get()) }>) {
    let owner: T::AccountId = whitelisted_caller();
    let assets = funded_assets::<T>(&owner, n);
    let policies: Vec<CollectPolicyOf<T>> = (0..n).map(|_| policy::<T>()).collect();

    #[extrinsic_call]
    _(
      RawOrigin::Signed(owner.clone()),
      BoundedVec::try_from(assets).unwrap(),
      BoundedVec::try_from(policies).unwrap(),
    );

    assert!(Installed::<T>::get(&owner));
    assert_eq!(ConfigCount::<T>::get(&owner), n);
  }

  #[benchmark]
  fn uninstall(n: Linear<0, { T::MaxConfigsPerAccount::get() }>) {
    let owner = installed_owner::<T>();
    seed_configs::<T>(&owner, n);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner.clone()));

    assert!(!Installed::<T>::get(&owner));
    assert_eq!(AccountConfigs::<T>::iter_key_prefix(&owner).count(), 0);
  }

  #[benchmark]
  fn configure_collection() {
    let owner = installed_owner::<T>();
    let asset = funded_assets::<T>(&owner, 1)[0];

    #[extrinsic_call]
    _(RawOrigin::Signed(owner.clone()), asset, policy::<T>());

    assert!(Pallet::<T>::collection_by_keys(&owner, asset).is_some());
  }

  #[benchmark]
  fn update_collection() {
    let owner = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, 1)[0];
    let mut updated = policy::<T>();
    updated.threshold = 200u32.into();

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), config_id, updated.clone());

    assert_eq!(Policies::<T>::get(config_id), Some(updated));
  }

  #[benchmark]
  fn set_collection_enabled() {
    let owner = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, 1)[0];

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), config_id, false);

    assert_eq!(Policies::<T>::get(config_id).map(|p| p.enabled), Some(false));
  }

  #[benchmark]
  fn trigger_collection() {
    let owner = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, 1)[0];
    let keeper: T::AccountId = account("keeper", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(keeper), owner, config_id);

    assert!(States::<T>::get(config_id).is_some_and(|s| s.last_collect_day > 0));
  }

  #[benchmark]
  fn trigger_all_collections(n: Linear<1, { T::MaxConfigsPerAccount::get() }>) {
    let owner = installed_owner::<T>();
    let config_ids = seed_configs::<T>(&owner, n);
    let keeper: T::AccountId = account("keeper", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(keeper), owner);

    for config_id in config_ids {
      assert!(States::<T>::get(config_id).is_some_and(|s| s.last_collect_day > 0));
    }
  }

  #[benchmark]
  fn set_triggers_paused() {
    #[extrinsic_call]
    _(RawOrigin::Root, true);

    assert!(TriggersPaused::<T>::get());
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
