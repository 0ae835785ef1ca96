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

  fn policy<T: Config>() -> TopUpPolicyOf<T> {
    TopUpPolicy {
      daily_limit: 100u32.into(),
      monthly_limit: 1_000u32.into(),
      enabled: true,
    }
  }

  fn installed_owner<T: Config>() -> (T::AccountId, T::AssetId) {
    let owner: T::AccountId = whitelisted_caller();
    let asset = T::BenchmarkHelper::funded_asset(&owner, FUNDS.into()).unwrap();
    Pallet::<T>::install(
      RawOrigin::Signed(owner.clone()).into(),
      BoundedVec::default(),
      BoundedVec::default(),
      BoundedVec::default(),
    )
    .unwrap();
    (owner, asset)
  }

  fn seed_configs<T: Config>(owner: &T::AccountId, asset: T::AssetId, n: u32) -> Vec<ConfigId> {
    (0..n)
      .map(|i| {
        let agent: T::AccountId = account("agent", i, 0);
        Pallet::<T>::do_configure(owner, agent, asset, policy::<T>()).unwrap()
      })
      .collect()
  }

  #[benchmark]
  fn install(n: Linear<0, { T::MaxSeedConfigs::get().min(T::MaxConfigsPerAccount::get()) }>) {
    let owner: T::AccountId = whitelisted_caller();
    let asset = T::BenchmarkHelper::funded_asset(&owner, FUNDS.into()).unwrap();
    let agents: Vec<T::AccountId> = (0..n).map(|i| account("agent", i, 0)).collect();
    let assets: Vec<T::AssetId> = (0..n).map(|_| asset).collect();
    let policies: Vec<TopUpPolicyOf<T>> = (0..n).map(|_| policy::<T>()).collect();

    #[extrinsic_call]
    _(
      RawOrigin::Signed(owner.clone()),
      BoundedVec::try_from(agents).unwrap(),
      BoundedVec::try_from(assets).unwrap(),
      BoundedVec::try_from(policies).unwrap(),
    );

    assert!(Installed::<T>::get(&owner));
    assert_eq!(ConfigCount::<T>::get(&owner), n);
  }

  #[benchmark]
  fn uninstall(n: Linear<0, { T::MaxConfigsPerAccount::get() }>) {
    let (owner, asset) = installed_owner::<T>();
    seed_configs::<T>(&owner, asset, n);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner.clone()));

    assert!(!Installed::<T>::get(&owner));
    assert_eq!(AccountConfigs::<T>::iter_key_prefix(&owner).count(), 0);
  }

  #[benchmark]
  fn configure_top_up() {
    let (owner, asset) = installed_owner::<T>();
    let agent: T::AccountId = account("agent", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner.clone()), agent.clone(), asset, policy::<T>());

    assert!(Pallet::<T>::top_up_by_keys(&owner, &agent, asset).is_some());
  }

  #[benchmark]
  fn update_top_up() {
    let (owner, asset) = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, asset, 1)[0];
    let mut updated = policy::<T>();
    updated.daily_limit = 200u32.into();

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), config_id, updated);

    assert_eq!(Policies::<T>::get(config_id), Some(updated));
  }

  #[benchmark]
  fn set_top_up_enabled() {
    let (owner, asset) = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, asset, 1)[0];

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), config_id, false);

    assert_eq!(Policies::<T>::get(config_id).map(|p| p.enabled), Some(false));
  }

  #[benchmark]
  fn trigger_top_up() {
    let (owner, asset) = installed_owner::<T>();
    let config_id = seed_configs::<T>(&owner, asset, 1)[0];
    let keeper: T::AccountId = account("keeper", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(keeper), owner, config_id);

    assert!(States::<T>::get(config_id).is_some_and(|s| s.last_top_up_day > 0));
  }

  #[benchmark]
  fn trigger_all_top_ups(n: Linear<1, { T::MaxConfigsPerAccount::get() }>) {
    let (owner, asset) = installed_owner::<T>();
    let config_ids = seed_configs::<T>(&owner, asset, n);
    let keeper: T::AccountId = account("keeper", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(keeper), owner);

    for config_id in config_ids {
      assert!(States::<T>::get(config_id).is_some_and(|s| s.last_top_up_day > 0));
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
