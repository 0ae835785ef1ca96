#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn install(n: u32) -> Weight;
  fn uninstall(n: u32) -> Weight;
  fn configure_collection() -> Weight;
  fn update_collection() -> Weight;
  fn set_collection_enabled() -> Weight;
  fn trigger_collection() -> Weight;
  fn trigger_all_collections(n: u32) -> Weight;
  fn set_triggers_paused() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn install(n: u32) -> Weight {
    let n = u64::from(n);
    Weight::from_parts(18_000_000, 1200)
      .saturating_add(Weight::from_parts(22_000_000, 900).saturating_mul(n))
      .saturating_add(T::DbWeight::get().reads(1u64.saturating_add(n.saturating_mul(4))))
      .saturating_add(T::DbWeight::get().writes(1u64.saturating_add(n.saturating_mul(4))))
  }

  fn uninstall(n: u32) -> Weight {
    let n = u64::from(n);
    Weight::from_parts(15_000_000, 1200)
      .saturating_add(Weight::from_parts(6_000_000, 600).saturating_mul(n))
      .saturating_add(T::DbWeight::get().reads(1u64.saturating_add(n)))
      .saturating_add(T::DbWeight::get().writes(2u64.saturating_add(n.saturating_mul(3))))
  }

  fn configure_collection() -> Weight {
    Weight::from_parts(23_000_000, 2200)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn update_collection() -> Weight {
    Weight::from_parts(18_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn set_collection_enabled() -> Weight {
    Weight::from_parts(15_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn trigger_collection() -> Weight {
    Weight::from_parts(42_000_000, 3400)
      .saturating_add(T::DbWeight::get().reads(9))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn trigger_all_collections(n: u32) -> Weight {
    let n = u64::from(n);
    Weight::from_parts(20_000_000, 1200)
      .saturating_add(Weight::from_parts(38_000_000, 3000).saturating_mul(n))
      .saturating_add(T::DbWeight::get().reads(3u64.saturating_add(n.saturating_mul(7))))
      .saturating_add(T::DbWeight::get().writes(2u64.saturating_add(n.saturating_mul(5))))
  }

  fn set_triggers_paused() -> Weight {
    Weight::from_parts(8_000_000, 600)
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn install(n: u32) -> Weight {
    Weight::from_parts(18_000_000u64.saturating_add(22_000_000u64.saturating_mul(u64::from(n))), 1200)
  }
  fn uninstall(n: u32) -> Weight {
    Weight::from_parts(15_000_000u64.saturating_add(6_000_000u64.saturating_mul(u64::from(n))), 1200)
  }
  fn configure_collection() -> Weight { Weight::from_parts(23_000_000, 2200) }
  fn update_collection() -> Weight { Weight::from_parts(18_000_000, 1800) }
  fn set_collection_enabled() -> Weight { Weight::from_parts(15_000_000, 1800) }
  fn trigger_collection() -> Weight { Weight::from_parts(42_000_000, 3400) }
  fn trigger_all_collections(n: u32) -> Weight {
    Weight::from_parts(20_000_000u64.saturating_add(38_000_000u64.saturating_mul(u64::from(n))), 1200)
  }
  fn set_triggers_paused() -> Weight { Weight::from_parts(8_000_000, 600) }
}
