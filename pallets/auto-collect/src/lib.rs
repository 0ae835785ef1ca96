//! Auto Collect Pallet
//!
//! A service account pre-authorizes a once-a-day sweep of its balance into a target
//! account. Each configuration names an asset and a policy: the target, the balance
//! that must be reached before anything moves, and the balance always left behind.
//!
//! Triggering is permissionless. Every evaluation that does not end in a transfer is
//! reported through a `CollectionSkipped` event carrying the numbers behind the decision,
//! so keepers can tell a quiet account from a misconfigured one.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod types;
pub use types::{CollectPolicy, CollectState};

pub mod validator;
pub use validator::{CollectBlock, CollectCheck, collectable_amount, evaluate_collection};

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub(crate) const LOG_TARGET: &str = "runtime::auto-collect";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId, Balance> {
  /// Returns the `index`-th distinct existing asset, with `owner` holding at least `amount`.
  fn funded_asset(
    owner: &AccountId,
    index: u32,
    amount: Balance,
  ) -> Result<AssetId, polkadot_sdk::sp_runtime::DispatchError>;
}

#[frame::pallet]
pub mod pallet {
  use super::{CollectBlock, CollectCheck, CollectPolicy, CollectState, LOG_TARGET, WeightInfo};
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::frame_support::{
    storage::with_storage_layer,
    traits::{EnsureOrigin, UnixTime},
  };
  use primitives::{
    AssetOps, COLLECT_TAG, CalendarDate, ConfigId, TransferExecutor, TransferReturnError,
    derive_config_id, interpret_transfer_return, is_null_account,
  };

  pub type CollectPolicyOf<T> =
    CollectPolicy<<T as frame_system::Config>::AccountId, <T as Config>::Balance>;
  pub type CollectStateOf<T> = CollectState<<T as Config>::AssetId>;
  pub type CollectCheckOf<T> = CollectCheck<<T as Config>::Balance>;

  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    type AssetId: Parameter + Member + Copy + MaybeSerializeDeserialize + MaxEncodedLen;

    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaybeSerializeDeserialize
      + MaxEncodedLen;

    /// Asset existence and balance queries
    type AssetOps: AssetOps<Self::AccountId, Self::AssetId, Self::Balance>;

    /// Host primitive that moves funds out of the service account
    type TransferExecutor: TransferExecutor<Self::AccountId, Self::AssetId, Self::Balance>;

    /// Wall clock used for calendar bucketing
    type UnixTime: UnixTime;

    /// Origin allowed to pause and resume all triggers
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Upper bound on configurations per service account, and so on one batch trigger
    #[pallet::constant]
    type MaxConfigsPerAccount: Get<u32>;

    /// Upper bound on configurations seeded by `install`
    #[pallet::constant]
    type MaxSeedConfigs: Get<u32>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId, Self::AssetId, Self::Balance>;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn is_installed)]
  pub type Installed<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, bool, ValueQuery>;

  #[pallet::storage]
  pub type Policies<T: Config> =
    StorageMap<_, Blake2_128Concat, ConfigId, CollectPolicyOf<T>, OptionQuery>;

  /// Absence means the configuration does not exist.
  #[pallet::storage]
  pub type States<T: Config> =
    StorageMap<_, Blake2_128Concat, ConfigId, CollectStateOf<T>, OptionQuery>;

  #[pallet::storage]
  pub type AccountConfigs<T: Config> =
    StorageDoubleMap<_, Blake2_128Concat, T::AccountId, Blake2_128Concat, ConfigId, (), OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn config_count)]
  pub type ConfigCount<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, u32, ValueQuery>;

  #[pallet::storage]
  pub type TriggerLock<T> = StorageValue<_, bool, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn triggers_paused)]
  pub type TriggersPaused<T> = StorageValue<_, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    Installed {
      owner: T::AccountId,
      configs: u32,
    },
    Uninstalled {
      owner: T::AccountId,
      configs: u32,
    },
    CollectionConfigured {
      config_id: ConfigId,
      owner: T::AccountId,
      asset: T::AssetId,
      policy: CollectPolicyOf<T>,
    },
    CollectionEnabled {
      config_id: ConfigId,
      owner: T::AccountId,
    },
    CollectionDisabled {
      config_id: ConfigId,
      owner: T::AccountId,
    },
    Collected {
      config_id: ConfigId,
      owner: T::AccountId,
      target: T::AccountId,
      asset: T::AssetId,
      amount: T::Balance,
    },
    /// Evaluated without moving funds, with the inputs of the decision.
    CollectionSkipped {
      config_id: ConfigId,
      owner: T::AccountId,
      reason: CollectBlock,
      balance: T::Balance,
      threshold: T::Balance,
      minimum_remaining: T::Balance,
      would_be_amount: T::Balance,
    },
    /// The transfer failed. Bookkeeping is unchanged.
    CollectionFailed {
      config_id: ConfigId,
      owner: T::AccountId,
      target: T::AccountId,
      error: DispatchError,
    },
    TriggersPausedSet {
      paused: bool,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    NotInitialized,
    AlreadyInitialized,
    ConfigNotFound,
    /// The configuration is not in the account's index.
    Unauthorized,
    /// The target is the null account.
    InvalidTarget,
    InvalidAsset,
    /// Seed sequences of different lengths.
    InvalidSeedArrays,
    TooManyConfigs,
    /// A trigger is already running.
    Reentrancy,
    TriggersPaused,
    ClockOutOfRange,
    TransferReturnedFalse,
    MalformedTransferReturn,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Installs the caller, optionally seeding configurations from parallel sequences.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::install(policies.len() as u32))]
    pub fn install(
      origin: OriginFor<T>,
      assets: BoundedVec<T::AssetId, T::MaxSeedConfigs>,
      policies: BoundedVec<CollectPolicyOf<T>, T::MaxSeedConfigs>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      ensure!(
        !Installed::<T>::get(&owner),
        Error::<T>::AlreadyInitialized
      );
      ensure!(
        assets.len() == policies.len(),
        Error::<T>::InvalidSeedArrays
      );
      Installed::<T>::insert(&owner, true);
      for (asset, policy) in assets.into_iter().zip(policies) {
        Self::do_configure(&owner, asset, policy)?;
      }
      Self::deposit_event(Event::Installed {
        configs: ConfigCount::<T>::get(&owner),
        owner,
      });
      Ok(())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::uninstall(T::MaxConfigsPerAccount::get()))]
    pub fn uninstall(origin: OriginFor<T>) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::ensure_installed(&owner)?;
      let config_ids: Vec<ConfigId> = AccountConfigs::<T>::iter_key_prefix(&owner).collect();
      for config_id in config_ids.iter() {
        Policies::<T>::remove(config_id);
        States::<T>::remove(config_id);
        AccountConfigs::<T>::remove(&owner, config_id);
      }
      ConfigCount::<T>::remove(&owner);
      Installed::<T>::remove(&owner);
      Self::deposit_event(Event::Uninstalled {
        owner,
        configs: config_ids.len() as u32,
      });
      Ok(())
    }

    /// Creates the configuration for `(caller, asset)` or replaces its policy.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::configure_collection())]
    pub fn configure_collection(
      origin: OriginFor<T>,
      asset: T::AssetId,
      policy: CollectPolicyOf<T>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::do_configure(&owner, asset, policy)?;
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::update_collection())]
    pub fn update_collection(
      origin: OriginFor<T>,
      config_id: ConfigId,
      policy: CollectPolicyOf<T>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::ensure_installed(&owner)?;
      Self::validate_policy(&policy)?;
      let state = Self::ensure_owned(&owner, &config_id)?;
      Self::apply_policy(&owner, config_id, &state, policy);
      Ok(())
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::set_collection_enabled())]
    pub fn set_collection_enabled(
      origin: OriginFor<T>,
      config_id: ConfigId,
      enabled: bool,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::ensure_installed(&owner)?;
      Self::ensure_owned(&owner, &config_id)?;
      let mut policy = Policies::<T>::get(config_id).ok_or(Error::<T>::ConfigNotFound)?;
      if policy.enabled == enabled {
        return Ok(());
      }
      policy.enabled = enabled;
      Policies::<T>::insert(config_id, policy);
      Self::deposit_enabled_event(config_id, owner, enabled);
      Ok(())
    }

    /// Runs one configuration of `owner`. Callable by anyone.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::trigger_collection())]
    pub fn trigger_collection(
      origin: OriginFor<T>,
      owner: T::AccountId,
      config_id: ConfigId,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(!TriggersPaused::<T>::get(), Error::<T>::TriggersPaused);
      Self::with_trigger_lock(|| {
        Self::ensure_installed(&owner)?;
        let state = Self::ensure_owned(&owner, &config_id)?;
        let date = Self::current_date()?;
        Self::process_collection(&owner, config_id, state, &date);
        Ok(())
      })
    }

    /// Runs every configuration of `owner`. Callable by anyone.
    ///
    /// Item outcomes never fail the call; they are reported through events.
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::trigger_all_collections(T::MaxConfigsPerAccount::get()))]
    pub fn trigger_all_collections(origin: OriginFor<T>, owner: T::AccountId) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(!TriggersPaused::<T>::get(), Error::<T>::TriggersPaused);
      Self::with_trigger_lock(|| {
        Self::ensure_installed(&owner)?;
        let date = Self::current_date()?;
        let config_ids: Vec<ConfigId> = AccountConfigs::<T>::iter_key_prefix(&owner).collect();
        for config_id in config_ids {
          if let Some(state) = States::<T>::get(config_id) {
            Self::process_collection(&owner, config_id, state, &date);
          }
        }
        Ok(())
      })
    }

    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::set_triggers_paused())]
    pub fn set_triggers_paused(origin: OriginFor<T>, paused: bool) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      TriggersPaused::<T>::put(paused);
      Self::deposit_event(Event::TriggersPausedSet { paused });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn collect_config_id(owner: &T::AccountId, asset: T::AssetId) -> ConfigId {
      derive_config_id(COLLECT_TAG, &(owner, asset))
    }

    pub fn collection_of(config_id: &ConfigId) -> Option<(CollectPolicyOf<T>, CollectStateOf<T>)> {
      Some((Policies::<T>::get(config_id)?, States::<T>::get(config_id)?))
    }

    pub fn collection_by_keys(
      owner: &T::AccountId,
      asset: T::AssetId,
    ) -> Option<(CollectPolicyOf<T>, CollectStateOf<T>)> {
      Self::collection_of(&Self::collect_config_id(owner, asset))
    }

    pub fn collections_of(
      owner: &T::AccountId,
    ) -> Vec<(ConfigId, CollectPolicyOf<T>, CollectStateOf<T>)> {
      AccountConfigs::<T>::iter_key_prefix(owner)
        .filter_map(|config_id| {
          let (policy, state) = Self::collection_of(&config_id)?;
          Some((config_id, policy, state))
        })
        .collect()
    }

    /// Dry run of a trigger at the current time. Does not write anything.
    pub fn check_collection(
      owner: &T::AccountId,
      config_id: &ConfigId,
    ) -> Result<CollectCheckOf<T>, DispatchError> {
      Self::ensure_installed(owner)?;
      let state = Self::ensure_owned(owner, config_id)?;
      let policy = Policies::<T>::get(config_id).ok_or(Error::<T>::ConfigNotFound)?;
      let date = Self::current_date()?;
      let balance = T::AssetOps::balance(owner, state.asset);
      Ok(crate::evaluate_collection(&policy, &state, balance, &date))
    }

    fn ensure_installed(owner: &T::AccountId) -> DispatchResult {
      ensure!(Installed::<T>::get(owner), Error::<T>::NotInitialized);
      Ok(())
    }

    fn ensure_owned(
      owner: &T::AccountId,
      config_id: &ConfigId,
    ) -> Result<CollectStateOf<T>, DispatchError> {
      let state = States::<T>::get(config_id).ok_or(Error::<T>::ConfigNotFound)?;
      if !AccountConfigs::<T>::contains_key(owner, config_id) {
        log::warn!(
          target: LOG_TARGET,
          "config {:?} is not owned by {:?}",
          config_id,
          owner,
        );
        return Err(Error::<T>::Unauthorized.into());
      }
      Ok(state)
    }

    /// Zero threshold and zero floor are both meaningful, so only the target is checked.
    fn validate_policy(policy: &CollectPolicyOf<T>) -> DispatchResult {
      ensure!(!is_null_account(&policy.target), Error::<T>::InvalidTarget);
      Ok(())
    }

    pub(crate) fn do_configure(
      owner: &T::AccountId,
      asset: T::AssetId,
      policy: CollectPolicyOf<T>,
    ) -> Result<ConfigId, DispatchError> {
      Self::ensure_installed(owner)?;
      Self::validate_policy(&policy)?;
      ensure!(T::AssetOps::asset_exists(asset), Error::<T>::InvalidAsset);
      let config_id = Self::collect_config_id(owner, asset);
      let state = match States::<T>::get(config_id) {
        Some(state) => state,
        None => {
          let count = ConfigCount::<T>::get(owner);
          ensure!(
            count < T::MaxConfigsPerAccount::get(),
            Error::<T>::TooManyConfigs
          );
          let state = CollectState::new(asset);
          States::<T>::insert(config_id, &state);
          AccountConfigs::<T>::insert(owner, config_id, ());
          ConfigCount::<T>::insert(owner, count.saturating_add(1));
          state
        }
      };
      Self::apply_policy(owner, config_id, &state, policy);
      Ok(config_id)
    }

    fn apply_policy(
      owner: &T::AccountId,
      config_id: ConfigId,
      state: &CollectStateOf<T>,
      policy: CollectPolicyOf<T>,
    ) {
      let was_enabled = Policies::<T>::get(config_id).is_some_and(|p| p.enabled);
      let enabled = policy.enabled;
      Policies::<T>::insert(config_id, &policy);
      Self::deposit_event(Event::CollectionConfigured {
        config_id,
        owner: owner.clone(),
        asset: state.asset,
        policy,
      });
      if enabled != was_enabled {
        Self::deposit_enabled_event(config_id, owner.clone(), enabled);
      }
    }

    fn deposit_enabled_event(config_id: ConfigId, owner: T::AccountId, enabled: bool) {
      if enabled {
        Self::deposit_event(Event::CollectionEnabled { config_id, owner });
      } else {
        Self::deposit_event(Event::CollectionDisabled { config_id, owner });
      }
    }

    fn with_trigger_lock<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
      ensure!(!TriggerLock::<T>::get(), Error::<T>::Reentrancy);
      TriggerLock::<T>::put(true);
      let result = f();
      TriggerLock::<T>::kill();
      result
    }

    fn current_date() -> Result<CalendarDate, DispatchError> {
      CalendarDate::from_unix_secs(T::UnixTime::now().as_secs())
        .ok_or_else(|| Error::<T>::ClockOutOfRange.into())
    }

    fn process_collection(
      owner: &T::AccountId,
      config_id: ConfigId,
      mut state: CollectStateOf<T>,
      date: &CalendarDate,
    ) {
      let Some(policy) = Policies::<T>::get(config_id) else {
        return;
      };
      let balance = T::AssetOps::balance(owner, state.asset);
      match crate::evaluate_collection(&policy, &state, balance, date) {
        CollectCheck::Ready { amount, day } => {
          match Self::isolated_transfer(owner, state.asset, &policy.target, amount) {
            Ok(()) => {
              state.record_collection(day);
              States::<T>::insert(config_id, &state);
              Self::deposit_event(Event::Collected {
                config_id,
                owner: owner.clone(),
                target: policy.target,
                asset: state.asset,
                amount,
              });
            }
            Err(error) => {
              log::warn!(
                target: LOG_TARGET,
                "collection {:?} of {:?} failed: {:?}",
                config_id,
                owner,
                error,
              );
              Self::deposit_event(Event::CollectionFailed {
                config_id,
                owner: owner.clone(),
                target: policy.target,
                error,
              });
            }
          }
        }
        CollectCheck::Blocked(reason) => {
          log::debug!(target: LOG_TARGET, "collection {:?} skipped: {}", config_id, reason.as_str());
          Self::deposit_event(Event::CollectionSkipped {
            config_id,
            owner: owner.clone(),
            reason,
            balance,
            threshold: policy.threshold,
            minimum_remaining: policy.minimum_remaining,
            would_be_amount: crate::collectable_amount(balance, policy.minimum_remaining),
          });
        }
      }
    }

    /// Moves `amount` in a nested storage layer; nothing it wrote survives an `Err`.
    fn isolated_transfer(
      owner: &T::AccountId,
      asset: T::AssetId,
      target: &T::AccountId,
      amount: T::Balance,
    ) -> DispatchResult {
      with_storage_layer(|| -> DispatchResult {
        let data = T::TransferExecutor::execute_transfer(owner, asset, target, amount)?;
        interpret_transfer_return(&data).map_err(|e| match e {
          TransferReturnError::ReturnedFalse => Error::<T>::TransferReturnedFalse.into(),
          TransferReturnError::Malformed => Error::<T>::MalformedTransferReturn.into(),
        })
      })
    }
  }
}
