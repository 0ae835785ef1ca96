//! Auto Top-Up Pallet
//!
//! A main account pre-authorizes recurring top-ups of its agent accounts. Each
//! configuration names an agent and an asset and carries two limits: the balance the
//! agent is refilled to (at most once per calendar day) and the total that may be
//! spent on that agent per calendar month.
//!
//! Configuration is owner-only. Triggering is permissionless: any signed account may
//! run the top-ups of an installed owner, and the limits alone decide what moves.
//! Every transfer runs in its own storage layer, so a failing token never aborts a
//! batch and never leaves half-written bookkeeping behind.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod types;
pub use types::{TopUpPolicy, TopUpState};

pub mod validator;
pub use validator::{TopUpBlock, TopUpCheck, evaluate_top_up};

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub(crate) const LOG_TARGET: &str = "runtime::auto-top-up";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId, Balance> {
  /// Returns an existing asset of which `owner` holds at least `amount`.
  fn funded_asset(
    owner: &AccountId,
    amount: Balance,
  ) -> Result<AssetId, polkadot_sdk::sp_runtime::DispatchError>;
}

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, TopUpBlock, TopUpCheck, TopUpPolicy, TopUpState, WeightInfo};
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{
      storage::with_storage_layer,
      traits::{EnsureOrigin, UnixTime},
    },
    sp_runtime::traits::Zero,
  };
  use primitives::{
    AssetOps, CalendarDate, ConfigId, TOP_UP_TAG, TransferExecutor, TransferReturnError,
    derive_config_id, interpret_transfer_return, is_null_account,
  };

  pub type TopUpPolicyOf<T> = TopUpPolicy<<T as Config>::Balance>;
  pub type TopUpStateOf<T> = TopUpState<
    <T as frame_system::Config>::AccountId,
    <T as Config>::AssetId,
    <T as Config>::Balance,
  >;
  pub type TopUpCheckOf<T> = TopUpCheck<<T as Config>::Balance>;

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

    /// Host primitive that moves funds out of the main account
    type TransferExecutor: TransferExecutor<Self::AccountId, Self::AssetId, Self::Balance>;

    /// Wall clock used for calendar bucketing
    type UnixTime: UnixTime;

    /// Origin allowed to pause and resume all triggers
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Upper bound on configurations per main account, and so on one batch trigger
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
    StorageMap<_, Blake2_128Concat, ConfigId, TopUpPolicyOf<T>, OptionQuery>;

  /// Absence means the configuration does not exist.
  #[pallet::storage]
  pub type States<T: Config> =
    StorageMap<_, Blake2_128Concat, ConfigId, TopUpStateOf<T>, OptionQuery>;

  #[pallet::storage]
  pub type AccountConfigs<T: Config> =
    StorageDoubleMap<_, Blake2_128Concat, T::AccountId, Blake2_128Concat, ConfigId, (), OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn config_count)]
  pub type ConfigCount<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, u32, ValueQuery>;

  /// Held for the whole of a trigger call.
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
    /// Full policy snapshot after a create or update.
    TopUpConfigured {
      config_id: ConfigId,
      owner: T::AccountId,
      agent: T::AccountId,
      asset: T::AssetId,
      policy: TopUpPolicyOf<T>,
    },
    TopUpEnabled {
      config_id: ConfigId,
      owner: T::AccountId,
    },
    TopUpDisabled {
      config_id: ConfigId,
      owner: T::AccountId,
    },
    TopUpExecuted {
      config_id: ConfigId,
      owner: T::AccountId,
      agent: T::AccountId,
      asset: T::AssetId,
      amount: T::Balance,
    },
    /// The transfer failed, or the main account cannot cover the top-up.
    /// Bookkeeping is unchanged.
    TopUpFailed {
      config_id: ConfigId,
      owner: T::AccountId,
      agent: T::AccountId,
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
    /// Both limits must be non-zero.
    InvalidPolicy,
    ConfigNotFound,
    /// The configuration is not in the account's index.
    Unauthorized,
    /// The agent is the null account or the owner itself.
    InvalidAgent,
    InvalidAsset,
    /// Seed sequences of different lengths.
    InvalidSeedArrays,
    TooManyConfigs,
    /// A trigger is already running.
    Reentrancy,
    TriggersPaused,
    /// The host clock cannot be mapped to a calendar date.
    ClockOutOfRange,
    InsufficientMainBalance,
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
      agents: BoundedVec<T::AccountId, T::MaxSeedConfigs>,
      assets: BoundedVec<T::AssetId, T::MaxSeedConfigs>,
      policies: BoundedVec<TopUpPolicyOf<T>, T::MaxSeedConfigs>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      ensure!(
        !Installed::<T>::get(&owner),
        Error::<T>::AlreadyInitialized
      );
      ensure!(
        agents.len() == assets.len() && assets.len() == policies.len(),
        Error::<T>::InvalidSeedArrays
      );
      Installed::<T>::insert(&owner, true);
      for ((agent, asset), policy) in agents.into_iter().zip(assets).zip(policies) {
        Self::do_configure(&owner, agent, asset, policy)?;
      }
      Self::deposit_event(Event::Installed {
        configs: ConfigCount::<T>::get(&owner),
        owner,
      });
      Ok(())
    }

    /// Purges every configuration of the caller and clears the installed flag.
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

    /// Creates the configuration for `(caller, agent, asset)` or replaces its policy.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::configure_top_up())]
    pub fn configure_top_up(
      origin: OriginFor<T>,
      agent: T::AccountId,
      asset: T::AssetId,
      policy: TopUpPolicyOf<T>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::do_configure(&owner, agent, asset, policy)?;
      Ok(())
    }

    /// Replaces the policy of an existing configuration owned by the caller.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::update_top_up())]
    pub fn update_top_up(
      origin: OriginFor<T>,
      config_id: ConfigId,
      policy: TopUpPolicyOf<T>,
    ) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      Self::ensure_installed(&owner)?;
      Self::validate_policy(&policy)?;
      let state = Self::ensure_owned(&owner, &config_id)?;
      Self::apply_policy(&owner, config_id, &state, policy);
      Ok(())
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::set_top_up_enabled())]
    pub fn set_top_up_enabled(
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
    #[pallet::weight(T::WeightInfo::trigger_top_up())]
    pub fn trigger_top_up(
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
        Self::process_top_up(&owner, config_id, state, &date);
        Ok(())
      })
    }

    /// Runs every configuration of `owner`. Callable by anyone.
    ///
    /// Item outcomes never fail the call; they are reported through events.
    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::trigger_all_top_ups(T::MaxConfigsPerAccount::get()))]
    pub fn trigger_all_top_ups(origin: OriginFor<T>, owner: T::AccountId) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(!TriggersPaused::<T>::get(), Error::<T>::TriggersPaused);
      Self::with_trigger_lock(|| {
        Self::ensure_installed(&owner)?;
        let date = Self::current_date()?;
        let config_ids: Vec<ConfigId> = AccountConfigs::<T>::iter_key_prefix(&owner).collect();
        for config_id in config_ids {
          if let Some(state) = States::<T>::get(config_id) {
            Self::process_top_up(&owner, config_id, state, &date);
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
    pub fn top_up_config_id(owner: &T::AccountId, agent: &T::AccountId, asset: T::AssetId) -> ConfigId {
      derive_config_id(TOP_UP_TAG, &(owner, agent, asset))
    }

    pub fn top_up_of(config_id: &ConfigId) -> Option<(TopUpPolicyOf<T>, TopUpStateOf<T>)> {
      Some((Policies::<T>::get(config_id)?, States::<T>::get(config_id)?))
    }

    pub fn top_up_by_keys(
      owner: &T::AccountId,
      agent: &T::AccountId,
      asset: T::AssetId,
    ) -> Option<(TopUpPolicyOf<T>, TopUpStateOf<T>)> {
      Self::top_up_of(&Self::top_up_config_id(owner, agent, asset))
    }

    pub fn top_ups_of(owner: &T::AccountId) -> Vec<(ConfigId, TopUpPolicyOf<T>, TopUpStateOf<T>)> {
      AccountConfigs::<T>::iter_key_prefix(owner)
        .filter_map(|config_id| {
          let (policy, state) = Self::top_up_of(&config_id)?;
          Some((config_id, policy, state))
        })
        .collect()
    }

    /// Dry run of a trigger at the current time. Does not write anything.
    pub fn check_top_up(
      owner: &T::AccountId,
      config_id: &ConfigId,
    ) -> Result<TopUpCheckOf<T>, DispatchError> {
      Self::ensure_installed(owner)?;
      let state = Self::ensure_owned(owner, config_id)?;
      let policy = Policies::<T>::get(config_id).ok_or(Error::<T>::ConfigNotFound)?;
      let date = Self::current_date()?;
      Ok(Self::evaluate(owner, &policy, &state, &date))
    }

    fn ensure_installed(owner: &T::AccountId) -> DispatchResult {
      ensure!(Installed::<T>::get(owner), Error::<T>::NotInitialized);
      Ok(())
    }

    fn ensure_owned(owner: &T::AccountId, config_id: &ConfigId) -> Result<TopUpStateOf<T>, DispatchError> {
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

    fn validate_policy(policy: &TopUpPolicyOf<T>) -> DispatchResult {
      ensure!(
        !policy.daily_limit.is_zero() && !policy.monthly_limit.is_zero(),
        Error::<T>::InvalidPolicy
      );
      Ok(())
    }

    fn validate_counterparty(
      owner: &T::AccountId,
      agent: &T::AccountId,
      asset: T::AssetId,
    ) -> DispatchResult {
      ensure!(
        !is_null_account(agent) && agent != owner,
        Error::<T>::InvalidAgent
      );
      ensure!(T::AssetOps::asset_exists(asset), Error::<T>::InvalidAsset);
      Ok(())
    }

    pub(crate) fn do_configure(
      owner: &T::AccountId,
      agent: T::AccountId,
      asset: T::AssetId,
      policy: TopUpPolicyOf<T>,
    ) -> Result<ConfigId, DispatchError> {
      Self::ensure_installed(owner)?;
      Self::validate_counterparty(owner, &agent, asset)?;
      Self::validate_policy(&policy)?;
      let config_id = Self::top_up_config_id(owner, &agent, asset);
      let state = match States::<T>::get(config_id) {
        Some(state) => state,
        None => {
          let count = ConfigCount::<T>::get(owner);
          ensure!(
            count < T::MaxConfigsPerAccount::get(),
            Error::<T>::TooManyConfigs
          );
          let state = TopUpState::new(agent, asset);
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
      state: &TopUpStateOf<T>,
      policy: TopUpPolicyOf<T>,
    ) {
      let was_enabled = Policies::<T>::get(config_id).is_some_and(|p| p.enabled);
      Policies::<T>::insert(config_id, policy);
      Self::deposit_event(Event::TopUpConfigured {
        config_id,
        owner: owner.clone(),
        agent: state.agent.clone(),
        asset: state.asset,
        policy,
      });
      if policy.enabled != was_enabled {
        Self::deposit_enabled_event(config_id, owner.clone(), policy.enabled);
      }
    }

    fn deposit_enabled_event(config_id: ConfigId, owner: T::AccountId, enabled: bool) {
      if enabled {
        Self::deposit_event(Event::TopUpEnabled { config_id, owner });
      } else {
        Self::deposit_event(Event::TopUpDisabled { config_id, owner });
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

    fn evaluate(
      owner: &T::AccountId,
      policy: &TopUpPolicyOf<T>,
      state: &TopUpStateOf<T>,
      date: &CalendarDate,
    ) -> TopUpCheckOf<T> {
      let agent_balance = T::AssetOps::balance(&state.agent, state.asset);
      let main_balance = T::AssetOps::balance(owner, state.asset);
      crate::evaluate_top_up(policy, state, agent_balance, main_balance, date)
    }

    fn process_top_up(
      owner: &T::AccountId,
      config_id: ConfigId,
      mut state: TopUpStateOf<T>,
      date: &CalendarDate,
    ) {
      let Some(policy) = Policies::<T>::get(config_id) else {
        return;
      };
      match Self::evaluate(owner, &policy, &state, date) {
        TopUpCheck::Ready { amount, day, period } => {
          match Self::isolated_transfer(owner, state.asset, &state.agent, amount) {
            Ok(()) => {
              state.record_top_up(amount, day, period);
              States::<T>::insert(config_id, &state);
              Self::deposit_event(Event::TopUpExecuted {
                config_id,
                owner: owner.clone(),
                agent: state.agent,
                asset: state.asset,
                amount,
              });
            }
            Err(error) => {
              log::warn!(
                target: LOG_TARGET,
                "top-up {:?} of {:?} failed: {:?}",
                config_id,
                owner,
                error,
              );
              Self::deposit_event(Event::TopUpFailed {
                config_id,
                owner: owner.clone(),
                agent: state.agent,
                error,
              });
            }
          }
        }
        TopUpCheck::Blocked(TopUpBlock::InsufficientMainBalance) => {
          log::warn!(
            target: LOG_TARGET,
            "top-up {:?}: {} for {:?}",
            config_id,
            TopUpBlock::InsufficientMainBalance.as_str(),
            owner,
          );
          Self::deposit_event(Event::TopUpFailed {
            config_id,
            owner: owner.clone(),
            agent: state.agent,
            error: Error::<T>::InsufficientMainBalance.into(),
          });
        }
        TopUpCheck::Blocked(block) => {
          log::debug!(target: LOG_TARGET, "top-up {:?} skipped: {}", config_id, block.as_str());
        }
      }
    }

    /// Moves `amount` in a nested storage layer; nothing it wrote survives an `Err`.
    fn isolated_transfer(
      owner: &T::AccountId,
      asset: T::AssetId,
      agent: &T::AccountId,
      amount: T::Balance,
    ) -> DispatchResult {
      with_storage_layer(|| -> DispatchResult {
        let data = T::TransferExecutor::execute_transfer(owner, asset, agent, amount)?;
        interpret_transfer_return(&data).map_err(|e| match e {
          TransferReturnError::ReturnedFalse => Error::<T>::TransferReturnedFalse.into(),
          TransferReturnError::Malformed => Error::<T>::MalformedTransferReturn.into(),
        })
      })
    }
  }
}
