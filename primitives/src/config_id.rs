//! Deterministic configuration identity
//!
//! A configuration id is the BLAKE2-256 hash of the SCALE encoding of a module tag
//! followed by the natural key of the configuration. Ids are never stored as mutable
//! state: they are the storage keys themselves, so keepers and indexers can compute
//! them off-chain before a configuration exists.

use codec::Encode;
use polkadot_sdk::sp_crypto_hashing::blake2_256;

pub type ConfigId = [u8; 32];

/// Namespace of the push variant (main account tops up agents).
pub const TOP_UP_TAG: &[u8] = b"auto-top-up/v1";

/// Namespace of the pull variant (service account is swept into a target).
pub const COLLECT_TAG: &[u8] = b"auto-collect/v1";

pub fn derive_config_id<K: Encode>(tag: &[u8], key: &K) -> ConfigId {
  (tag, key).using_encoded(blake2_256)
}
