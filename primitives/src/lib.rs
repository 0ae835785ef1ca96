#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod account;
pub mod adapters;
pub mod calendar;
pub mod config_id;
pub mod transfer;

pub use account::*;
pub use adapters::*;
pub use calendar::*;
pub use config_id::*;
pub use transfer::*;
