//! # ARW Core Library
//!
//! Host-agnostic substrate for equipment-driven effects in a ticking block
//! world. The gameplay rules live in `arw-bedrock`; this crate owns the
//! time-and-state machinery underneath them:
//!
//! - **Actor state** ([`ActorStateStore`]): cached equipment, curse timer,
//!   biome memo and cooldowns per active actor, dropped on departure.
//! - **Deferred actions** ([`DeferredActionScheduler`]): tick-count countdowns
//!   that resolve their target by identity when they fire.
//! - **Reversible mutations** ([`ReversibleMutationRegistry`]): temporary block
//!   conversions reverted by wall-clock expiry if the block is unchanged.
//! - **Host boundary** ([`Host`]): every world query and command, fallible and
//!   synchronous. [`sandbox::SandboxHost`] is an in-memory implementation.
//!
//! ## Execution model
//!
//! Single-threaded and cooperative: the host drives one tick pass at a time
//! and delivers hit events between passes. Nothing here spawns threads or
//! blocks.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod biome;
pub mod config;
pub mod deferred;
pub mod effect;
pub mod error;
pub mod host;
pub mod items;
pub mod metrics;
pub mod mutation;
pub mod sandbox;
pub mod state;
pub mod types;

pub use config::ArwConfig;
pub use deferred::{DeferredAction, DeferredActionScheduler, DeferredPayload};
pub use error::{ArwError, HostError};
pub use host::Host;
pub use mutation::{MutationKey, ReversibleMutation, ReversibleMutationRegistry};
pub use state::{ActorState, ActorStateStore, EquipmentSampler};
pub use types::*;
