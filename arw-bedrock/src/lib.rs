//! # arw-bedrock: Bedrock Integration for ARW Relics
//!
//! This crate connects the host-agnostic `arw-core` state machines to a
//! ticking Bedrock world. It decides what each relic does; `arw-core` only
//! knows how to remember, schedule and revert.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │            Bedrock script host            │
//! │  ┌─────────────────────────────────────┐  │
//! │  │            arw-bedrock              │  │
//! │  │  hooks → events → rule              │  │
//! │  │            ├── effects (per tick)   │  │
//! │  │            └── combat  (per hit)    │  │
//! │  │                  │                  │  │
//! │  │                  ▼                  │  │
//! │  │    ┌─────────────────────────────┐  │  │
//! │  │    │          arw-core           │  │  │
//! │  │    └─────────────────────────────┘  │  │
//! │  └─────────────────────────────────────┘  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `rule`: `ArwRule` session state and the tick/hit/departure entry points
//! - `effects`: passive per-tick effects, the curse timer and magma walker
//! - `combat`: on-hit weapon and accessory effects
//! - `events`: host events the rule reacts to
//! - `hooks`: conversion from raw script payloads into events
//! - `adapter`: `SharedRule`, a lockable handle for script callbacks
//! - `logging`: tracing subscriber setup

pub mod adapter;
pub mod combat;
pub mod effects;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod rule;

pub use adapter::SharedRule;
pub use events::{HitEvent, HostEvent};
pub use rule::{ArwRule, TickReport, on_actor_departed, on_hit, on_tick, process_host_event};
