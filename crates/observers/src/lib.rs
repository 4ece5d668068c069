//! Reusable observers for burnup depletion runs.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with the depletion scheduler's events and actions.
//!
//! # Modules
//!
//! - [`traits`] — Capability traits for generic observers
//!   ([`HasContext`], [`HasPower`], [`CanBreak`])
//! - [`log`] — [`LogObserver`], which reports progress through `tracing`
//! - [`notify`] — [`ChannelNotifier`], which forwards step boundaries to a
//!   coupled program over a channel
//! - [`recorder`] — [`Recorder`], which keeps a copy of every event
//! - [`limit`] — [`BurnupLimit`], which stops a history at a target burnup
//!
//! [`Observer`]: burnup_core::Observer
//! [`HasContext`]: traits::HasContext
//! [`HasPower`]: traits::HasPower
//! [`CanBreak`]: traits::CanBreak

pub mod limit;
pub mod log;
pub mod notify;
pub mod recorder;
pub mod traits;

pub use limit::BurnupLimit;
pub use log::LogObserver;
pub use notify::{ChannelNotifier, Notification};
pub use recorder::Recorder;
