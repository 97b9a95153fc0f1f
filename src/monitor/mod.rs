//! The health monitoring state machine.
//!
//! One tick: the [`ContainerInspector`] lists containers, the snapshot is
//! diffed against the previous one by [`classifier::classify`], each failure is
//! gated by the [`cooldown::CooldownLedger`], and failures that get through
//! have their logs saved by [`LogCapture`] before a notification is queued.

pub mod alert;
pub mod capture;
pub mod classifier;
pub mod cooldown;
pub mod health;
pub mod inspector;

pub use alert::AlertFormatter;
pub use capture::LogCapture;
pub use health::{HealthMonitor, MonitorSettings};
pub use inspector::ContainerInspector;
