//! Strategy core — signal evaluation, stake ladder, mode control, and
//! session accounting.
//!
//! Everything in this module is a synchronous value type with explicit
//! transitions. The [`crate::engine::TradeEngine`] owns the instances and is
//! the only caller of the mutating methods; nothing here touches the broker
//! or the clock on its own.

pub mod ladder;
pub mod modes;
pub mod session;
pub mod signal;
