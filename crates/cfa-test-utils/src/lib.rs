//! Testing utilities for the CFA workspace
//!
//! Shared fixtures, proptest strategies and a scripted service double.

#![allow(missing_docs)]

pub mod fixtures;
pub mod scripted;
pub mod strategies;

pub use scripted::ScriptedApi;
pub use strategies::{constraint_strategy, goal_strategy, state_strategy};
