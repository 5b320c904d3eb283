//! Turn-based monster battles.
//!
//! The battle core ([`battle`], [`fighter`], [`unit`], [`dialog`]) is plain
//! state driven by explicit calls and a continuation queue. The rest wires
//! it into a tui-dispatch application: [`state`], [`action`], [`effect`] and
//! [`reducer`] hold the app shell, [`ui`] renders it with ratatui.

pub mod action;
pub mod audio;
pub mod battle;
pub mod config;
pub mod dialog;
pub mod effect;
pub mod fighter;
pub mod locale;
pub mod reducer;
pub mod rng;
pub mod roster;
pub mod state;
pub mod ui;
pub mod unit;
