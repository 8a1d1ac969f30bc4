//! Chat-bot interface for the Scuderia picker
//!
//! This crate turns normalized chat payloads into message templates:
//! - **Commands** (`commands`) - `/pick`, `/mypick`, `/leaderboard`, `/pickhelp`, menu selections
//! - **Blocks** (`blocks`) - Message builders for sections, select menus and context lines
//! - **Service** (`service`) - `PickerService`, backed by a `PickStore` and a `RosterSource`
//! - **Roster** (`roster`) - Static, OpenF1 (HTTP) and cached roster sources
//!
//! # Architecture
//!
//! ```text
//! Slash command / menu selection → CommandRouter → PickerService → PickStore
//!                                        ↓                ↓
//!                               MessageTemplate ←   RosterSource
//! ```
//!
//! The chat gateway transport is not part of this crate; it hands payloads to
//! `CommandRouter` and renders the returned `MessageTemplate`.

pub mod blocks;
pub mod commands;
pub mod roster;
pub mod service;

pub use blocks::{MessageTemplate, Visibility};
pub use commands::{CommandRouter, SelectionPayload, SlashCommandPayload};
pub use roster::{
    live_roster_source, CachedRosterSource, OpenF1RosterSource, RosterError, RosterSource,
    StaticRosterSource,
};
pub use service::PickerService;
