//! # CLI Module
//!
//! Command-line entry points of spotrip. The binary in `main.rs` only parses
//! arguments and hands over to the functions re-exported here.
//!
//! ## Run Order
//!
//! ```text
//! settings check ─▶ credentials ─▶ resolve playlist ─▶ download folder
//!                                                          │
//!                           summary ◀── process tracks ◀───┘
//! ```
//!
//! Everything before the first download is fatal: the [`crate::error!`] macro
//! prints the problem and exits with status 1. Once tracks are being processed
//! nothing stops the run; failures are collected and decide the exit status.
//!
//! ## Exit Status
//!
//! - `0` - every track was downloaded (possibly degraded), or the playlist is empty
//! - `1` - fatal error before processing
//! - `2` - at least one track failed

mod download;

pub use download::download;
