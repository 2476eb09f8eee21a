//! Core library for the tether remote-control utility.
//!
//! One operator endpoint drives one listener endpoint over a single reliable
//! byte stream. The operator forwards command lines; the listener changes
//! its working directory, transfers files in either direction, deletes
//! files, or runs the line through the platform shell and returns the
//! captured output. Commands resolve strictly one at a time — a multi-chunk
//! transfer completes before the next command is read.
//!
//! The wire format lives in [`tether_proto`]; this crate provides the
//! [`transfer`] engine, the [`exec`] bridge, the listener-side [`Session`],
//! and the operator-side [`Client`].

mod client;
mod error;
pub mod exec;
mod session;
pub mod transfer;

pub use client::{Action, Client};
pub use error::{Error, Result};
pub use session::{Session, SessionEnd};
