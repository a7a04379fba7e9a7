// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Host-side bridge to the procmetrics native library
//!
//! The native library exports a fixed set of C entry points (see
//! [`procmetrics_abi::CALL_TABLE`]) for process telemetry and certificate and
//! signature checks. This crate loads it, marshals arguments, dispatches calls
//! in their declared mode and maps the length-prefixed results into typed
//! records.
//!
//! ```no_run
//! # async fn run() -> procmetrics_bridge::Result<()> {
//! use procmetrics_bridge::{BridgeConfig, global};
//!
//! let bridge = global::init(&BridgeConfig::default())?;
//! let info = bridge.get_process_info(std::process::id())?;
//! let cert = bridge.get_cert("example.com", 443, false).await?;
//! if cert.is_err() {
//! 	eprintln!("lookup failed: {}", cert.error);
//! }
//! # let _ = info;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod loader;
pub mod mapper;
pub mod record;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use dispatch::{Arg, Deferred, Dispatcher, Invocation, NativeValue};
pub use error::{DecodeError, Error, FramingError, LoadError, MappingError, Result};
pub use loader::ForeignLibraryHandle;
pub use record::{CertDetails, ProcessInfo, ProcessTime, VerificationResult};
