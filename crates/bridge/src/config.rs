// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{env, path::PathBuf};

use procmetrics_abi::LIBRARY_NAME;

use crate::{
	error::LoadError,
	loader::{Os, resolve_library_path},
};

/// Default bound on a single length-prefixed payload (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
	/// Directory holding the native library; relative paths are resolved
	/// against the directory of the running executable
	pub library_dir: PathBuf,
	/// Library base name without platform prefix or extension
	pub library_name: String,
	/// Largest payload length accepted from a length-prefixed buffer
	pub max_payload_len: usize,
	/// Maximum number of deferred calls running at once
	pub max_in_flight: usize,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			library_dir: PathBuf::from("target/release"),
			library_name: LIBRARY_NAME.to_string(),
			max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
			max_in_flight: num_cpus::get().max(1),
		}
	}
}

impl BridgeConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.library_dir = dir.into();
		self
	}

	pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
		self.library_name = name.into();
		self
	}

	pub fn with_max_payload_len(mut self, len: usize) -> Self {
		self.max_payload_len = len;
		self
	}

	pub fn with_max_in_flight(mut self, max: usize) -> Self {
		self.max_in_flight = max.max(1);
		self
	}

	/// Platform-specific path of the native library for the current system
	pub fn library_path(&self) -> Result<String, LoadError> {
		let dir = if self.library_dir.is_absolute() {
			self.library_dir.clone()
		} else {
			let exe = env::current_exe().map_err(LoadError::CurrentExe)?;
			match exe.parent() {
				Some(parent) => parent.join(&self.library_dir),
				None => self.library_dir.clone(),
			}
		};

		Ok(resolve_library_path(Os::current()?, &dir.to_string_lossy(), &self.library_name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = BridgeConfig::default();
		assert_eq!(config.library_name, "metrics");
		assert_eq!(config.max_payload_len, DEFAULT_MAX_PAYLOAD_LEN);
		assert!(config.max_in_flight >= 1);
	}

	#[test]
	fn test_builder() {
		let config = BridgeConfig::new()
			.with_library_dir("/opt/procmetrics/lib")
			.with_library_name("telemetry")
			.with_max_payload_len(64)
			.with_max_in_flight(0);

		assert_eq!(config.max_payload_len, 64);
		assert_eq!(config.max_in_flight, 1);

		#[cfg(target_os = "linux")]
		assert_eq!(config.library_path().unwrap(), "/opt/procmetrics/lib/libtelemetry.so");
	}
}
