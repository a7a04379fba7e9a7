// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt;

use serde::Deserialize;

/// Resource usage snapshot of one process
///
/// A process the native side cannot find is reported with every field zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ProcessInfo {
	/// Percentage of one core
	pub cpu_usage: f32,
	/// Seconds since the epoch
	pub start_time: u64,
	/// Seconds
	pub run_time: u64,
	/// Bytes
	pub virtual_memory: u64,
	/// Bytes
	pub memory: u64,
}

/// CPU time split of one process, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ProcessTime {
	pub user_time: u64,
	pub system_time: u64,
}

/// Outcome of a certificate lookup
///
/// `error` is non-empty exactly when the lookup failed; `certificate` and
/// `public_key` are then empty. This is ordinary data and the bridge never
/// turns it into an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CertDetails {
	/// PEM encoded peer certificate, sent under the key `certificat`
	#[serde(rename = "certificat", alias = "certificate")]
	pub certificate: String,
	/// PEM encoded public key of the certificate
	pub public_key: String,
	pub error: String,
}

impl CertDetails {
	pub fn is_err(&self) -> bool {
		!self.error.is_empty()
	}
}

/// Verbatim text returned by `verify_signature`
///
/// The native side answers `"OK"`, `"NOK"` or an error message. The text is not
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationResult(pub String);

impl VerificationResult {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for VerificationResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl PartialEq<str> for VerificationResult {
	fn eq(&self, other: &str) -> bool {
		self.0 == other
	}
}

impl PartialEq<&str> for VerificationResult {
	fn eq(&self, other: &&str) -> bool {
		self.0 == *other
	}
}
