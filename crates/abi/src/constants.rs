// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

/// Size of the big-endian `u32` length header preceding every returned buffer
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Returned by the numeric `u64` readings when the process does not exist
pub const UNAVAILABLE_U64: u64 = u64::MAX;

/// Returned by `get_cpu_usage` when the process does not exist
pub const UNAVAILABLE_CPU_USAGE: f32 = -1.0;

/// `get_cert` flag: reject certificates that fail validation
pub const CERT_STRICT: u8 = 0;

/// `get_cert` flag: accept invalid certificates and report them anyway
pub const CERT_ACCEPT_INVALID: u8 = 1;

/// Base name of the native library file (without platform prefix/suffix)
pub const LIBRARY_NAME: &str = "metrics";
