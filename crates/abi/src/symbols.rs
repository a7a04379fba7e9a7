// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Function pointer types for every native entry point
//!
//! Buffer results point at a native-owned region laid out as a big-endian `u32`
//! length followed by exactly that many bytes. The region is only guaranteed
//! to be readable until the next call into the library.

/// `get_cert(host, host_len, port, flags) -> buffer`
pub type GetCertFnFFI = extern "C" fn(host: *const u8, host_len: usize, port: u32, flags: u8) -> *const u8;

/// Per-process `u64` reading (`get_memory`, `get_run_time`, ...)
pub type PidU64FnFFI = extern "C" fn(pid: u32) -> u64;

/// `get_cpu_usage(pid) -> f32`
pub type PidF32FnFFI = extern "C" fn(pid: u32) -> f32;

/// Per-process length-prefixed JSON record (`get_process_info`, `get_process_time`)
pub type PidBufferFnFFI = extern "C" fn(pid: u32) -> *const u8;

/// `get_max_children() -> i64`
pub type MaxChildrenFnFFI = extern "C" fn() -> i64;

/// `verify_signature(pem, pem_len, message, message_len, signature, signature_len) -> buffer`
pub type VerifySignatureFnFFI = extern "C" fn(
	public_key_pem: *const u8,
	public_key_pem_len: usize,
	message: *const u8,
	message_len: usize,
	signature: *const u8,
	signature_len: usize,
) -> *const u8;

/// Resolved entry points of one native library
///
/// One field per row of [`CALL_TABLE`](crate::CALL_TABLE). All function pointers
/// must be valid (non-null) for as long as the library that exported them stays
/// loaded.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SymbolsFFI {
	pub get_cert: GetCertFnFFI,
	pub get_cpu_stime: PidU64FnFFI,
	pub get_cpu_usage: PidF32FnFFI,
	pub get_cpu_utime: PidU64FnFFI,
	pub get_max_children: MaxChildrenFnFFI,
	pub get_memory: PidU64FnFFI,
	pub get_process_info: PidBufferFnFFI,
	pub get_process_time: PidBufferFnFFI,
	pub get_run_time: PidU64FnFFI,
	pub get_start_time: PidU64FnFFI,
	pub get_virtual_memory: PidU64FnFFI,
	pub verify_signature: VerifySignatureFnFFI,
}
