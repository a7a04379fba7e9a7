// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-process implementation of the native entry points
//!
//! Buffers are produced the way the real library produces them: a big-endian
//! `u32` length followed by a JSON or text payload, leaked to the caller.
//! A handful of reserved process ids and host names trigger the failure shapes
//! the bridge has to cope with.

use std::{slice, str, thread, time::Duration};

use procmetrics_abi::{
	CERT_ACCEPT_INVALID, LENGTH_PREFIX_SIZE, SymbolsFFI, UNAVAILABLE_CPU_USAGE, UNAVAILABLE_U64,
};
use serde_json::json;

/// Reports `cpu_usage 12.5, start_time 100, run_time 5, virtual_memory 2048,
/// memory 1024, user_time 3, system_time 2`
pub const KNOWN_PID: u32 = 4242;
/// No such process: sentinels for readings, zeroed records
pub const UNKNOWN_PID: u32 = 999_999;
/// Record entry points return a null pointer
pub const NULL_BUFFER_PID: u32 = 13;
/// Record entry points return truncated JSON
pub const MALFORMED_PID: u32 = 14;
/// Record entry points return JSON without their last field
pub const MISSING_FIELD_PID: u32 = 15;
/// Record entry points return bytes that are not UTF-8
pub const INVALID_UTF8_PID: u32 = 16;
/// Record entry points return a header declaring `u32::MAX` bytes and nothing else
pub const OVERSIZED_PID: u32 = 17;
/// Record entry points return an empty payload
pub const EMPTY_PID: u32 = 18;

pub const MAX_CHILDREN: i64 = 4096;

/// Host names under this prefix answer after [`SLOW_DELAY`]
pub const SLOW_HOST_PREFIX: &str = "slow.";
/// Messages under this prefix are verified after [`SLOW_DELAY`]
pub const SLOW_MESSAGE_PREFIX: &[u8] = b"slow:";
pub const SLOW_DELAY: Duration = Duration::from_millis(150);

/// Lookup of this host fails with a resolver error
pub const UNRESOLVABLE_HOST: &str = "missing.invalid";
/// Certificate of this host only passes with `CERT_ACCEPT_INVALID`
pub const SELF_SIGNED_HOST: &str = "self-signed.test";
pub const UNRESOLVABLE_ERROR: &str = "failed to lookup address information: Name or service not known";
pub const SELF_SIGNED_ERROR: &str = "certificate verify failed: self signed certificate";
pub const BAD_KEY_ERROR: &str = "error:1E08010C:DECODER routines::unsupported";

pub const PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEAprocmetricstestingkey0000000000000=\n-----END PUBLIC KEY-----\n";

pub fn symbols() -> SymbolsFFI {
	SymbolsFFI {
		get_cert,
		get_cpu_stime,
		get_cpu_usage,
		get_cpu_utime,
		get_max_children,
		get_memory,
		get_process_info,
		get_process_time,
		get_run_time,
		get_start_time,
		get_virtual_memory,
		verify_signature,
	}
}

/// Signature the fake verifier accepts for `message`
pub fn sign(message: &[u8]) -> Vec<u8> {
	message.iter().rev().map(|b| b ^ 0x5a).collect()
}

/// PEM certificate the fake returns for `host:port`
pub fn certificate_for(host: &str, port: u32) -> String {
	format!("-----BEGIN CERTIFICATE-----\n{host}:{port}\n-----END CERTIFICATE-----\n")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
	pub cpu_usage: f32,
	pub start_time: u64,
	pub run_time: u64,
	pub virtual_memory: u64,
	pub memory: u64,
	pub user_time: u64,
	pub system_time: u64,
}

/// What the fake reports for `pid`, `None` when the process does not exist
pub fn reading(pid: u32) -> Option<Reading> {
	match pid {
		UNKNOWN_PID => None,
		KNOWN_PID => Some(Reading {
			cpu_usage: 12.5,
			start_time: 100,
			run_time: 5,
			virtual_memory: 2048,
			memory: 1024,
			user_time: 3,
			system_time: 2,
		}),
		pid => {
			let pid = pid as u64;
			Some(Reading {
				cpu_usage: (pid % 100) as f32 + 0.5,
				start_time: 1_700_000_000 + pid,
				run_time: pid % 3600,
				virtual_memory: pid * 8192,
				memory: pid * 4096,
				user_time: pid * 3,
				system_time: pid * 2,
			})
		}
	}
}

fn leak_framed(payload: &[u8]) -> *const u8 {
	let mut region = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
	region.extend_from_slice(&(payload.len() as u32).to_be_bytes());
	region.extend_from_slice(payload);
	Box::leak(region.into_boxed_slice()).as_ptr()
}

fn leak_header_only(declared: u32) -> *const u8 {
	Box::leak(Box::new(declared.to_be_bytes())).as_ptr()
}

/// Failure shapes shared by the record entry points
fn special_record(pid: u32, truncated: &str, partial: String) -> Option<*const u8> {
	match pid {
		NULL_BUFFER_PID => Some(std::ptr::null()),
		MALFORMED_PID => Some(leak_framed(truncated.as_bytes())),
		MISSING_FIELD_PID => Some(leak_framed(partial.as_bytes())),
		INVALID_UTF8_PID => Some(leak_framed(&[0x7b, 0xff, 0xfe, 0x7d])),
		OVERSIZED_PID => Some(leak_header_only(u32::MAX)),
		EMPTY_PID => Some(leak_framed(&[])),
		_ => None,
	}
}

fn bytes<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
	if ptr.is_null() || len == 0 {
		return &[];
	}
	// SAFETY: the host passes a (pointer, length) pair describing a live buffer
	unsafe { slice::from_raw_parts(ptr, len) }
}

extern "C" fn get_max_children() -> i64 {
	MAX_CHILDREN
}

extern "C" fn get_cpu_usage(pid: u32) -> f32 {
	reading(pid).map_or(UNAVAILABLE_CPU_USAGE, |r| r.cpu_usage)
}

extern "C" fn get_memory(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.memory)
}

extern "C" fn get_virtual_memory(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.virtual_memory)
}

extern "C" fn get_run_time(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.run_time)
}

extern "C" fn get_start_time(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.start_time)
}

extern "C" fn get_cpu_utime(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.user_time)
}

extern "C" fn get_cpu_stime(pid: u32) -> u64 {
	reading(pid).map_or(UNAVAILABLE_U64, |r| r.system_time)
}

extern "C" fn get_process_info(pid: u32) -> *const u8 {
	let partial = json!({"cpu_usage": 1.0, "start_time": 1, "run_time": 1, "virtual_memory": 1}).to_string();
	if let Some(ptr) = special_record(pid, r#"{"cpu_usage":12.5,"start_ti"#, partial) {
		return ptr;
	}

	let r = reading(pid).unwrap_or(Reading {
		cpu_usage: 0.0,
		start_time: 0,
		run_time: 0,
		virtual_memory: 0,
		memory: 0,
		user_time: 0,
		system_time: 0,
	});
	let payload = json!({
		"cpu_usage": r.cpu_usage,
		"start_time": r.start_time,
		"run_time": r.run_time,
		"virtual_memory": r.virtual_memory,
		"memory": r.memory,
	});
	leak_framed(payload.to_string().as_bytes())
}

extern "C" fn get_process_time(pid: u32) -> *const u8 {
	let partial = json!({"user_time": 1}).to_string();
	if let Some(ptr) = special_record(pid, r#"{"user_time":"#, partial) {
		return ptr;
	}

	let (user_time, system_time) = reading(pid).map_or((0, 0), |r| (r.user_time, r.system_time));
	let payload = json!({
		"user_time": user_time,
		"system_time": system_time,
	});
	leak_framed(payload.to_string().as_bytes())
}

extern "C" fn get_cert(host: *const u8, host_len: usize, port: u32, flags: u8) -> *const u8 {
	let cert_error = |error: &str| {
		json!({
			"certificat": "",
			"public_key": "",
			"error": error,
		})
	};

	let payload = match str::from_utf8(bytes(host, host_len)) {
		Err(e) => cert_error(&e.to_string()),
		Ok(UNRESOLVABLE_HOST) => cert_error(UNRESOLVABLE_ERROR),
		Ok(SELF_SIGNED_HOST) if flags != CERT_ACCEPT_INVALID => cert_error(SELF_SIGNED_ERROR),
		Ok(host) => {
			if host.starts_with(SLOW_HOST_PREFIX) {
				thread::sleep(SLOW_DELAY);
			}
			json!({
				"certificat": certificate_for(host, port),
				"public_key": PUBLIC_KEY_PEM,
				"error": "",
			})
		}
	};

	leak_framed(payload.to_string().as_bytes())
}

extern "C" fn verify_signature(
	public_key_pem: *const u8,
	public_key_pem_len: usize,
	message: *const u8,
	message_len: usize,
	signature: *const u8,
	signature_len: usize,
) -> *const u8 {
	let pem = bytes(public_key_pem, public_key_pem_len);
	let message = bytes(message, message_len);
	let signature = bytes(signature, signature_len);

	if message.starts_with(SLOW_MESSAGE_PREFIX) {
		thread::sleep(SLOW_DELAY);
	}

	let outcome = if !pem.starts_with(b"-----BEGIN PUBLIC KEY-----") {
		BAD_KEY_ERROR
	} else if signature == sign(message).as_slice() {
		"OK"
	} else {
		"NOK"
	};

	leak_framed(outcome.as_bytes())
}
