// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Native library resolution and loading

use std::{env, fmt};

use libloading::Library;
use procmetrics_abi::{EntryPoint, SymbolsFFI};
use tracing::{debug, error, instrument};

use crate::error::LoadError;

/// Operating systems the native library is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
	Darwin,
	Windows,
	Linux,
	FreeBsd,
	NetBsd,
	Aix,
	Solaris,
	Illumos,
}

impl Os {
	pub fn current() -> Result<Self, LoadError> {
		Self::from_name(env::consts::OS).ok_or_else(|| LoadError::UnsupportedPlatform {
			os: env::consts::OS.to_string(),
		})
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"darwin" | "macos" => Some(Os::Darwin),
			"windows" => Some(Os::Windows),
			"linux" => Some(Os::Linux),
			"freebsd" => Some(Os::FreeBsd),
			"netbsd" => Some(Os::NetBsd),
			"aix" => Some(Os::Aix),
			"solaris" => Some(Os::Solaris),
			"illumos" => Some(Os::Illumos),
			_ => None,
		}
	}

	pub fn library_file_name(self, name: &str) -> String {
		match self {
			Os::Darwin => format!("lib{name}.dylib"),
			Os::Windows => format!("{name}.dll"),
			_ => format!("lib{name}.so"),
		}
	}
}

/// Join `dir` and the platform file name of library `name`
///
/// On Windows every separator becomes a backslash. A URL-style directory with a
/// single leading `/` loses it, so `/C:/lib/` turns into `C:\lib\`; native
/// paths, UNC shares (`\\srv\share`) included, keep their prefix.
pub fn resolve_library_path(os: Os, dir: &str, name: &str) -> String {
	let url_style = dir.starts_with('/') && !dir.starts_with("//");
	let mut uri = dir.to_string();
	let terminated = uri.ends_with('/') || (os == Os::Windows && uri.ends_with('\\'));
	if !terminated {
		uri.push('/');
	}

	if os == Os::Windows {
		uri = uri.replace('/', "\\");
		if url_style {
			uri.remove(0);
		}
	}

	uri.push_str(&os.library_file_name(name));
	uri
}

/// The loaded native library and its resolved entry points
///
/// Read-only once built. Symbols stay valid for as long as this handle lives.
pub struct ForeignLibraryHandle {
	symbols: SymbolsFFI,
	origin: String,
	_library: Option<Library>,
}

impl ForeignLibraryHandle {
	/// Open the library at `path` and resolve every entry of the call table
	#[instrument(name = "bridge::load", level = "debug", skip_all, fields(path = %path))]
	pub fn load(path: &str) -> Result<Self, LoadError> {
		// SAFETY: loading runs the library's initializers; the library is trusted
		let library = unsafe { Library::new(path) }.map_err(|source| {
			error!("failed to open native library {}: {}", path, source);
			LoadError::Open {
				path: path.to_string(),
				source,
			}
		})?;

		let symbols = resolve_symbols(&library, path)?;
		debug!("resolved {} entry points from {}", EntryPoint::ALL.len(), path);

		Ok(Self {
			symbols,
			origin: path.to_string(),
			_library: Some(library),
		})
	}

	/// Wrap entry points implemented in this process
	pub fn from_symbols(symbols: SymbolsFFI) -> Self {
		Self {
			symbols,
			origin: "<in-process>".to_string(),
			_library: None,
		}
	}

	pub fn symbols(&self) -> &SymbolsFFI {
		&self.symbols
	}

	/// Path the library was loaded from
	pub fn origin(&self) -> &str {
		&self.origin
	}
}

impl fmt::Debug for ForeignLibraryHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ForeignLibraryHandle").field("origin", &self.origin).finish_non_exhaustive()
	}
}

fn resolve_symbols(library: &Library, path: &str) -> Result<SymbolsFFI, LoadError> {
	Ok(SymbolsFFI {
		get_cert: symbol(library, path, EntryPoint::GetCert)?,
		get_cpu_stime: symbol(library, path, EntryPoint::GetCpuStime)?,
		get_cpu_usage: symbol(library, path, EntryPoint::GetCpuUsage)?,
		get_cpu_utime: symbol(library, path, EntryPoint::GetCpuUtime)?,
		get_max_children: symbol(library, path, EntryPoint::GetMaxChildren)?,
		get_memory: symbol(library, path, EntryPoint::GetMemory)?,
		get_process_info: symbol(library, path, EntryPoint::GetProcessInfo)?,
		get_process_time: symbol(library, path, EntryPoint::GetProcessTime)?,
		get_run_time: symbol(library, path, EntryPoint::GetRunTime)?,
		get_start_time: symbol(library, path, EntryPoint::GetStartTime)?,
		get_virtual_memory: symbol(library, path, EntryPoint::GetVirtualMemory)?,
		verify_signature: symbol(library, path, EntryPoint::VerifySignature)?,
	})
}

fn symbol<T: Copy>(library: &Library, path: &str, entry: EntryPoint) -> Result<T, LoadError> {
	// SAFETY: T is the function pointer type declared for `entry` in SymbolsFFI
	let symbol = unsafe { library.get::<T>(entry.name().as_bytes()) }.map_err(|source| {
		error!("native library {} does not export {}: {}", path, entry, source);
		LoadError::MissingSymbol {
			path: path.to_string(),
			symbol: entry.name(),
			source,
		}
	})?;
	Ok(*symbol)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_library_file_names() {
		assert_eq!(Os::Darwin.library_file_name("metrics"), "libmetrics.dylib");
		assert_eq!(Os::Windows.library_file_name("metrics"), "metrics.dll");
		for os in [Os::Linux, Os::FreeBsd, Os::NetBsd, Os::Aix, Os::Solaris, Os::Illumos] {
			assert_eq!(os.library_file_name("metrics"), "libmetrics.so");
		}
	}

	#[test]
	fn test_os_names() {
		assert_eq!(Os::from_name("macos"), Some(Os::Darwin));
		assert_eq!(Os::from_name("darwin"), Some(Os::Darwin));
		assert_eq!(Os::from_name("illumos"), Some(Os::Illumos));
		assert_eq!(Os::from_name("haiku"), None);
	}

	#[test]
	fn test_resolve_unix() {
		assert_eq!(
			resolve_library_path(Os::Linux, "/srv/app/target/release", "metrics"),
			"/srv/app/target/release/libmetrics.so"
		);
		assert_eq!(
			resolve_library_path(Os::Darwin, "/srv/app/target/release/", "metrics"),
			"/srv/app/target/release/libmetrics.dylib"
		);
	}

	#[test]
	fn test_resolve_windows() {
		assert_eq!(
			resolve_library_path(Os::Windows, "/C:/app/target/release", "metrics"),
			"C:\\app\\target\\release\\metrics.dll"
		);
		assert_eq!(
			resolve_library_path(Os::Windows, "/C:/app/target/release/", "metrics"),
			"C:\\app\\target\\release\\metrics.dll"
		);
		assert_eq!(
			resolve_library_path(Os::Windows, "C:\\app\\target\\release", "metrics"),
			"C:\\app\\target\\release\\metrics.dll"
		);
	}

	#[test]
	fn test_resolve_windows_unc_share() {
		assert_eq!(
			resolve_library_path(Os::Windows, r"\\srv\share\lib", "metrics"),
			r"\\srv\share\lib\metrics.dll"
		);
		assert_eq!(
			resolve_library_path(Os::Windows, r"\\srv\share\lib\", "metrics"),
			r"\\srv\share\lib\metrics.dll"
		);
		assert_eq!(resolve_library_path(Os::Windows, "//srv/share/lib", "metrics"), r"\\srv\share\lib\metrics.dll");
	}

	#[test]
	fn test_load_missing_library() {
		let err = ForeignLibraryHandle::load("/nonexistent/procmetrics/libmetrics.so").unwrap_err();
		assert!(matches!(err, LoadError::Open { .. }));
	}
}
