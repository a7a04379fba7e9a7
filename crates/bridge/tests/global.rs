// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The process-wide bridge is installed once and never replaced

use procmetrics_bridge::{Bridge, BridgeConfig, ForeignLibraryHandle, global};
use procmetrics_testing::native::{self, KNOWN_PID};

#[test]
fn test_install_once() {
	let bridge = Bridge::from_handle(ForeignLibraryHandle::from_symbols(native::symbols()), &BridgeConfig::default());
	let installed = global::install(bridge).unwrap();
	assert_eq!(installed.get_memory(KNOWN_PID).unwrap(), 1024);
	assert_eq!(installed.dispatcher().library().origin(), "<in-process>");

	let second = Bridge::from_handle(ForeignLibraryHandle::from_symbols(native::symbols()), &BridgeConfig::default());
	assert!(global::install(second).is_err());

	// init never reloads once a bridge is present, even for a path that does not exist
	let config = BridgeConfig::default().with_library_dir("/nonexistent/procmetrics");
	let again = global::init(&config).unwrap();
	assert!(std::ptr::eq(again, installed));
	assert!(std::ptr::eq(global::get().unwrap(), installed));
}
