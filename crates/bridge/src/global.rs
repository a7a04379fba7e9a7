// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Process-wide bridge, loaded once and never reloaded

use once_cell::sync::OnceCell;

use crate::{bridge::Bridge, config::BridgeConfig, error::LoadError};

static BRIDGE: OnceCell<Bridge> = OnceCell::new();

/// Load the native library on first use
///
/// Later calls return the already loaded bridge and ignore `config`. A failed
/// load leaves the cell empty so startup can report it.
pub fn init(config: &BridgeConfig) -> Result<&'static Bridge, LoadError> {
	BRIDGE.get_or_try_init(|| Bridge::load(config))
}

/// Install an already built bridge, typically one wired to in-process symbols
///
/// Returns the rejected bridge if one is installed already.
pub fn install(bridge: Bridge) -> Result<&'static Bridge, Bridge> {
	BRIDGE.try_insert(bridge).map_err(|(_, rejected)| rejected)
}

pub fn get() -> Option<&'static Bridge> {
	BRIDGE.get()
}
