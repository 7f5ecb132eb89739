// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Settings snapshot and margin normalization.
//!
//! Field names follow the `rt_cfg.json` layout (PascalCase), so an existing
//! configuration file loads without conversion. Settings are only read here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `MarginBasic` value meaning "use the four independent margins".
pub const INDEPENDENT_MARGINS: i32 = -384;

const SETTINGS_DIR: &str = "roundedbar";
const SETTINGS_FILE: &str = "rt_cfg.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    pub margin_basic: i32,
    pub margin_left: i32,
    pub margin_top: i32,
    pub margin_right: i32,
    pub margin_bottom: i32,
    pub corner_radius: i32,
    pub is_dynamic: bool,
    pub composition_compat: bool,
    pub is_centred: bool,
    pub is_windows11: bool,
    pub show_tray: bool,
    pub fill_on_maximise: bool,
    pub fill_on_task_switch: bool,

    /// Re-read `IsCentred` from the shell's registry value every tick.
    pub detect_alignment: bool,
    /// Derive `IsWindows11` from the OS build at startup.
    pub detect_windows11: bool,
    /// Display indices (enumeration order, primary = 0) left unclipped.
    pub ignored_displays: Vec<usize>,
    pub poll_interval_ms: u64,
    pub tick_timeout_ms: u64,
    pub dynamic: DynamicTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            margin_basic: 3,
            margin_left: 3,
            margin_top: 3,
            margin_right: 3,
            margin_bottom: 3,
            corner_radius: 7,
            is_dynamic: false,
            composition_compat: false,
            is_centred: false,
            is_windows11: false,
            show_tray: false,
            fill_on_maximise: false,
            fill_on_task_switch: false,
            detect_alignment: true,
            detect_windows11: true,
            ignored_displays: Vec::new(),
            poll_interval_ms: 100,
            tick_timeout_ms: 1000,
            dynamic: DynamicTuning::default(),
        }
    }
}

/// Constants applied only in dynamic mode.
///
/// Dynamic mode ignores the configured margins and uses `margins` instead.
/// `left_offset` is added to the left edge of a left-aligned Windows 11
/// taskbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DynamicTuning {
    pub margins: Margins,
    pub left_offset: i32,
}

impl Default for DynamicTuning {
    fn default() -> Self {
        Self {
            margins: Margins { left: 0, top: 1, right: 0, bottom: 0 },
            left_offset: 12,
        }
    }
}

/// Margins in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn uniform(value: i32) -> Self {
        Margins { left: value, top: value, right: value, bottom: value }
    }

    /// Effective margins of a snapshot. Never writes back into `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.margin_basic != INDEPENDENT_MARGINS {
            return Margins::uniform(settings.margin_basic);
        }
        Margins {
            left: settings.margin_left,
            top: settings.margin_top,
            right: settings.margin_right,
            bottom: settings.margin_bottom,
        }
    }
}

impl Settings {
    /// Reads a settings file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// `<config dir>/roundedbar/rt_cfg.json`, or the working directory without one.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_DIR)
            .join(SETTINGS_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.corner_radius < 0 {
            return Err(Error::Settings(format!("CornerRadius must be >= 0, got {}", self.corner_radius)));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Settings("PollIntervalMs must be > 0".into()));
        }
        if self.tick_timeout_ms == 0 {
            return Err(Error::Settings("TickTimeoutMs must be > 0".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_millis(self.tick_timeout_ms)
    }

    pub fn is_display_ignored(&self, index: usize) -> bool {
        self.ignored_displays.contains(&index)
    }
}
