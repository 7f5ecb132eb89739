// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![windows_subsystem = "windows"]

use std::path::{Path, PathBuf};

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use roundedbar::{Error, Result, Settings};

const LOG_FILE: &str = "roundedbar.log";
const DEFAULT_FILTER: &str = "roundedbar=info";

// ── Logging ──────────────────────────────────────────
// Release builds have no console, so everything goes to a daily file next to the settings.
fn init_logging(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;
    Ok(guard)
}

fn settings_path() -> PathBuf {
    std::env::args_os().nth(1).map(PathBuf::from).unwrap_or_else(Settings::default_path)
}

// ── Daemon ───────────────────────────────────────────
#[cfg(windows)]
fn run(settings: Settings) -> Result<()> {
    use std::sync::Arc;
    use roundedbar::win32::Win32Desktop;

    let mut engine = roundedbar::Engine::new(Arc::new(Win32Desktop::new()), settings)?;
    info!("{} taskbar(s) under management", engine.display_count());
    engine.run(|| true)
}

#[cfg(not(windows))]
fn run(_settings: Settings) -> Result<()> {
    Err(Error::Unsupported("taskbar clipping needs the Windows shell"))
}

fn main() -> std::process::ExitCode {
    let path = settings_path();
    let log_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let _guard = match init_logging(&log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("roundedbar: logging disabled: {e}");
            None
        }
    };

    info!("=== roundedbar {} START ===", env!("CARGO_PKG_VERSION"));
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("settings {}: {e}", path.display());
            return std::process::ExitCode::FAILURE;
        }
    };
    info!("settings loaded from {}", path.display());

    match run(settings) {
        Ok(()) => {
            info!("=== roundedbar EXIT ===");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("roundedbar: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
