// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types shared by every layer of the pipeline.

use thiserror::Error;

use crate::geometry::Handle;

/// Result type alias for roundedbar operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A step of automation session setup failed. Fatal for the display's bridge.
    #[error("automation setup failed at {stage}: {reason}")]
    AutomationInit { stage: &'static str, reason: String },

    #[error("automation session not initialised")]
    AutomationUnavailable,

    /// A single automation read failed; retry next tick.
    #[error("automation query failed: {0}")]
    AutomationQuery(String),

    #[error("window query failed for {handle}: {reason}")]
    WindowQuery { handle: Handle, reason: String },

    #[error("region operation failed: {0}")]
    Region(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to start worker for display {index}: {reason}")]
    WorkerSpawn { index: usize, reason: String },

    #[error("platform not supported: {0}")]
    Unsupported(&'static str),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl Error {
    pub fn window_query(handle: Handle, reason: impl Into<String>) -> Self {
        Error::WindowQuery { handle, reason: reason.into() }
    }

    /// True for failures that should disable a display until re-enumeration.
    pub fn is_fatal_for_display(&self) -> bool {
        matches!(self, Error::AutomationInit { .. })
    }
}
