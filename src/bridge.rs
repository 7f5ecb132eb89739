// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-taskbar accessibility bridge.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::Handle;
use crate::platform::{AutomationSession, Desktop};

/// Owns at most one automation session for one taskbar window.
#[derive(Default)]
pub struct AccessibilityBridge {
    session: Option<Box<dyn AutomationSession>>,
}

impl AccessibilityBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects once; later calls are no-ops. On error nothing is kept.
    pub fn ensure_initialized(&mut self, desktop: &dyn Desktop, taskbar: Handle) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        match desktop.connect_automation(taskbar) {
            Ok(session) => {
                debug!("bridge: session established for taskbar {taskbar}");
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!("bridge: setup failed for taskbar {taskbar}: {e}");
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<&dyn AutomationSession> {
        self.session.as_deref().ok_or(Error::AutomationUnavailable)
    }

    /// Drops the session. A later `ensure_initialized` builds a new one.
    pub fn release(&mut self) {
        if self.session.take().is_some() {
            debug!("bridge: session released");
        }
    }
}

impl fmt::Debug for AccessibilityBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessibilityBridge")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
