// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Taskbar discovery and per-display records.

use tracing::{debug, info};

use crate::bounds::resolve_actual_taskbar_rect;
use crate::bridge::AccessibilityBridge;
use crate::error::Result;
use crate::geometry::{scale_factor_from_dpi, Handle, Rect};
use crate::platform::Desktop;

// ── Shell window classes ─────────────────────────────
pub const PRIMARY_TASKBAR_CLASS: &str = "Shell_TrayWnd";
pub const SECONDARY_TASKBAR_CLASS: &str = "Shell_SecondaryTrayWnd";
pub const START_CLASS: &str = "Start";
pub const TRAY_CLASS: &str = "TrayNotifyWnd";
const PRIMARY_APPLIST_HOST: &str = "ReBarWindow32";
const PRIMARY_APPLIST_CLASS: &str = "MSTaskSwWClass";
const SECONDARY_APPLIST_HOST: &str = "WorkerW";
const SECONDARY_APPLIST_CLASS: &str = "MSTaskListWClass";

/// Handles of one taskbar and its structural children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskbarWindows {
    pub taskbar: Handle,
    pub tray: Handle,
    pub app_list: Handle,
    pub start: Handle,
    pub primary: bool,
}

/// The three rectangles that drive re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskbarRects {
    pub taskbar: Rect,
    pub tray: Rect,
    pub app_list: Rect,
}

/// Quick per-tick read: handles plus fresh rectangles, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskbarSample {
    pub taskbar: Handle,
    pub tray: Handle,
    pub app_list: Handle,
    pub rects: TaskbarRects,
}

/// What the region synthesizer needs to know about one taskbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskbarGeometry {
    pub taskbar: Handle,
    pub tray: Handle,
    pub rects: TaskbarRects,
    pub scale_factor: f64,
}

#[derive(Debug)]
pub struct TaskbarRecord {
    pub windows: TaskbarWindows,
    pub rects: TaskbarRects,
    pub scale_factor: f64,
    pub ignored: bool,
    /// Region the taskbar carried at enumeration; null when it had none.
    pub recovery_region: Handle,
    bridge: AccessibilityBridge,
}

// ── Discovery ────────────────────────────────────────

fn child(desktop: &dyn Desktop, parent: Handle, class: &str) -> Handle {
    if parent.is_null() {
        return Handle::NULL;
    }
    desktop.find_window(parent, Handle::NULL, class).unwrap_or(Handle::NULL)
}

fn primary_windows(desktop: &dyn Desktop, taskbar: Handle) -> TaskbarWindows {
    let host = child(desktop, taskbar, PRIMARY_APPLIST_HOST);
    TaskbarWindows {
        taskbar,
        tray: child(desktop, taskbar, TRAY_CLASS),
        app_list: child(desktop, host, PRIMARY_APPLIST_CLASS),
        start: child(desktop, taskbar, START_CLASS),
        primary: true,
    }
}

fn secondary_windows(desktop: &dyn Desktop, taskbar: Handle) -> TaskbarWindows {
    let host = child(desktop, taskbar, SECONDARY_APPLIST_HOST);
    TaskbarWindows {
        taskbar,
        tray: child(desktop, taskbar, TRAY_CLASS),
        app_list: child(desktop, host, SECONDARY_APPLIST_CLASS),
        start: child(desktop, taskbar, START_CLASS),
        primary: false,
    }
}

fn secondary_taskbars(desktop: &dyn Desktop) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut previous = Handle::NULL;
    while let Some(current) = desktop.find_window(Handle::NULL, previous, SECONDARY_TASKBAR_CLASS) {
        found.push(current);
        previous = current;
    }
    found
}

fn primary_taskbar(desktop: &dyn Desktop) -> Option<Handle> {
    desktop.find_window(Handle::NULL, Handle::NULL, PRIMARY_TASKBAR_CLASS)
}

/// Handles of every taskbar, primary first. No automation work.
pub fn discover(desktop: &dyn Desktop) -> Vec<TaskbarWindows> {
    let mut all = Vec::new();
    if let Some(main) = primary_taskbar(desktop) {
        all.push(primary_windows(desktop, main));
    }
    all.extend(secondary_taskbars(desktop).into_iter().map(|h| secondary_windows(desktop, h)));
    debug!("registry: discovered {} taskbar(s)", all.len());
    all
}

/// Builds a record for every discovered taskbar.
pub fn enumerate(desktop: &dyn Desktop) -> Result<Vec<TaskbarRecord>> {
    discover(desktop).into_iter().map(|w| TaskbarRecord::build(w, desktop)).collect()
}

/// True when the primary taskbar changed (or vanished) or the count differs.
pub fn taskbar_topology_changed(desktop: &dyn Desktop, expected_count: usize, primary: Handle) -> bool {
    let current_primary = primary_taskbar(desktop).unwrap_or(Handle::NULL);
    if current_primary != primary {
        return true;
    }
    let count = usize::from(!current_primary.is_null()) + secondary_taskbars(desktop).len();
    count != expected_count
}

/// Window rectangle, or the zero rectangle for an absent child window.
fn child_rect(desktop: &dyn Desktop, window: Handle) -> Result<Rect> {
    if window.is_null() {
        return Ok(Rect::default());
    }
    desktop.window_rect(window)
}

// ── Records ──────────────────────────────────────────

impl TaskbarRecord {
    /// Connects the bridge and takes the first full reading.
    pub fn build(windows: TaskbarWindows, desktop: &dyn Desktop) -> Result<Self> {
        let mut bridge = AccessibilityBridge::new();
        bridge.ensure_initialized(desktop, windows.taskbar)?;

        let rects = TaskbarRects {
            taskbar: resolve_actual_taskbar_rect(desktop, bridge.session()?, windows.start)?,
            tray: child_rect(desktop, windows.tray)?,
            app_list: child_rect(desktop, windows.app_list)?,
        };
        let recovery_region = if windows.primary {
            Handle::NULL
        } else {
            desktop.window_region(windows.taskbar)
        };
        let scale_factor = scale_factor_from_dpi(desktop.dpi_for_window(windows.taskbar));

        info!(
            "registry: taskbar {} ({}) {} x {} @ {:.2}x",
            windows.taskbar,
            if windows.primary { "primary" } else { "secondary" },
            rects.taskbar.width(),
            rects.taskbar.height(),
            scale_factor
        );
        Ok(Self {
            windows,
            rects,
            scale_factor,
            ignored: false,
            recovery_region,
            bridge,
        })
    }

    pub fn taskbar(&self) -> Handle {
        self.windows.taskbar
    }

    /// Fresh rectangles without touching the record's own.
    pub fn sample(&mut self, desktop: &dyn Desktop) -> Result<TaskbarSample> {
        self.bridge.ensure_initialized(desktop, self.windows.taskbar)?;
        let taskbar = resolve_actual_taskbar_rect(desktop, self.bridge.session()?, self.windows.start)?;
        Ok(TaskbarSample {
            taskbar: self.windows.taskbar,
            tray: self.windows.tray,
            app_list: self.windows.app_list,
            rects: TaskbarRects {
                taskbar,
                tray: child_rect(desktop, self.windows.tray)?,
                app_list: child_rect(desktop, self.windows.app_list)?,
            },
        })
    }

    pub fn geometry(&self) -> TaskbarGeometry {
        TaskbarGeometry {
            taskbar: self.windows.taskbar,
            tray: self.windows.tray,
            rects: self.rects,
            scale_factor: self.scale_factor,
        }
    }

    pub fn bridge(&self) -> &AccessibilityBridge {
        &self.bridge
    }

    /// Releases the bridge session and the recovery region.
    pub fn release(&mut self, desktop: &dyn Desktop) {
        self.bridge.release();
        if !self.recovery_region.is_null() {
            desktop.release_region(self.recovery_region);
            self.recovery_region = Handle::NULL;
        }
    }
}
