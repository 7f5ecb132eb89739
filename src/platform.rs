// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Every OS call the pipeline makes.
//!
//! `Desktop` is shared by all display workers, so implementations must be
//! `Send + Sync`. Automation sessions are created by the worker that owns the
//! display and never leave that thread.

use crate::error::Result;
use crate::geometry::{Handle, Rect};
use crate::region::Region;

/// Taskbar alignment as stored by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Centred,
}

pub trait Desktop: Send + Sync {
    // ── Window discovery ───────────────────────────
    /// First window of `class` under `parent` (null = top level) after `after`.
    fn find_window(&self, parent: Handle, after: Handle, class: &str) -> Option<Handle>;
    fn window_rect(&self, window: Handle) -> Result<Rect>;
    fn dpi_for_window(&self, window: Handle) -> u32;

    // ── Monitors ───────────────────────────────────
    /// Nearest monitor to `window`.
    fn monitor_from_window(&self, window: Handle) -> Handle;
    fn monitor_rect(&self, monitor: Handle) -> Option<Rect>;

    // ── Regions ────────────────────────────────────
    /// Installs `region` (or removes any region with `None`). All or nothing.
    fn set_window_region(&self, window: Handle, region: Option<&Region>) -> Result<()>;
    /// Copy of the window's current region, null if none is installed.
    fn window_region(&self, window: Handle) -> Handle;
    fn release_region(&self, region: Handle);

    // ── Top-level windows (fill heuristic) ─────────
    fn top_level_windows(&self) -> Vec<Handle>;
    /// Class name of the topmost window at screen origin.
    fn class_at_origin(&self) -> Option<String>;
    fn is_visible(&self, window: Handle) -> bool;
    fn is_cloaked(&self, window: Handle) -> bool;
    fn is_maximized(&self, window: Handle) -> bool;

    // ── Shell state ────────────────────────────────
    fn taskbar_alignment(&self) -> Alignment;
    fn os_build(&self) -> Option<u32>;

    // ── Collaborators ──────────────────────────────
    /// Asks a translucency tool to repaint `taskbar`.
    fn refresh_composition(&self, taskbar: Handle);

    /// Opens an automation session rooted at `taskbar`.
    fn connect_automation(&self, taskbar: Handle) -> Result<Box<dyn AutomationSession>>;
}

/// Live automation view of one taskbar.
pub trait AutomationSession {
    /// Bounding rectangles of every task-list button under the taskbar root.
    fn task_button_rects(&self) -> Result<Vec<Rect>>;
}

/// Build number from which the platform counts as Windows 11.
pub const WINDOWS11_FIRST_BUILD: u32 = 22000;

pub fn is_windows11(desktop: &dyn Desktop) -> bool {
    desktop.os_build().is_some_and(|build| build >= WINDOWS11_FIRST_BUILD)
}
