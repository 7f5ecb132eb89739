// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Clip region synthesis.
//!
//! Regions are built as plain values first and handed to the platform in a
//! single install call, so a failure never leaves a half-applied clip.

use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{scale, Handle};
use crate::platform::Desktop;
use crate::registry::TaskbarGeometry;
use crate::settings::{Margins, Settings};

/// Rounded rectangle in window coordinates; `corner` is both ellipse axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub corner: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    RoundRect(RoundRect),
    Union(Box<Region>, Box<Region>),
}

impl Region {
    pub fn round_rect(left: i32, top: i32, right: i32, bottom: i32, corner: i32) -> Self {
        Region::RoundRect(RoundRect { left, top, right, bottom, corner })
    }

    pub fn union(a: Region, b: Region) -> Self {
        Region::Union(Box::new(a), Box::new(b))
    }

    /// Every rounded rectangle in the region, left operand first.
    pub fn parts(&self) -> Vec<RoundRect> {
        match self {
            Region::RoundRect(r) => vec![*r],
            Region::Union(a, b) => {
                let mut parts = a.parts();
                parts.extend(b.parts());
                parts
            }
        }
    }
}

/// Scaled rectangle fed to a rounded-rectangle region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveRegion {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub corner_radius: i32,
}

impl EffectiveRegion {
    fn to_region(self) -> Region {
        Region::round_rect(self.left, self.top, self.width, self.height, self.corner_radius)
    }
}

// ── Simple mode ──────────────────────────────────────

pub fn simple_effective_region(geometry: &TaskbarGeometry, settings: &Settings) -> EffectiveRegion {
    let margins = Margins::from_settings(settings);
    let s = geometry.scale_factor;
    let tb = geometry.rects.taskbar;
    EffectiveRegion {
        corner_radius: scale(f64::from(settings.corner_radius), s),
        top: scale(f64::from(margins.top), s),
        left: scale(f64::from(margins.left), s),
        // +1 so the right/bottom edge is not clipped
        width: scale(f64::from(tb.width()) - f64::from(margins.right) * s, 1.0) + 1,
        height: scale(f64::from(tb.height()) - f64::from(margins.bottom) * s, 1.0) + 1,
    }
}

pub fn simple_region(geometry: &TaskbarGeometry, settings: &Settings) -> Region {
    simple_effective_region(geometry, settings).to_region()
}

// ── Dynamic mode ─────────────────────────────────────

/// Main region fitted to the task list, unioned with the tray when shown.
pub fn dynamic_region(geometry: &TaskbarGeometry, settings: &Settings) -> Region {
    // Configured margins are superseded by the dynamic tuning, see DynamicTuning
    let margins = settings.dynamic.margins;
    let s = geometry.scale_factor;
    let tb = geometry.rects.taskbar;
    let scaled = |v: i32| scale(f64::from(v), s);

    let mut left = tb.left + scaled(margins.left);
    let right = tb.right - scaled(margins.right);
    let top = scaled(margins.top);
    let bottom = top + tb.height() - scaled(margins.bottom);
    if !settings.is_centred && settings.is_windows11 {
        left += scaled(settings.dynamic.left_offset);
    }

    let corner = scaled(settings.corner_radius);
    let main = Region::round_rect(left, top, right, bottom, corner);
    if !settings.show_tray || geometry.tray.is_null() {
        return main;
    }

    // No custom left margin on the tray: the shell leaves no padding there
    let tray = EffectiveRegion {
        corner_radius: corner,
        top,
        left: scale(1.0, s),
        width: scale(f64::from(tb.width()) - f64::from(margins.left) * s, 1.0) + 1,
        height: scale(f64::from(tb.height()) - f64::from(margins.bottom) * s, 1.0) + 1,
    };
    let tray_region = Region::round_rect(
        geometry.rects.tray.left - tray.left,
        tray.top,
        tray.width,
        tray.height,
        tray.corner_radius,
    );
    Region::union(tray_region, main)
}

// ── Installation ─────────────────────────────────────

fn install(desktop: &dyn Desktop, taskbar: Handle, region: &Region, settings: &Settings) -> Result<()> {
    if let Err(e) = desktop.set_window_region(taskbar, Some(region)) {
        warn!("region: install on taskbar {taskbar} failed: {e}");
        return Err(e);
    }
    if settings.composition_compat {
        desktop.refresh_composition(taskbar);
    }
    Ok(())
}

pub fn update_simple_taskbar(desktop: &dyn Desktop, geometry: &TaskbarGeometry, settings: &Settings) -> Result<()> {
    let region = simple_region(geometry, settings);
    debug!("region: simple {:?} on taskbar {}", region, geometry.taskbar);
    install(desktop, geometry.taskbar, &region, settings)
}

pub fn update_dynamic_taskbar(desktop: &dyn Desktop, geometry: &TaskbarGeometry, settings: &Settings) -> Result<()> {
    let region = dynamic_region(geometry, settings);
    debug!("region: dynamic {:?} on taskbar {}", region, geometry.taskbar);
    install(desktop, geometry.taskbar, &region, settings)
}

/// Mode-dispatching entry point used by the engine.
pub fn update_taskbar(desktop: &dyn Desktop, geometry: &TaskbarGeometry, settings: &Settings) -> Result<()> {
    if settings.is_dynamic {
        update_dynamic_taskbar(desktop, geometry, settings)
    } else {
        update_simple_taskbar(desktop, geometry, settings)
    }
}

/// Restores the native shape. Safe to call when no region is installed.
pub fn reset_taskbar(desktop: &dyn Desktop, taskbar: Handle, settings: &Settings) -> Result<()> {
    desktop.set_window_region(taskbar, None)?;
    if settings.composition_compat {
        desktop.refresh_composition(taskbar);
    }
    Ok(())
}
