// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Decides when a sampled taskbar needs a new clip region.

use crate::registry::TaskbarRects;

/// Whether a freshly sampled geometry needs a re-render.
///
/// Simple mode renders a fixed rectangle, so only the taskbar rect matters
/// there. Dynamic mode follows the app list and tray as well.
pub fn refresh_required(current: &TaskbarRects, sampled: &TaskbarRects, dynamic: bool) -> bool {
    let taskbar_changed = current.taskbar != sampled.taskbar;
    let app_list_changed = current.app_list != sampled.app_list;
    let tray_changed = current.tray != sampled.tray;

    if dynamic {
        taskbar_changed || app_list_changed || tray_changed
    } else {
        taskbar_changed
    }
}
