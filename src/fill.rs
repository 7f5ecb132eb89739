// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fill-on-maximize: when to show the taskbar unclipped.

use crate::geometry::Handle;
use crate::platform::Desktop;
use crate::settings::Settings;

/// Windows 11 task switcher (Alt+Tab) host window.
const TASK_SWITCHER_CLASS: &str = "XamlExplorerHostIslandWindow";

/// True when a maximized window (or the task switcher) shares the taskbar's monitor.
pub fn should_be_filled(desktop: &dyn Desktop, taskbar: Handle, settings: &Settings) -> bool {
    if !settings.fill_on_maximise {
        return false;
    }
    if settings.fill_on_task_switch && desktop.class_at_origin().as_deref() == Some(TASK_SWITCHER_CLASS) {
        return true;
    }

    let monitor = desktop.monitor_from_window(taskbar);
    desktop.top_level_windows().into_iter().any(|window| {
        desktop.is_visible(window)
            && desktop.monitor_from_window(window) == monitor
            && !desktop.is_cloaked(window)
            && desktop.is_maximized(window)
    })
}
