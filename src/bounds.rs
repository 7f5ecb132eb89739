// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Visual taskbar bounds from task-list buttons and the start button.

use tracing::trace;

use crate::error::Result;
use crate::geometry::{Handle, Rect};
use crate::platform::{AutomationSession, Desktop};

/// Bounding rectangle of all task buttons; `Rect::UNBOUNDED` when there are none.
pub fn resolve_task_buttons_rect(session: &dyn AutomationSession) -> Result<Rect> {
    let rects = session.task_button_rects()?;
    Ok(rects.into_iter().fold(Rect::UNBOUNDED, Rect::include))
}

/// Start button through the end of the task list, relative to the monitor origin.
///
/// Secondary monitors report window coordinates relative to the primary
/// monitor's origin, so the owning monitor's left edge is subtracted.
pub fn resolve_actual_taskbar_rect(
    desktop: &dyn Desktop,
    session: &dyn AutomationSession,
    start: Handle,
) -> Result<Rect> {
    let monitor = desktop.monitor_from_window(start);
    let monitor_offset = desktop.monitor_rect(monitor).map_or(0, |r| r.left);

    let start_rect = desktop.window_rect(start)?;
    let mut buttons = resolve_task_buttons_rect(session)?;
    if buttons.is_unbounded() {
        // Empty task list: content ends with the start button
        buttons = start_rect;
    }

    let rect = Rect {
        left: start_rect.left - monitor_offset,
        top: buttons.top,
        right: buttons.right - monitor_offset,
        bottom: buttons.bottom,
    };
    trace!(
        "bounds: start={start} offset={monitor_offset} rect=({}, {}, {}, {})",
        rect.left, rect.top, rect.right, rect.bottom
    );
    Ok(rect)
}
