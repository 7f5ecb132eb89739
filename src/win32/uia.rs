// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! UI Automation session rooted at one taskbar.

use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::*;
use windows::Win32::UI::Accessibility::*;
use windows_core::{Interface, BSTR, VARIANT};

use tracing::trace;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::platform::AutomationSession;

const TASK_BUTTON_CLASS: &str = "Taskbar.TaskListButtonAutomationPeer";
const CONNECTION_TIMEOUT_MS: u32 = 2000;

/// Keeps the calling thread in the multithreaded apartment while alive.
struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_err() {
            return Err(Error::AutomationInit { stage: "CoInitializeEx", reason: hr.message() });
        }
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

fn init_err(stage: &'static str) -> impl FnOnce(windows_core::Error) -> Error {
    move |e| Error::AutomationInit { stage, reason: e.message() }
}

pub struct UiaSession {
    _automation: IUIAutomation,
    root: IUIAutomationElement,
    button_condition: IUIAutomationCondition,
    // Declared last: released after the COM objects above
    _apartment: ComApartment,
}

impl UiaSession {
    pub fn connect(taskbar: HWND) -> Result<Self> {
        let apartment = ComApartment::enter()?;
        unsafe {
            let automation: IUIAutomation = CoCreateInstance(&CUIAutomation8, None, CLSCTX_INPROC_SERVER)
                .map_err(init_err("CoCreateInstance"))?;
            if let Ok(uia6) = automation.cast::<IUIAutomation6>() {
                let _ = uia6.SetConnectionTimeout(CONNECTION_TIMEOUT_MS);
            }

            let desktop = automation.GetRootElement().map_err(init_err("GetRootElement"))?;
            let handle_condition = automation
                .CreatePropertyCondition(UIA_NativeWindowHandlePropertyId, &VARIANT::from(taskbar.0 as i32))
                .map_err(init_err("handle condition"))?;
            let root = desktop
                .FindFirst(TreeScope_Children, &handle_condition)
                .map_err(init_err("taskbar element"))?;
            let button_condition = automation
                .CreatePropertyCondition(UIA_ClassNamePropertyId, &VARIANT::from(BSTR::from(TASK_BUTTON_CLASS)))
                .map_err(init_err("button condition"))?;

            trace!("uia: session for taskbar 0x{:X}", taskbar.0 as usize);
            Ok(Self { _automation: automation, root, button_condition, _apartment: apartment })
        }
    }
}

impl AutomationSession for UiaSession {
    fn task_button_rects(&self) -> Result<Vec<Rect>> {
        let query = |e: windows_core::Error| Error::AutomationQuery(e.message());
        unsafe {
            let buttons = self.root.FindAll(TreeScope_Descendants, &self.button_condition).map_err(query)?;
            let count = buttons.Length().map_err(query)?;
            let mut rects = Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let rc = buttons.GetElement(i).and_then(|b| b.CurrentBoundingRectangle()).map_err(query)?;
                rects.push(Rect::new(rc.left, rc.top, rc.right, rc.bottom));
            }
            Ok(rects)
        }
    }
}
