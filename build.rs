// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

fn main() {
    // Version resource only makes sense for Windows targets
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    let mut res = winresource::WindowsResource::new();
    res.set("FileDescription", "roundedbar taskbar clipper");
    res.set("ProductName", "roundedbar");
    if let Err(e) = res.compile() {
        println!("cargo:warning=winresource: {e}");
    }
}
