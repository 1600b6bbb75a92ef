// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::error::BinResult;

/// Executes the `version` command to display version information.
pub fn version() -> BinResult<()> {
    println!("Tollgate - session, rate limit and permission gateway");
    println!();
    println!("Version Information:");
    println!("  tollgate-bin:  {}", crate::VERSION);
    println!("  tollgate-core: {}", tollgate_core::VERSION);
    println!("  tollgate-api:  {}", tollgate_api::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:        {}", std::env::consts::ARCH);
    println!("  OS:            {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
