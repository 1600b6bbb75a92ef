// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.

mod hash_secret;
mod serve;
mod validate;
mod version;

pub use hash_secret::hash_secret;
pub use serve::{build_state, serve};
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Serve(args) => serve::serve(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::HashSecret(args) => hash_secret::hash_secret(args),
        Commands::Version => version::version(),
    }
}
