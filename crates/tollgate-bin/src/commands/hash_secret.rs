// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-secret` command.

use std::io::BufRead;

use crate::cli::HashSecretArgs;
use crate::error::{BinError, BinResult};

/// Prints the argon2 PHC hash of a secret.
pub fn hash_secret(args: HashSecretArgs) -> BinResult<()> {
    let secret = match args.value {
        Some(value) if !args.stdin => value,
        _ => read_stdin_line()?,
    };
    if secret.is_empty() {
        return Err(BinError::config("Secret must not be empty"));
    }

    println!("{}", tollgate_api::password::hash_secret(&secret)?);
    Ok(())
}

fn read_stdin_line() -> BinResult<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
