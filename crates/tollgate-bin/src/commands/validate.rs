// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::config::load_config;
use crate::error::{BinError, BinResult};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;
    let config = load_config(config_path)?;
    let api = &config.api;

    let mut warnings: Vec<String> = Vec::new();
    if api.admin.secret_hash.is_none() {
        warnings.push("No admin secret hash configured; admin login is disabled".to_string());
    }
    if config.users.is_empty() {
        warnings.push("No users configured".to_string());
    }
    if api.cors.allowed_origins.iter().any(|o| o == "*") {
        warnings.push("CORS mirrors any origin while allowing credentials".to_string());
    }

    match args.format {
        OutputFormat::Text => {
            println!("Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen:       {}", api.socket_addr());
            println!("  Environment:  {}", api.cookie.environment);
            println!("  Store:        {:?}", api.store.backend);
            println!("  Access TTL:   {:?}", api.session.access_ttl);
            println!("  Refresh TTL:  {:?}", api.session.refresh_ttl);
            println!("  Users:        {}", config.users.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", to_json(&config)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "listen": api.socket_addr().to_string(),
                    "environment": api.cookie.environment.as_str(),
                    "user_count": config.users.len(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!("{}", to_json(&output)?);
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))
}
