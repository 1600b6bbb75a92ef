// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `serve` command.

use std::sync::Arc;

use tollgate_api::{ApiServer, AppState, StoreBackend};
use tollgate_core::{MemoryStore, RedisStore};
use tracing::{info, warn};

use crate::cli::{Cli, ServeArgs};
use crate::config::{load_config, load_from_env, TollgateConfig};
use crate::directory::UserDirectory;
use crate::error::BinResult;
use crate::shutdown::shutdown_signal;

/// Executes the `serve` command.
pub async fn serve(cli: &Cli, args: ServeArgs) -> BinResult<()> {
    let mut config = if args.no_config {
        load_from_env()?
    } else {
        load_config(&cli.config)?
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }

    let state = build_state(config).await?;
    let server = ApiServer::new(state);
    info!(
        "Starting Tollgate v{} on {}",
        tollgate_core::VERSION,
        server.addr()
    );

    server.run_with_shutdown(shutdown_signal()).await?;
    info!("Tollgate shutdown complete");
    Ok(())
}

/// Connects the configured store and assembles the application state.
pub async fn build_state(config: TollgateConfig) -> BinResult<AppState> {
    let directory = Arc::new(UserDirectory::new(config.users));
    if directory.is_empty() {
        info!("No users configured; only admin login is available");
    }
    if config.api.admin.secret_hash.is_none() {
        warn!("No admin secret hash configured; admin login is disabled");
    }

    let builder = AppState::builder()
        .credentials(directory.clone())
        .capabilities(directory);

    let builder = match config.api.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; sessions do not survive a restart");
            builder.store(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.api.store.redis).await?;
            builder.store(Arc::new(store))
        }
    };

    Ok(builder.config(config.api).build()?)
}
