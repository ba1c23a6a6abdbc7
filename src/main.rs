// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::rc::Rc;

use fintrack::config::AppConfig;
use fintrack::db::SqliteStorage;
use fintrack::remote::RemoteClient;
use fintrack::store::DarkModeFlag;
use fintrack::{AppContext, cli, commands, logging};

fn main() -> Result<()> {
    logging::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = AppConfig::from_env()?;
    let db_path = config.db_path()?;
    let storage = SqliteStorage::open(&db_path)
        .with_context(|| format!("Open storage at {}", db_path.display()))?;
    let dark_mode = DarkModeFlag::new();
    let mut ctx = AppContext::open(Rc::new(storage), Some(Rc::new(dark_mode.clone())));
    tracing::debug!(dark = dark_mode.is_dark(), "context ready");

    match matches.subcommand() {
        Some(("tx", sub)) => commands::transactions::handle(&mut ctx, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut ctx, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&mut ctx, sub)?,
        Some(("report", sub)) => commands::reports::handle(&ctx, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&ctx, sub)?,
        Some(("auth", sub)) => commands::auth::handle(&mut ctx, sub)?,
        Some(("sync", sub)) => {
            let client = RemoteClient::new(&config.api_url, config.http_timeout)?;
            commands::sync::handle(&mut ctx, &client, sub)?
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }

    for alert in ctx.budget_alerts() {
        tracing::warn!(
            category = %alert.budget.category,
            progress = %alert.progress,
            status = %alert.status,
            "budget alert"
        );
    }
    Ok(())
}
