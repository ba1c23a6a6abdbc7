// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::context::AppContext;
use crate::error::Error;
use crate::remote::RemoteClient;
use anyhow::{Context, Result};

pub fn handle(ctx: &mut AppContext, client: &RemoteClient, m: &clap::ArgMatches) -> Result<()> {
    let outcome = match m.subcommand() {
        Some(("transactions", _)) => sync_transactions(ctx, client),
        Some(("budgets", _)) => sync_budgets(ctx, client),
        _ => return Ok(()),
    };
    if let Err(ref err) = outcome {
        match err {
            Error::RateLimited if client.notice().should_show() => {
                eprintln!("Too many requests. Please wait a moment and try again.")
            }
            Error::Auth(msg) => eprintln!("{}", msg),
            _ => {}
        }
    }
    outcome.context("sync failed")
}

fn sync_transactions(ctx: &mut AppContext, client: &RemoteClient) -> crate::Result<()> {
    let ticket = ctx.transactions.begin_fetch();
    let list = client.fetch_transactions(&mut ctx.session)?;
    let count = list.len();
    if ctx.transactions.apply_fetched(ticket, list)? {
        println!("Loaded {} transactions", count);
    }
    Ok(())
}

fn sync_budgets(ctx: &mut AppContext, client: &RemoteClient) -> crate::Result<()> {
    let ticket = ctx.budgets.begin_fetch();
    let list = client.fetch_budgets(&mut ctx.session)?;
    let count = list.len();
    if ctx.budgets.apply_fetched(ticket, list)? {
        println!("Loaded {} budgets", count);
    }
    Ok(())
}
