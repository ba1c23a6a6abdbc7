// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{optional, required};
use crate::context::AppContext;
use crate::models::{BudgetPatch, BudgetProgress, DEFAULT_ALERT_THRESHOLD, NewBudget, Period};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Utc;

pub fn handle(ctx: &mut AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("update", sub)) => update(ctx, sub)?,
        Some(("rm", sub)) => {
            let removed = ctx.budgets.delete_budget(required(sub, "id")?)?;
            println!("Removed {} budget for '{}'", removed.period, removed.category);
        }
        Some(("alerts", sub)) => alerts(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let category = required(sub, "category")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let period = required(sub, "period")?.parse::<Period>()?;
    let start = match optional(sub, "start") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let threshold = sub
        .get_one::<u8>("alert_threshold")
        .copied()
        .unwrap_or(DEFAULT_ALERT_THRESHOLD);
    let input = NewBudget::new(category, amount, period, start)
        .with_alerts(!sub.get_flag("no_alerts"), threshold);

    let budget = ctx.budgets.add_budget(input)?;
    println!(
        "Budget set for '{}': {} {} from {} to {} (id: {})",
        budget.category,
        ctx.money(budget.amount),
        budget.period,
        ctx.date(budget.start_date),
        ctx.date(budget.end_date()),
        budget.id
    );
    Ok(())
}

fn update(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    let patch = BudgetPatch {
        category: optional(sub, "category").map(str::to_string),
        amount: optional(sub, "amount").map(parse_decimal).transpose()?,
        period: optional(sub, "period")
            .map(|s| s.parse::<Period>())
            .transpose()?,
        start_date: optional(sub, "start").map(parse_date).transpose()?,
        enable_alerts: if sub.get_flag("alerts") {
            Some(true)
        } else {
            sub.get_flag("no_alerts").then_some(false)
        },
        alert_threshold: sub.get_one::<u8>("alert_threshold").copied(),
    };
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }
    let budget = ctx.budgets.update_budget(id, patch)?;
    println!("Updated budget {}", budget.id);
    Ok(())
}

fn list(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<BudgetProgress> = if sub.get_flag("active") {
        ctx.budgets
            .get_active_budgets()
            .into_iter()
            .map(|b| ctx.budgets.progress(b, &ctx.transactions))
            .collect()
    } else {
        ctx.budget_progress()
    };
    print_progress(ctx, sub, &data)
}

fn alerts(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let data = ctx.budget_alerts();
    if data.is_empty() && !sub.get_flag("json") && !sub.get_flag("jsonl") {
        println!("No budget alerts");
        return Ok(());
    }
    print_progress(ctx, sub, &data)
}

fn print_progress(ctx: &AppContext, sub: &clap::ArgMatches, data: &[BudgetProgress]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|p| {
            vec![
                p.budget.category.clone(),
                p.budget.period.to_string(),
                ctx.date(p.budget.end_date()),
                ctx.money(p.budget.amount),
                ctx.money(p.spent),
                format!("{:.1}%", p.progress),
                p.status.to_string(),
                if p.alert_triggered { "!".into() } else { String::new() },
                p.budget.id.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "Category", "Period", "Ends", "Budget", "Spent", "Progress", "Status", "Alert",
                "ID",
            ],
            rows,
        )
    );
    Ok(())
}
