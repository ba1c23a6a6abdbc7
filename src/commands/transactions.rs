// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{optional, required};
use crate::context::AppContext;
use crate::models::{NewTransaction, Period, Transaction, TransactionPatch, TransactionType};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table, truncate_text};
use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ctx: &mut AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("update", sub)) => update(ctx, sub)?,
        Some(("rm", sub)) => remove(ctx, sub)?,
        Some(("totals", sub)) => totals(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let kind = required(sub, "type")?.parse::<TransactionType>()?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let category = required(sub, "category")?;
    let date = match optional(sub, "date") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let mut input = NewTransaction::new(kind, amount, category, date);
    if let Some(desc) = optional(sub, "description") {
        input = input.with_description(desc);
    }
    if let Some(period) = optional(sub, "recurring") {
        input = input.recurring(period.parse::<Period>()?);
    }

    let tx = ctx.transactions.add_transaction(input)?;
    println!(
        "Recorded {} {} in '{}' on {} (id: {})",
        tx.kind,
        ctx.money(tx.amount),
        tx.category,
        ctx.date(tx.date),
        tx.id
    );
    Ok(())
}

fn update(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    let patch = TransactionPatch {
        kind: optional(sub, "type")
            .map(|s| s.parse::<TransactionType>())
            .transpose()?,
        amount: optional(sub, "amount").map(parse_decimal).transpose()?,
        category: optional(sub, "category").map(str::to_string),
        description: sub.get_one::<String>("description").cloned(),
        date: optional(sub, "date").map(parse_date).transpose()?,
        is_recurring: sub.get_flag("no_recurring").then_some(false),
        recurring_period: optional(sub, "recurring")
            .map(|s| s.parse::<Period>())
            .transpose()?,
    };
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }
    let tx = ctx.transactions.update_transaction(id, patch)?;
    println!("Updated transaction {}", tx.id);
    Ok(())
}

fn remove(ctx: &mut AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    let tx = ctx.transactions.delete_transaction(id)?;
    println!(
        "Removed {} {} in '{}'",
        tx.kind,
        ctx.money(tx.amount),
        tx.category
    );
    Ok(())
}

fn list(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ctx, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let sign = if r.kind == TransactionType::Income { "+" } else { "-" };
                vec![
                    ctx.date(r.date),
                    r.kind.to_string(),
                    r.category.clone(),
                    format!("{}{}", sign, ctx.money(r.amount)),
                    truncate_text(r.description.as_deref().unwrap_or(""), 32),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Category", "Amount", "Description", "ID"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: chrono::NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            date: t.date,
            kind: t.kind,
            category: t.category.clone(),
            amount: t.amount,
            description: t.description.clone(),
        }
    }
}

/// Rows matching the `list` filters, newest first.
pub fn query_rows(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let from = optional(sub, "from").map(parse_date).transpose()?;
    let to = optional(sub, "to").map(parse_date).transpose()?;
    let kind = optional(sub, "type")
        .map(|s| s.parse::<TransactionType>())
        .transpose()?;
    let category = optional(sub, "category");

    let store = &ctx.transactions;
    let mut data = store.recent(store.transactions().len());
    if let Some(from) = from {
        data.retain(|t| t.date >= from);
    }
    if let Some(to) = to {
        data.retain(|t| t.date <= to);
    }
    if let Some(cat) = category {
        data.retain(|t| t.category == cat);
    }
    if let Some(kind) = kind {
        data.retain(|t| t.kind == kind);
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data.into_iter().map(TransactionRow::from).collect())
}

fn totals(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let store = &ctx.transactions;
    let data = vec![
        vec!["Income".to_string(), ctx.money(store.total_income())],
        vec!["Expense".to_string(), ctx.money(store.total_expense())],
        vec![
            "Balance".to_string(),
            signed_money(ctx, store.balance()),
        ],
    ];
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&["", "Total"], data));
    }
    Ok(())
}

pub(crate) fn signed_money(ctx: &AppContext, amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-{}", ctx.money(amount))
    } else {
        ctx.money(amount)
    }
}
