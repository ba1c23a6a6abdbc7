// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::optional;
use super::transactions::signed_money;
use crate::context::AppContext;
use crate::models::{Period, Transaction, TransactionType};
use crate::utils::{
    TransactionGroup, calculate_percentage, group_by_category, group_by_date, maybe_print_json,
    period_window, pretty_table,
};
use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ctx: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(ctx, sub)?,
        Some(("by-category", sub)) => by_category(ctx, sub)?,
        Some(("by-date", sub)) => by_date(ctx, sub)?,
        Some(("monthly", sub)) => monthly(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub savings_rate: Decimal,
    pub count: usize,
}

pub fn compute_summary(ctx: &AppContext, period: Option<Period>) -> Summary {
    let store = &ctx.transactions;
    let window = period.map(|p| period_window(p, Utc::now().date_naive()));
    let (income, expense, count) = match window {
        None => (
            store.total_income(),
            store.total_expense(),
            store.transactions().len(),
        ),
        Some((from, to)) => {
            let mut income = Decimal::ZERO;
            let mut expense = Decimal::ZERO;
            let mut count = 0;
            for t in store.filter_by_date_range(from, to) {
                match t.kind {
                    TransactionType::Income => income += t.amount,
                    TransactionType::Expense => expense += t.amount,
                }
                count += 1;
            }
            (income, expense, count)
        }
    };
    let balance = income - expense;
    Summary {
        from: window.map(|w| w.0),
        to: window.map(|w| w.1),
        income,
        expense,
        balance,
        savings_rate: calculate_percentage(balance, income),
        count,
    }
}

fn summary(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let period = optional(sub, "period")
        .map(|s| s.parse::<Period>())
        .transpose()?;
    let s = compute_summary(ctx, period);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let span = match (s.from, s.to) {
        (Some(from), Some(to)) => format!("{} - {}", ctx.date(from), ctx.date(to)),
        _ => "all time".to_string(),
    };
    let rows = vec![
        vec!["Period".to_string(), span],
        vec!["Transactions".to_string(), s.count.to_string()],
        vec!["Income".to_string(), ctx.money(s.income)],
        vec!["Expense".to_string(), ctx.money(s.expense)],
        vec!["Balance".to_string(), signed_money(ctx, s.balance)],
        vec!["Savings rate".to_string(), format!("{}%", s.savings_rate)],
    ];
    println!("{}", pretty_table(&["", "Value"], rows));
    Ok(())
}

fn print_groups(
    ctx: &AppContext,
    sub: &clap::ArgMatches,
    header: &str,
    groups: &[TransactionGroup],
    label: impl Fn(&TransactionGroup) -> String,
) -> Result<()> {
    let grand: Decimal = groups.iter().map(|g| g.total).sum();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &groups)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| {
            vec![
                label(g),
                g.count.to_string(),
                ctx.money(g.total),
                format!("{}%", calculate_percentage(g.total, grand)),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&[header, "Count", "Total", "Share"], rows)
    );
    Ok(())
}

fn by_category(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let kind = optional(sub, "type")
        .unwrap_or("expense")
        .parse::<TransactionType>()?;
    let source: &[Transaction] = match kind {
        TransactionType::Income => ctx.transactions.incomes(),
        TransactionType::Expense => ctx.transactions.expenses(),
    };
    let groups = group_by_category(source);
    print_groups(ctx, sub, "Category", &groups, |g| g.key.clone())
}

fn by_date(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let groups = group_by_date(ctx.transactions.expenses());
    print_groups(ctx, sub, "Date", &groups, |g| {
        g.transactions
            .first()
            .map(|t| ctx.date(t.date))
            .unwrap_or_else(|| g.key.clone())
    })
}

fn monthly(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let months = sub.get_one::<usize>("months").copied().unwrap_or(12);
    let mut data = ctx.transactions.monthly_summary();
    data.truncate(months);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|m| {
            vec![
                m.month.clone(),
                ctx.money(m.income),
                ctx.money(m.expense),
                signed_money(ctx, m.net),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expense", "Net"], rows)
    );
    Ok(())
}
