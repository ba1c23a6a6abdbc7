// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::required;
use crate::context::AppContext;
use crate::models::{DateFormat, NotificationsPatch, Theme};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ctx: &mut AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(ctx, sub)?,
        Some(("theme", sub)) => {
            let theme = required(sub, "value")?.parse::<Theme>()?;
            ctx.settings.set_theme(theme)?;
            println!("Theme set to {}", theme);
        }
        Some(("currency", sub)) => {
            ctx.settings.set_currency(required(sub, "value")?)?;
            println!("Currency set to {}", ctx.settings.settings().currency);
        }
        Some(("language", sub)) => {
            ctx.settings.set_language(required(sub, "value")?)?;
            println!("Language set to {}", ctx.settings.settings().language);
        }
        Some(("date-format", sub)) => {
            let format = required(sub, "value")?.parse::<DateFormat>()?;
            ctx.settings.set_date_format(format)?;
            println!("Date format set to {}", format);
        }
        Some(("notify", sub)) => {
            let name = required(sub, "name")?;
            let on = required(sub, "state")? == "on";
            ctx.settings.update_notifications(notification_patch(name, on)?)?;
            println!("Notification '{}' turned {}", name, if on { "on" } else { "off" });
        }
        Some(("reset", _)) => {
            ctx.settings.reset_settings()?;
            println!("Settings restored to defaults");
        }
        _ => {}
    }
    Ok(())
}

pub fn notification_patch(name: &str, on: bool) -> Result<NotificationsPatch> {
    let mut patch = NotificationsPatch::default();
    match name.to_lowercase().replace('_', "-").as_str() {
        "budget-alerts" => patch.budget_alerts = Some(on),
        "monthly-reports" => patch.monthly_reports = Some(on),
        "bill-reminders" => patch.bill_reminders = Some(on),
        "unusual-spending" => patch.unusual_spending = Some(on),
        other => bail!(
            "Unknown notification '{}' (use budget-alerts|monthly-reports|bill-reminders|unusual-spending)",
            other
        ),
    }
    Ok(patch)
}

fn show(ctx: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let s = ctx.settings.settings();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
        return Ok(());
    }
    let onoff = |b: bool| (if b { "on" } else { "off" }).to_string();
    let rows = vec![
        vec!["theme".into(), s.theme.to_string()],
        vec!["currency".into(), s.currency.clone()],
        vec!["language".into(), s.language.clone()],
        vec!["date format".into(), s.date_format.to_string()],
        vec!["budget alerts".into(), onoff(s.notifications.budget_alerts)],
        vec!["monthly reports".into(), onoff(s.notifications.monthly_reports)],
        vec!["bill reminders".into(), onoff(s.notifications.bill_reminders)],
        vec!["unusual spending".into(), onoff(s.notifications.unusual_spending)],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}
