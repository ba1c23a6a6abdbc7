// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(
        Arg::new("type")
            .long("type")
            .required(required)
            .help("income | expense"),
    )
    .arg(Arg::new("amount").long("amount").required(required))
    .arg(Arg::new("category").long("category").required(required))
    .arg(
        Arg::new("date")
            .long("date")
            .help("YYYY-MM-DD (defaults to today when adding)"),
    )
    .arg(Arg::new("description").long("description"))
    .arg(
        Arg::new("recurring")
            .long("recurring")
            .help("daily | weekly | monthly | quarterly | yearly"),
    )
    .arg(
        Arg::new("no_recurring")
            .long("no-recurring")
            .action(ArgAction::SetTrue)
            .conflicts_with("recurring")
            .help("Make the transaction one-off"),
    )
}

fn budget_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("category").long("category").required(required))
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(
            Arg::new("period")
                .long("period")
                .required(required)
                .help("daily | weekly | monthly | quarterly | yearly"),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .help("YYYY-MM-DD (defaults to today when adding)"),
        )
        .arg(
            Arg::new("alert_threshold")
                .long("alert-threshold")
                .value_parser(value_parser!(u8))
                .help("Alert when progress reaches this percent (1-100)"),
        )
        .arg(
            Arg::new("alerts")
                .long("alerts")
                .action(ArgAction::SetTrue)
                .conflicts_with("no_alerts")
                .help("Turn threshold alerts back on"),
        )
        .arg(
            Arg::new("no_alerts")
                .long("no-alerts")
                .action(ArgAction::SetTrue),
        )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Personal finance tracking: transactions, budgets, reports")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(tx_fields(Command::new("add"), true))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("from").long("from").help("YYYY-MM-DD, inclusive"))
                        .arg(Arg::new("to").long("to").help("YYYY-MM-DD, inclusive"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("type").long("type"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(tx_fields(
                    Command::new("update").arg(Arg::new("id").required(true)),
                    false,
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
                .subcommand(json_flags(Command::new("totals"))),
        )
        .subcommand(
            Command::new("budget")
                .about("Spending ceilings per category")
                .subcommand(budget_fields(Command::new("add"), true))
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("active")
                            .long("active")
                            .action(ArgAction::SetTrue)
                            .help("Only budgets whose window has not ended"),
                    ),
                ))
                .subcommand(budget_fields(
                    Command::new("update").arg(Arg::new("id").required(true)),
                    false,
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
                .subcommand(json_flags(Command::new("alerts"))),
        )
        .subcommand(
            Command::new("settings")
                .about("User preferences")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(Command::new("theme").arg(Arg::new("value").required(true)))
                .subcommand(Command::new("currency").arg(Arg::new("value").required(true)))
                .subcommand(Command::new("language").arg(Arg::new("value").required(true)))
                .subcommand(Command::new("date-format").arg(Arg::new("value").required(true)))
                .subcommand(
                    Command::new("notify")
                        .arg(
                            Arg::new("name")
                                .required(true)
                                .help("budget-alerts | monthly-reports | bill-reminders | unusual-spending"),
                        )
                        .arg(
                            Arg::new("state")
                                .required(true)
                                .value_parser(["on", "off"]),
                        ),
                )
                .subcommand(Command::new("reset")),
        )
        .subcommand(
            Command::new("report")
                .about("Summaries over recorded transactions")
                .subcommand(json_flags(
                    Command::new("summary").arg(
                        Arg::new("period")
                            .long("period")
                            .help("Restrict to the current daily|weekly|monthly|quarterly|yearly window"),
                    ),
                ))
                .subcommand(json_flags(
                    Command::new("by-category").arg(
                        Arg::new("type")
                            .long("type")
                            .default_value("expense"),
                    ),
                ))
                .subcommand(json_flags(Command::new("by-date")))
                .subcommand(json_flags(
                    Command::new("monthly").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(usize))
                            .default_value("12"),
                    ),
                )),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .required(true)
                            .help("csv | json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("auth")
                .about("Remote API session")
                .subcommand(
                    Command::new("login")
                        .arg(Arg::new("user_id").long("user-id").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("token").long("token").required(true))
                        .arg(Arg::new("role").long("role").default_value("user")),
                )
                .subcommand(Command::new("logout"))
                .subcommand(Command::new("status")),
        )
        .subcommand(
            Command::new("sync")
                .about("Replace local data with the remote API's copy")
                .subcommand(Command::new("transactions"))
                .subcommand(Command::new("budgets")),
        )
}
