// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};
use std::path::PathBuf;

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn kind_arg(required: bool) -> Arg {
    Arg::new("kind")
        .long("kind")
        .required(required)
        .value_parser(["income", "expense"])
        .help("income | expense")
}

fn month_arg() -> Arg {
    Arg::new("month").long("month").help("Month as YYYY-MM")
}

fn switch_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(["on", "off"])
        .help(help)
}

pub fn build_cli() -> Command {
    Command::new("spendwise")
        .version(crate_version!())
        .about("Track income and expenses across wallets, with monthly budget alerts")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("SPENDWISE_DB")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the SQLite database"),
        )
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("settings")
                .about("User preferences")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set").arg(
                        Arg::new("locale")
                            .long("locale")
                            .required(true)
                            .help("vi-VN | en-US"),
                    ),
                ),
        )
        .subcommand(
            Command::new("wallet")
                .about("Manage wallets")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("balance").long("balance").default_value("0"))
                        .arg(Arg::new("icon").long("icon").default_value("💳"))
                        .arg(Arg::new("color").long("color").default_value("#4ECDC4"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("rename").long("rename"))
                        .arg(Arg::new("balance").long("balance"))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage income and expense categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(kind_arg(true))
                        .arg(Arg::new("parent").long("parent").help("Parent category name"))
                        .arg(Arg::new("icon").long("icon").default_value("📁"))
                        .arg(Arg::new("color").long("color").default_value("#45B7D1")),
                )
                .subcommand(json_args(Command::new("list").arg(kind_arg(false))))
                .subcommand(
                    Command::new("edit")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(kind_arg(true))
                        .arg(Arg::new("parent").long("parent"))
                        .arg(Arg::new("rename").long("rename"))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(kind_arg(true))
                        .arg(Arg::new("parent").long("parent")),
                )
                .subcommand(Command::new("seed").about("Install the default category tree")),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and browse transactions")
                .subcommand(
                    Command::new("add")
                        .arg(kind_arg(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("subcategory").long("subcategory"))
                        .arg(Arg::new("wallet").long("wallet"))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("YYYY-MM-DD, defaults to today"),
                        )
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(kind_arg(false))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("subcategory").long("subcategory"))
                        .arg(
                            Arg::new("no-subcategory")
                                .long("no-subcategory")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("subcategory"),
                        )
                        .arg(Arg::new("wallet").long("wallet"))
                        .arg(
                            Arg::new("no-wallet")
                                .long("no-wallet")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("wallet"),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(month_arg())
                        .arg(kind_arg(false))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("wallet").long("wallet"))
                        .arg(Arg::new("search").long("search"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budget and alerts")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("limit").long("limit").required(true))
                        .arg(
                            Arg::new("threshold")
                                .long("threshold")
                                .default_value("80")
                                .help("Warning threshold percent: 70 | 80 | 90 | 100"),
                        )
                        .arg(month_arg().help("First month the budget applies to, defaults to this month"))
                        .arg(switch_arg("in-app", "In-app notifications"))
                        .arg(switch_arg("email", "Email notifications")),
                )
                .subcommand(json_args(Command::new("show").arg(month_arg())))
                .subcommand(json_args(
                    Command::new("history").arg(
                        Arg::new("months")
                            .long("months")
                            .default_value("6")
                            .value_parser(value_parser!(u32)),
                    ),
                ))
                .subcommand(json_args(Command::new("alerts").arg(month_arg()))),
        )
        .subcommand(
            Command::new("report")
                .about("Statistics")
                .subcommand(json_args(Command::new("overview")))
                .subcommand(json_args(
                    Command::new("summary")
                        .arg(Arg::new("year").long("year").value_parser(value_parser!(i32)))
                        .arg(month_arg())
                        .arg(kind_arg(false))
                        .arg(Arg::new("search").long("search")),
                ))
                .subcommand(json_args(
                    Command::new("by-category")
                        .arg(Arg::new("year").long("year").value_parser(value_parser!(i32)))
                        .arg(month_arg())
                        .arg(kind_arg(false)),
                ))
                .subcommand(json_args(
                    Command::new("monthly").arg(
                        Arg::new("year")
                            .long("year")
                            .required(true)
                            .value_parser(value_parser!(i32)),
                    ),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv | json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("statistics")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(month_arg())
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check the ledger for inconsistencies"))
}
