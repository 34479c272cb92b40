// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::expenses_in_month;
use crate::error::ValidationError;
use crate::models::{AlertChannel, Budget, BudgetAlert, Locale, WarningThreshold};
use crate::notify::{self, Notification};
use crate::policy::{self, BudgetImpact};
use crate::utils::{
    decimal_column, fmt_money, get_locale, maybe_print_json, month_key, month_start,
    months_back, parse_decimal, parse_month, parse_switch, pretty_table, today,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let as_of = today();
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub, as_of)?,
        Some(("show", sub)) => show(conn, sub, as_of)?,
        Some(("history", sub)) => history(conn, sub, as_of)?,
        Some(("alerts", sub)) => alerts(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches, as_of: NaiveDate) -> Result<()> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => parse_month(m)?,
        None => month_key(as_of),
    };
    let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
    let threshold: WarningThreshold = sub.get_one::<String>("threshold").unwrap().parse()?;
    let previous = effective_budget(conn, &month)?;
    let in_app = sub
        .get_one::<String>("in-app")
        .map(|s| parse_switch(s))
        .or(previous.as_ref().map(|b| b.in_app_notifications))
        .unwrap_or(true);
    let email = sub
        .get_one::<String>("email")
        .map(|s| parse_switch(s))
        .or(previous.as_ref().map(|b| b.email_notifications))
        .unwrap_or(false);

    let budget = Budget {
        month,
        monthly_limit: limit,
        warning_threshold: threshold,
        in_app_notifications: in_app,
        email_notifications: email,
    };
    set_budget(conn, &budget)?;
    println!(
        "Budget from {}: limit {}, warning at {}",
        budget.month,
        fmt_money(&budget.monthly_limit, get_locale(conn)?),
        budget.warning_threshold
    );
    Ok(())
}

/// Store `budget` for its month, replacing any budget already set there.
pub fn set_budget(conn: &Connection, budget: &Budget) -> Result<()> {
    if budget.monthly_limit <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveLimit(budget.monthly_limit).into());
    }
    month_start(&budget.month)?;
    conn.execute(
        "INSERT INTO budgets(month, monthly_limit, warning_threshold, notify_in_app, notify_email)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(month) DO UPDATE SET
             monthly_limit=excluded.monthly_limit,
             warning_threshold=excluded.warning_threshold,
             notify_in_app=excluded.notify_in_app,
             notify_email=excluded.notify_email",
        params![
            budget.month,
            budget.monthly_limit.to_string(),
            budget.warning_threshold.percent(),
            budget.in_app_notifications,
            budget.email_notifications
        ],
    )?;
    tracing::info!(month = %budget.month, limit = %budget.monthly_limit, "budget set");
    Ok(())
}

/// The budget in force for `month`: the latest one set on or before it.
pub fn effective_budget(conn: &Connection, month: &str) -> Result<Option<Budget>> {
    let row: Option<(String, String, u32, bool, bool)> = conn
        .query_row(
            "SELECT month, monthly_limit, warning_threshold, notify_in_app, notify_email
             FROM budgets WHERE month<=?1 ORDER BY month DESC LIMIT 1",
            params![month],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let Some((month, limit, threshold, in_app, email)) = row else {
        return Ok(None);
    };
    Ok(Some(Budget {
        monthly_limit: decimal_column(&limit, "budget limit")?,
        warning_threshold: WarningThreshold::try_from(threshold)
            .with_context(|| format!("Budget for {} has an invalid threshold", month))?,
        month,
        in_app_notifications: in_app,
        email_notifications: email,
    }))
}

/// Log the alerts a budget impact calls for and return the in-app
/// notification to show, if any. Runs inside the caller's write transaction;
/// showing the notification is left to the caller once that commits.
pub fn raise_alerts(
    conn: &Connection,
    budget: &Budget,
    impact: &BudgetImpact,
    as_of: NaiveDate,
    locale: Locale,
) -> Result<Option<Notification>> {
    tracing::debug!(
        total = %impact.new_total,
        threshold = %impact.threshold_amount,
        crossed_threshold = impact.crossed_threshold,
        crossed_limit = impact.crossed_limit,
        "budget evaluated"
    );
    if !impact.crossed() {
        return Ok(None);
    }
    let mut shown = None;
    if impact.should_notify(budget) {
        record_alert(conn, budget, impact, as_of, AlertChannel::InApp)?;
        shown = Some(notify::budget_alert(impact, budget, as_of, locale));
    }
    if budget.email_notifications {
        // Picked up by an external mailer; nothing is sent from here
        record_alert(conn, budget, impact, as_of, AlertChannel::Email)?;
    }
    Ok(shown)
}

fn record_alert(
    conn: &Connection,
    budget: &Budget,
    impact: &BudgetImpact,
    as_of: NaiveDate,
    channel: AlertChannel,
) -> Result<()> {
    let level = impact.alert_level(budget);
    conn.execute(
        "INSERT INTO budget_alerts(month, threshold, channel, sent_on, spent, limit_amount, percentage)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            month_key(as_of),
            level,
            channel.as_str(),
            as_of.to_string(),
            impact.new_total.to_string(),
            budget.monthly_limit.to_string(),
            impact.percentage_of_limit.round_dp(2).to_string()
        ],
    )?;
    tracing::info!(level, channel = channel.as_str(), "budget alert recorded");
    Ok(())
}

pub fn list_alerts(conn: &Connection, month: Option<&str>) -> Result<Vec<BudgetAlert>> {
    let mut stmt = conn.prepare(
        "SELECT id, month, threshold, channel, sent_on, spent, limit_amount, percentage
         FROM budget_alerts WHERE (?1 IS NULL OR month=?1) ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok(BudgetAlert {
            id: r.get(0)?,
            month: r.get(1)?,
            threshold: r.get(2)?,
            channel: r.get(3)?,
            sent_on: r.get(4)?,
            spent: r.get(5)?,
            limit: r.get(6)?,
            percentage: r.get(7)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub month: String,
    pub monthly_limit: Decimal,
    pub warning_threshold: u32,
    pub threshold_amount: Decimal,
    pub spent: Decimal,
    pub percentage: Decimal,
    pub is_over_threshold: bool,
    pub is_over_limit: bool,
    pub notify_in_app: bool,
    pub notify_email: bool,
}

/// Spend against the budget in force for `month`, if there is one.
pub fn budget_status(conn: &Connection, month: &str) -> Result<Option<BudgetStatus>> {
    let Some(budget) = effective_budget(conn, month)? else {
        return Ok(None);
    };
    let start = month_start(month)?;
    let spent = policy::monthly_expense_total(&expenses_in_month(conn, start)?, start, None);
    let threshold_amount = policy::threshold_amount(&budget);
    Ok(Some(BudgetStatus {
        month: month.to_string(),
        monthly_limit: budget.monthly_limit,
        warning_threshold: budget.warning_threshold.percent(),
        threshold_amount,
        spent,
        percentage: policy::percentage_of_limit(spent, budget.monthly_limit).round_dp(2),
        is_over_threshold: spent >= threshold_amount,
        is_over_limit: spent > budget.monthly_limit,
        notify_in_app: budget.in_app_notifications,
        notify_email: budget.email_notifications,
    }))
}

/// Status for the last `months` months ending at `as_of`, newest first.
/// Months before the first budget are skipped.
pub fn budget_history(conn: &Connection, as_of: NaiveDate, months: u32) -> Result<Vec<BudgetStatus>> {
    let mut out = Vec::new();
    for back in 0..months {
        if let Some(s) = budget_status(conn, &months_back(as_of, back))? {
            out.push(s);
        }
    }
    Ok(out)
}

fn status_rows(conn: &Connection, data: &[BudgetStatus]) -> Result<Vec<Vec<String>>> {
    let locale = get_locale(conn)?;
    Ok(data
        .iter()
        .map(|s| {
            let state = if s.is_over_limit {
                "over limit"
            } else if s.is_over_threshold {
                "warning"
            } else {
                "ok"
            };
            vec![
                s.month.clone(),
                fmt_money(&s.spent, locale),
                fmt_money(&s.monthly_limit, locale),
                format!(
                    "{}%",
                    policy::whole_percent(policy::percentage_of_limit(s.spent, s.monthly_limit))
                ),
                format!("{}%", s.warning_threshold),
                state.to_string(),
            ]
        })
        .collect())
}

const STATUS_HEADERS: [&str; 6] = ["Month", "Spent", "Limit", "Used", "Warn at", "State"];

fn show(conn: &Connection, sub: &clap::ArgMatches, as_of: NaiveDate) -> Result<()> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => parse_month(m)?,
        None => month_key(as_of),
    };
    let Some(status) = budget_status(conn, &month)? else {
        println!("No budget set for {}", month);
        return Ok(());
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &status)? {
        let rows = status_rows(conn, std::slice::from_ref(&status))?;
        println!("{}", pretty_table(&STATUS_HEADERS, rows));
        let flags = format!(
            "in-app: {}, email: {}",
            if status.notify_in_app { "on" } else { "off" },
            if status.notify_email { "on" } else { "off" }
        );
        println!("Notifications {}", flags);
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches, as_of: NaiveDate) -> Result<()> {
    let months = *sub.get_one::<u32>("months").unwrap_or(&6);
    let data = budget_history(conn, as_of, months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", pretty_table(&STATUS_HEADERS, status_rows(conn, &data)?));
    }
    Ok(())
}

fn alerts(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let data = list_alerts(conn, month.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|a| {
                let level = if a.threshold > 100 {
                    "limit".to_string()
                } else {
                    format!("{}%", a.threshold)
                };
                vec![
                    a.sent_on.clone(),
                    level,
                    a.channel.clone(),
                    a.spent.clone(),
                    a.limit.clone(),
                    format!("{}%", a.percentage),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Sent", "Level", "Channel", "Spent", "Limit", "Used"], rows)
        );
    }
    Ok(())
}
