// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::{
    decimal_column, fmt_money, get_locale, maybe_print_json, parse_month, pretty_table,
};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("overview", sub)) => overview_cmd(conn, sub)?,
        Some(("summary", sub)) => summary_cmd(conn, sub)?,
        Some(("by-category", sub)) => by_category_cmd(conn, sub)?,
        Some(("monthly", sub)) => monthly_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Which transactions a statistic covers. A month narrows a year.
#[derive(Debug, Clone, Default)]
pub struct PeriodFilter {
    pub year: Option<i32>,
    pub month: Option<String>,
    pub kind: Option<TxKind>,
    pub search: Option<String>,
}

impl PeriodFilter {
    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        let month = sub
            .get_one::<String>("month")
            .map(|m| parse_month(m))
            .transpose()?;
        let kind = match sub.try_get_one::<String>("kind") {
            Ok(Some(k)) => Some(k.parse::<TxKind>()?),
            _ => None,
        };
        let search = match sub.try_get_one::<String>("search") {
            Ok(Some(s)) => Some(s.trim().to_lowercase()).filter(|s| !s.is_empty()),
            _ => None,
        };
        Ok(PeriodFilter {
            year: sub.get_one::<i32>("year").copied(),
            month,
            kind,
            search,
        })
    }

    fn matches(&self, e: &LedgerEntry) -> bool {
        if let Some(y) = self.year {
            if e.date.year() != y {
                return false;
            }
        }
        if let Some(m) = &self.month {
            if !e.date.to_string().starts_with(m.as_str()) {
                return false;
            }
        }
        if let Some(k) = self.kind {
            if e.kind != k {
                return false;
            }
        }
        if let Some(q) = &self.search {
            let hay = format!(
                "{} {} {}",
                e.note,
                e.category,
                e.subcategory.as_deref().unwrap_or_default()
            )
            .to_lowercase();
            if !hay.contains(q.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub kind: TxKind,
    pub date: NaiveDate,
    pub amount: Decimal,
    /// Top-level category; subcategory spend rolls up here.
    pub category: String,
    pub subcategory: Option<String>,
    pub note: String,
}

pub fn load_ledger(conn: &Connection) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT t.kind, t.date, t.amount, c.name, s.name, t.note
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         LEFT JOIN categories s ON t.subcategory_id=s.id
         ORDER BY t.date, t.id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let kind: String = r.get(0)?;
        let d: String = r.get(1)?;
        let amt: String = r.get(2)?;
        out.push(LedgerEntry {
            kind: kind.parse()?,
            date: NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}' in transactions", d))?,
            amount: decimal_column(&amt, "amount")?,
            category: r
                .get::<_, Option<String>>(3)?
                .unwrap_or_else(|| "(uncategorized)".into()),
            subcategory: r.get(4)?,
            note: r.get::<_, Option<String>>(5)?.unwrap_or_default(),
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub income_count: usize,
    pub expense_count: usize,
}

pub fn summary(entries: &[LedgerEntry], filter: &PeriodFilter) -> Summary {
    let mut s = Summary::default();
    for e in entries.iter().filter(|e| filter.matches(e)) {
        match e.kind {
            TxKind::Income => {
                s.income += e.amount;
                s.income_count += 1;
            }
            TxKind::Expense => {
                s.expense += e.amount;
                s.expense_count += 1;
            }
        }
    }
    s.net = s.income - s.expense;
    s
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub kind: TxKind,
    pub total: Decimal,
    /// Percent of the kind's total in the period.
    pub share: Decimal,
}

pub fn by_category(entries: &[LedgerEntry], filter: &PeriodFilter) -> Vec<CategoryShare> {
    let mut agg: BTreeMap<(TxKind, String), Decimal> = BTreeMap::new();
    let mut kind_totals: BTreeMap<TxKind, Decimal> = BTreeMap::new();
    for e in entries.iter().filter(|e| filter.matches(e)) {
        *agg.entry((e.kind, e.category.clone())).or_insert(Decimal::ZERO) += e.amount;
        *kind_totals.entry(e.kind).or_insert(Decimal::ZERO) += e.amount;
    }
    let mut items: Vec<CategoryShare> = agg
        .into_iter()
        .filter(|(_, total)| *total > Decimal::ZERO)
        .map(|((kind, category), total)| {
            let kind_total = kind_totals.get(&kind).copied().unwrap_or(Decimal::ZERO);
            let share = if kind_total.is_zero() {
                Decimal::ZERO
            } else {
                (total / kind_total * Decimal::ONE_HUNDRED).round_dp(2)
            };
            CategoryShare {
                category,
                kind,
                total,
                share,
            }
        })
        .collect();
    items.sort_by(|a, b| {
        a.kind
            .as_str()
            .cmp(b.kind.as_str())
            .then(b.total.cmp(&a.total))
            .then(a.category.cmp(&b.category))
    });
    items
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Income and expense for each of the twelve months of `year`.
pub fn monthly(entries: &[LedgerEntry], year: i32) -> Vec<MonthRow> {
    let mut rows: Vec<MonthRow> = (1..=12)
        .map(|m| MonthRow {
            month: format!("{:04}-{:02}", year, m),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        })
        .collect();
    for e in entries.iter().filter(|e| e.date.year() == year) {
        let row = &mut rows[e.date.month0() as usize];
        match e.kind {
            TxKind::Income => row.income += e.amount,
            TxKind::Expense => row.expense += e.amount,
        }
    }
    rows
}

fn overview_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let s = summary(&load_ledger(conn)?, &PeriodFilter::default());
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let locale = get_locale(conn)?;
        let data = vec![vec![
            fmt_money(&s.income, locale),
            fmt_money(&s.expense, locale),
            fmt_money(&s.net, locale),
        ]];
        println!("{}", pretty_table(&["Income", "Expense", "Balance"], data));
    }
    Ok(())
}

fn summary_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = PeriodFilter::from_matches(sub)?;
    let s = summary(&load_ledger(conn)?, &filter);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        let locale = get_locale(conn)?;
        let data = vec![vec![
            format!("{} ({})", fmt_money(&s.income, locale), s.income_count),
            format!("{} ({})", fmt_money(&s.expense, locale), s.expense_count),
            fmt_money(&s.net, locale),
        ]];
        println!("{}", pretty_table(&["Income (n)", "Expense (n)", "Net"], data));
    }
    Ok(())
}

fn by_category_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = PeriodFilter::from_matches(sub)?;
    let items = by_category(&load_ledger(conn)?, &filter);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        let locale = get_locale(conn)?;
        let data = items
            .iter()
            .map(|i| {
                vec![
                    i.category.clone(),
                    i.kind.to_string(),
                    fmt_money(&i.total, locale),
                    format!("{:.1}%", i.share),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Kind", "Total", "Share"], data));
    }
    Ok(())
}

fn monthly_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let year = *sub.get_one::<i32>("year").unwrap();
    let rows = monthly(&load_ledger(conn)?, year);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let locale = get_locale(conn)?;
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    fmt_money(&r.income, locale),
                    fmt_money(&r.expense, locale),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense"], data));
    }
    Ok(())
}
