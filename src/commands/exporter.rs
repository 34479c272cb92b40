// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::{self, PeriodFilter};
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
            let out = sub.get_one::<String>("out").unwrap();
            let n = export_transactions(conn, &fmt, Path::new(out))?;
            println!("Exported {} transactions to {}", n, out);
        }
        Some(("statistics", sub)) => {
            let year = *sub.get_one::<i32>("year").unwrap();
            let month = sub.get_one::<String>("month").map(|s| s.as_str());
            let out = sub.get_one::<String>("out").unwrap();
            export_statistics(conn, year, month, Path::new(out))?;
            println!("Exported statistics to {}", out);
        }
        _ => {}
    }
    Ok(())
}

type ExportRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

pub fn export_transactions(conn: &Connection, fmt: &str, out: &Path) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT t.date, t.kind, t.amount, c.name, s.name, w.name, t.note
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         LEFT JOIN categories s ON t.subcategory_id=s.id
         LEFT JOIN wallets w ON t.wallet_id=w.id
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get(0)?,
            r.get(1)?,
            r.get(2)?,
            r.get(3)?,
            r.get(4)?,
            r.get(5)?,
            r.get(6)?,
        ))
    })?;
    let mut data: Vec<ExportRow> = Vec::new();
    for row in rows {
        data.push(row?);
    }

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Cannot write {}", out.display()))?;
            wtr.write_record([
                "date",
                "kind",
                "amount",
                "category",
                "subcategory",
                "wallet",
                "note",
            ])?;
            for (d, k, amt, cat, sub, wallet, note) in &data {
                wtr.write_record([
                    d.as_str(),
                    k.as_str(),
                    amt.as_str(),
                    cat.as_deref().unwrap_or_default(),
                    sub.as_deref().unwrap_or_default(),
                    wallet.as_deref().unwrap_or_default(),
                    note.as_deref().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = data
                .iter()
                .map(|(d, k, amt, cat, sub, wallet, note)| {
                    json!({
                        "date": d, "kind": k, "amount": amt, "category": cat,
                        "subcategory": sub, "wallet": wallet, "note": note
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Cannot write {}", out.display()))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(rows = data.len(), path = %out.display(), "transactions exported");
    Ok(data.len())
}

/// Period totals followed by the month-by-month comparison for `year`.
pub fn export_statistics(
    conn: &Connection,
    year: i32,
    month: Option<&str>,
    out: &Path,
) -> Result<()> {
    let entries = reports::load_ledger(conn)?;
    let filter = PeriodFilter {
        year: Some(year),
        month: month.map(crate::utils::parse_month).transpose()?,
        ..PeriodFilter::default()
    };
    let period = filter.month.clone().unwrap_or_else(|| year.to_string());
    let s = reports::summary(&entries, &filter);

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(out)
        .with_context(|| format!("Cannot write {}", out.display()))?;
    wtr.write_record(["period", period.as_str()])?;
    wtr.write_record(["total_income", format!("{:.2}", s.income).as_str()])?;
    wtr.write_record(["total_expense", format!("{:.2}", s.expense).as_str()])?;
    wtr.write_record(["net", format!("{:.2}", s.net).as_str()])?;
    wtr.write_record(["income_count", s.income_count.to_string().as_str()])?;
    wtr.write_record(["expense_count", s.expense_count.to_string().as_str()])?;
    wtr.write_record(["month", "income", "expense", "net"])?;
    for r in reports::monthly(&entries, year) {
        wtr.write_record([
            r.month.clone(),
            format!("{:.2}", r.income),
            format!("{:.2}", r.expense),
            format!("{:.2}", r.income - r.expense),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
