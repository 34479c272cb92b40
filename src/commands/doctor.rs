// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::WarningThreshold;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = find_issues(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// `[issue, detail]` pairs for everything that breaks a ledger invariant.
pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Wallets below zero
    let mut stmt = conn.prepare("SELECT name, balance FROM wallets ORDER BY name")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let bal: String = r.get(1)?;
        match bal.parse::<Decimal>() {
            Ok(d) if d < Decimal::ZERO => {
                rows.push(vec!["negative_wallet_balance".into(), format!("{} {}", name, d)])
            }
            Ok(_) => {}
            Err(_) => rows.push(vec!["unreadable_balance".into(), format!("{} '{}'", name, bal)]),
        }
    }

    // 2) Transaction kind disagrees with its category
    let mut stmt2 = conn.prepare(
        "SELECT t.id, t.kind, c.name, c.kind FROM transactions t
         JOIN categories c ON t.category_id=c.id WHERE t.kind<>c.kind ORDER BY t.id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        let cat: String = r.get(2)?;
        let cat_kind: String = r.get(3)?;
        rows.push(vec![
            "kind_mismatch".into(),
            format!("#{} is {} but '{}' is {}", id, kind, cat, cat_kind),
        ]);
    }

    // 3) Amounts that are not strictly positive
    let mut stmt3 = conn.prepare("SELECT id, amount FROM transactions ORDER BY id")?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let amt: String = r.get(1)?;
        let ok = amt.parse::<Decimal>().map(|d| d > Decimal::ZERO).unwrap_or(false);
        if !ok {
            rows.push(vec!["bad_amount".into(), format!("#{} '{}'", id, amt)]);
        }
    }

    // 4) Budgets the evaluator would ignore or reject
    let mut stmt4 =
        conn.prepare("SELECT month, monthly_limit, warning_threshold FROM budgets ORDER BY month")?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let month: String = r.get(0)?;
        let limit: String = r.get(1)?;
        let threshold: u32 = r.get(2)?;
        let positive = limit.parse::<Decimal>().map(|d| d > Decimal::ZERO).unwrap_or(false);
        if !positive {
            rows.push(vec!["budget_limit".into(), format!("{} '{}'", month, limit)]);
        }
        if WarningThreshold::try_from(threshold).is_err() {
            rows.push(vec!["budget_threshold".into(), format!("{} {}%", month, threshold)]);
        }
    }

    Ok(rows)
}
