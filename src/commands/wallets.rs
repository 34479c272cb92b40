// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use crate::models::Wallet;
use crate::utils::{
    decimal_column, fmt_money, get_locale, id_for_wallet, maybe_print_json, parse_decimal,
    pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let icon = sub.get_one::<String>("icon").unwrap();
            let color = sub.get_one::<String>("color").unwrap();
            let description = sub.get_one::<String>("description").map(|s| s.as_str());
            let w = add_wallet(conn, name, balance, icon, color, description)?;
            println!("Added wallet '{}' ({})", w.name, w.balance);
        }
        Some(("list", sub)) => {
            let wallets = list_wallets(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &wallets)? {
                let locale = get_locale(conn)?;
                let rows = wallets
                    .iter()
                    .map(|w| {
                        vec![
                            format!("{} {}", w.icon, w.name),
                            fmt_money(&w.balance, locale),
                            w.description.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Wallet", "Balance", "Description"], rows));
            }
        }
        Some(("edit", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let update = WalletUpdate {
                name: sub.get_one::<String>("rename").cloned(),
                balance: sub
                    .get_one::<String>("balance")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
                icon: sub.get_one::<String>("icon").cloned(),
                color: sub.get_one::<String>("color").cloned(),
                description: sub.get_one::<String>("description").cloned(),
            };
            let id = id_for_wallet(conn, name)?;
            let w = edit_wallet(conn, id, update)?;
            println!("Updated wallet '{}'", w.name);
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_wallet(conn, name)?;
            remove_wallet(conn, id)?;
            println!("Removed wallet '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct WalletUpdate {
    pub name: Option<String>,
    pub balance: Option<Decimal>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

type WalletRow = (i64, String, String, String, String, Option<String>);

fn map_wallet(r: &Row<'_>) -> rusqlite::Result<WalletRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn into_wallet(raw: WalletRow) -> Result<Wallet> {
    let (id, name, balance, icon, color, description) = raw;
    Ok(Wallet {
        id,
        balance: decimal_column(&balance, "wallet balance")?,
        name,
        icon,
        color,
        description,
    })
}

fn name_taken(conn: &Connection, name: &str, except: Option<i64>) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM wallets WHERE lower(trim(name))=lower(?1) AND (?2 IS NULL OR id<>?2)",
            params![name.trim(), except],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

pub fn add_wallet(
    conn: &Connection,
    name: &str,
    balance: Decimal,
    icon: &str,
    color: &str,
    description: Option<&str>,
) -> Result<Wallet> {
    let name = name.trim();
    if name_taken(conn, name, None)? {
        return Err(ValidationError::DuplicateWallet(name.to_string()).into());
    }
    if balance < Decimal::ZERO {
        return Err(ValidationError::NegativeBalance(balance).into());
    }
    conn.execute(
        "INSERT INTO wallets(name, balance, icon, color, description) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, balance.to_string(), icon, color, description],
    )?;
    get_wallet(conn, conn.last_insert_rowid())
}

pub fn get_wallet(conn: &Connection, id: i64) -> Result<Wallet> {
    let raw = conn
        .query_row(
            "SELECT id, name, balance, icon, color, description FROM wallets WHERE id=?1",
            params![id],
            map_wallet,
        )
        .with_context(|| format!("Wallet {} not found", id))?;
    into_wallet(raw)
}

pub fn list_wallets(conn: &Connection) -> Result<Vec<Wallet>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, balance, icon, color, description FROM wallets ORDER BY name",
    )?;
    let rows = stmt.query_map([], map_wallet)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(into_wallet(row?)?);
    }
    Ok(out)
}

pub fn edit_wallet(conn: &Connection, id: i64, update: WalletUpdate) -> Result<Wallet> {
    let mut w = get_wallet(conn, id)?;
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name_taken(conn, &name, Some(id))? {
            return Err(ValidationError::DuplicateWallet(name).into());
        }
        w.name = name;
    }
    if let Some(balance) = update.balance {
        if balance < Decimal::ZERO {
            return Err(ValidationError::NegativeBalance(balance).into());
        }
        w.balance = balance;
    }
    if let Some(icon) = update.icon {
        w.icon = icon;
    }
    if let Some(color) = update.color {
        w.color = color;
    }
    if let Some(description) = update.description {
        w.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    conn.execute(
        "UPDATE wallets SET name=?1, balance=?2, icon=?3, color=?4, description=?5 WHERE id=?6",
        params![w.name, w.balance.to_string(), w.icon, w.color, w.description, id],
    )?;
    Ok(w)
}

pub fn remove_wallet(conn: &Connection, id: i64) -> Result<()> {
    let w = get_wallet(conn, id)?;
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE wallet_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(ValidationError::WalletInUse(w.name).into());
    }
    conn.execute("DELETE FROM wallets WHERE id=?1", params![id])?;
    Ok(())
}

/// Add `delta` to a wallet's stored balance.
pub fn adjust_balance(conn: &Connection, id: i64, delta: Decimal) -> Result<Decimal> {
    let w = get_wallet(conn, id)?;
    let balance = w.balance + delta;
    conn.execute(
        "UPDATE wallets SET balance=?1 WHERE id=?2",
        params![balance.to_string(), id],
    )?;
    tracing::debug!(wallet = %w.name, %delta, %balance, "wallet balance adjusted");
    Ok(balance)
}
