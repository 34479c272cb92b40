// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::{Locale, TxKind};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    month_start(s)?;
    Ok(s.to_string())
}

/// First day of a `YYYY-MM` month.
pub fn month_start(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Month key `back` months before `date`'s month.
pub fn months_back(date: NaiveDate, back: u32) -> String {
    let idx = date.year() * 12 + date.month0() as i32 - back as i32;
    format!("{:04}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1)
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(d).into());
    }
    Ok(d)
}

pub fn parse_switch(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "on" | "true" | "yes" | "1"
    )
}

pub fn decimal_column(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}' in database", what, s))
}

/// Group the integer part of `d` with the locale's separator and append `₫`.
pub fn fmt_money(d: &Decimal, locale: Locale) -> String {
    let (group, point) = match locale {
        Locale::Vi => ('.', ','),
        Locale::En => (',', '.'),
    };
    let rounded = d.round_dp(2).normalize();
    let neg = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group);
        }
        grouped.push(ch);
    }
    let mut out = String::new();
    if neg {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push(point);
        out.push_str(&f);
    }
    out.push('₫');
    out
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_wallet(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM wallets WHERE lower(name)=lower(?1)")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Wallet '{}' not found", name.trim()))?;
    Ok(id)
}

/// Look up a top-level category (`parent` None) or a subcategory of `parent`.
pub fn id_for_category(
    conn: &Connection,
    name: &str,
    kind: Option<TxKind>,
    parent: Option<i64>,
) -> Result<i64> {
    let mut stmt = conn.prepare(
        "SELECT id FROM categories
         WHERE lower(name)=lower(?1)
           AND (?2 IS NULL OR kind=?2)
           AND ((?3 IS NULL AND parent_id IS NULL) OR parent_id=?3)
         ORDER BY id LIMIT 1",
    )?;
    let id: i64 = stmt
        .query_row(
            params![name.trim(), kind.map(|k| k.as_str()), parent],
            |r| r.get(0),
        )
        .with_context(|| format!("Category '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn get_locale(conn: &Connection) -> Result<Locale> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key='locale'", [], |r| {
            r.get(0)
        })
        .optional()?;
    match v {
        Some(s) => Ok(s.parse()?),
        None => Ok(Locale::Vi),
    }
}

pub fn set_locale(conn: &Connection, locale: Locale) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('locale', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![locale.as_str()],
    )?;
    Ok(())
}
