// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{budgets, categories, wallets};
use crate::error::ValidationError;
use crate::models::{Budget, Locale, Transaction, TxKind};
use crate::notify::{ConsoleNotifier, Notification, Notifier};
use crate::policy::{self, evaluate_budget_impact, evaluate_edit_impact, same_month};
use crate::utils::{
    decimal_column, get_locale, id_for_category, id_for_wallet, maybe_print_json, month_key,
    parse_amount, parse_date, parse_month, pretty_table, today,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let as_of = today();
    let notifier = ConsoleNotifier;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub, as_of, &notifier)?,
        Some(("edit", sub)) => edit(conn, sub, as_of, &notifier)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let t = remove_transaction(conn, id)?;
            println!("Removed {} {} on {}", t.kind, t.amount, t.date);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// A transaction about to be written, with references already resolved.
#[derive(Debug, Clone)]
pub struct TxInput {
    pub kind: TxKind,
    pub amount: Decimal,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub wallet_id: Option<i64>,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Partial update for `tx edit`. `Some(None)` clears an optional reference.
#[derive(Debug, Clone, Default)]
pub struct TxUpdate {
    pub kind: Option<TxKind>,
    pub amount: Option<Decimal>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<Option<i64>>,
    pub wallet_id: Option<Option<i64>>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Resolve category names for `kind`; the subcategory is looked up under the
/// category.
pub fn resolve_category(
    conn: &Connection,
    kind: TxKind,
    category: &str,
    subcategory: Option<&str>,
) -> Result<(i64, Option<i64>)> {
    let cat_id = match id_for_category(conn, category, Some(kind), None) {
        Ok(id) => id,
        Err(e) => {
            // Named category exists, but for the other kind
            let other = id_for_category(conn, category, None, None).map_err(|_| e)?;
            let cat = categories::get_category(conn, other)?;
            return Err(ValidationError::KindMismatch {
                category: cat.name,
                expected: cat.kind.to_string(),
                actual: kind.to_string(),
            }
            .into());
        }
    };
    let sub_id = subcategory
        .map(|s| id_for_category(conn, s, Some(kind), Some(cat_id)))
        .transpose()?;
    Ok((cat_id, sub_id))
}

fn add(
    conn: &Connection,
    sub: &clap::ArgMatches,
    as_of: NaiveDate,
    notifier: &dyn Notifier,
) -> Result<()> {
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let (category_id, subcategory_id) = resolve_category(
        conn,
        kind,
        sub.get_one::<String>("category").unwrap(),
        sub.get_one::<String>("subcategory").map(|s| s.as_str()),
    )?;
    let wallet_id = sub
        .get_one::<String>("wallet")
        .map(|w| id_for_wallet(conn, w))
        .transpose()?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => as_of,
    };
    let note = sub
        .get_one::<String>("note")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let input = TxInput {
        kind,
        amount,
        category_id,
        subcategory_id,
        wallet_id,
        date,
        note,
    };
    let (t, _) = add_transaction(conn, &input, as_of, notifier)?;
    println!("Recorded {} {} on {} (#{})", t.kind, t.amount, t.date, t.id);
    Ok(())
}

fn edit(
    conn: &Connection,
    sub: &clap::ArgMatches,
    as_of: NaiveDate,
    notifier: &dyn Notifier,
) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = get_transaction(conn, id)?;
    let kind = sub
        .get_one::<String>("kind")
        .map(|k| k.parse::<TxKind>())
        .transpose()?;
    let effective_kind = kind.unwrap_or(current.kind);

    let mut update = TxUpdate {
        kind,
        amount: sub
            .get_one::<String>("amount")
            .map(|a| parse_amount(a))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|d| parse_date(d))
            .transpose()?,
        note: sub.get_one::<String>("note").cloned(),
        ..TxUpdate::default()
    };
    if let Some(cat) = sub.get_one::<String>("category") {
        let (cat_id, sub_id) = resolve_category(
            conn,
            effective_kind,
            cat,
            sub.get_one::<String>("subcategory").map(|s| s.as_str()),
        )?;
        update.category_id = Some(cat_id);
        update.subcategory_id = Some(sub_id);
    } else if let Some(s) = sub.get_one::<String>("subcategory") {
        let sub_id = id_for_category(conn, s, Some(effective_kind), Some(current.category_id))?;
        update.subcategory_id = Some(Some(sub_id));
    }
    if sub.get_flag("no-subcategory") {
        update.subcategory_id = Some(None);
    }
    if let Some(w) = sub.get_one::<String>("wallet") {
        update.wallet_id = Some(Some(id_for_wallet(conn, w)?));
    }
    if sub.get_flag("no-wallet") {
        update.wallet_id = Some(None);
    }

    let (t, _) = edit_transaction(conn, id, update, as_of, notifier)?;
    println!("Updated #{}: {} {} on {}", t.id, t.kind, t.amount, t.date);
    Ok(())
}

type TransactionRecord = (
    i64,
    String,
    String,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

const SELECT_TX: &str =
    "SELECT id, kind, date, amount, category_id, subcategory_id, wallet_id, note FROM transactions";

fn map_tx(r: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
    ))
}

fn into_tx(raw: TransactionRecord) -> Result<Transaction> {
    let (id, kind, date, amount, category_id, subcategory_id, wallet_id, note) = raw;
    Ok(Transaction {
        id,
        kind: kind.parse()?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' on transaction {}", date, id))?,
        amount: decimal_column(&amount, "amount")?,
        category_id,
        subcategory_id,
        wallet_id,
        note,
    })
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let raw = conn
        .query_row(&format!("{} WHERE id=?1", SELECT_TX), params![id], map_tx)
        .with_context(|| format!("Transaction {} not found", id))?;
    into_tx(raw)
}

/// Every expense dated in `month`'s calendar month.
pub fn expenses_in_month(conn: &Connection, month: NaiveDate) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE kind='expense' AND substr(date,1,7)=?1 ORDER BY date, id",
        SELECT_TX
    ))?;
    let rows = stmt.query_map(params![month_key(month)], map_tx)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(into_tx(row?)?);
    }
    Ok(out)
}

fn check_category(conn: &Connection, input: &TxInput) -> Result<()> {
    let cat = categories::get_category(conn, input.category_id)?;
    if cat.kind != input.kind {
        return Err(ValidationError::KindMismatch {
            category: cat.name,
            expected: cat.kind.to_string(),
            actual: input.kind.to_string(),
        }
        .into());
    }
    if let Some(sid) = input.subcategory_id {
        let s = categories::get_category(conn, sid)?;
        if s.parent_id != Some(cat.id) {
            anyhow::bail!("'{}' is not a subcategory of '{}'", s.name, cat.name);
        }
    }
    Ok(())
}

/// Reject an expense that would take its wallet below zero. `credit_back` is
/// the amount returned to the wallet by reverting the previous version of the
/// transaction.
fn check_funds(conn: &Connection, input: &TxInput, credit_back: Decimal) -> Result<()> {
    let Some(wid) = input.wallet_id else {
        return Ok(());
    };
    if input.kind != TxKind::Expense {
        return Ok(());
    }
    let w = wallets::get_wallet(conn, wid)?;
    let available = w.balance + credit_back;
    if available - input.amount < Decimal::ZERO {
        return Err(ValidationError::InsufficientFunds {
            wallet: w.name,
            available,
        }
        .into());
    }
    Ok(())
}

fn validate(conn: &Connection, input: &TxInput) -> Result<()> {
    if input.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(input.amount).into());
    }
    check_category(conn, input)
}

/// What a transaction adds to `as_of`'s monthly expense total.
fn contribution(kind: TxKind, date: NaiveDate, amount: Decimal, as_of: NaiveDate) -> Decimal {
    if kind == TxKind::Expense && same_month(date, as_of) {
        amount
    } else {
        Decimal::ZERO
    }
}

/// Budget in force for `as_of`'s month and the locale its alert is worded in.
fn budget_context(conn: &Connection, as_of: NaiveDate) -> Result<Option<(Budget, Locale)>> {
    match budgets::effective_budget(conn, &month_key(as_of))? {
        Some(budget) => Ok(Some((budget, get_locale(conn)?))),
        None => Ok(None),
    }
}

/// Write transactions take the database lock up front so the monthly total
/// they evaluate against cannot move underneath them.
fn begin_write(conn: &Connection) -> Result<rusqlite::Transaction<'_>> {
    Ok(rusqlite::Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// Record a transaction, move its wallet balance and evaluate the monthly
/// budget. Returns the stored transaction and the alert raised, if any.
/// Nothing is written when any step fails.
pub fn add_transaction(
    conn: &Connection,
    input: &TxInput,
    as_of: NaiveDate,
    notifier: &dyn Notifier,
) -> Result<(Transaction, Option<Notification>)> {
    let tx = begin_write(conn)?;
    validate(&tx, input)?;
    check_funds(&tx, input, Decimal::ZERO)?;
    let change = contribution(input.kind, input.date, input.amount, as_of);
    let context = if change > Decimal::ZERO {
        budget_context(&tx, as_of)?
    } else {
        None
    };
    let before = policy::monthly_expense_total(&expenses_in_month(&tx, as_of)?, as_of, None);

    tx.execute(
        "INSERT INTO transactions(kind, date, amount, category_id, subcategory_id, wallet_id, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.kind.as_str(),
            input.date.to_string(),
            input.amount.to_string(),
            input.category_id,
            input.subcategory_id,
            input.wallet_id,
            input.note
        ],
    )?;
    let id = tx.last_insert_rowid();
    if let Some(wid) = input.wallet_id {
        wallets::adjust_balance(&tx, wid, input.kind.wallet_effect(input.amount))?;
    }
    let alert = match &context {
        Some((budget, locale)) => {
            let impact = evaluate_budget_impact(before, change, budget);
            budgets::raise_alerts(&tx, budget, &impact, as_of, *locale)?
        }
        None => None,
    };
    tx.commit()?;
    tracing::info!(id, kind = %input.kind, amount = %input.amount, "transaction recorded");

    if let Some(n) = &alert {
        notifier.notify(n);
    }
    Ok((get_transaction(conn, id)?, alert))
}

/// Apply `update` to transaction `id`. The previous wallet effect is reversed
/// before the new one is applied.
pub fn edit_transaction(
    conn: &Connection,
    id: i64,
    update: TxUpdate,
    as_of: NaiveDate,
    notifier: &dyn Notifier,
) -> Result<(Transaction, Option<Notification>)> {
    let tx = begin_write(conn)?;
    let old = get_transaction(&tx, id)?;
    let mut input = TxInput {
        kind: update.kind.unwrap_or(old.kind),
        amount: update.amount.unwrap_or(old.amount),
        category_id: update.category_id.unwrap_or(old.category_id),
        subcategory_id: update.subcategory_id.unwrap_or(old.subcategory_id),
        wallet_id: update.wallet_id.unwrap_or(old.wallet_id),
        date: update.date.unwrap_or(old.date),
        note: old.note.clone(),
    };
    if let Some(note) = update.note {
        input.note = Some(note.trim().to_string()).filter(|n| !n.is_empty());
    }
    validate(&tx, &input)?;
    let credit_back = if old.wallet_id.is_some() && old.wallet_id == input.wallet_id {
        -old.kind.wallet_effect(old.amount)
    } else {
        Decimal::ZERO
    };
    check_funds(&tx, &input, credit_back)?;

    let change = contribution(input.kind, input.date, input.amount, as_of);
    let context = if change > Decimal::ZERO {
        budget_context(&tx, as_of)?
    } else {
        None
    };
    let excluding =
        policy::monthly_expense_total(&expenses_in_month(&tx, as_of)?, as_of, Some(id));
    let previous = contribution(old.kind, old.date, old.amount, as_of);

    if let Some(wid) = old.wallet_id {
        wallets::adjust_balance(&tx, wid, -old.kind.wallet_effect(old.amount))?;
    }
    tx.execute(
        "UPDATE transactions SET kind=?1, date=?2, amount=?3, category_id=?4, subcategory_id=?5,
             wallet_id=?6, note=?7 WHERE id=?8",
        params![
            input.kind.as_str(),
            input.date.to_string(),
            input.amount.to_string(),
            input.category_id,
            input.subcategory_id,
            input.wallet_id,
            input.note,
            id
        ],
    )?;
    if let Some(wid) = input.wallet_id {
        wallets::adjust_balance(&tx, wid, input.kind.wallet_effect(input.amount))?;
    }
    let alert = match &context {
        Some((budget, locale)) => {
            let impact = evaluate_edit_impact(excluding, previous, change, budget);
            budgets::raise_alerts(&tx, budget, &impact, as_of, *locale)?
        }
        None => None,
    };
    tx.commit()?;
    tracing::info!(id, amount = %input.amount, "transaction updated");

    if let Some(n) = &alert {
        notifier.notify(n);
    }
    Ok((get_transaction(conn, id)?, alert))
}

/// Delete a transaction and give its wallet effect back.
pub fn remove_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let tx = begin_write(conn)?;
    let t = get_transaction(&tx, id)?;
    if let Some(wid) = t.wallet_id {
        wallets::adjust_balance(&tx, wid, -t.kind.wallet_effect(t.amount))?;
    }
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;
    tracing::info!(id, "transaction removed");
    Ok(t)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let category = match &r.subcategory {
                    Some(s) => format!("{} / {}", r.category, s),
                    None => r.category.clone(),
                };
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    category,
                    r.wallet.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Category", "Wallet", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub wallet: String,
    pub note: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, t.amount, c.name, s.name, w.name, t.note
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         LEFT JOIN categories s ON t.subcategory_id=s.id
         LEFT JOIN wallets w ON t.wallet_id=w.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(parse_month(month)?);
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.parse::<TxKind>()?.as_str().to_string());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND (lower(c.name)=lower(?) OR lower(s.name)=lower(?))");
        params_vec.push(cat.trim().to_string());
        params_vec.push(cat.trim().to_string());
    }
    if let Some(wallet) = sub.get_one::<String>("wallet") {
        sql.push_str(" AND lower(w.name)=lower(?)");
        params_vec.push(wallet.trim().to_string());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let search = sub
        .get_one::<String>("search")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        if data.len() >= limit {
            break;
        }
        let row = TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            kind: r.get(2)?,
            amount: r.get(3)?,
            category: r.get::<_, Option<String>>(4)?.unwrap_or_default(),
            subcategory: r.get(5)?,
            wallet: r.get::<_, Option<String>>(6)?.unwrap_or_default(),
            note: r.get::<_, Option<String>>(7)?.unwrap_or_default(),
        };
        if let Some(q) = &search {
            let hay = format!(
                "{} {} {}",
                row.note,
                row.category,
                row.subcategory.as_deref().unwrap_or_default()
            )
            .to_lowercase();
            if !hay.contains(q.as_str()) {
                continue;
            }
        }
        data.push(row);
    }
    Ok(data)
}
