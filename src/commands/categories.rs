// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use crate::models::{Category, TxKind};
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Default tree installed by `category seed`: (name, kind, icon, color, parent).
const DEFAULTS: &[(&str, TxKind, &str, &str, Option<&str>)] = &[
    ("Ăn uống", TxKind::Expense, "🍽️", "#FF6B6B", None),
    ("Nhà hàng", TxKind::Expense, "🍴", "#FF8787", Some("Ăn uống")),
    ("Siêu thị", TxKind::Expense, "🛒", "#FFA07A", Some("Ăn uống")),
    ("Di chuyển", TxKind::Expense, "🚗", "#4ECDC4", None),
    ("Xăng xe", TxKind::Expense, "⛽", "#5FD3C9", Some("Di chuyển")),
    ("Giao thông công cộng", TxKind::Expense, "🚌", "#7FDAD5", Some("Di chuyển")),
    ("Mua sắm", TxKind::Expense, "🛍️", "#45B7D1", None),
    ("Lương", TxKind::Income, "💰", "#96CEB4", None),
    ("Lương chính", TxKind::Income, "💼", "#A7D8BF", Some("Lương")),
    ("Thưởng", TxKind::Income, "🎁", "#B8E3CA", Some("Lương")),
    ("Freelance", TxKind::Income, "💻", "#FFEAA7", None),
];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let parent = sub
                .get_one::<String>("parent")
                .map(|p| id_for_category(conn, p, Some(kind), None))
                .transpose()?;
            let c = add_category(
                conn,
                sub.get_one::<String>("name").unwrap(),
                kind,
                sub.get_one::<String>("icon").unwrap(),
                sub.get_one::<String>("color").unwrap(),
                parent,
            )?;
            println!("Added {} category '{}'", c.kind, c.name);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("kind")
                .map(|k| k.parse::<TxKind>())
                .transpose()?;
            let cats = list_categories(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                println!("{}", pretty_table(&["Category", "Kind", "Color"], tree_rows(&cats)));
            }
        }
        Some(("edit", sub)) => {
            let id = resolve(conn, sub)?;
            let c = edit_category(
                conn,
                id,
                sub.get_one::<String>("rename").map(|s| s.as_str()),
                sub.get_one::<String>("icon").map(|s| s.as_str()),
                sub.get_one::<String>("color").map(|s| s.as_str()),
            )?;
            println!("Updated category '{}'", c.name);
        }
        Some(("rm", sub)) => {
            let id = resolve(conn, sub)?;
            let c = remove_category(conn, id)?;
            println!("Removed category '{}'", c.name);
        }
        Some(("seed", _)) => {
            let added = seed_defaults(conn)?;
            println!("Seeded {} categories", added);
        }
        _ => {}
    }
    Ok(())
}

fn resolve(conn: &Connection, sub: &clap::ArgMatches) -> Result<i64> {
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let parent = sub
        .get_one::<String>("parent")
        .map(|p| id_for_category(conn, p, Some(kind), None))
        .transpose()?;
    id_for_category(conn, sub.get_one::<String>("name").unwrap(), Some(kind), parent)
}

fn tree_rows(cats: &[Category]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for top in cats.iter().filter(|c| c.parent_id.is_none()) {
        rows.push(vec![
            format!("{} {}", top.icon, top.name),
            top.kind.to_string(),
            top.color.clone(),
        ]);
        for child in cats.iter().filter(|c| c.parent_id == Some(top.id)) {
            rows.push(vec![
                format!("  └ {} {}", child.icon, child.name),
                child.kind.to_string(),
                child.color.clone(),
            ]);
        }
    }
    rows
}

type CategoryRow = (i64, String, String, String, String, Option<i64>);

fn map_category(r: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn into_category(raw: CategoryRow) -> Result<Category> {
    let (id, name, kind, icon, color, parent_id) = raw;
    Ok(Category {
        id,
        name,
        kind: kind.parse()?,
        icon,
        color,
        parent_id,
    })
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Category> {
    let raw = conn
        .query_row(
            "SELECT id, name, kind, icon, color, parent_id FROM categories WHERE id=?1",
            params![id],
            map_category,
        )
        .with_context(|| format!("Category {} not found", id))?;
    into_category(raw)
}

pub fn list_categories(conn: &Connection, kind: Option<TxKind>) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind, icon, color, parent_id FROM categories
         WHERE (?1 IS NULL OR kind=?1) ORDER BY kind, name",
    )?;
    let rows = stmt.query_map(params![kind.map(|k| k.as_str())], map_category)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(into_category(row?)?);
    }
    Ok(out)
}

fn duplicate_error(name: &str, kind: TxKind, parent: Option<i64>) -> ValidationError {
    ValidationError::DuplicateCategory {
        level: if parent.is_some() { "subcategory" } else { "category" },
        name: name.to_string(),
        kind: kind.to_string(),
    }
}

fn name_taken(
    conn: &Connection,
    name: &str,
    kind: TxKind,
    parent: Option<i64>,
    except: Option<i64>,
) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories
             WHERE lower(trim(name))=lower(?1) AND kind=?2
               AND ((?3 IS NULL AND parent_id IS NULL) OR parent_id=?3)
               AND (?4 IS NULL OR id<>?4)",
            params![name.trim(), kind.as_str(), parent, except],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

pub fn add_category(
    conn: &Connection,
    name: &str,
    kind: TxKind,
    icon: &str,
    color: &str,
    parent: Option<i64>,
) -> Result<Category> {
    let name = name.trim();
    if let Some(pid) = parent {
        let p = get_category(conn, pid)?;
        if p.parent_id.is_some() {
            return Err(ValidationError::NestedTooDeep.into());
        }
        if p.kind != kind {
            return Err(ValidationError::KindMismatch {
                category: p.name,
                expected: p.kind.to_string(),
                actual: kind.to_string(),
            }
            .into());
        }
    }
    if name_taken(conn, name, kind, parent, None)? {
        return Err(duplicate_error(name, kind, parent).into());
    }
    conn.execute(
        "INSERT INTO categories(name, kind, icon, color, parent_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, kind.as_str(), icon, color, parent],
    )?;
    get_category(conn, conn.last_insert_rowid())
}

pub fn edit_category(
    conn: &Connection,
    id: i64,
    rename: Option<&str>,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<Category> {
    let mut c = get_category(conn, id)?;
    if let Some(name) = rename {
        let name = name.trim();
        if name_taken(conn, name, c.kind, c.parent_id, Some(id))? {
            return Err(duplicate_error(name, c.kind, c.parent_id).into());
        }
        c.name = name.to_string();
    }
    if let Some(icon) = icon {
        c.icon = icon.to_string();
    }
    if let Some(color) = color {
        c.color = color.to_string();
    }
    conn.execute(
        "UPDATE categories SET name=?1, icon=?2, color=?3 WHERE id=?4",
        params![c.name, c.icon, c.color, id],
    )?;
    Ok(c)
}

/// Remove a category and its subcategories, refusing while any transaction
/// still points at either.
pub fn remove_category(conn: &Connection, id: i64) -> Result<Category> {
    let c = get_category(conn, id)?;
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions
         WHERE category_id IN (SELECT id FROM categories WHERE id=?1 OR parent_id=?1)
            OR subcategory_id IN (SELECT id FROM categories WHERE id=?1 OR parent_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(ValidationError::CategoryInUse(c.name).into());
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM categories WHERE parent_id=?1", params![id])?;
    tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    tx.commit()?;
    Ok(c)
}

/// Insert the default categories that are not present yet.
pub fn seed_defaults(conn: &Connection) -> Result<usize> {
    let mut added = 0;
    for (name, kind, icon, color, parent) in DEFAULTS {
        let parent_id = match parent {
            Some(p) => Some(id_for_category(conn, p, Some(*kind), None)?),
            None => None,
        };
        if name_taken(conn, name, *kind, parent_id, None)? {
            continue;
        }
        add_category(conn, name, *kind, icon, color, parent_id)?;
        added += 1;
    }
    tracing::info!(added, "default categories seeded");
    Ok(added)
}
