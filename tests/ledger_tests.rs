// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use spendwise::commands::transactions::{self, TxInput};
use spendwise::commands::wallets::{self, WalletUpdate};
use spendwise::commands::{categories, doctor};
use spendwise::db;
use spendwise::error::ValidationError;
use spendwise::models::{Locale, TxKind};
use spendwise::notify::ConsoleNotifier;
use spendwise::utils::{fmt_money, get_locale, id_for_category, set_locale};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn validation(err: &anyhow::Error) -> Option<&ValidationError> {
    err.downcast_ref::<ValidationError>()
}

#[test]
fn wallet_names_are_unique_ignoring_case_and_spaces() {
    let conn = setup();
    wallets::add_wallet(&conn, "Cash", Decimal::from(100), "💵", "#fff", None).unwrap();
    let err = wallets::add_wallet(&conn, "  cash ", Decimal::ZERO, "💵", "#fff", None).unwrap_err();
    assert_eq!(
        validation(&err),
        Some(&ValidationError::DuplicateWallet("cash".into()))
    );
    let err =
        wallets::add_wallet(&conn, "Bank", Decimal::from(-1), "🏦", "#000", None).unwrap_err();
    assert!(matches!(validation(&err), Some(ValidationError::NegativeBalance(_))));
}

#[test]
fn wallet_edit_and_guarded_delete() {
    let conn = setup();
    let w = wallets::add_wallet(&conn, "Cash", Decimal::from(500), "💵", "#fff", None).unwrap();
    let other = wallets::add_wallet(&conn, "Bank", Decimal::ZERO, "🏦", "#000", None).unwrap();
    let err = wallets::edit_wallet(
        &conn,
        other.id,
        WalletUpdate {
            name: Some("CASH".into()),
            ..WalletUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(validation(&err), Some(ValidationError::DuplicateWallet(_))));

    let edited = wallets::edit_wallet(
        &conn,
        w.id,
        WalletUpdate {
            description: Some("Ví chính".into()),
            ..WalletUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(edited.description.as_deref(), Some("Ví chính"));

    let cat = categories::add_category(&conn, "Food", TxKind::Expense, "🍜", "#f00", None)
        .unwrap()
        .id;
    let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let input = TxInput {
        kind: TxKind::Expense,
        amount: Decimal::from(50),
        category_id: cat,
        subcategory_id: None,
        wallet_id: Some(w.id),
        date,
        note: None,
    };
    let (t, _) = transactions::add_transaction(&conn, &input, date, &ConsoleNotifier).unwrap();
    let err = wallets::remove_wallet(&conn, w.id).unwrap_err();
    assert!(matches!(validation(&err), Some(ValidationError::WalletInUse(_))));

    transactions::remove_transaction(&conn, t.id).unwrap();
    wallets::remove_wallet(&conn, w.id).unwrap();
    assert_eq!(wallets::list_wallets(&conn).unwrap().len(), 1);
}

#[test]
fn categories_nest_one_level_with_matching_kind() {
    let conn = setup();
    let food = categories::add_category(&conn, "Food", TxKind::Expense, "🍜", "#f00", None).unwrap();
    let dining =
        categories::add_category(&conn, "Dining", TxKind::Expense, "🍴", "#f00", Some(food.id))
            .unwrap();
    assert_eq!(dining.parent_id, Some(food.id));

    let err = categories::add_category(&conn, "Late", TxKind::Expense, "🌙", "#f00", Some(dining.id))
        .unwrap_err();
    assert_eq!(validation(&err), Some(&ValidationError::NestedTooDeep));

    let err = categories::add_category(&conn, "Tips", TxKind::Income, "💵", "#0f0", Some(food.id))
        .unwrap_err();
    assert!(matches!(validation(&err), Some(ValidationError::KindMismatch { .. })));

    // Same name is fine under another kind, not twice under the same one
    categories::add_category(&conn, "Food", TxKind::Income, "🍜", "#0f0", None).unwrap();
    let err = categories::add_category(&conn, "food", TxKind::Expense, "🍜", "#f00", None)
        .unwrap_err();
    assert!(matches!(
        validation(&err),
        Some(ValidationError::DuplicateCategory { level: "category", .. })
    ));
}

#[test]
fn category_delete_cascades_to_children_unless_used() {
    let conn = setup();
    let food = categories::add_category(&conn, "Food", TxKind::Expense, "🍜", "#f00", None).unwrap();
    let dining =
        categories::add_category(&conn, "Dining", TxKind::Expense, "🍴", "#f00", Some(food.id))
            .unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let input = TxInput {
        kind: TxKind::Expense,
        amount: Decimal::from(10),
        category_id: food.id,
        subcategory_id: Some(dining.id),
        wallet_id: None,
        date,
        note: None,
    };
    let (t, _) = transactions::add_transaction(&conn, &input, date, &ConsoleNotifier).unwrap();
    let err = categories::remove_category(&conn, food.id).unwrap_err();
    assert!(matches!(validation(&err), Some(ValidationError::CategoryInUse(_))));

    transactions::remove_transaction(&conn, t.id).unwrap();
    categories::remove_category(&conn, food.id).unwrap();
    assert!(categories::list_categories(&conn, None).unwrap().is_empty());
}

#[test]
fn seeding_is_idempotent() {
    let conn = setup();
    let first = categories::seed_defaults(&conn).unwrap();
    assert_eq!(first, 11);
    assert_eq!(categories::seed_defaults(&conn).unwrap(), 0);

    let expenses = categories::list_categories(&conn, Some(TxKind::Expense)).unwrap();
    assert_eq!(expenses.len(), 7);
    let parent = id_for_category(&conn, "Di chuyển", Some(TxKind::Expense), None).unwrap();
    assert!(id_for_category(&conn, "Xăng xe", Some(TxKind::Expense), Some(parent)).is_ok());
}

#[test]
fn locale_defaults_to_vietnamese() {
    let conn = setup();
    assert_eq!(get_locale(&conn).unwrap(), Locale::Vi);
    set_locale(&conn, Locale::En).unwrap();
    assert_eq!(get_locale(&conn).unwrap(), Locale::En);
    assert!("fr-FR".parse::<Locale>().is_err());

    assert_eq!(fmt_money(&Decimal::from(5_000_000), Locale::Vi), "5.000.000₫");
    assert_eq!(fmt_money(&Decimal::from(1_234_567), Locale::En), "1,234,567₫");
    assert_eq!(fmt_money(&Decimal::new(-150, 2), Locale::Vi), "-1,5₫");
    assert_eq!(fmt_money(&Decimal::from(999), Locale::Vi), "999₫");
}

#[test]
fn doctor_flags_broken_rows() {
    let conn = setup();
    assert!(doctor::find_issues(&conn).unwrap().is_empty());

    let w = wallets::add_wallet(&conn, "Cash", Decimal::ZERO, "💵", "#fff", None).unwrap();
    conn.execute("UPDATE wallets SET balance='-20' WHERE id=?1", params![w.id])
        .unwrap();
    let salary = categories::add_category(&conn, "Salary", TxKind::Income, "💰", "#0f0", None)
        .unwrap();
    conn.execute(
        "INSERT INTO transactions(kind, date, amount, category_id) VALUES ('expense','2025-01-01','0',?1)",
        params![salary.id],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO budgets(month, monthly_limit, warning_threshold) VALUES ('2025-01','-5',75)",
        [],
    )
    .unwrap();

    let issues: Vec<String> = doctor::find_issues(&conn)
        .unwrap()
        .into_iter()
        .map(|r| r[0].clone())
        .collect();
    assert_eq!(
        issues,
        vec![
            "negative_wallet_balance",
            "kind_mismatch",
            "bad_amount",
            "budget_limit",
            "budget_threshold"
        ]
    );
}

#[test]
fn explicit_db_path_is_created_and_reopened() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.sqlite");
    {
        let conn = db::open_or_init(Some(&path)).unwrap();
        wallets::add_wallet(&conn, "Cash", Decimal::ONE, "💵", "#fff", None).unwrap();
    }
    assert!(path.exists());
    let conn = db::open_or_init(Some(&path)).unwrap();
    assert_eq!(wallets::list_wallets(&conn).unwrap().len(), 1);
}
