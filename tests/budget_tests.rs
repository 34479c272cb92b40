// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use spendwise::commands::transactions::{self, TxInput};
use spendwise::commands::{budgets, categories};
use spendwise::db;
use spendwise::error::ValidationError;
use spendwise::models::{Budget, TxKind, WarningThreshold};
use spendwise::notify::{Notification, Notifier};

struct Silent;

impl Notifier for Silent {
    fn notify(&self, _: &Notification) {}
}

fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let cat = categories::add_category(&conn, "Mua sắm", TxKind::Expense, "🛍️", "#4ECDC4", None)
        .unwrap()
        .id;
    (conn, cat)
}

fn budget(month: &str, limit: i64, threshold: WarningThreshold) -> Budget {
    Budget {
        month: month.into(),
        monthly_limit: Decimal::from(limit),
        warning_threshold: threshold,
        in_app_notifications: true,
        email_notifications: false,
    }
}

fn spend(conn: &Connection, cat: i64, amount: i64, on: &str) -> Option<Notification> {
    let date = NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap();
    let input = TxInput {
        kind: TxKind::Expense,
        amount: Decimal::from(amount),
        category_id: cat,
        subcategory_id: None,
        wallet_id: None,
        date,
        note: None,
    };
    transactions::add_transaction(conn, &input, date, &Silent).unwrap().1
}

#[test]
fn budget_carries_forward_until_replaced() {
    let (conn, _) = setup();
    budgets::set_budget(&conn, &budget("2025-01", 1_000, WarningThreshold::P80)).unwrap();
    budgets::set_budget(&conn, &budget("2025-04", 2_000, WarningThreshold::P90)).unwrap();

    assert!(budgets::effective_budget(&conn, "2024-12").unwrap().is_none());
    let march = budgets::effective_budget(&conn, "2025-03").unwrap().unwrap();
    assert_eq!(march.month, "2025-01");
    assert_eq!(march.monthly_limit, Decimal::from(1_000));
    let june = budgets::effective_budget(&conn, "2025-06").unwrap().unwrap();
    assert_eq!(june.warning_threshold, WarningThreshold::P90);

    // Setting the same month again replaces it
    budgets::set_budget(&conn, &budget("2025-04", 3_000, WarningThreshold::P70)).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 2);
    let april = budgets::effective_budget(&conn, "2025-04").unwrap().unwrap();
    assert_eq!(april.monthly_limit, Decimal::from(3_000));
}

#[test]
fn invalid_budgets_are_rejected() {
    let (conn, _) = setup();
    let err = budgets::set_budget(&conn, &budget("2025-01", 0, WarningThreshold::P80)).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::NonPositiveLimit(Decimal::ZERO))
    );
    assert!(budgets::set_budget(&conn, &budget("2025-13", 10, WarningThreshold::P80)).is_err());
    assert_eq!(
        "75".parse::<WarningThreshold>(),
        Err(ValidationError::InvalidThreshold("75".into()))
    );
    assert_eq!("90%".parse::<WarningThreshold>(), Ok(WarningThreshold::P90));
}

#[test]
fn status_reports_spend_against_limit() {
    let (conn, cat) = setup();
    budgets::set_budget(&conn, &budget("2025-05", 1_000, WarningThreshold::P80)).unwrap();
    spend(&conn, cat, 300, "2025-05-02");
    spend(&conn, cat, 550, "2025-05-09");
    spend(&conn, cat, 999, "2025-06-01");

    let s = budgets::budget_status(&conn, "2025-05").unwrap().unwrap();
    assert_eq!(s.spent, Decimal::from(850));
    assert_eq!(s.threshold_amount, Decimal::from(800));
    assert_eq!(s.percentage, Decimal::from(85));
    assert!(s.is_over_threshold);
    assert!(!s.is_over_limit);

    let history = budgets::budget_history(
        &conn,
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        4,
    )
    .unwrap();
    let months: Vec<&str> = history.iter().map(|h| h.month.as_str()).collect();
    assert_eq!(months, vec!["2025-06", "2025-05"]);
}

#[test]
fn alert_log_keeps_in_app_and_email_rows() {
    let (conn, cat) = setup();
    let mut b = budget("2025-05", 1_000, WarningThreshold::P70);
    b.email_notifications = true;
    budgets::set_budget(&conn, &b).unwrap();

    assert!(spend(&conn, cat, 600, "2025-05-02").is_none());
    assert!(spend(&conn, cat, 200, "2025-05-03").is_some());
    assert!(spend(&conn, cat, 100, "2025-05-04").is_none());

    let log = budgets::list_alerts(&conn, Some("2025-05")).unwrap();
    assert_eq!(log.len(), 2);
    let channels: Vec<&str> = log.iter().map(|a| a.channel.as_str()).collect();
    assert!(channels.contains(&"in_app"));
    assert!(channels.contains(&"email"));
    assert!(log.iter().all(|a| a.threshold == 70 && a.spent == "800"));
    assert!(budgets::list_alerts(&conn, Some("2025-04")).unwrap().is_empty());
}

#[test]
fn in_app_off_still_queues_email() {
    let (conn, cat) = setup();
    let mut b = budget("2025-05", 1_000, WarningThreshold::P80);
    b.in_app_notifications = false;
    b.email_notifications = true;
    budgets::set_budget(&conn, &b).unwrap();

    assert!(spend(&conn, cat, 1_200, "2025-05-02").is_none());
    let log = budgets::list_alerts(&conn, None).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].channel, "email");
    assert_eq!(log[0].threshold, 101);
}
