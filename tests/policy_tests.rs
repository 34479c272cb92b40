// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendwise::models::{Budget, Locale, Transaction, TxKind, WarningThreshold};
use spendwise::notify::budget_alert;
use spendwise::policy::{
    evaluate_budget_impact, evaluate_edit_impact, monthly_expense_total, whole_percent,
};

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

fn budget(limit: i64, threshold: WarningThreshold) -> Budget {
    Budget {
        month: "2025-03".into(),
        monthly_limit: d(limit),
        warning_threshold: threshold,
        in_app_notifications: true,
        email_notifications: false,
    }
}

fn five_million() -> Budget {
    budget(5_000_000, WarningThreshold::P80)
}

#[test]
fn under_threshold_is_silent() {
    let i = evaluate_budget_impact(d(3_000_000), d(500_000), &five_million());
    assert_eq!(i.new_total, d(3_500_000));
    assert_eq!(i.threshold_amount, d(4_000_000));
    assert!(!i.crossed_threshold);
    assert!(!i.crossed_limit);
    assert!(!i.should_notify(&five_million()));
}

#[test]
fn crossing_the_threshold_fires_once() {
    let b = five_million();
    let i = evaluate_budget_impact(d(3_500_000), d(700_000), &b);
    assert_eq!(i.new_total, d(4_200_000));
    assert!(i.crossed_threshold);
    assert!(!i.crossed_limit);
    assert!(i.should_notify(&b));

    let again = evaluate_budget_impact(d(4_200_000), d(300_000), &b);
    assert!(!again.crossed_threshold);
    assert!(!again.crossed_limit);
    assert!(!again.should_notify(&b));
}

#[test]
fn crossing_the_limit_after_warning() {
    let i = evaluate_budget_impact(d(4_500_000), d(600_000), &five_million());
    assert_eq!(i.new_total, d(5_100_000));
    assert!(!i.crossed_threshold);
    assert!(i.crossed_limit);
    assert!(i.is_over_limit);
    assert_eq!(i.percentage_of_limit, d(102));
}

#[test]
fn single_huge_expense_crosses_both_with_over_limit_wording() {
    let b = five_million();
    let i = evaluate_budget_impact(Decimal::ZERO, d(5_500_000), &b);
    assert!(i.crossed_threshold);
    assert!(i.crossed_limit);
    assert_eq!(i.alert_level(&b), 101);

    let month = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let vi = budget_alert(&i, &b, month, Locale::Vi);
    assert_eq!(vi.title, "⚠️ Cảnh báo: Đã vượt ngân sách!");
    assert_eq!(vi.body, "Tháng 3: 5.500.000₫ / 5.000.000₫ (110%)");
    let en = budget_alert(&i, &b, month, Locale::En);
    assert_eq!(en.title, "⚠️ Budget exceeded!");
}

#[test]
fn warning_wording_below_limit() {
    let b = five_million();
    let i = evaluate_budget_impact(d(3_500_000), d(700_000), &b);
    let month = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let n = budget_alert(&i, &b, month, Locale::Vi);
    assert_eq!(n.title, "⚠️ Cảnh báo ngân sách!");
    assert_eq!(n.body, "Tháng 3: 4.200.000₫ / 5.000.000₫ (84%)");
}

#[test]
fn exact_threshold_counts_as_reached() {
    let i = evaluate_budget_impact(d(3_999_999), d(1), &five_million());
    assert!(i.crossed_threshold);
    // Reaching the limit exactly is not over it
    let j = evaluate_budget_impact(d(4_000_000), d(1_000_000), &five_million());
    assert!(!j.crossed_limit);
    assert!(!j.is_over_limit);
}

#[test]
fn running_total_fires_threshold_exactly_once() {
    let b = budget(1_000, WarningThreshold::P70);
    let amounts = [100, 250, 300, 60, 10, 200, 5, 40];
    let mut total = Decimal::ZERO;
    let mut threshold_fires = 0;
    let mut limit_fires = 0;
    for a in amounts {
        let i = evaluate_budget_impact(total, d(a), &b);
        if i.crossed_threshold {
            threshold_fires += 1;
            assert!(total < d(700) && i.new_total >= d(700));
        }
        if i.crossed_limit {
            limit_fires += 1;
        }
        total = i.new_total;
    }
    assert_eq!(threshold_fires, 1);
    assert_eq!(limit_fires, 0);
    assert_eq!(total, d(965));
}

#[test]
fn hundred_percent_threshold_fires_with_limit() {
    let b = budget(1_000, WarningThreshold::P100);
    for (existing, change) in [(0, 999), (500, 501), (1_001, 5), (0, 2_000), (200, 300)] {
        let i = evaluate_budget_impact(d(existing), d(change), &b);
        assert_eq!(i.crossed_threshold, i.crossed_limit, "{existing}+{change}");
    }
    let both = evaluate_budget_impact(d(900), d(200), &b);
    assert!(both.crossed_threshold && both.crossed_limit);

    // The flags part ways only on the limit itself
    let onto_limit = evaluate_budget_impact(d(900), d(100), &b);
    assert!(onto_limit.crossed_threshold);
    assert!(!onto_limit.crossed_limit);
    let off_limit = evaluate_budget_impact(d(1_000), d(5), &b);
    assert!(!off_limit.crossed_threshold);
    assert!(off_limit.crossed_limit);
}

#[test]
fn display_percent_rounds_half_away_from_zero() {
    assert_eq!(whole_percent(Decimal::new(845, 1)), d(85));
    assert_eq!(whole_percent(Decimal::new(844, 1)), d(84));
    assert_eq!(whole_percent(Decimal::new(825, 1)), d(83));

    let b = budget(1_000, WarningThreshold::P80);
    let i = evaluate_budget_impact(d(700), d(145), &b);
    let n = budget_alert(&i, &b, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), Locale::En);
    assert_eq!(n.body, "March: 845₫ / 1,000₫ (85%)");
}

#[test]
fn percentage_never_decreases_with_total() {
    let b = five_million();
    let mut last = Decimal::MIN;
    for total in (0..=12).map(|k| d(k * 500_000)) {
        let p = evaluate_budget_impact(total, Decimal::ZERO, &b).percentage_of_limit;
        assert!(p >= last);
        last = p;
    }
}

#[test]
fn disabled_budget_never_crosses() {
    for limit in [0, -100] {
        let b = budget(limit, WarningThreshold::P80);
        for (existing, change) in [(0, 1), (0, 1_000_000), (-50, 60), (10, 0)] {
            let i = evaluate_budget_impact(d(existing), d(change), &b);
            assert!(!i.crossed_threshold);
            assert!(!i.crossed_limit);
            assert!(!i.should_notify(&b));
            assert_eq!(i.percentage_of_limit, Decimal::ZERO);
        }
    }
}

#[test]
fn in_app_off_suppresses_notification_but_not_crossing() {
    let mut b = five_million();
    b.in_app_notifications = false;
    let i = evaluate_budget_impact(d(3_500_000), d(700_000), &b);
    assert!(i.crossed_threshold);
    assert!(!i.should_notify(&b));
}

#[test]
fn edit_within_the_same_zone_stays_quiet() {
    let b = five_million();
    // 4.2M before, the edited expense grows from 300k to 500k: still warning zone
    let i = evaluate_edit_impact(d(3_900_000), d(300_000), d(500_000), &b);
    assert_eq!(i.new_total, d(4_400_000));
    assert!(!i.crossed_threshold);
    assert!(!i.crossed_limit);
}

#[test]
fn edit_that_moves_into_a_new_zone_fires() {
    let b = five_million();
    // 3.6M before, the edit lifts the total to 4.1M
    let i = evaluate_edit_impact(d(3_500_000), d(100_000), d(600_000), &b);
    assert!(i.crossed_threshold);
    // 4.6M before, the edit pushes it past the limit
    let j = evaluate_edit_impact(d(4_500_000), d(100_000), d(900_000), &b);
    assert!(!j.crossed_threshold);
    assert!(j.crossed_limit);
    // Already over before the edit
    let k = evaluate_edit_impact(d(4_500_000), d(700_000), d(800_000), &b);
    assert!(!k.crossed_limit);
    assert!(k.is_over_limit);
}

#[test]
fn monthly_total_counts_only_expenses_in_month() {
    let tx = |id, kind, amount, date: &str| Transaction {
        id,
        kind,
        category_id: 1,
        subcategory_id: None,
        amount: d(amount),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        wallet_id: None,
        note: None,
    };
    let txs = vec![
        tx(1, TxKind::Expense, 100, "2025-03-01"),
        tx(2, TxKind::Expense, 200, "2025-03-31"),
        tx(3, TxKind::Income, 5_000, "2025-03-10"),
        tx(4, TxKind::Expense, 400, "2025-02-28"),
        tx(5, TxKind::Expense, 800, "2024-03-15"),
    ];
    let month = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
    assert_eq!(monthly_expense_total(&txs, month, None), d(300));
    assert_eq!(monthly_expense_total(&txs, month, Some(2)), d(100));
}
