// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly budget threshold evaluation.
//!
//! Everything here is a pure function of its inputs. Callers recompute the
//! "before" total from the ledger on every evaluation; no notification state
//! is kept between calls.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{Budget, Transaction, TxKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetImpact {
    pub new_total: Decimal,
    pub threshold_amount: Decimal,
    pub crossed_threshold: bool,
    pub crossed_limit: bool,
    pub is_over_limit: bool,
    pub percentage_of_limit: Decimal,
}

impl BudgetImpact {
    /// Whether the caller should surface an in-app notification.
    pub fn should_notify(&self, budget: &Budget) -> bool {
        budget.in_app_notifications && self.crossed()
    }

    pub fn crossed(&self) -> bool {
        self.crossed_threshold || self.crossed_limit
    }

    /// Level recorded in the alert log: the warning percent, or 101 once the
    /// limit itself has been crossed.
    pub fn alert_level(&self, budget: &Budget) -> u32 {
        if self.crossed_limit {
            101
        } else {
            budget.warning_threshold.percent()
        }
    }
}

pub fn threshold_amount(budget: &Budget) -> Decimal {
    budget.monthly_limit * Decimal::from(budget.warning_threshold.percent()) / Decimal::ONE_HUNDRED
}

pub fn percentage_of_limit(total: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total / limit * Decimal::ONE_HUNDRED
}

/// Percentage rounded half away from zero for display.
pub fn whole_percent(p: Decimal) -> Decimal {
    p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Evaluate adding `change` of expense on top of `existing` spend this month.
///
/// `existing` must exclude the transaction being evaluated. Only a transition
/// across the threshold or the limit counts as a crossing.
pub fn evaluate_budget_impact(existing: Decimal, change: Decimal, budget: &Budget) -> BudgetImpact {
    let limit = budget.monthly_limit;
    let new_total = existing + change;
    let threshold = threshold_amount(budget);
    let enabled = limit > Decimal::ZERO;

    BudgetImpact {
        new_total,
        threshold_amount: threshold,
        crossed_threshold: enabled && existing < threshold && new_total >= threshold,
        crossed_limit: enabled && existing <= limit && new_total > limit,
        is_over_limit: new_total > limit,
        percentage_of_limit: percentage_of_limit(new_total, limit),
    }
}

/// Evaluate an edited expense.
///
/// `excluding` is the month's spend without the edited transaction and
/// `previous` is what that transaction contributed before the edit (zero when
/// it was an income or fell in another month). A crossing only counts when the
/// pre-edit total had not already reached that zone.
pub fn evaluate_edit_impact(
    excluding: Decimal,
    previous: Decimal,
    new_amount: Decimal,
    budget: &Budget,
) -> BudgetImpact {
    let mut impact = evaluate_budget_impact(excluding, new_amount, budget);
    let before_edit = excluding + previous;
    if before_edit >= impact.threshold_amount {
        impact.crossed_threshold = false;
    }
    if before_edit > budget.monthly_limit {
        impact.crossed_limit = false;
    }
    impact
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Sum of expenses dated in `month`'s calendar month, skipping `excluding`.
pub fn monthly_expense_total<'a, I>(txs: I, month: NaiveDate, excluding: Option<i64>) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    txs.into_iter()
        .filter(|t| t.kind == TxKind::Expense)
        .filter(|t| Some(t.id) != excluding)
        .filter(|t| same_month(t.date, month))
        .map(|t| t.amount)
        .sum()
}
