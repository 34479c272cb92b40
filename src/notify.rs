// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Budget, Locale};
use crate::policy::{BudgetImpact, whole_percent};
use crate::utils::fmt_money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Displays a notification. Nothing is returned to the caller.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Prints notifications to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: &Notification) {
        println!("{}", n.title);
        println!("  {}", n.body);
    }
}

fn month_name(month: u32, locale: Locale) -> String {
    match locale {
        Locale::Vi => format!("Tháng {}", month),
        Locale::En => [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ]
        .get(month.saturating_sub(1) as usize)
        .map(|s| s.to_string())
        .unwrap_or_default(),
    }
}

/// Budget alert text. Over-limit wording wins whenever the new total is
/// above the limit.
pub fn budget_alert(
    impact: &BudgetImpact,
    budget: &Budget,
    month: NaiveDate,
    locale: Locale,
) -> Notification {
    let title = match (impact.is_over_limit, locale) {
        (true, Locale::Vi) => "⚠️ Cảnh báo: Đã vượt ngân sách!",
        (false, Locale::Vi) => "⚠️ Cảnh báo ngân sách!",
        (true, Locale::En) => "⚠️ Budget exceeded!",
        (false, Locale::En) => "⚠️ Budget warning!",
    };
    let body = format!(
        "{}: {} / {} ({}%)",
        month_name(month.month(), locale),
        fmt_money(&impact.new_total, locale),
        fmt_money(&budget.monthly_limit, locale),
        whole_percent(impact.percentage_of_limit),
    );
    Notification {
        title: title.to_string(),
        body,
    }
}
