// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    /// Signed effect of an amount of this kind on a wallet balance.
    pub fn wallet_effect(&self, amount: Decimal) -> Decimal {
        match self {
            TxKind::Income => amount,
            TxKind::Expense => -amount,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            other => Err(ValidationError::InvalidKind(other.to_string())),
        }
    }
}

/// Early-warning level as a percentage of the monthly limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WarningThreshold {
    P70,
    P80,
    P90,
    P100,
}

impl WarningThreshold {
    pub fn percent(&self) -> u32 {
        match self {
            WarningThreshold::P70 => 70,
            WarningThreshold::P80 => 80,
            WarningThreshold::P90 => 90,
            WarningThreshold::P100 => 100,
        }
    }
}

impl TryFrom<u32> for WarningThreshold {
    type Error = ValidationError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            70 => Ok(WarningThreshold::P70),
            80 => Ok(WarningThreshold::P80),
            90 => Ok(WarningThreshold::P90),
            100 => Ok(WarningThreshold::P100),
            other => Err(ValidationError::InvalidThreshold(other.to_string())),
        }
    }
}

impl From<WarningThreshold> for u32 {
    fn from(t: WarningThreshold) -> u32 {
        t.percent()
    }
}

impl FromStr for WarningThreshold {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let v: u32 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidThreshold(s.trim().to_string()))?;
        WarningThreshold::try_from(v)
    }
}

impl fmt::Display for WarningThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub month: String, // YYYY-MM the budget takes effect from
    pub monthly_limit: Decimal,
    pub warning_threshold: WarningThreshold,
    pub in_app_notifications: bool,
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
    pub balance: Decimal,
    pub icon: String,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: TxKind,
    pub icon: String,
    pub color: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TxKind,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub wallet_id: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    InApp,
    Email,
}

impl AlertChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChannel::InApp => "in_app",
            AlertChannel::Email => "email",
        }
    }
}

/// One row of the budget alert log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: i64,
    pub month: String,
    /// Warning percent that was crossed, or 101 when the limit itself was.
    pub threshold: u32,
    pub channel: String,
    pub sent_on: String,
    pub spent: String,
    pub limit: String,
    pub percentage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "vi-VN")]
    Vi,
    #[serde(rename = "en-US")]
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Vi => "vi-VN",
            Locale::En => "en-US",
        }
    }
}

impl FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vi-VN" | "vi" => Ok(Locale::Vi),
            "en-US" | "en" => Ok(Locale::En),
            other => Err(ValidationError::InvalidLocale(other.to_string())),
        }
    }
}
