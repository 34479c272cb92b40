// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Input rejected at the point of data entry, before anything is written.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("monthly limit must be greater than zero, got {0}")]
    NonPositiveLimit(Decimal),

    #[error("warning threshold must be one of 70, 80, 90, 100 (got '{0}')")]
    InvalidThreshold(String),

    #[error("transaction kind must be 'income' or 'expense' (got '{0}')")]
    InvalidKind(String),

    #[error("locale must be 'vi-VN' or 'en-US' (got '{0}')")]
    InvalidLocale(String),

    #[error("wallet balance cannot be negative, got {0}")]
    NegativeBalance(Decimal),

    #[error("insufficient funds in wallet '{wallet}': available {available}")]
    InsufficientFunds { wallet: String, available: Decimal },

    #[error("a wallet named '{0}' already exists")]
    DuplicateWallet(String),

    #[error("{level} '{name}' already exists for {kind}")]
    DuplicateCategory {
        level: &'static str,
        name: String,
        kind: String,
    },

    #[error("category '{category}' is for {expected} transactions, not {actual}")]
    KindMismatch {
        category: String,
        expected: String,
        actual: String,
    },

    #[error("subcategories can only be nested one level under a top-level category")]
    NestedTooDeep,

    #[error("category '{0}' has transactions; delete them first")]
    CategoryInUse(String),

    #[error("wallet '{0}' has transactions; delete them first")]
    WalletInUse(String),
}
