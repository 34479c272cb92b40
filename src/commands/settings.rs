// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Locale;
use crate::utils::{get_locale, pretty_table, set_locale};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let locale = get_locale(conn)?;
            println!(
                "{}",
                pretty_table(&["Key", "Value"], vec![vec!["locale".into(), locale.as_str().into()]])
            );
        }
        Some(("set", sub)) => {
            let locale: Locale = sub.get_one::<String>("locale").unwrap().parse()?;
            set_locale(conn, locale)?;
            println!("Locale set to {}", locale.as_str());
        }
        _ => {}
    }
    Ok(())
}
