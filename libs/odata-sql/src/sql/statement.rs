// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use super::SQLParam;

/// A rendered statement: SQL text with `?` placeholders and the parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SQLStatement {
    pub sql: String,
    pub params: Vec<SQLParam>,
}

impl SQLStatement {
    pub fn new(sql: String, params: Vec<SQLParam>) -> Self {
        Self { sql, params }
    }

    /// The SQL text with `?` placeholders rewritten as `$1`, `$2`, ... for drivers that use
    /// numbered parameters. Question marks inside quoted literals or identifiers are kept.
    pub fn numbered_sql(&self) -> String {
        let mut numbered = String::with_capacity(self.sql.len() + self.params.len());
        let mut quote: Option<char> = None;
        let mut index = 0;

        for c in self.sql.chars() {
            match (quote, c) {
                (None, '\'' | '"') => {
                    quote = Some(c);
                    numbered.push(c);
                }
                (Some(open), _) if open == c => {
                    quote = None;
                    numbered.push(c);
                }
                (None, '?') => {
                    index += 1;
                    numbered.push('$');
                    numbered.push_str(&index.to_string());
                }
                _ => numbered.push(c),
            }
        }

        numbered
    }
}

impl From<(String, Vec<SQLParam>)> for SQLStatement {
    fn from((sql, params): (String, Vec<SQLParam>)) -> Self {
        Self::new(sql, params)
    }
}

impl From<SQLStatement> for (String, Vec<SQLParam>) {
    fn from(statement: SQLStatement) -> Self {
        (statement.sql, statement.params)
    }
}

impl Display for SQLStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}
