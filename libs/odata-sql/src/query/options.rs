// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use tracing::trace;

use super::filter::{FilterExpression, parse_filter};
use crate::ODataSqlError;

/// A `/`-separated property path such as `Items/Name`
pub type PropertyPath = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub path: PropertyPath,
    pub ordering: Ordering,
}

/// The parsed system query options of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<FilterExpression>,
    pub select: Vec<PropertyPath>,
    pub expand: Vec<PropertyPath>,
    pub order_by: Vec<OrderByItem>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub skip_token: Option<usize>,
}

impl QueryOptions {
    pub fn parse(options: &HashMap<String, String>) -> Result<Self, ODataSqlError> {
        let mut parsed = QueryOptions::default();

        for (name, value) in options {
            match name.as_str() {
                "$filter" => parsed.filter = Some(parse_filter(value)?),
                "$select" => parsed.select = parse_paths(value),
                "$expand" => parsed.expand = parse_paths(value),
                "$orderby" => parsed.order_by = parse_order_by(value)?,
                "$top" => parsed.top = Some(parse_count("$top", value)?),
                "$skip" => parsed.skip = Some(parse_count("$skip", value)?),
                "$skiptoken" => parsed.skip_token = Some(parse_count("$skiptoken", value)?),
                _ => trace!(option = %name, "Ignoring query option"),
            }
        }

        Ok(parsed)
    }

    /// Whether `$select` asks for everything (absent, or containing `*`)
    pub fn selects_all(&self) -> bool {
        self.select.is_empty() || self.select.iter().any(|path| is_star(path))
    }
}

pub(crate) fn is_star(path: &[String]) -> bool {
    matches!(path, [segment] if segment == "*")
}

fn parse_paths(value: &str) -> Vec<PropertyPath> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.split('/').map(|s| s.trim().to_string()).collect())
        .collect()
}

fn parse_order_by(value: &str) -> Result<Vec<OrderByItem>, ODataSqlError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut parts = item.split_whitespace();
            let path = parts.next().unwrap_or_default();
            let ordering = match parts.next().map(|d| d.to_ascii_lowercase()).as_deref() {
                None | Some("asc") => Ordering::Asc,
                Some("desc") => Ordering::Desc,
                Some(other) => {
                    return Err(ODataSqlError::invalid_option(
                        "$orderby",
                        format!("Invalid sort direction {other} in $orderby"),
                    ));
                }
            };
            if parts.next().is_some() {
                return Err(ODataSqlError::invalid_option(
                    "$orderby",
                    format!("Invalid $orderby item {item}"),
                ));
            }

            Ok(OrderByItem {
                path: path.split('/').map(str::to_string).collect(),
                ordering,
            })
        })
        .collect()
}

fn parse_count(option: &'static str, value: &str) -> Result<usize, ODataSqlError> {
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| ODataSqlError::invalid_option(option, format!("{option} must be a number")))?;

    usize::try_from(number).map_err(|_| {
        ODataSqlError::invalid_option(
            option,
            format!("{option} must be a positive number equal or greater than zero"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[multiplatform_test]
    fn parses_paging_select_and_order() {
        let parsed = QueryOptions::parse(&options(&[
            ("$top", "12"),
            ("$skip", "0"),
            ("$select", "Status, Items/Name"),
            ("$orderby", "Status, LogStart desc"),
            ("$format", "json"),
        ]))
        .unwrap();

        assert_eq!(parsed.top, Some(12));
        assert_eq!(parsed.skip, Some(0));
        assert_eq!(
            parsed.select,
            vec![
                vec!["Status".to_string()],
                vec!["Items".to_string(), "Name".to_string()]
            ]
        );
        assert_eq!(
            parsed.order_by,
            vec![
                OrderByItem {
                    path: vec!["Status".to_string()],
                    ordering: Ordering::Asc
                },
                OrderByItem {
                    path: vec!["LogStart".to_string()],
                    ordering: Ordering::Desc
                }
            ]
        );
        assert!(!parsed.selects_all());
    }

    #[multiplatform_test]
    fn rejects_invalid_counts() {
        let error = QueryOptions::parse(&options(&[("$skiptoken", "abc")])).unwrap_err();
        assert_eq!(error.to_string(), "$skiptoken must be a number");

        let error = QueryOptions::parse(&options(&[("$top", "-1")])).unwrap_err();
        assert_eq!(
            error.to_string(),
            "$top must be a positive number equal or greater than zero"
        );
    }

    #[multiplatform_test]
    fn rejects_invalid_sort_direction() {
        let error = QueryOptions::parse(&options(&[("$orderby", "Status up")])).unwrap_err();
        assert!(matches!(
            error,
            ODataSqlError::InvalidQueryOption {
                option: "$orderby",
                ..
            }
        ));
    }
}
