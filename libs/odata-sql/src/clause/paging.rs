// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    PagingStyle, SQLContext,
    sql::{ExpressionBuilder, SQLBuilder},
};

/// The row window of a select, rendered in the paging style of the target dialect.
///
/// Counts are rendered inline; an offset of zero is left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    pub top: Option<usize>,
    pub skip: usize,
}

impl Paging {
    pub fn new(top: Option<usize>, skip: usize) -> Self {
        Self { top, skip }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.skip == 0
    }
}

impl ExpressionBuilder for Paging {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        let mut parts = vec![];

        match context.product.paging_style() {
            PagingStyle::FetchFirst => {
                if self.skip > 0 {
                    parts.push(format!("OFFSET {}", self.skip));
                }
                if let Some(top) = self.top {
                    parts.push(format!("FETCH FIRST {top} ROWS ONLY"));
                }
            }
            PagingStyle::Limit => {
                if let Some(top) = self.top {
                    parts.push(format!("LIMIT {top}"));
                }
                if self.skip > 0 {
                    parts.push(format!("OFFSET {}", self.skip));
                }
            }
        }

        builder.push_str(parts.join(" "));
    }
}
