// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    SQLContext,
    sql::{ExpressionBuilder, SQLBuilder, SQLParam},
};

/// `FROM <table>[(<calc view parameters>)] AS <alias>`
///
/// The alias of the primary table is never quoted, even in case-sensitive mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: String,
    pub alias: String,
    /// Calculation-view input parameters, by name
    pub parameters: Vec<(String, SQLParam)>,
}

impl FromClause {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            parameters: vec![],
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<(String, SQLParam)>) -> Self {
        self.parameters = parameters;
        self
    }
}

impl ExpressionBuilder for FromClause {
    fn build(&self, _context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_str("FROM ");
        builder.push_identifier(&self.table);

        if !self.parameters.is_empty() {
            builder.push('(');
            builder.push_iter(self.parameters.iter(), ",", |builder, (name, param)| {
                builder.push_str(format!("placeholder.\"$${name}$$\" => "));
                builder.push_param(param.clone());
                builder.push_space();
            });
            builder.push(')');
        }

        builder.push_str(" AS ");
        builder.push_str(&self.alias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseProduct;
    use edm_binding::EdmSimpleType;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn plain_table() {
        let from = FromClause::new("MPLHEADER", "T0");
        assert_binding!(
            from.to_sql(&SQLContext::new(DatabaseProduct::H2)),
            "FROM MPLHEADER AS T0"
        );
        assert_binding!(
            from.to_sql(&SQLContext::new(DatabaseProduct::H2).with_case_sensitive(true)),
            r#"FROM "MPLHEADER" AS T0"#
        );
    }

    #[multiplatform_test]
    fn calc_view_placeholders() {
        let from = FromClause::new("ENTITY6_TABLE", "T0").with_parameters(vec![
            (
                "CurrentEmployeeId".to_string(),
                SQLParam::new(42.into(), EdmSimpleType::Int32),
            ),
            (
                "CurrentEmployeeName".to_string(),
                SQLParam::new("Jon".into(), EdmSimpleType::String),
            ),
        ]);

        assert_binding!(
            from.to_sql(&SQLContext::new(DatabaseProduct::Hana).with_case_sensitive(true)),
            r#"FROM "ENTITY6_TABLE"(placeholder."$$CurrentEmployeeId$$" => ? ,placeholder."$$CurrentEmployeeName$$" => ? ) AS T0"#,
            42,
            "Jon"
        );
    }
}
