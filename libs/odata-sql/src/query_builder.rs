// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashMap, sync::Arc};

use edm_binding::{EdmTableBindingProvider, EdmValue, EntityTypeBinding, PropertyBinding};
use tracing::{debug, instrument};

use crate::{
    Entry, ODataQuery, ODataSqlError, QueryOptions, SQLConfig, SQLDeleteBuilder,
    SQLInsertBuilder, SQLInterceptor, SQLSelectBuilder, SQLUpdateBuilder, WithContext,
    config::Environment,
    query::filter::{FilterExpression, parse_literal},
    sql::SQLParam,
    statement::check_key,
};

/// Translates OData requests into statement builders.
///
/// Each `build_*` method resolves the addressed entity set, navigation and key predicates
/// against the bindings, applies the query options in a fixed order, and then lets every
/// registered [`SQLInterceptor`] adjust the result. The returned builder borrows from `self`
/// and renders with [`SQLSelectBuilder::build`] (or the write builders' `build`) for a given
/// [`SQLContext`](crate::SQLContext).
pub struct SQLQueryBuilder {
    provider: Arc<dyn EdmTableBindingProvider>,
    config: SQLConfig,
    interceptors: Vec<Arc<dyn SQLInterceptor>>,
}

/// A request with its names resolved to bindings
struct ResolvedQuery<'a> {
    /// The entity type the key predicates address
    start: &'a EntityTypeBinding,
    /// The queried entity type: `start`, or where the navigation leads
    target: &'a EntityTypeBinding,
    keys: Vec<(&'a PropertyBinding, SQLParam)>,
    /// Calculation-view input parameters, in declared order
    parameters: Vec<(String, SQLParam)>,
    options: QueryOptions,
}

impl SQLQueryBuilder {
    pub fn new(provider: Arc<dyn EdmTableBindingProvider>, config: SQLConfig) -> Self {
        Self {
            provider,
            config,
            interceptors: vec![],
        }
    }

    pub fn from_env(
        provider: Arc<dyn EdmTableBindingProvider>,
        env: &dyn Environment,
    ) -> Result<Self, ODataSqlError> {
        Ok(Self::new(provider, SQLConfig::from_env(env)?))
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn SQLInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn provider(&self) -> &dyn EdmTableBindingProvider {
        self.provider.as_ref()
    }

    pub fn config(&self) -> &SQLConfig {
        &self.config
    }

    /// The read the request asks for: the count for `$count`, the single entity when the key
    /// predicates address one entity of the entity set, otherwise a page of the collection.
    #[instrument(name = "SQLQueryBuilder::build_select_query", skip(self))]
    pub fn build_select_query(
        &self,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        if query.count {
            return self.build_select_count_query(query);
        }

        let (start, _) = self.addressed(query)?;
        let addresses_entity = query.navigation.is_none()
            && query
                .key_predicates
                .iter()
                .any(|predicate| start.find_parameter(&predicate.property).is_none());

        if addresses_entity {
            self.build_select_entity_query(query)
        } else {
            self.build_select_entity_set_query(query)
        }
    }

    /// `SELECT COUNT(*)` over the addressed collection, honoring `$filter` and the keys
    #[instrument(name = "SQLQueryBuilder::build_select_count_query", skip(self))]
    pub fn build_select_count_query(
        &self,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        let resolved = self.resolve(query)?;

        let mut select = SQLSelectBuilder::new(self.provider(), resolved.target);
        select.select_count();
        select.with_parameters(resolved.parameters);
        select.with_keys(resolved.start, resolved.keys)?;
        if let Some(filter) = &resolved.options.filter {
            select.filter(filter)?;
        }

        self.intercept_read(select, query)
    }

    /// A single entity. Every key property of the addressed entity must have a value.
    #[instrument(name = "SQLQueryBuilder::build_select_entity_query", skip(self))]
    pub fn build_select_entity_query(
        &self,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        let resolved = self.resolve(query)?;
        if let Some(missing) = resolved
            .start
            .keys
            .iter()
            .find(|key| !resolved.keys.iter().any(|(bound, _)| &bound.name == *key))
        {
            return Err(ODataSqlError::MissingKey {
                entity: resolved.start.name.clone(),
                property: missing.clone(),
            });
        }

        let mut select = SQLSelectBuilder::new(self.provider(), resolved.target);
        select.select(&resolved.options.select)?;
        select.expand(&resolved.options.expand)?;
        select.with_parameters(resolved.parameters);
        if let Some(filter) = &resolved.options.filter {
            select.filter(filter)?;
        }
        select.with_keys(resolved.start, resolved.keys)?;

        self.intercept_read(select, query)
    }

    /// A page of the addressed collection, ordered and paged
    #[instrument(name = "SQLQueryBuilder::build_select_entity_set_query", skip(self))]
    pub fn build_select_entity_set_query(
        &self,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        let resolved = self.resolve(query)?;
        let options = &resolved.options;

        let mut select = SQLSelectBuilder::new(self.provider(), resolved.target);
        select.select(&options.select)?;
        select.expand(&options.expand)?;
        select.with_parameters(resolved.parameters);
        if let Some(filter) = &options.filter {
            select.filter(filter)?;
        }
        select.with_keys(resolved.start, resolved.keys)?;
        select.order_by(&options.order_by)?;
        select.paginate(
            options.top,
            options.skip,
            options.skip_token,
            self.config.server_paging_size,
        )?;

        self.intercept_read(select, query)
    }

    /// The keys of one page of the collection. With `$expand`, a page of the joined rows holds
    /// fewer than `$top` distinct entities; callers use these keys to fetch the complete
    /// expanded entities with [`Self::build_select_expanded_entities_query`].
    #[instrument(name = "SQLQueryBuilder::build_select_entity_set_ids_query", skip(self))]
    pub fn build_select_entity_set_ids_query(
        &self,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        let resolved = self.resolve(query)?;
        let options = &resolved.options;

        let mut select = SQLSelectBuilder::new(self.provider(), resolved.target);
        select.select_keys()?;
        select.with_parameters(resolved.parameters);
        if let Some(filter) = &options.filter {
            select.filter(filter)?;
        }
        select.with_keys(resolved.start, resolved.keys)?;
        select.join_expanded(&options.expand)?;
        select.order_by(&options.order_by)?;
        select.paginate(
            options.top,
            options.skip,
            options.skip_token,
            self.config.server_paging_size,
        )?;

        self.intercept_read(select, query)
    }

    /// The entities with the given key values and everything `$expand` names. Paging was
    /// already applied when `ids` were fetched, so this statement is not paged. Without ids
    /// this is the plain entity set query.
    #[instrument(name = "SQLQueryBuilder::build_select_expanded_entities_query", skip(self))]
    pub fn build_select_expanded_entities_query(
        &self,
        query: &ODataQuery,
        ids: &[EdmValue],
    ) -> Result<SQLSelectBuilder<'_>, ODataSqlError> {
        if ids.is_empty() {
            return self.build_select_entity_set_query(query);
        }

        let resolved = self.resolve(query)?;
        let target = resolved.target;
        let key = match target.key_properties()?.as_slice() {
            [key] => *key,
            _ => {
                return Err(ODataSqlError::UnsupportedQuery(format!(
                    "Complex key properties are not supported (entity type {})",
                    target.name
                )));
            }
        };
        let ids = ids
            .iter()
            .map(|id| SQLParam::coerced(id, key.edm_type))
            .collect::<Result<Vec<_>, _>>()?;

        let options = &resolved.options;
        let mut select = SQLSelectBuilder::new(self.provider(), target);
        select.select(&options.select)?;
        select.expand(&options.expand)?;
        select.with_parameters(resolved.parameters);
        if let Some(filter) = &options.filter {
            select.filter(filter)?;
        }
        select.filter_ids(key, ids);
        select.with_keys(resolved.start, resolved.keys)?;
        select.order_by(&options.order_by)?;

        self.intercept_read(select, query)
    }

    #[instrument(name = "SQLQueryBuilder::build_insert_entity_query", skip(self))]
    pub fn build_insert_entity_query(
        &self,
        query: &ODataQuery,
        entry: &Entry,
    ) -> Result<SQLInsertBuilder<'_>, ODataSqlError> {
        let (_, target) = self.addressed(query)?;
        let mut insert = SQLInsertBuilder::new(target, entry)?;

        for interceptor in &self.interceptors {
            interceptor.on_create(&mut insert, query)?;
        }
        Ok(insert)
    }

    /// `keys` identify the entity; `entry` carries the new property values
    #[instrument(name = "SQLQueryBuilder::build_update_entity_query", skip(self))]
    pub fn build_update_entity_query(
        &self,
        query: &ODataQuery,
        entry: &Entry,
        keys: &Entry,
    ) -> Result<SQLUpdateBuilder<'_>, ODataSqlError> {
        let (_, target) = self.addressed(query)?;
        let mut update = SQLUpdateBuilder::new(target, keys, entry)?;

        for interceptor in &self.interceptors {
            interceptor.on_update(&mut update, query)?;
        }
        Ok(update)
    }

    /// Deletes from the addressed entity set itself, never from a navigation target
    #[instrument(name = "SQLQueryBuilder::build_delete_entity_query", skip(self))]
    pub fn build_delete_entity_query(
        &self,
        query: &ODataQuery,
        keys: &Entry,
    ) -> Result<SQLDeleteBuilder<'_>, ODataSqlError> {
        let (start, _) = self.addressed(query)?;
        let mut delete = SQLDeleteBuilder::new(start, keys)?;

        for interceptor in &self.interceptors {
            interceptor.on_delete(&mut delete, query)?;
        }
        Ok(delete)
    }

    fn intercept_read<'a>(
        &self,
        mut select: SQLSelectBuilder<'a>,
        query: &ODataQuery,
    ) -> Result<SQLSelectBuilder<'a>, ODataSqlError> {
        for interceptor in &self.interceptors {
            interceptor.on_read(&mut select, query)?;
        }
        Ok(select)
    }

    /// The entity type of the entity set and the one the navigation (if any) leads to
    fn addressed(
        &self,
        query: &ODataQuery,
    ) -> Result<(&EntityTypeBinding, &EntityTypeBinding), ODataSqlError> {
        let start = self.provider.entity_set(&query.entity_set)?;
        let target = match &query.navigation {
            Some(navigation) => self.provider.navigation(start, navigation)?.1,
            None => start,
        };
        Ok((start, target))
    }

    fn resolve(&self, query: &ODataQuery) -> Result<ResolvedQuery<'_>, ODataSqlError> {
        let (start, target) = self.addressed(query)?;

        let mut keys = vec![];
        let mut parameter_values = HashMap::new();
        for predicate in &query.key_predicates {
            let value = literal_value(&predicate.literal)
                .with_context(format!("Invalid value for {}:", predicate.property))?;

            if let Some(parameter) = start.find_parameter(&predicate.property) {
                parameter_values.insert(
                    parameter.name.as_str(),
                    SQLParam::coerced(&value, parameter.edm_type)?,
                );
            } else {
                let key = check_key(start, &predicate.property)?;
                keys.push((key, SQLParam::coerced(&value, key.edm_type)?));
            }
        }

        let parameters = if !target.has_parameters() {
            vec![]
        } else if target.name != start.name || parameter_values.is_empty() {
            // A calculation view with input parameters is reachable only through its own
            // entity set, with the parameters in the key predicate.
            return Err(ODataSqlError::NotDirectlyAccessible(target.name.clone()));
        } else {
            target
                .parameters
                .iter()
                .map(|parameter| {
                    parameter_values
                        .remove(parameter.name.as_str())
                        .map(|value| (parameter.name.clone(), value))
                        .ok_or_else(|| ODataSqlError::MissingParameter {
                            entity: target.name.clone(),
                            parameter: parameter.name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let options = query.parse_options()?;
        debug!(
            start = %start.name,
            target = %target.name,
            keys = keys.len(),
            parameters = parameters.len(),
            "Resolved request"
        );

        Ok(ResolvedQuery {
            start,
            target,
            keys,
            parameters,
            options,
        })
    }
}

fn literal_value(literal: &str) -> Result<EdmValue, ODataSqlError> {
    match parse_literal(literal)? {
        FilterExpression::Literal { value, .. } => Ok(value),
        _ => Err(ODataSqlError::InvalidFilter(format!(
            "{literal} is not a literal"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseProduct, SQLContext, clause::SQLExpression, test_util::TestSetup};
    use multiplatform_test::multiplatform_test;
    use std::sync::Mutex;

    fn h2() -> SQLContext {
        SQLContext::new(DatabaseProduct::H2)
    }

    fn hana() -> SQLContext {
        SQLContext::new(DatabaseProduct::Hana).with_case_sensitive(true)
    }

    const MPL_COLUMNS: &str = r#"SELECT T0.MESSAGEGUID AS "MESSAGEGUID_T0", T0.LOGSTART AS "LOGSTART_T0", T0.LOGEND AS "LOGEND_T0", T0.SENDER AS "SENDER_T0", T0.RECEIVER AS "RECEIVER_T0", T0.STATUS AS "STATUS_T0" FROM MPLHEADER AS T0"#;

    const MPL_FILTER: &str = "Status eq 'ERROR' and LogEnd lt datetime'2014-10-02T09:14:00'";

    #[test_log::test]
    fn count_query() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("MessageProcessingLogs").count();
            assert_binding!(
                query_builder
                    .build_select_count_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "SELECT COUNT(*) FROM MPLHEADER AS T0"
            );

            let query = query.option("$filter", MPL_FILTER).option("$top", "5");
            let statement = query_builder
                .build_select_count_query(&query)
                .unwrap()
                .build(&h2())
                .unwrap();
            assert_eq!(
                statement.sql,
                "SELECT COUNT(*) FROM MPLHEADER AS T0 WHERE T0.STATUS = ? AND T0.LOGEND < ?"
            );
            assert_eq!(statement.params.len(), 2);
            assert_eq!(statement.params[0].value, EdmValue::from("ERROR"));
            assert!(matches!(statement.params[1].value, EdmValue::Calendar(_)));
        });
    }

    #[multiplatform_test]
    fn entity_set_query_with_filter() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("MessageProcessingLogs").option("$filter", MPL_FILTER);
            let statement = query_builder
                .build_select_entity_set_query(&query)
                .unwrap()
                .build(&h2())
                .unwrap();

            assert_eq!(
                statement.sql,
                format!(
                    "{MPL_COLUMNS} WHERE T0.STATUS = ? AND T0.LOGEND < ? ORDER BY T0.MESSAGEGUID ASC FETCH FIRST 1000 ROWS ONLY"
                )
            );
            assert_eq!(
                statement.params[1].value.epoch_millis(),
                Some(1_412_241_240_000)
            );
        });
    }

    #[multiplatform_test]
    fn select_order_and_paging() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("MessageProcessingLogs")
                .option("$select", "Status")
                .option("$orderby", "Status, LogStart desc")
                .option("$top", "2");
            let select = query_builder.build_select_entity_set_query(&query).unwrap();

            assert_binding!(
                select
                    .build(&SQLContext::new(DatabaseProduct::PostgreSql))
                    .unwrap(),
                r#"SELECT T0.STATUS AS "STATUS_T0", T0.MESSAGEGUID AS "MESSAGEGUID_T0" FROM MPLHEADER AS T0 ORDER BY T0.STATUS ASC, T0.LOGSTART DESC LIMIT 2"#
            );
            assert!(!select.is_server_side_paging());

            let query = ODataQuery::new("MessageProcessingLogs")
                .option("$select", "Status")
                .option("$top", "2")
                .option("$skip", "5");
            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&SQLContext::new(DatabaseProduct::Hana))
                    .unwrap(),
                r#"SELECT T0.STATUS AS "STATUS_T0", T0.MESSAGEGUID AS "MESSAGEGUID_T0" FROM MPLHEADER AS T0 ORDER BY T0.MESSAGEGUID ASC LIMIT 2 OFFSET 5"#
            );
            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&SQLContext::new(DatabaseProduct::Derby))
                    .unwrap(),
                r#"SELECT T0.STATUS AS "STATUS_T0", T0.MESSAGEGUID AS "MESSAGEGUID_T0" FROM MPLHEADER AS T0 ORDER BY T0.MESSAGEGUID ASC OFFSET 5 FETCH FIRST 2 ROWS ONLY"#
            );
        });
    }

    #[multiplatform_test]
    fn zero_skip_renders_no_offset() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("MessageProcessingLogs")
                .option("$select", "Status")
                .option("$skip", "0")
                .option("$top", "10");
            let select = query_builder.build_select_entity_set_query(&query).unwrap();

            assert_eq!(select.effective_skip(), Some(0));
            assert_binding!(
                select.build(&h2()).unwrap(),
                r#"SELECT T0.STATUS AS "STATUS_T0", T0.MESSAGEGUID AS "MESSAGEGUID_T0" FROM MPLHEADER AS T0 ORDER BY T0.MESSAGEGUID ASC FETCH FIRST 10 ROWS ONLY"#
            );
        });
    }

    #[multiplatform_test]
    fn skip_and_skip_token_add_up() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let effective_skip = |skip: Option<&str>, skip_token: Option<&str>| {
                let mut query = ODataQuery::new("MessageProcessingLogs");
                if let Some(skip) = skip {
                    query = query.option("$skip", skip);
                }
                if let Some(skip_token) = skip_token {
                    query = query.option("$skiptoken", skip_token);
                }
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .effective_skip()
            };

            assert_eq!(effective_skip(Some("3"), Some("5")), Some(8));
            assert_eq!(effective_skip(None, Some("5")), Some(5));
            assert_eq!(effective_skip(Some("3"), None), Some(3));
            assert_eq!(effective_skip(None, None), None);
        });
    }

    #[multiplatform_test]
    fn offsets_past_bigint_are_rejected() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let max = crate::MAX_OFFSET.to_string();

            let query = ODataQuery::new("MessageProcessingLogs").option("$skip", max.as_str());
            let select = query_builder.build_select_entity_set_query(&query).unwrap();
            assert_eq!(select.effective_skip(), Some(crate::MAX_OFFSET));
            assert_eq!(select.next_skip_token(1000), None);

            let query = query.option("$skiptoken", max.as_str());
            let error = query_builder
                .build_select_entity_set_query(&query)
                .err()
                .unwrap();
            assert!(matches!(
                error,
                ODataSqlError::InvalidQueryOption {
                    option: "$skiptoken",
                    ..
                }
            ));
            assert!(
                query_builder
                    .build_select_entity_set_ids_query(&query)
                    .is_err()
            );
        });
    }

    #[multiplatform_test]
    fn filter_on_order_status() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Orders").option("$filter", "Status eq 'ERROR'");
            let statement = query_builder
                .build_select_count_query(&query)
                .unwrap()
                .build(&h2())
                .unwrap();

            assert_binding!(
                statement,
                "SELECT COUNT(*) FROM ORDERS AS T0 WHERE T0.STATUS = ?",
                "ERROR"
            );

            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID AS "ID_T0", T0.CUSTOMER AS "CUSTOMER_T0", T0.TOTAL AS "TOTAL_T0", T0.STATUS AS "STATUS_T0" FROM ORDERS AS T0 WHERE T0.STATUS = ? ORDER BY T0.ID ASC FETCH FIRST 1000 ROWS ONLY"#,
                "ERROR"
            );
        });
    }

    #[multiplatform_test]
    fn select_query_follows_the_request() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let sql = |query: &ODataQuery| {
                query_builder
                    .build_select_query(query)
                    .unwrap()
                    .build(&h2())
                    .unwrap()
                    .sql
            };

            let query = ODataQuery::new("Entities4").count();
            assert_eq!(sql(&query), "SELECT COUNT(*) FROM ENTITY4_TABLE AS T0");

            let query = ODataQuery::new("Entities4")
                .key("Id4_1", "11")
                .key("Id4_2", "22");
            assert_eq!(
                sql(&query),
                r#"SELECT T0.ID4_1 AS "ID4_1_T0", T0.ID4_2 AS "ID4_2_T0", T0.ID4_3 AS "ID4_3_T0" FROM ENTITY4_TABLE AS T0 WHERE T0.ID4_1 = ? AND T0.ID4_2 = ?"#
            );

            let query = ODataQuery::new("Entities4");
            assert_eq!(
                sql(&query),
                r#"SELECT T0.ID4_1 AS "ID4_1_T0", T0.ID4_2 AS "ID4_2_T0", T0.ID4_3 AS "ID4_3_T0" FROM ENTITY4_TABLE AS T0 ORDER BY T0.ID4_1 ASC, T0.ID4_2 ASC FETCH FIRST 1000 ROWS ONLY"#
            );

            let query = ODataQuery::new("Orders").key("Id", "1").navigate("Items");
            assert!(sql(&query).ends_with("FETCH FIRST 1000 ROWS ONLY"));

            let query = ODataQuery::new("Entities4").key("Id4_1", "11");
            assert_eq!(
                query_builder
                    .build_select_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "Missing value for key property Id4_2 of Entity4Type"
            );
        });
    }

    #[multiplatform_test]
    fn derived_aggregates_in_entity_set_query() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Payments")
                .option("$select", "Region,Number")
                .option("$orderby", "Number desc")
                .option("$top", "10");

            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&SQLContext::new(DatabaseProduct::PostgreSql))
                    .unwrap(),
                r#"SELECT T0.REGION AS "REGION_T0", SUM(T0.NUMBER) AS "NUMBER_T0", T0.ID AS "ID_T0" FROM PAYMENTS AS T0 GROUP BY T0.REGION, T0.ID ORDER BY "NUMBER_T0" DESC LIMIT 10"#
            );

            let query = ODataQuery::new("Payments").count();
            assert_binding!(
                query_builder
                    .build_select_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "SELECT COUNT(*) FROM PAYMENTS AS T0"
            );
        });
    }

    #[multiplatform_test]
    fn top_is_clamped_to_page_size() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("MessageProcessingLogs").option("$top", "5000");
            let select = query_builder.build_select_entity_set_query(&query).unwrap();
            assert_eq!(select.effective_top(), Some(1000));
            assert!(select.is_server_side_paging());

            let query = ODataQuery::new("MessageProcessingLogs").option("$top", "0");
            let select = query_builder.build_select_entity_set_query(&query).unwrap();
            assert_eq!(select.effective_top(), Some(0));
            assert!(select.build(&h2()).unwrap().sql.ends_with("FETCH FIRST 0 ROWS ONLY"));

            let query = ODataQuery::new("MessageProcessingLogs").option("$top", "-1");
            assert_eq!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "$top must be a positive number equal or greater than zero"
            );
        });
    }

    #[multiplatform_test]
    fn composite_keys() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities4")
                .key("Id4_1", "11")
                .key("Id4_2", "22");

            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID4_1 AS "ID4_1_T0", T0.ID4_2 AS "ID4_2_T0", T0.ID4_3 AS "ID4_3_T0" FROM ENTITY4_TABLE AS T0 WHERE T0.ID4_1 = ? AND T0.ID4_2 = ? ORDER BY T0.ID4_1 ASC, T0.ID4_2 ASC FETCH FIRST 1000 ROWS ONLY"#,
                11,
                22
            );
            assert_binding!(
                query_builder
                    .build_select_entity_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID4_1 AS "ID4_1_T0", T0.ID4_2 AS "ID4_2_T0", T0.ID4_3 AS "ID4_3_T0" FROM ENTITY4_TABLE AS T0 WHERE T0.ID4_1 = ? AND T0.ID4_2 = ?"#,
                11,
                22
            );
        });
    }

    #[multiplatform_test]
    fn invalid_keys() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities4").key("Id4_1", "11");
            assert_eq!(
                query_builder
                    .build_select_entity_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "Missing value for key property Id4_2 of Entity4Type"
            );

            let query = ODataQuery::new("Entities4").key("Id4_3", "'x'");
            assert_eq!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "Id4_3 is not a key property of Entity4Type"
            );

            let query = ODataQuery::new("Entities4").key("Id4_1", "'eleven'");
            assert!(matches!(
                query_builder.build_select_entity_set_query(&query).err(),
                Some(ODataSqlError::Cast(_))
            ));

            let query = ODataQuery::new("Entities4").key("Id4_1", "'open");
            assert!(matches!(
                query_builder.build_select_entity_set_query(&query).err(),
                Some(ODataSqlError::WithContext(..))
            ));
        });
    }

    #[multiplatform_test]
    fn calc_view_with_parameters() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities6")
                .key("CurrentEmployeeName", "'Jon'")
                .key("CurrentEmployeeId", "42")
                .key("ID", "1");

            assert_binding!(
                query_builder
                    .build_select_entity_query(&query)
                    .unwrap()
                    .build(&hana())
                    .unwrap(),
                r#"SELECT "T0"."ID" AS "ID_T0", "T0"."NAME" AS "NAME_T0", ? AS CurrentEmployeeId_T0, ? AS CurrentEmployeeName_T0 FROM "ENTITY6_TABLE"(placeholder."$$CurrentEmployeeId$$" => ? ,placeholder."$$CurrentEmployeeName$$" => ? ) AS T0 WHERE "T0"."ID" = ?"#,
                42,
                "Jon",
                42,
                "Jon",
                1
            );

            let query = ODataQuery::new("Entities6")
                .key("CurrentEmployeeId", "42")
                .key("CurrentEmployeeName", "'Jon'");
            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&hana())
                    .unwrap(),
                r#"SELECT "T0"."ID" AS "ID_T0", "T0"."NAME" AS "NAME_T0", ? AS CurrentEmployeeId_T0, ? AS CurrentEmployeeName_T0 FROM "ENTITY6_TABLE"(placeholder."$$CurrentEmployeeId$$" => ? ,placeholder."$$CurrentEmployeeName$$" => ? ) AS T0 ORDER BY CurrentEmployeeId_T0 ASC, CurrentEmployeeName_T0 ASC, "T0"."ID" ASC LIMIT 1000"#,
                42,
                "Jon",
                42,
                "Jon"
            );

            assert_binding!(
                query_builder
                    .build_select_count_query(&query)
                    .unwrap()
                    .build(&hana())
                    .unwrap(),
                r#"SELECT COUNT(*) FROM "ENTITY6_TABLE"(placeholder."$$CurrentEmployeeId$$" => ? ,placeholder."$$CurrentEmployeeName$$" => ? ) AS T0"#,
                42,
                "Jon"
            );
        });
    }

    #[multiplatform_test]
    fn calc_view_needs_all_parameters() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities6");
            assert_eq!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "Collection Entity6Type is not directly accessible."
            );

            let query = ODataQuery::new("Entities6").key("CurrentEmployeeId", "42");
            assert_eq!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .err()
                    .unwrap()
                    .to_string(),
                "Missing value for parameter CurrentEmployeeName of Entity6Type"
            );
        });
    }

    #[multiplatform_test]
    fn navigation_from_an_entity() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Orders")
                .key("Id", "1")
                .navigate("Items")
                .option("$filter", "Quantity gt 2");

            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID AS "ID_T0", T0.ORDER_ID AS "ORDER_ID_T0", T0.NAME AS "NAME_T0", T0.QUANTITY AS "QUANTITY_T0" FROM ITEMS AS T0 LEFT JOIN ORDERS AS T1 ON T1.ID = T0.ORDER_ID WHERE T0.QUANTITY > ? AND T1.ID = ? ORDER BY T0.ID ASC FETCH FIRST 1000 ROWS ONLY"#,
                2,
                1
            );

            assert_binding!(
                query_builder
                    .build_select_count_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT COUNT(*) FROM ITEMS AS T0 LEFT JOIN ORDERS AS T1 ON T1.ID = T0.ORDER_ID WHERE T1.ID = ? AND T0.QUANTITY > ?"#,
                1,
                2
            );
        });
    }

    #[multiplatform_test]
    fn expand_selects_related_columns() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Orders").option("$expand", "Items");

            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID AS "ID_T0", T0.CUSTOMER AS "CUSTOMER_T0", T0.TOTAL AS "TOTAL_T0", T0.STATUS AS "STATUS_T0", T1.ID AS "ID_T1", T1.ORDER_ID AS "ORDER_ID_T1", T1.NAME AS "NAME_T1", T1.QUANTITY AS "QUANTITY_T1" FROM ORDERS AS T0 LEFT JOIN ITEMS AS T1 ON T1.ORDER_ID = T0.ID ORDER BY T0.ID ASC FETCH FIRST 1000 ROWS ONLY"#
            );
        });
    }

    #[multiplatform_test]
    fn ids_then_expanded_entities() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Orders")
                .option("$expand", "Items")
                .option("$top", "5")
                .option("$skip", "10");

            let ids = query_builder
                .build_select_entity_set_ids_query(&query)
                .unwrap();
            assert_eq!(ids.effective_top(), Some(5));
            assert_binding!(
                ids.build(&h2()).unwrap(),
                r#"SELECT T0.ID AS "ID_T0" FROM ORDERS AS T0 LEFT JOIN ITEMS AS T1 ON T1.ORDER_ID = T0.ID ORDER BY T0.ID ASC OFFSET 10 FETCH FIRST 5 ROWS ONLY"#
            );

            assert_binding!(
                query_builder
                    .build_select_expanded_entities_query(
                        &query,
                        &[EdmValue::from("1"), EdmValue::Int64(2)]
                    )
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.ID AS "ID_T0", T0.CUSTOMER AS "CUSTOMER_T0", T0.TOTAL AS "TOTAL_T0", T0.STATUS AS "STATUS_T0", T1.ID AS "ID_T1", T1.ORDER_ID AS "ORDER_ID_T1", T1.NAME AS "NAME_T1", T1.QUANTITY AS "QUANTITY_T1" FROM ORDERS AS T0 LEFT JOIN ITEMS AS T1 ON T1.ORDER_ID = T0.ID WHERE T0.ID IN (?,?) ORDER BY T0.ID ASC"#,
                1,
                2
            );

            let expanded = query_builder
                .build_select_expanded_entities_query(&query, &[])
                .unwrap();
            assert_eq!(expanded.effective_top(), Some(5));
            assert_eq!(expanded.effective_skip(), Some(10));
        });
    }

    #[multiplatform_test]
    fn expanded_entities_need_a_simple_key() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities4");
            let error = query_builder
                .build_select_expanded_entities_query(&query, &[EdmValue::Int32(1)])
                .err()
                .unwrap();
            assert!(
                error
                    .to_string()
                    .starts_with("Complex key properties are not supported")
            );
        });
    }

    #[multiplatform_test]
    fn write_statements() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Entities4");
            let keys = Entry::from([
                ("Id4_1".to_string(), EdmValue::Int32(11)),
                ("Id4_2".to_string(), EdmValue::Int32(22)),
            ]);
            let entry = Entry::from([("Id4_3".to_string(), EdmValue::from("new"))]);

            assert_binding!(
                query_builder
                    .build_update_entity_query(&query, &entry, &keys)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "UPDATE ENTITY4_TABLE SET ID4_3=? WHERE ID4_1=? AND ID4_2=?",
                "new",
                11,
                22
            );
            assert_binding!(
                query_builder
                    .build_delete_entity_query(&query, &keys)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "DELETE FROM ENTITY4_TABLE WHERE ID4_1=? AND ID4_2=?",
                11,
                22
            );

            let query = ODataQuery::new("Entities6");
            assert_eq!(
                query_builder
                    .build_insert_entity_query(&query, &entry)
                    .err()
                    .unwrap()
                    .to_string(),
                "Calculation view ENTITY6_TABLE is read-only"
            );
        });
    }

    #[multiplatform_test]
    fn filter_through_two_navigations() {
        TestSetup::with_setup(|TestSetup { query_builder, .. }| {
            let query = ODataQuery::new("Items").option("$filter", "Order/Buyer/Name eq 'ACME'");

            assert_binding!(
                query_builder
                    .build_select_count_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "SELECT COUNT(*) FROM ITEMS AS T0 LEFT JOIN ORDERS AS T1 ON T1.ID = T0.ORDER_ID LEFT JOIN CUSTOMERS AS T2 ON T2.ID = T1.CUSTOMER_ID WHERE T2.NAME = ?",
                "ACME"
            );
        });
    }

    struct TenantInterceptor {
        seen: Mutex<Vec<String>>,
    }

    impl SQLInterceptor for TenantInterceptor {
        fn on_read(
            &self,
            select: &mut SQLSelectBuilder<'_>,
            query: &ODataQuery,
        ) -> Result<(), ODataSqlError> {
            self.seen.lock().unwrap().push(query.entity_set.clone());
            let alias = select.alias().to_string();
            select.add_condition(SQLExpression::eq(
                SQLExpression::column(alias, "CUSTOMER"),
                SQLExpression::Param(SQLParam::typed(EdmValue::from("ACME"))),
            ));
            Ok(())
        }

        fn on_create(
            &self,
            insert: &mut SQLInsertBuilder<'_>,
            _query: &ODataQuery,
        ) -> Result<(), ODataSqlError> {
            insert.set_value("CUSTOMER", SQLParam::typed(EdmValue::from("ACME")));
            Ok(())
        }
    }

    #[multiplatform_test]
    fn interceptors_adjust_statements() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let interceptor = Arc::new(TenantInterceptor {
                seen: Mutex::new(vec![]),
            });
            let mut query_builder =
                SQLQueryBuilder::new(Arc::new(bindings), SQLConfig::default());
            query_builder.add_interceptor(interceptor.clone());

            let query = ODataQuery::new("Orders").option("$select", "Total");
            assert_binding!(
                query_builder
                    .build_select_entity_set_query(&query)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                r#"SELECT T0.TOTAL AS "TOTAL_T0", T0.ID AS "ID_T0" FROM ORDERS AS T0 WHERE T0.CUSTOMER = ? ORDER BY T0.ID ASC FETCH FIRST 1000 ROWS ONLY"#,
                "ACME"
            );

            let entry = Entry::from([
                ("Id".to_string(), EdmValue::Int32(3)),
                ("Total".to_string(), EdmValue::Int64(20)),
            ]);
            assert_binding!(
                query_builder
                    .build_insert_entity_query(&query, &entry)
                    .unwrap()
                    .build(&h2())
                    .unwrap(),
                "INSERT INTO ORDERS (ID,TOTAL,CUSTOMER) VALUES (?,?,?)",
                3,
                20i64,
                "ACME"
            );

            assert_eq!(*interceptor.seen.lock().unwrap(), vec!["Orders".to_string()]);
        });
    }
}
