// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Test assertions to check SQL statements and parameters.

/// Assert that the given parameters carry the expected values, in order.
///
/// # Usage:
/// ```no_run
/// assert_params!(actual_params, expected_value1, expected_value2, ...);
/// ```
///
/// Each expected value is converted with `EdmValue::from`, so `11` checks for `Int32(11)` and
/// `"ERROR"` for `String("ERROR")`.
macro_rules! assert_params {
    ($actual_params:expr) => {
        assert!($actual_params.is_empty(), "Extra actual parameters: {:?}", $actual_params);
    };
    ($actual_params:expr, $expected_param:expr $(, $rest:expr)*) => {
        match $actual_params.split_first() {
            Some((actual_head, actual_tail)) => {
                assert_eq!(
                    actual_head.value,
                    ::edm_binding::EdmValue::from($expected_param),
                    "Parameter mismatch"
                );
                assert_params!(actual_tail $(, $rest)*);
            }
            None => panic!("Missing actual parameters"),
        }
    };
}

/// Assert the SQL text and parameters of a `(String, Vec<SQLParam>)` pair or an `SQLStatement`.
macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr $(, $rest:expr)*) => {
        let (actual_stmt, actual_params): (String, Vec<$crate::sql::SQLParam>) = $actual.into();
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params $(, $rest)*);
    };
}
