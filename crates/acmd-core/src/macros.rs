// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Record and factory construction macros.

/// Creates a [`Record`](crate::Record) from key-value pairs.
///
/// Values go through `Value::from`.
///
/// # Example
///
/// ```
/// use acmd_core::{record, Value};
///
/// let record = record! {
///     "name" => "acmd",
///     "answer" => 42,
/// };
/// assert_eq!(record["answer"], Value::Number(42.0));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(record.insert(::std::string::String::from($key), $crate::Value::from($value));)+
        record
    }};
}

/// Creates an async function [`Factory`](crate::Factory).
///
/// The body is an expression evaluating to a
/// [`FactoryResult`](crate::FactoryResult); `?` works inside it. Values
/// listed in the leading brackets are cloned into every invocation.
///
/// # Example
///
/// ```
/// use acmd_core::{factory, record};
/// use std::sync::Arc;
///
/// let greeting = Arc::new(String::from("hello"));
/// let factory = factory!([greeting] |require, exports, _module| {
///     let config = require.require("config").await?;
///     exports.set("greeting", greeting.as_str());
///     exports.set("loud", config.get("loud").is_some());
///     Ok(Some(record! { "ready" => true }))
/// });
/// # drop(factory);
/// ```
#[macro_export]
macro_rules! factory {
    ([$($capture:ident),* $(,)?] |$require:pat_param, $exports:pat_param, $module:pat_param| $body:expr) => {
        $crate::Factory::new(move |$require, $exports, $module| {
            $(let $capture = ::std::clone::Clone::clone(&$capture);)*
            async move {
                let result: $crate::FactoryResult = $body;
                result
            }
        })
    };
    (|$require:pat_param, $exports:pat_param, $module:pat_param| $body:expr) => {
        $crate::factory!([] |$require, $exports, $module| $body)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Factory, Value};

    #[test]
    fn test_record_macro() {
        let empty = record! {};
        assert!(empty.is_empty());

        let record = record! { "b" => 2, "a" => "one" };
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(record["a"], Value::from("one"));
    }

    #[test]
    fn test_factory_macro_builds_function() {
        let factory = factory!(|_require, exports, _module| {
            exports.set("value", 1);
            Ok(None)
        });
        assert!(matches!(factory, Factory::Function(_)));
    }
}
