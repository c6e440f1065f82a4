//! Argument binding
//!
//! Turns the per-scope argument map of a request (`params[scope]`) into the
//! positional argument list the scope's operation expects.

use autoscope_core::value::kind_name;
use autoscope_core::{Cardinality, ParamsError, ScopeResult, Signature, Value};

/// Bind `args` against `signature`, strictly in declaration order.
///
/// - `Required`: the value is forwarded as-is, `null` when absent.
/// - `Optional`: forwarded only when present and non-null.
/// - `Rest`: must be a list (absent or `null` means empty); every element is
///   forwarded as its own trailing argument.
///
/// `args` must be an object; anything else is a malformed request.
pub fn bind_arguments(scope: &str, signature: &Signature, args: &Value) -> ScopeResult<Vec<Value>> {
    let Value::Object(map) = args else {
        return Err(ParamsError::MalformedScopeArguments {
            scope: scope.to_string(),
            found: kind_name(args).to_string(),
        }
        .into());
    };

    let mut bound = Vec::with_capacity(signature.len());

    for arg in signature {
        let supplied = map.get(&arg.name);
        match arg.cardinality {
            Cardinality::Required => {
                bound.push(supplied.cloned().unwrap_or(Value::Null));
            }
            Cardinality::Optional => {
                if let Some(value) = supplied.filter(|v| !v.is_null()) {
                    bound.push(value.clone());
                }
            }
            Cardinality::Rest => match supplied {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => bound.extend(items.iter().cloned()),
                Some(other) => {
                    return Err(ParamsError::MalformedRestArgument {
                        scope: scope.to_string(),
                        argument: arg.name.clone(),
                        found: kind_name(other).to_string(),
                    }
                    .into());
                }
            },
        }
    }

    Ok(bound)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use autoscope_test_utils::generators::{arb_signature, arb_string_value};
    use proptest::prelude::*;
    use serde_json::Map;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// With every argument supplied, the bound list holds one value per
        /// required/optional argument plus every rest element.
        #[test]
        fn prop_full_binding_length(
            sig in arb_signature(),
            value in arb_string_value(),
            rest_len in 0usize..5,
        ) {
            let mut args = Map::new();
            for arg in &sig {
                let v = match arg.cardinality {
                    Cardinality::Rest => Value::Array(vec![value.clone(); rest_len]),
                    _ => value.clone(),
                };
                args.insert(arg.name.clone(), v);
            }

            let bound = bind_arguments("s", &sig, &Value::Object(args)).unwrap();
            let expected = sig.required_count()
                + sig.optional_count()
                + if sig.has_rest() { rest_len } else { 0 };
            prop_assert_eq!(bound.len(), expected);
            prop_assert!(sig.accepts(bound.len()));
        }

        /// With nothing supplied, only required slots are bound (as nulls).
        #[test]
        fn prop_empty_binding_is_required_nulls(sig in arb_signature()) {
            let bound = bind_arguments("s", &sig, &Value::Object(Map::new())).unwrap();
            prop_assert_eq!(bound.len(), sig.required_count());
            prop_assert!(bound.iter().all(Value::is_null));
        }
    }
}
