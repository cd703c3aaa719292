// Helper macro to distinguish between patterns and expressions
#[macro_export]
macro_rules! assert_case {
    // Guard patterns - patterns with if conditions
    ($result:expr, { $pattern:pat if $guard:expr }) => {
        match $result {
            $pattern if $guard => {},
            other => panic!("Expected {} if {} but got {:?}", stringify!($pattern), stringify!($guard), other),
        }
    };

    ($result:expr, { Err($($pattern:tt)*) }) => {
        match $result {
            Err($($pattern)*) => {},
            other => panic!("Expected Err({}) but got {:#?}", stringify!($($pattern)*), other),
        }
    };

    // Default case - treat as expression for equality comparison
    ($result:expr, { $expected:expr }) => {
        match $result {
            Ok(actual) => {
                pretty_assertions::assert_eq!($expected, actual, "Expected {:#?} but got {:#?}\n\n< expected / got >", $expected, actual);
            },
            other => panic!("Expected Ok(...) but got {:?}", other),
        }
    };
}

// Helper macro to generate test functions based on field names
#[macro_export]
macro_rules! handle_case {
    ([$($attrs:meta)*] steps, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_steps() {
            let result = weft::Path::deserialize_from_string(input())
                .map(|path| path.iter().map(ToString::to_string).collect::<Vec<_>>());
            assert_case!(result, $expected);
        }
    };

    ([$($attrs:meta)*] serialized, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_serialized() {
            let result = weft::Path::deserialize_from_string(input()).map(|path| path.serialize_to_string());
            assert_case!(result, $expected);
        }
    };

    // Deserializing the serialized form gives back the same path.
    ([$($attrs:meta)*] round_trip, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_round_trip() {
            let result = weft::Path::deserialize_from_string(input()).and_then(|path| {
                let again = weft::Path::deserialize_from_string(&path.serialize_to_string())?;
                Ok(again == path)
            });
            assert_case!(result, $expected);
        }
    };

    // Follow the path in the fixture tree and name the type found there.
    ([$($attrs:meta)*] type_name, $expected:tt) => {
        $(#[$attrs])*
        #[test]
        fn validate_type_name() {
            let ts = weft::TypeSystem::new();
            let tree = fixture(&ts);
            let result = input()
                .parse::<weft::Path>()
                .and_then(|path| tree.follow(&path))
                .map(|node| tree.type_exp(node).to_string_with(&ts));
            assert_case!(result, $expected);
        }
    };

    // Generic case for unknown field names
    ([$($attrs:meta)*] $field_name:ident, $expected:tt) => {
        compile_error!(concat!("Unknown test case field: ", stringify!($field_name)));
    };
}

// Helper macro to recursively parse assertion fields (now correctly capturing braces)
#[macro_export]
macro_rules! parse_assertions {
    // Base case: no more fields to parse
    (@parse [$($test_functions:tt)*]) => {
        $($test_functions)*
    };

    // Parse assertion field with potential attributes (handles both cases)
    (@parse [$($test_functions:tt)*] $(#[$attr:meta])* $field_name:ident: $field_value:tt, $($rest:tt)*) => {
        parse_assertions! {@parse [
            $($test_functions)*
            handle_case! {[$($attr)*] $field_name, $field_value}
        ] $($rest)*}
    };
}

// Main macro - name first, input second, then any order for assertions
#[macro_export]
macro_rules! test_case {
    (
        name: $name:ident,
        input: $input:expr,
        $($assertion_fields:tt)*
    ) => {
        mod $name {
            #![allow(unused_imports, dead_code)]

            use super::*;

            fn input() -> &'static str {
                $input
            }

            // Generate all test functions
            parse_assertions! {@parse [] $($assertion_fields)*}
        }
    };
}
