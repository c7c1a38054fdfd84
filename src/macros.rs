/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Objects become `Value::Object` with keys in the order written. Any other
/// expression goes through [`to_value`](crate::to_value).
///
/// ```rust
/// use serde_walk::{to_string, value};
///
/// let v = value!({ "b": [1, null], "a": { "c": true } });
/// assert_eq!(to_string(&v).unwrap(), r#"{"b":[1,null],"a":{"c":true}}"#);
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::ValueMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ValueMap::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    }};
}
