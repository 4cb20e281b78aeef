/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Integer literals become `Int32`, float literals `Float64`. Any other expression goes
/// through `Value::from`.
///
/// ```rust
/// use datacodec::{doc, Value};
///
/// let value = doc!({"a": 1, "b": [true, null]});
/// let map = value.as_map().unwrap();
/// assert_eq!(map.get("a"), Some(&Value::Int32(1)));
/// ```
#[macro_export]
macro_rules! doc {
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
        $crate::Value::List(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(vec![$($crate::doc!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::DocMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::DocMap::new();
        $(
            map.insert($key.to_string(), $crate::doc!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
