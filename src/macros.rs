/// Builds a [`RichValue`](crate::RichValue) with JSON-like syntax.
///
/// Arrays and objects get fresh handles. Anything that is not `null`, `true`,
/// `false`, an array or an object goes through `RichValue::from`, so wrap
/// arbitrary expressions in parentheses:
///
/// ```rust
/// use serde_richjson::{rich, RichValue};
///
/// let shared = rich!([1, 2]);
/// let value = rich!({
///     "name": "Alice",
///     "tags": [true, null],
///     "nothing": (RichValue::Undefined),
///     "same": (shared.clone()),
/// });
/// assert!(value.as_object().unwrap().borrow().get("same").unwrap().same_reference(&shared));
/// ```
#[macro_export]
macro_rules! rich {
    (null) => {
        $crate::RichValue::Null
    };

    (true) => {
        $crate::RichValue::Bool(true)
    };

    (false) => {
        $crate::RichValue::Bool(false)
    };

    ([]) => {
        $crate::RichValue::array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::RichValue::array(vec![$($crate::rich!($elem)),*])
    };

    ({}) => {
        $crate::RichValue::object($crate::ObjectMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ObjectMap::new();
        $(
            object.insert($key.to_string(), $crate::rich!($value));
        )*
        $crate::RichValue::object(object)
    }};

    // Literals and parenthesized expressions
    ($s:expr) => {
        $crate::RichValue::from($s)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Number, RichValue};

    #[test]
    fn test_rich_macro_primitives() {
        assert_eq!(rich!(null), RichValue::Null);
        assert_eq!(rich!(true), RichValue::Bool(true));
        assert_eq!(rich!(false), RichValue::Bool(false));
        assert_eq!(rich!(42), RichValue::Number(Number::Integer(42)));
        assert_eq!(rich!(3.5), RichValue::Number(Number::Float(3.5)));
        assert_eq!(rich!("hello"), RichValue::String("hello".to_string()));
        assert_eq!(rich!((RichValue::Undefined)), RichValue::Undefined);
    }

    #[test]
    fn test_rich_macro_arrays() {
        let arr = rich!([1, 2, 3]);
        let items = arr.as_array().unwrap().borrow();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], RichValue::Number(Number::Integer(1)));
        assert_eq!(items[2], RichValue::Number(Number::Integer(3)));
    }

    #[test]
    fn test_rich_macro_fresh_handles() {
        let a = rich!({});
        let b = rich!({});
        assert_eq!(a, b);
        assert!(!a.same_reference(&b));
    }

    #[test]
    fn test_rich_macro_objects() {
        let obj = rich!({
            "name": "Alice",
            "age": 30
        });
        let map = obj.as_object().unwrap().borrow();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("name"), Some(&RichValue::String("Alice".to_string())));
        assert_eq!(map.get("age"), Some(&RichValue::Number(Number::Integer(30))));
    }
}
