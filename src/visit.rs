//! Depth-first traversal of documents.
//!
//! [`traverse`] walks a [`Value`] and reports each node to a [`Visitor`] as a fixed sequence
//! of events. Both codec encoders are visitors: the traversal decides *what* is visited and
//! in which order, the visitor decides *how* it is written.
//!
//! For the document `{"a": 1, "b": [true, null]}` the events are:
//!
//! ```text
//! start_map(2)
//!   key("a")  int32(1)
//!   key("b")  start_list(2)
//!               index(0) bool(true)
//!               index(1) null
//!             end_list
//! end_map
//! ```
//!
//! Empty composites produce a single `empty_map` or `empty_list` event instead of a
//! start/end pair.

use crate::{ByteString, DocList, DocMap, Error, Result, Value};

/// Maximum nesting depth of maps and lists accepted by traversal and by the decoders.
pub const MAX_DEPTH: usize = 1000;

/// Order in which map entries are visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// The map's own insertion order.
    #[default]
    Insertion,
    /// Keys in ascending byte order, for canonical output.
    Sorted,
}

/// Receives traversal events.
///
/// Any error returned from an event aborts the traversal and is handed back to the caller
/// of [`traverse`].
pub trait Visitor {
    /// Requested order of map entries. Queried once per non-empty map.
    fn key_order(&self) -> KeyOrder {
        KeyOrder::Insertion
    }

    fn visit_null(&mut self) -> Result<()>;
    fn visit_bool(&mut self, value: bool) -> Result<()>;
    fn visit_i32(&mut self, value: i32) -> Result<()>;
    fn visit_i64(&mut self, value: i64) -> Result<()>;
    fn visit_f32(&mut self, value: f32) -> Result<()>;
    fn visit_f64(&mut self, value: f64) -> Result<()>;
    fn visit_str(&mut self, value: &str) -> Result<()>;
    fn visit_bytes(&mut self, value: &ByteString) -> Result<()>;

    fn empty_map(&mut self) -> Result<()>;
    fn start_map(&mut self, map: &DocMap) -> Result<()>;
    fn key(&mut self, key: &str) -> Result<()>;
    fn end_map(&mut self) -> Result<()>;

    fn empty_list(&mut self) -> Result<()>;
    fn start_list(&mut self, list: &DocList) -> Result<()>;

    /// Announces the element at `index`. Most formats do not record it.
    fn index(&mut self, _index: usize) -> Result<()> {
        Ok(())
    }

    fn end_list(&mut self) -> Result<()>;
}

/// Walks `value` depth first, reporting every node to `visitor`.
///
/// Fails with [`Error::Encoding`] when composites nest deeper than [`MAX_DEPTH`].
///
/// # Examples
///
/// ```rust
/// use datacodec::visit::{traverse, Visitor};
/// use datacodec::{doc, ByteString, DocList, DocMap, Result};
///
/// #[derive(Default)]
/// struct CountKeys(usize);
///
/// impl Visitor for CountKeys {
///     fn visit_null(&mut self) -> Result<()> { Ok(()) }
///     fn visit_bool(&mut self, _: bool) -> Result<()> { Ok(()) }
///     fn visit_i32(&mut self, _: i32) -> Result<()> { Ok(()) }
///     fn visit_i64(&mut self, _: i64) -> Result<()> { Ok(()) }
///     fn visit_f32(&mut self, _: f32) -> Result<()> { Ok(()) }
///     fn visit_f64(&mut self, _: f64) -> Result<()> { Ok(()) }
///     fn visit_str(&mut self, _: &str) -> Result<()> { Ok(()) }
///     fn visit_bytes(&mut self, _: &ByteString) -> Result<()> { Ok(()) }
///     fn empty_map(&mut self) -> Result<()> { Ok(()) }
///     fn start_map(&mut self, _: &DocMap) -> Result<()> { Ok(()) }
///     fn key(&mut self, _: &str) -> Result<()> { self.0 += 1; Ok(()) }
///     fn end_map(&mut self) -> Result<()> { Ok(()) }
///     fn empty_list(&mut self) -> Result<()> { Ok(()) }
///     fn start_list(&mut self, _: &DocList) -> Result<()> { Ok(()) }
///     fn end_list(&mut self) -> Result<()> { Ok(()) }
/// }
///
/// let mut counter = CountKeys::default();
/// traverse(&doc!({"a": {"b": 1}, "c": []}), &mut counter).unwrap();
/// assert_eq!(counter.0, 3);
/// ```
pub fn traverse<V: Visitor + ?Sized>(value: &Value, visitor: &mut V) -> Result<()> {
    walk(value, visitor, 0)
}

/// Walks a top-level map.
pub fn traverse_map<V: Visitor + ?Sized>(map: &DocMap, visitor: &mut V) -> Result<()> {
    walk_map(map, visitor, 0)
}

/// Walks a top-level list.
pub fn traverse_list<V: Visitor + ?Sized>(list: &DocList, visitor: &mut V) -> Result<()> {
    walk_list(list, visitor, 0)
}

fn walk<V: Visitor + ?Sized>(value: &Value, visitor: &mut V, depth: usize) -> Result<()> {
    match value {
        Value::Null => visitor.visit_null(),
        Value::Bool(b) => visitor.visit_bool(*b),
        Value::Int32(i) => visitor.visit_i32(*i),
        Value::Int64(i) => visitor.visit_i64(*i),
        Value::Float32(f) => visitor.visit_f32(*f),
        Value::Float64(f) => visitor.visit_f64(*f),
        Value::Str(s) => visitor.visit_str(s),
        Value::Bytes(b) => visitor.visit_bytes(b),
        Value::Map(map) => walk_map(map, visitor, depth),
        Value::List(list) => walk_list(list, visitor, depth),
    }
}

fn enter(depth: usize) -> Result<usize> {
    let depth = depth + 1;
    if depth > MAX_DEPTH {
        return Err(Error::encoding(format!(
            "Nesting depth exceeds the limit of {}",
            MAX_DEPTH
        )));
    }
    Ok(depth)
}

fn walk_map<V: Visitor + ?Sized>(map: &DocMap, visitor: &mut V, depth: usize) -> Result<()> {
    let depth = enter(depth)?;
    if map.is_empty() {
        return visitor.empty_map();
    }

    visitor.start_map(map)?;
    match visitor.key_order() {
        KeyOrder::Insertion => {
            for (key, value) in map.iter() {
                visitor.key(key)?;
                walk(value, visitor, depth)?;
            }
        }
        KeyOrder::Sorted => {
            for (key, value) in map.sorted_entries() {
                visitor.key(key)?;
                walk(value, visitor, depth)?;
            }
        }
    }
    visitor.end_map()
}

fn walk_list<V: Visitor + ?Sized>(list: &DocList, visitor: &mut V, depth: usize) -> Result<()> {
    let depth = enter(depth)?;
    if list.is_empty() {
        return visitor.empty_list();
    }

    visitor.start_list(list)?;
    for (index, value) in list.iter().enumerate() {
        visitor.index(index)?;
        walk(value, visitor, depth)?;
    }
    visitor.end_list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    /// Records events as short strings.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        order: KeyOrder,
    }

    impl Recorder {
        fn push(&mut self, event: String) -> Result<()> {
            self.events.push(event);
            Ok(())
        }
    }

    impl Visitor for Recorder {
        fn key_order(&self) -> KeyOrder {
            self.order
        }
        fn visit_null(&mut self) -> Result<()> {
            self.push("null".into())
        }
        fn visit_bool(&mut self, value: bool) -> Result<()> {
            self.push(format!("bool({})", value))
        }
        fn visit_i32(&mut self, value: i32) -> Result<()> {
            self.push(format!("i32({})", value))
        }
        fn visit_i64(&mut self, value: i64) -> Result<()> {
            self.push(format!("i64({})", value))
        }
        fn visit_f32(&mut self, value: f32) -> Result<()> {
            self.push(format!("f32({})", value))
        }
        fn visit_f64(&mut self, value: f64) -> Result<()> {
            self.push(format!("f64({})", value))
        }
        fn visit_str(&mut self, value: &str) -> Result<()> {
            self.push(format!("str({})", value))
        }
        fn visit_bytes(&mut self, value: &ByteString) -> Result<()> {
            self.push(format!("bytes({})", value.len()))
        }
        fn empty_map(&mut self) -> Result<()> {
            self.push("{}".into())
        }
        fn start_map(&mut self, map: &DocMap) -> Result<()> {
            self.push(format!("start_map({})", map.len()))
        }
        fn key(&mut self, key: &str) -> Result<()> {
            self.push(format!("key({})", key))
        }
        fn end_map(&mut self) -> Result<()> {
            self.push("end_map".into())
        }
        fn empty_list(&mut self) -> Result<()> {
            self.push("[]".into())
        }
        fn start_list(&mut self, list: &DocList) -> Result<()> {
            self.push(format!("start_list({})", list.len()))
        }
        fn index(&mut self, index: usize) -> Result<()> {
            self.push(format!("index({})", index))
        }
        fn end_list(&mut self) -> Result<()> {
            self.push("end_list".into())
        }
    }

    #[test]
    fn test_event_sequence() {
        let mut recorder = Recorder::default();
        traverse(&doc!({"a": 1, "b": [true, null], "c": {}}), &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start_map(3)",
                "key(a)",
                "i32(1)",
                "key(b)",
                "start_list(2)",
                "index(0)",
                "bool(true)",
                "index(1)",
                "null",
                "end_list",
                "key(c)",
                "{}",
                "end_map",
            ]
        );
    }

    #[test]
    fn test_sorted_keys() {
        let mut recorder = Recorder {
            order: KeyOrder::Sorted,
            ..Default::default()
        };
        traverse(&doc!({"z": 1, "a": 2}), &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start_map(2)",
                "key(a)",
                "i32(2)",
                "key(z)",
                "i32(1)",
                "end_map",
            ]
        );
    }

    #[test]
    fn test_empty_top_level() {
        let mut recorder = Recorder::default();
        traverse_list(&vec![], &mut recorder).unwrap();
        traverse_map(&DocMap::new(), &mut recorder).unwrap();
        assert_eq!(recorder.events, vec!["[]", "{}"]);
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::List(vec![]);
        for _ in 0..MAX_DEPTH - 1 {
            value = Value::List(vec![value]);
        }
        assert!(traverse(&value, &mut Recorder::default()).is_ok());

        let value = Value::List(vec![value]);
        let err = traverse(&value, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_visitor_error_aborts() {
        struct FailOnKey(Recorder);
        impl Visitor for FailOnKey {
            fn visit_null(&mut self) -> Result<()> {
                self.0.visit_null()
            }
            fn visit_bool(&mut self, v: bool) -> Result<()> {
                self.0.visit_bool(v)
            }
            fn visit_i32(&mut self, v: i32) -> Result<()> {
                self.0.visit_i32(v)
            }
            fn visit_i64(&mut self, v: i64) -> Result<()> {
                self.0.visit_i64(v)
            }
            fn visit_f32(&mut self, v: f32) -> Result<()> {
                self.0.visit_f32(v)
            }
            fn visit_f64(&mut self, v: f64) -> Result<()> {
                self.0.visit_f64(v)
            }
            fn visit_str(&mut self, v: &str) -> Result<()> {
                self.0.visit_str(v)
            }
            fn visit_bytes(&mut self, v: &ByteString) -> Result<()> {
                self.0.visit_bytes(v)
            }
            fn empty_map(&mut self) -> Result<()> {
                self.0.empty_map()
            }
            fn start_map(&mut self, m: &DocMap) -> Result<()> {
                self.0.start_map(m)
            }
            fn key(&mut self, key: &str) -> Result<()> {
                Err(Error::encoding(format!("rejected key {}", key)))
            }
            fn end_map(&mut self) -> Result<()> {
                self.0.end_map()
            }
            fn empty_list(&mut self) -> Result<()> {
                self.0.empty_list()
            }
            fn start_list(&mut self, l: &DocList) -> Result<()> {
                self.0.start_list(l)
            }
            fn end_list(&mut self) -> Result<()> {
                self.0.end_list()
            }
        }

        let mut visitor = FailOnKey(Recorder::default());
        let err = traverse(&doc!({"k": 1}), &mut visitor).unwrap_err();
        assert_eq!(err, Error::Encoding("rejected key k".to_string()));
        assert_eq!(visitor.0.events, vec!["start_map(1)"]);
    }
}
