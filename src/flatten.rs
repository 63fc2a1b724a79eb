use {
    crate::value::{Map, Value},
    indexmap::IndexSet,
    std::num::NonZeroUsize,
    tap::Pipe,
    tracing::instrument,
};

/// Options steering [`flatten`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Separator joining path segments into flat keys.
    pub delimiter: String,
    /// Containers reached at this depth are kept whole. Children of the root
    /// sit at depth 1.
    pub max_depth: Option<NonZeroUsize>,
    /// Fully-joined paths whose subtrees are kept whole. Matched exactly, so
    /// entries are only valid for the delimiter they were built with.
    pub no_flatten_keys: IndexSet<String>,
    /// Treat arrays as leaves instead of indexing into them.
    pub safe: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            delimiter: ".".to_string(),
            max_depth: None,
            no_flatten_keys: IndexSet::new(),
            safe: false,
        }
    }
}

impl FlattenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// A depth of zero means unlimited.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = NonZeroUsize::new(depth);
        self
    }

    pub fn with_no_flatten_key(mut self, key: impl Into<String>) -> Self {
        self.no_flatten_keys.insert(key.into());
        self
    }

    pub fn safe(mut self) -> Self {
        self.safe = true;
        self
    }
}

fn boxed_iter<'a, T, I>(iter: I) -> Box<dyn Iterator<Item = T> + 'a>
where
    T: 'a,
    I: Iterator<Item = T> + 'a,
{
    Box::new(iter)
}

type Entries = Box<dyn Iterator<Item = (String, Value)>>;

/// Walks `object` depth-first and collects every leaf under its
/// delimiter-joined path. Leaves move into the output as-is; excluded, empty
/// and depth-pinned containers count as leaves.
#[instrument(skip_all)]
pub fn flatten(object: Map, options: &FlattenOptions) -> Map {
    let mut output = Map::new();
    step(boxed_iter(object.into_iter()), None, 1, options, &mut output);
    output
}

fn step(entries: Entries, prefix: Option<&str>, depth: usize, options: &FlattenOptions, output: &mut Map) {
    for (key, value) in entries {
        let path = match prefix {
            Some(prefix) => format!("{prefix}{}{key}", options.delimiter),
            None => key,
        };
        let pinned = options.no_flatten_keys.contains(path.as_str())
            || options.max_depth.is_some_and(|limit| depth >= limit.get());
        let children = match value {
            value if pinned => Err(value),
            Value::Array(items) if options.safe => Err(Value::Array(items)),
            Value::Array(items) if !items.is_empty() => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (idx.to_string(), item))
                .pipe(boxed_iter)
                .pipe(Ok),
            Value::Object(map) if !map.is_empty() => map.into_iter().pipe(boxed_iter).pipe(Ok),
            leaf => Err(leaf),
        };
        match children {
            Ok(children) => step(children, Some(path.as_str()), depth + 1, options, output),
            Err(leaf) => {
                output.insert(path, leaf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json, tap::Pipe};

    fn object(value: serde_json::Value) -> Map {
        match Value::from(value) {
            Value::Object(map) => map,
            other => panic!("test inputs must be objects, got {other:?}"),
        }
    }

    #[track_caller]
    fn assert_flattens_to(input: serde_json::Value, options: &FlattenOptions, expected: serde_json::Value) {
        assert_eq!(
            flatten(object(input), options).pipe(Value::Object),
            expected.pipe(Value::from),
        );
    }

    #[test]
    fn test_nested_once() {
        assert_flattens_to(
            json!({ "hello": { "world": "good morning" } }),
            &FlattenOptions::default(),
            json!({ "hello.world": "good morning" }),
        );
    }

    #[test]
    fn test_nested_twice() {
        assert_flattens_to(
            json!({ "hello": { "world": { "again": "good morning" } } }),
            &FlattenOptions::default(),
            json!({ "hello.world.again": "good morning" }),
        );
    }

    #[test]
    fn test_scalar_leaves_keep_their_value() {
        for leaf in [
            Value::from("good morning"),
            Value::Number(serde_json::Number::from_f64(1234.99).expect("finite")),
            Value::from(true),
            Value::Null,
            Value::Undefined,
        ] {
            let input = Map::from_iter([(
                "hello".to_string(),
                Value::Object(Map::from_iter([("world".to_string(), leaf.clone())])),
            )]);
            assert_eq!(
                flatten(input, &FlattenOptions::default()),
                Map::from_iter([("hello.world".to_string(), leaf)]),
            );
        }
    }

    #[test]
    fn test_multiple_keys() {
        assert_flattens_to(
            json!({
                "hello": { "lorem": { "ipsum": "again", "dolor": "sit" } },
                "world": { "lorem": { "ipsum": "again", "dolor": "sit" } }
            }),
            &FlattenOptions::default(),
            json!({
                "hello.lorem.ipsum": "again",
                "hello.lorem.dolor": "sit",
                "world.lorem.ipsum": "again",
                "world.lorem.dolor": "sit"
            }),
        );
    }

    #[test]
    fn test_custom_delimiter() {
        assert_flattens_to(
            json!({ "hello": { "world": { "again": "good morning" } } }),
            &FlattenOptions::new().with_delimiter(":"),
            json!({ "hello:world:again": "good morning" }),
        );
    }

    #[test]
    fn test_no_flatten_keys_with_custom_delimiter() {
        assert_flattens_to(
            json!({
                "hello": {
                    "world": { "again": "good morning" },
                    "horse": { "goes": "neigh neigh", "givesMilk": false },
                    "cow": {
                        "goes": "moo moo",
                        "dung": { "colour": "brownish", "consistency": "flappy, downright mushy" },
                        "givesMilk": true
                    }
                },
                "foobar": { "barfoo": true }
            }),
            &FlattenOptions::new()
                .with_delimiter(":")
                .with_no_flatten_key("foobar")
                .with_no_flatten_key("hello:horse")
                .with_no_flatten_key("hello:cow:dung")
                .with_no_flatten_key("hello:cow:givesMilk"),
            json!({
                "hello:world:again": "good morning",
                "hello:horse": { "goes": "neigh neigh", "givesMilk": false },
                "hello:cow:goes": "moo moo",
                "hello:cow:dung": { "colour": "brownish", "consistency": "flappy, downright mushy" },
                "hello:cow:givesMilk": true,
                "foobar": { "barfoo": true }
            }),
        );
    }

    #[test]
    fn test_empty_containers_are_leaves() {
        assert_flattens_to(
            json!({ "hello": { "empty": { "nested": {} }, "none": [] } }),
            &FlattenOptions::default(),
            json!({ "hello.empty.nested": {}, "hello.none": [] }),
        );
    }

    #[test]
    fn test_byte_buffers_are_never_descended() {
        let input = Map::from_iter([(
            "hello".to_string(),
            Value::Object(Map::from_iter([(
                "empty".to_string(),
                Value::Object(Map::from_iter([(
                    "nested".to_string(),
                    Value::Bytes(b"test".to_vec()),
                )])),
            )])),
        )]);
        assert_eq!(
            flatten(input, &FlattenOptions::default()),
            Map::from_iter([("hello.empty.nested".to_string(), Value::Bytes(b"test".to_vec()))]),
        );
    }

    #[test]
    fn test_max_depth_pins_subtrees() {
        assert_flattens_to(
            json!({
                "hello": { "world": { "again": "good morning" } },
                "lorem": { "ipsum": { "dolor": "good evening" } }
            }),
            &FlattenOptions::new().with_max_depth(2),
            json!({
                "hello.world": { "again": "good morning" },
                "lorem.ipsum": { "dolor": "good evening" }
            }),
        );
    }

    #[test]
    fn test_max_depth_of_zero_is_unlimited() {
        assert_flattens_to(
            json!({ "a": { "b": { "c": 1 } } }),
            &FlattenOptions::new().with_max_depth(0),
            json!({ "a.b.c": 1 }),
        );
    }

    #[test]
    fn test_arrays_flatten_under_stringified_indices() {
        assert_flattens_to(
            json!({ "hello": [{ "world": { "again": "foo" } }, { "lorem": "ipsum" }] }),
            &FlattenOptions::default(),
            json!({ "hello.0.world.again": "foo", "hello.1.lorem": "ipsum" }),
        );
    }

    #[test]
    fn test_safe_protects_arrays() {
        assert_flattens_to(
            json!({
                "hello": [{ "world": { "again": "foo" } }, { "lorem": "ipsum" }],
                "another": { "nested": [{ "array": { "too": "deep" } }] },
                "lorem": { "ipsum": "whoop" }
            }),
            &FlattenOptions::new().safe(),
            json!({
                "hello": [{ "world": { "again": "foo" } }, { "lorem": "ipsum" }],
                "lorem.ipsum": "whoop",
                "another.nested": [{ "array": { "too": "deep" } }]
            }),
        );
    }
}
