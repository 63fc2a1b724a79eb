use {
    crate::value::{Map, Value},
    std::ops::ControlFlow,
    tap::Pipe,
    tracing::instrument,
};

/// Options steering [`unflatten`].
#[derive(Debug, Clone)]
pub struct UnflattenOptions {
    /// Separator splitting flat keys into path segments.
    pub delimiter: String,
    /// Replace scalars occupying a path prefix instead of dropping the
    /// deeper keys.
    pub overwrite: bool,
    /// Build objects keyed by stringified indices instead of arrays.
    pub object: bool,
}

impl Default for UnflattenOptions {
    fn default() -> Self {
        Self {
            delimiter: ".".to_string(),
            overwrite: false,
            object: false,
        }
    }
}

impl UnflattenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn object(mut self) -> Self {
        self.object = true;
        self
    }
}

/// One component of a flat key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Idx(usize),
    Field(&'a str),
}

impl<'a> Segment<'a> {
    /// Digits-only segments address array slots. Anything a full base-10
    /// parse rejects (floats, exponents, text with embedded delimiters)
    /// stays a field key.
    fn parse(raw: &'a str) -> Self {
        raw.parse::<usize>().map(Segment::Idx).unwrap_or(Segment::Field(raw))
    }

    fn into_key(self) -> String {
        match self {
            Segment::Idx(idx) => idx.to_string(),
            Segment::Field(raw) => raw.to_string(),
        }
    }
}

#[extension_traits::extension(trait VecSlotExt)]
impl Vec<Value> {
    /// Grows the vector with explicit absence markers so out-of-order
    /// indices land in the right slot.
    fn slot_mut(&mut self, index: usize) -> &mut Value {
        if self.len() <= index {
            self.resize(index + 1, Value::Undefined);
        }
        &mut self[index]
    }
}

/// A field key landing on an array turns it into an object keyed by
/// stringified indices; the elements keep their positions as keys.
fn into_keyed_object(recipient: &mut Value) {
    if let Value::Array(items) = recipient {
        *recipient = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(idx, item)| (idx.to_string(), item))
            .collect::<Map>()
            .pipe(Value::Object);
    }
}

fn child_slot<'v>(recipient: &'v mut Value, segment: Segment<'_>) -> &'v mut Value {
    if let (Value::Array(_), Segment::Field(_)) = (&*recipient, &segment) {
        into_keyed_object(recipient);
    }
    match (recipient, segment) {
        (Value::Array(items), Segment::Idx(idx)) => items.slot_mut(idx),
        (Value::Object(map), segment) => map.entry(segment.into_key()).or_insert(Value::Undefined),
        (other, segment) => panic!("recipients are always containers, got {other:?} at {segment:?}"),
    }
}

fn empty_container(next: &Segment<'_>, options: &UnflattenOptions) -> Value {
    match next {
        Segment::Idx(_) if !options.object => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

fn insert(root: &mut Value, key: &str, leaf: Value, options: &UnflattenOptions) -> ControlFlow<()> {
    let segments = key
        .split(options.delimiter.as_str())
        .map(Segment::parse)
        .collect::<Vec<_>>();
    let (last, ancestors) = segments
        .split_last()
        .expect("splitting a str always yields at least one segment");
    let mut recipient = root;
    for (position, segment) in ancestors.iter().enumerate() {
        let next = &segments[position + 1];
        let slot = child_slot(recipient, segment.clone());
        match slot {
            Value::Object(_) | Value::Array(_) => {}
            Value::Undefined => *slot = empty_container(next, options),
            _ if options.overwrite => *slot = empty_container(next, options),
            occupied => {
                tracing::debug!(%key, ?occupied, "scalar occupies a path prefix, dropping the remaining keys");
                return ControlFlow::Break(());
            }
        }
        recipient = slot;
    }
    *child_slot(recipient, last.clone()) = unflatten(leaf, options);
    ControlFlow::Continue(())
}

/// Rebuilds a nested tree from a map of delimiter-joined keys. Non-object
/// input passes through unchanged. Each leaf is unflattened again on the way
/// in, so partially flattened values compose.
///
/// With `overwrite` off, a flat key whose path prefix is occupied by a
/// scalar ends the walk; the result keeps what the earlier keys built. This
/// is a policy branch, not an error.
#[instrument(skip_all)]
pub fn unflatten(value: Value, options: &UnflattenOptions) -> Value {
    let map = match value {
        Value::Object(map) => map,
        passthrough => return passthrough,
    };
    let mut root = Value::Object(Map::new());
    for (key, leaf) in map {
        if insert(&mut root, &key, leaf, options).is_break() {
            break;
        }
    }
    root
}
