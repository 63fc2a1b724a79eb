pub mod flatten;
pub mod unflatten;
pub mod value;

pub use {
    flatten::{FlattenOptions, flatten},
    unflatten::{UnflattenOptions, unflatten},
    value::{Map, Value},
};

/// Wrapper that serializes its contents as a single-level map with
/// delimiter-joined keys, and restores the nested shape on deserialization.
#[derive(Debug)]
pub struct Flattened<T>(T);

#[derive(Debug)]
pub struct FlattenedRef<'a, T>(&'a T);

impl<T> Flattened<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_ref(&self) -> FlattenedRef<'_, T> {
        FlattenedRef(&self.0)
    }
}

mod serde;
