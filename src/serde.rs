use {
    crate::{
        Flattened, FlattenedRef,
        flatten::{FlattenOptions, flatten},
        unflatten::{UnflattenOptions, unflatten},
        value::Value,
    },
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tap::Pipe,
    tracing::instrument,
};

impl<T> Serialize for FlattenedRef<'_, T>
where
    T: Serialize,
{
    #[instrument(skip_all)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde_json::to_value(self.0)
            .map_err(serde::ser::Error::custom)
            .map(Value::from)
            .map(|value| match value {
                Value::Object(map) => flatten(map, &FlattenOptions::default()).pipe(Value::Object),
                leaf => leaf,
            })
            .and_then(|value| serde_json::Value::try_from(value).map_err(serde::ser::Error::custom))
            .and_then(|value| value.serialize(serializer))
    }
}

impl<T> Serialize for Flattened<T>
where
    T: Serialize,
{
    #[instrument(skip_all)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_ref().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Flattened<T>
where
    T: DeserializeOwned,
{
    #[instrument(skip(deserializer))]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer)
            .map(Value::from)
            .map(|value| unflatten(value, &UnflattenOptions::default()))
            .and_then(|value| serde_json::Value::try_from(value).map_err(serde::de::Error::custom))
            .and_then(|value| serde_json::from_value::<T>(value).map_err(serde::de::Error::custom))
            .map(Self)
    }
}
