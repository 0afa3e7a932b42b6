//! Structured argument decoders.
//!
//! Cached arguments are plain JSON. Parameters declared with
//! [`Param::structured`](super::Param::structured) carry a tag; when the
//! stored value is an object and a decoder is registered for that tag, the
//! decoder turns it back into the typed value before the component runs.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub type Decoded = Box<dyn Any + Send + Sync>;
type DecodeFn = Arc<dyn Fn(&Map<String, Value>) -> anyhow::Result<Decoded> + Send + Sync>;

#[derive(Default, Clone)]
pub struct ArgDecoders {
    decoders: FxHashMap<String, DecodeFn>,
}

impl ArgDecoders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a serde-backed decoder for `tag`.
    pub fn register<T>(&mut self, tag: impl Into<String>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.register_with(tag, |map| {
            let value: T = serde_json::from_value(Value::Object(map.clone()))?;
            Ok(Box::new(value) as Decoded)
        });
    }

    pub fn register_with<F>(&mut self, tag: impl Into<String>, decode: F)
    where
        F: Fn(&Map<String, Value>) -> anyhow::Result<Decoded> + Send + Sync + 'static,
    {
        self.decoders.insert(tag.into(), Arc::new(decode));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Decode `value` with the decoder registered for `tag`.
    ///
    /// Returns `None` when the value is not an object, no decoder exists,
    /// or the decoder rejects the value. The raw value stays available to
    /// the component in every case.
    pub fn decode(&self, tag: &str, value: &Value) -> Option<Decoded> {
        let Value::Object(map) = value else {
            return None;
        };
        let decoder = self.decoders.get(tag)?;
        match decoder(map) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                crate::debug!("component"; "decoder `{}` rejected value: {}", tag, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u32,
    }

    fn decoders() -> ArgDecoders {
        let mut decoders = ArgDecoders::new();
        decoders.register::<User>("user");
        decoders
    }

    #[test]
    fn test_decode_object() {
        let decoded = decoders()
            .decode("user", &json!({"name": "Ada", "age": 36}))
            .unwrap();
        let user = decoded.downcast_ref::<User>().unwrap();
        assert_eq!(
            user,
            &User {
                name: "Ada".into(),
                age: 36
            }
        );
    }

    #[test]
    fn test_non_object_is_left_alone() {
        assert!(decoders().decode("user", &json!("Ada")).is_none());
    }

    #[test]
    fn test_failed_decode_is_ignored() {
        assert!(decoders().decode("user", &json!({"name": "Ada"})).is_none());
    }

    #[test]
    fn test_unknown_tag() {
        assert!(decoders().decode("order", &json!({})).is_none());
        assert!(!decoders().contains("order"));
    }
}
