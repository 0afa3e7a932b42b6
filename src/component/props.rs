//! Arguments as seen by a rendering function.

use std::any::Any;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::decode::{ArgDecoders, Decoded};
use super::{Param, ParamKind};

/// Plain JSON arguments of an invocation, keyed by parameter name.
pub type Args = Map<String, Value>;

#[derive(Debug, Error)]
pub enum PropError {
    #[error("missing argument `{0}`")]
    Missing(String),

    #[error("invalid argument `{name}`")]
    Invalid {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invocation arguments plus any structured values decoded from them.
#[derive(Default)]
pub struct Props {
    values: Args,
    decoded: FxHashMap<String, Decoded>,
}

impl std::fmt::Debug for Props {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.values)
            .field("decoded", &self.decoded.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Props {
    pub fn new(values: Args) -> Self {
        Self {
            values,
            decoded: FxHashMap::default(),
        }
    }

    /// Build props for `params`, decoding structured arguments on the way.
    pub(crate) fn decode(values: Args, params: &[Param], decoders: &ArgDecoders) -> Self {
        let mut decoded = FxHashMap::default();
        for param in params {
            let ParamKind::Structured { tag } = &param.kind else {
                continue;
            };
            let Some(value) = values.get(&param.name) else {
                continue;
            };
            if let Some(typed) = decoders.decode(tag, value) {
                decoded.insert(param.name.clone(), typed);
            }
        }
        Self { values, decoded }
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, PropError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| PropError::Missing(name.to_string()))?;
        T::deserialize(value).map_err(|source| PropError::Invalid {
            name: name.to_string(),
            source,
        })
    }

    /// Structured value decoded by a registered decoder.
    pub fn typed<T: Any>(&self, name: &str) -> Option<&T> {
        self.decoded.get(name)?.downcast_ref::<T>()
    }

    pub fn values(&self) -> &Args {
        &self.values
    }

    pub fn into_values(self) -> Args {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn args(value: Value) -> Args {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_plain_access() {
        let props = Props::new(args(json!({"name": "Ada", "count": 3})));
        assert_eq!(props.str("name"), Some("Ada"));
        assert_eq!(props.get::<u32>("count").unwrap(), 3);
        assert!(props.str("count").is_none());
        assert!(matches!(props.get::<u32>("nope"), Err(PropError::Missing(_))));
        assert!(matches!(
            props.get::<u32>("name"),
            Err(PropError::Invalid { .. })
        ));
    }

    #[test]
    fn test_structured_decoding() {
        let mut decoders = ArgDecoders::new();
        decoders.register::<Point>("point");
        let params = vec![Param::value("label"), Param::structured("at", "point")];

        let props = Props::decode(
            args(json!({"label": "origin", "at": {"x": 0, "y": 1}})),
            &params,
            &decoders,
        );
        assert_eq!(props.typed::<Point>("at"), Some(&Point { x: 0, y: 1 }));
        assert!(props.typed::<Point>("label").is_none());
        // raw JSON is kept alongside the decoded value
        assert_eq!(props.raw("at"), Some(&json!({"x": 0, "y": 1})));
    }

    #[test]
    fn test_undecodable_structured_value_stays_raw() {
        let mut decoders = ArgDecoders::new();
        decoders.register::<Point>("point");
        let params = vec![Param::structured("at", "point")];

        let props = Props::decode(args(json!({"at": {"x": "left"}})), &params, &decoders);
        assert!(props.typed::<Point>("at").is_none());
        assert!(props.raw("at").is_some());
    }
}
