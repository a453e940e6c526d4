//! Binding options from a JSON configuration document
//!
//! Sections are addressed with `:`-separated paths (`HttpClient:foo:BasicAuth`).
//! Binding overlays the keys present in the section onto an existing value,
//! so several sources can contribute to the same options.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{self, Result};

/// Look up the section at `path`, where segments are separated by `:`.
#[must_use]
pub fn section<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(':')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment
                .trim_matches(|c| c == '[' || c == ']')
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        })
}

/// Overlay `section` onto `target`.
///
/// # Errors
///
/// Returns a `Configuration` error if the section is not an object or does
/// not deserialize into `T`.
pub fn bind_into<T>(section: &Value, target: &mut T) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(overrides) = section else {
        return Err(error::configuration(format!(
            "configuration section must be an object, found {section}"
        )));
    };

    let mut current = match serde_json::to_value(&*target).map_err(error::configuration)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merge(&mut current, overrides);

    *target = serde_json::from_value(Value::Object(current)).map_err(error::configuration)?;
    Ok(())
}

fn merge(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge(existing, nested),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
