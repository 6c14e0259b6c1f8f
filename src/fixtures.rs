//! Auxiliary JSON fixtures attached by the user.
//!
//! A fixture is one JSON document kept as text. The set is ordered, persisted
//! under a single store key as a JSON array of strings, and injected into
//! script runs as `json0..jsonN` constants plus a `fixtures()` accessor.
//! Malformed *stored* data is logged and treated as absent; malformed data
//! passed to [`FixtureSet::add`] is a recoverable error for the caller.

use crate::geometry::Point;
use crate::storage::{KeyValueStore, FIXTURES_KEY};

/// Invalid JSON handed to [`FixtureSet::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureError(pub String);

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fixture JSON: {}", self.0)
    }
}

impl std::error::Error for FixtureError {}

/// Ordered set of JSON fixture documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureSet {
    entries: Vec<String>,
}

impl FixtureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the store. Anything unreadable falls back to empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(FIXTURES_KEY) else {
            return Self::new();
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => Self { entries },
            Err(e) => {
                log::warn!("ignoring malformed stored fixtures: {e}");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => store.set(FIXTURES_KEY, &raw),
            Err(e) => log::warn!("cannot serialize fixtures: {e}"),
        }
    }

    /// Validate and append one document. The stored form is pretty-printed,
    /// normalizing whatever spacing the user typed.
    pub fn add(&mut self, json: &str) -> Result<(), FixtureError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| FixtureError(e.to_string()))?;
        let pretty = serde_json::to_string_pretty(&value).map_err(|e| FixtureError(e.to_string()))?;
        self.entries.push(pretty);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Parse every entry. Entries that no longer parse (hand-edited storage)
    /// are skipped with a warning.
    pub fn values(&self) -> Vec<serde_json::Value> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| match serde_json::from_str(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("skipping unparseable fixture {i}: {e}");
                    None
                }
            })
            .collect()
    }

    /// Fixtures as script values, in order.
    pub fn to_dynamic(&self) -> Vec<rhai::Dynamic> {
        self.values().iter().map(json_to_dynamic).collect()
    }

    /// Extract points from fixtures shaped like `{x, y, z?}` or arrays of
    /// such objects. Anything else is skipped.
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for value in self.values() {
            match &value {
                serde_json::Value::Array(items) => {
                    points.extend(items.iter().filter_map(point_from_json));
                }
                _ => {
                    if let Some(p) = point_from_json(&value) {
                        points.push(p);
                    }
                }
            }
        }
        points
    }
}

fn point_from_json(value: &serde_json::Value) -> Option<Point> {
    let x = value.get("x")?.as_f64()? as f32;
    let y = value.get("y")?.as_f64()? as f32;
    let z = value.get("z").and_then(|z| z.as_f64()).unwrap_or(0.0) as f32;
    Some(Point::new(x, y, z))
}

/// Convert a script value back into JSON. Returns `None` for values with no
/// JSON form (host types, functions).
pub fn dynamic_to_json(value: &rhai::Dynamic) -> Option<serde_json::Value> {
    if value.is_unit() {
        return Some(serde_json::Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Some(serde_json::Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Some(serde_json::Value::from(i));
    }
    if let Ok(f) = value.as_float() {
        return Some(serde_json::Value::from(f as f64));
    }
    if let Ok(s) = value.clone().into_string() {
        return Some(serde_json::Value::String(s));
    }
    if value.is_array() {
        let arr = value.clone().try_cast::<rhai::Array>()?;
        let items: Option<Vec<_>> = arr.iter().map(dynamic_to_json).collect();
        return Some(serde_json::Value::Array(items?));
    }
    if value.is_map() {
        let map = value.clone().try_cast::<rhai::Map>()?;
        let mut fields = serde_json::Map::new();
        for (k, v) in map.iter() {
            fields.insert(k.to_string(), dynamic_to_json(v)?);
        }
        return Some(serde_json::Value::Object(fields));
    }
    None
}

/// Convert a JSON value into a script value. Numbers become script floats
/// unless they are exact integers.
pub fn json_to_dynamic(value: &serde_json::Value) -> rhai::Dynamic {
    match value {
        serde_json::Value::Null => rhai::Dynamic::UNIT,
        serde_json::Value::Bool(b) => rhai::Dynamic::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rhai::Dynamic::from(i)
            } else {
                rhai::Dynamic::from(n.as_f64().unwrap_or(0.0) as f32)
            }
        }
        serde_json::Value::String(s) => rhai::Dynamic::from(s.clone()),
        serde_json::Value::Array(items) => {
            let arr: rhai::Array = items.iter().map(json_to_dynamic).collect();
            rhai::Dynamic::from(arr)
        }
        serde_json::Value::Object(fields) => {
            let mut map = rhai::Map::new();
            for (k, v) in fields {
                map.insert(k.as_str().into(), json_to_dynamic(v));
            }
            rhai::Dynamic::from(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_add_normalizes_and_orders() {
        let mut fixtures = FixtureSet::new();
        fixtures.add("{\"x\":1,\"y\":2}").unwrap();
        fixtures.add("[1, 2, 3]").unwrap();

        assert_eq!(fixtures.len(), 2);
        assert!(fixtures.entries()[0].contains("\"x\": 1"));
        assert!(fixtures.entries()[1].starts_with('['));
    }

    #[test]
    fn test_add_rejects_invalid_json() {
        let mut fixtures = FixtureSet::new();
        assert!(fixtures.add("{not json").is_err());
        assert!(fixtures.is_empty());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let mut store = MemoryStore::new();
        let mut fixtures = FixtureSet::new();
        fixtures.add("{\"x\": 1, \"y\": 2, \"z\": 3}").unwrap();
        fixtures.save(&mut store);

        let loaded = FixtureSet::load(&store);
        assert_eq!(loaded, fixtures);
    }

    #[test]
    fn test_malformed_stored_data_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(FIXTURES_KEY, "{definitely broken");

        let fixtures = FixtureSet::load(&store);
        assert!(fixtures.is_empty());
    }

    #[test]
    fn test_points_extraction() {
        let mut fixtures = FixtureSet::new();
        fixtures.add("{\"x\": 1, \"y\": 2}").unwrap();
        fixtures.add("[{\"x\": 3, \"y\": 4, \"z\": 5}, {\"label\": \"not a point\"}]").unwrap();
        fixtures.add("\"just a string\"").unwrap();

        let points = fixtures.points();
        assert_eq!(points, vec![Point::new(1.0, 2.0, 0.0), Point::new(3.0, 4.0, 5.0)]);
    }

    #[test]
    fn test_json_to_dynamic_shapes() {
        let value = serde_json::json!({
            "name": "demo",
            "count": 3,
            "scale": 1.5,
            "flags": [true, false],
            "nothing": null,
        });

        let dynamic = json_to_dynamic(&value);
        let map = dynamic.try_cast::<rhai::Map>().unwrap();
        assert_eq!(map.get("name").unwrap().clone().into_string().unwrap(), "demo");
        assert_eq!(map.get("count").unwrap().as_int().unwrap(), 3);
        assert!((map.get("scale").unwrap().as_float().unwrap() - 1.5).abs() < 1e-6);
        let flags = map.get("flags").unwrap().clone().try_cast::<rhai::Array>().unwrap();
        assert_eq!(flags.len(), 2);
        assert!(map.get("nothing").unwrap().is_unit());
    }

    #[test]
    fn test_dynamic_json_roundtrip() {
        let value = serde_json::json!({ "type": "point", "x": 1.0, "y": 2.5, "z": 0 });
        let dynamic = json_to_dynamic(&value);
        let back = dynamic_to_json(&dynamic).unwrap();

        assert_eq!(back["type"], "point");
        assert_eq!(back["z"], 0);
        assert!((back["y"].as_f64().unwrap() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_clear() {
        let mut fixtures = FixtureSet::new();
        fixtures.add("1").unwrap();
        fixtures.clear();
        assert!(fixtures.is_empty());
    }
}
