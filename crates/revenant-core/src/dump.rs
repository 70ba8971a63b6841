//! JSON export of restored object graphs
//!
//! Each object is written in full the first time it is reached and as
//! `{"$ref": id}` afterwards, so shared references and cycles terminate.

use crate::types::Reconstruct;
use crate::value::{ObjectRef, Value};
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value as Json};

/// Convert a value graph to JSON
pub fn to_json(value: &Value) -> Json {
    JsonDumper::default().dump(value)
}

/// Convert a value graph to pretty-printed JSON text
pub fn to_json_string_pretty(value: &Value) -> String {
    // Serializing a serde_json::Value cannot fail
    serde_json::to_string_pretty(&to_json(value)).unwrap_or_default()
}

#[derive(Default)]
struct JsonDumper {
    // object address -> id
    seen: FxHashMap<usize, usize>,
}

impl JsonDumper {
    fn dump(&mut self, value: &Value) -> Json {
        match value {
            Value::None => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::Str(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| json!(b)).collect()),
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                Json::Array(items.iter().map(|item| self.dump(item)).collect())
            }
            Value::Dict(entries) => self.dump_dict(entries),
            Value::Type(ty) => json!({ "$class": ty.qualified_name() }),
            Value::Object(obj) => self.dump_object(obj),
        }
    }

    fn dump_dict(&mut self, entries: &[(Value, Value)]) -> Json {
        if entries.iter().all(|(k, _)| matches!(k, Value::Str(_))) {
            let mut map = Map::new();
            for (key, value) in entries {
                if let Value::Str(key) = key {
                    map.insert(key.clone(), self.dump(value));
                }
            }
            Json::Object(map)
        } else {
            Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![self.dump(k), self.dump(v)]))
                    .collect(),
            )
        }
    }

    fn dump_object(&mut self, obj: &ObjectRef) -> Json {
        if let Some(id) = self.seen.get(&obj.addr()) {
            return json!({ "$ref": id });
        }
        let id = self.seen.len();
        self.seen.insert(obj.addr(), id);

        let instance = obj.read();
        let mut names: Vec<&String> = instance.attrs().keys().collect();
        names.sort();

        let mut attrs = Map::new();
        for name in names {
            if let Some(value) = instance.get(name) {
                attrs.insert(name.clone(), self.dump(value));
            }
        }

        let mut out = Map::new();
        out.insert(
            "$type".to_string(),
            Json::String(instance.type_name().to_string()),
        );
        out.insert("$id".to_string(), json!(id));
        if let Some(text) = instance.text() {
            out.insert("$text".to_string(), Json::String(text.to_string()));
        }
        out.insert("attrs".to_string(), Json::Object(attrs));
        Json::Object(out)
    }
}
