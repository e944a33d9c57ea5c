//! Request parsing for the single RPC endpoint
//!
//! A request is assembled from up to three sources: the query string, an
//! urlencoded form body, and a JSON object body. Later sources override
//! earlier ones field by field at the top level. Every string value is
//! HTML-escaped before it is used.

use blobbox_security::sanitize_value;
use serde_json::{Map, Value};
use tracing::debug;

pub type Params = Map<String, Value>;

/// Bracket segments allowed in one urlencoded key, as with PHP's
/// `max_input_nesting_level`
pub const MAX_KEY_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Requested operation name, empty when the caller sent none
    pub method: String,
    pub params: Params,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Merge the three request sources into one request
    pub fn from_sources(query: Option<&str>, form: Option<&str>, body: &[u8]) -> Self {
        let mut merged = Params::new();

        if let Some(query) = query {
            merged.extend(sanitize_fields(urlencoded_fields(query)));
        }
        if let Some(form) = form {
            merged.extend(sanitize_fields(urlencoded_fields(form)));
        }
        merged.extend(sanitize_fields(json_fields(body)));

        Self::from_fields(merged)
    }

    fn from_fields(mut fields: Params) -> Self {
        let method = match fields.remove("method") {
            Some(Value::String(method)) => method,
            _ => String::new(),
        };

        let params = match fields.remove("params") {
            Some(Value::Object(params)) => params,
            _ => Params::new(),
        };

        Self { method, params }
    }
}

fn sanitize_fields(fields: Params) -> Params {
    match sanitize_value(Value::Object(fields)) {
        Value::Object(fields) => fields,
        _ => Params::new(),
    }
}

fn json_fields(body: &[u8]) -> Params {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Params::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            debug!("ignoring JSON body that is not an object");
            Params::new()
        }
        Err(_) => Params::new(),
    }
}

/// Decode `a=1&params[name]=x` into nested fields. A `params` value given as
/// a JSON object string is expanded into that object.
fn urlencoded_fields(input: &str) -> Params {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(input) {
        Ok(pairs) => pairs,
        Err(e) => {
            debug!(error = %e, "ignoring malformed urlencoded input");
            return Params::new();
        }
    };

    let mut root = Value::Object(Params::new());
    for (key, value) in pairs {
        match key_path(&key) {
            Some(path) => insert_path(&mut root, &path, Value::String(value)),
            None => debug!(key_len = key.len(), "dropping key nested too deeply"),
        }
    }

    let mut fields = match root {
        Value::Object(fields) => fields,
        _ => Params::new(),
    };

    let expanded = match fields.get("params") {
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_object),
        _ => None,
    };
    if let Some(params) = expanded {
        fields.insert("params".to_string(), params);
    }

    fields
}

/// Split `params[data][0]` into `["params", "data", "0"]`. Keys without a
/// well-formed bracket suffix are taken literally. Keys with more than
/// [`MAX_KEY_DEPTH`] bracket segments yield `None`.
fn key_path(key: &str) -> Option<Vec<String>> {
    let Some(open) = key.find('[') else {
        return Some(vec![key.to_string()]);
    };
    if open == 0 {
        return Some(vec![key.to_string()]);
    }

    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return Some(vec![key.to_string()]);
        };
        if path.len() > MAX_KEY_DEPTH {
            return None;
        }
        path.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        return Some(vec![key.to_string()]);
    }

    Some(path)
}

/// Store `value` at `path` below `slot`, creating objects along the way. An
/// empty segment appends to an array.
fn insert_path(slot: &mut Value, path: &[String], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *slot = value;
        return;
    };

    if segment.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            let mut child = Value::Null;
            insert_path(&mut child, rest, value);
            items.push(child);
        }
    } else {
        if !slot.is_object() {
            *slot = Value::Object(Params::new());
        }
        if let Value::Object(fields) = slot {
            let child = fields.entry(segment.clone()).or_insert(Value::Null);
            insert_path(child, rest, value);
        }
    }
}
