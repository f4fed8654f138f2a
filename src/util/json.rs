use serde_json::{Map, Value};

/// find the dps object of a device payload, either at the top level or under `data`
pub fn find_dps(json_data: &Value) -> Option<&Map<String, Value>> {
    json_data
        .get("dps")
        .or_else(|| json_data.get("data").and_then(|data| data.get("dps")))
        .and_then(Value::as_object)
}

/// get the `Err` indicator as a string, numeric codes are stringified
pub fn get_error_str(json_data: &Value) -> Option<String> {
    match json_data.get("Err")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
