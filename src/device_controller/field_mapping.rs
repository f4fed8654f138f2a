//! static tables turning raw field codes and values into named, human readable values
//! - field code -> semantic name
//! - field code -> scale factor for fixed point numbers
//! - semantic name -> closed enumeration of labels

use std::collections::HashMap;
use lazy_static::lazy_static;
use serde_json::Value;
use strum::EnumString;
use crate::common::error::{ErrorCode, ProxyError};
use crate::common::setting::Mapping;
use crate::warn;

const LOG_TAG: &str = "field_mapping";

/// keys owned by the snapshot envelope, not usable as field names
const RESERVED_NAMES: [&str; 3] = ["timestamp", "device_id", "connected"];

/// operating mode of the heat pump
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString)]
pub enum Mode {
    Cooling = 0,
    Heating = 1,
    Auto = 2,
}

/// compressor work mode of the heat pump
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString)]
pub enum WorkMode {
    Silence = 0,
    Smart = 1,
    Boost = 2,
}

/// fields whose device labels translate to integer codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnumTable {
    Mode,
    WorkMode,
}

impl EnumTable {
    /// integer code of a label, None if the label is unknown
    pub fn code_of(&self, label: &str) -> Option<i64> {
        match self {
            EnumTable::Mode => label.parse::<Mode>().ok().map(|m| m as i64),
            EnumTable::WorkMode => label.parse::<WorkMode>().ok().map(|m| m as i64),
        }
    }
}

lazy_static! {
    static ref HEAT_PUMP_NAMES: HashMap<String, String> = [
        ("1", "switch"),
        ("2", "mode"),
        ("4", "temp_set"),
        ("5", "work_mode"),
        ("15", "fault"),
        ("16", "temp_current"),
        ("17", "work_state"),
        ("25", "effluent_temp"),
    ]
    .iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect();

    static ref HEAT_PUMP_SCALES: HashMap<String, f64> = [("4", 0.1), ("16", 0.1)]
        .iter()
        .map(|(code, scale)| (code.to_string(), *scale))
        .collect();
}

#[derive(Debug, Clone)]
pub struct FieldMapping {
    names: HashMap<String, String>,
    scales: HashMap<String, f64>,
    enums: HashMap<String, EnumTable>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        FieldMapping::heat_pump()
    }
}

impl FieldMapping {
    /// built-in tables of the heat pump controller
    pub fn heat_pump() -> Self {
        FieldMapping {
            names: HEAT_PUMP_NAMES.clone(),
            scales: HEAT_PUMP_SCALES.clone(),
            enums: default_enums(),
        }
    }

    /// heat pump tables with the overrides from the `[mapping]` config section
    pub fn from_settings(mapping: &Mapping) -> Result<Self, ProxyError> {
        let mut ret = FieldMapping::heat_pump();
        for (code, name) in mapping.names.iter() {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(ProxyError::new(
                    ErrorCode::FieldMappingError,
                    format!("field {} cannot be named {}, the name is reserved", code, name),
                ));
            }
            ret.names.insert(code.clone(), name.clone());
        }
        for (code, scale) in mapping.scales.iter() {
            if !scale.is_finite() {
                return Err(ProxyError::new(
                    ErrorCode::FieldMappingError,
                    format!("scale of field {} is not a finite number", code),
                ));
            }
            ret.scales.insert(code.clone(), *scale);
        }
        Ok(ret)
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// transform one raw value into its mapped form
    /// returns None for unmapped field codes
    pub fn transform(&self, code: &str, value: &Value) -> Option<(String, Value)> {
        let name = self.name_of(code)?;

        let value = match (self.scales.get(code), value.as_f64()) {
            (Some(scale), Some(number)) if value.is_number() => Value::from(number * scale),
            _ => value.clone(),
        };

        let mapped = match (&value, self.enums.get(name)) {
            (Value::Bool(on), _) => Value::from(if *on { 1 } else { 0 }),
            (Value::String(label), Some(table)) => match table.code_of(label) {
                Some(code) => Value::from(code),
                None => {
                    warn!(LOG_TAG, "unknown label {} for field {}, keeping the raw label", label, name);
                    value.clone()
                }
            },
            (_, Some(_)) => {
                warn!(LOG_TAG, "field {} expects a label, got {}, keeping the raw value", name, value);
                value.clone()
            }
            _ => value.clone(),
        };
        Some((name.to_string(), mapped))
    }
}

fn default_enums() -> HashMap<String, EnumTable> {
    let mut enums = HashMap::new();
    enums.insert("mode".to_string(), EnumTable::Mode);
    enums.insert("work_mode".to_string(), EnumTable::WorkMode);
    enums
}
