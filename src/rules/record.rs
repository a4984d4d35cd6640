//! Configuration record parsing
//!
//! The record is a JSON object:
//!
//! ```json
//! {
//!   "TimeRule": { "AAPL": [["1111100", 93000, 160000, 60, 30]] },
//!   "AlertCMD": ["echo {HEADER} {BODY}"]
//! }
//! ```
//!
//! Each rule is `[weekdayMask, beginTime, endTime, tickThreshold, quoteThreshold]`.

use super::{AlertCommand, RuleSet};
use crate::domain::{TimeOfDay, TimeRule, WeekdayMask};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Names of the five rule fields, in positional order
const FIELD_NAMES: [&str; 5] = [
    "weekdayMask",
    "beginTime",
    "endTime",
    "tickThreshold",
    "quoteThreshold",
];

const TIME_RULE_KEY: &str = "TimeRule";
const ALERT_CMD_KEY: &str = "AlertCMD";

/// Parse and validate a configuration record
pub fn parse_record(text: &str) -> Result<RuleSet, ConfigError> {
    let root: Value =
        serde_json::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let root = root.as_object().ok_or_else(|| ConfigError::InvalidValue {
        key: "<record>".to_string(),
        message: "expected a JSON object".to_string(),
    })?;

    let time_rules = root
        .get(TIME_RULE_KEY)
        .ok_or_else(|| ConfigError::MissingField(TIME_RULE_KEY.to_string()))?
        .as_object()
        .ok_or_else(|| ConfigError::InvalidValue {
            key: TIME_RULE_KEY.to_string(),
            message: "expected an object keyed by symbol".to_string(),
        })?;

    let mut rules = BTreeMap::new();
    for (symbol, list) in time_rules {
        if symbol.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: TIME_RULE_KEY.to_string(),
                message: "empty symbol name".to_string(),
            });
        }

        let list = list.as_array().ok_or_else(|| ConfigError::InvalidValue {
            key: format!("{}.{}", TIME_RULE_KEY, symbol),
            message: "expected a list of rules".to_string(),
        })?;

        let parsed = list
            .iter()
            .enumerate()
            .map(|(idx, raw)| parse_rule(symbol, idx + 1, raw))
            .collect::<Result<Vec<_>, _>>()?;

        rules.insert(symbol.clone(), parsed);
    }

    let commands = root
        .get(ALERT_CMD_KEY)
        .ok_or_else(|| ConfigError::MissingField(ALERT_CMD_KEY.to_string()))?
        .as_array()
        .ok_or_else(|| ConfigError::InvalidValue {
            key: ALERT_CMD_KEY.to_string(),
            message: "expected a list of command strings".to_string(),
        })?
        .iter()
        .enumerate()
        .map(|(idx, cmd)| {
            cmd.as_str()
                .map(AlertCommand::new)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: format!("{}[{}]", ALERT_CMD_KEY, idx),
                    message: "expected a string".to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleSet::new(rules, commands))
}

fn parse_rule(symbol: &str, index: usize, raw: &Value) -> Result<TimeRule, ConfigError> {
    let invalid = |field: &str, message: String| ConfigError::InvalidRule {
        symbol: symbol.to_string(),
        index,
        field: field.to_string(),
        message,
    };

    let fields = raw
        .as_array()
        .ok_or_else(|| invalid("rule", "expected a 5-element list".to_string()))?;
    if fields.len() != FIELD_NAMES.len() {
        return Err(invalid(
            "rule",
            format!("expected 5 elements, found {}", fields.len()),
        ));
    }

    let weekdays = parse_weekday_mask(&fields[0]).map_err(|m| invalid(FIELD_NAMES[0], m))?;
    let begin = parse_time(&fields[1]).map_err(|m| invalid(FIELD_NAMES[1], m))?;
    let end = parse_time(&fields[2]).map_err(|m| invalid(FIELD_NAMES[2], m))?;
    let tick = parse_threshold(&fields[3]).map_err(|m| invalid(FIELD_NAMES[3], m))?;
    let quote = parse_threshold(&fields[4]).map_err(|m| invalid(FIELD_NAMES[4], m))?;

    Ok(TimeRule::new(weekdays, begin, end, tick, quote))
}

fn parse_weekday_mask(value: &Value) -> Result<WeekdayMask, String> {
    match value {
        Value::String(s) => WeekdayMask::parse(s).map_err(|e| e.to_string()),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("expected 7 binary digits, found {}", n))
            .and_then(|v| WeekdayMask::from_integer(v).map_err(|e| e.to_string())),
        other => Err(format!("expected a string of 7 binary digits, found {}", other)),
    }
}

fn parse_time(value: &Value) -> Result<TimeOfDay, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("expected HHMMSS, found {}", n))
            .and_then(|v| TimeOfDay::from_hhmmss(v).map_err(|e| e.to_string())),
        Value::String(s) => TimeOfDay::parse(s).map_err(|e| e.to_string()),
        other => Err(format!("expected HHMMSS, found {}", other)),
    }
}

fn parse_threshold(value: &Value) -> Result<u64, String> {
    value
        .as_u64()
        .ok_or_else(|| format!("expected a non-negative integer, found {}", value))
}
