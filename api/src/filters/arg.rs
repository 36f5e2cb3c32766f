use catalog_common::{clamp_to_boolean_flag, value_to_display, Operator};
use serde_json::{Map, Value};

/// Value of one operator inside an operator map.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(String),
    List(Vec<String>),
    Bounds {
        from: Option<String>,
        to: Option<String>,
    },
}

/// One filter argument, decoded from its loosely typed GraphQL shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    /// `{"color": "red"}`
    Scalar(String),
    /// `{"color": ["red", "blue"]}`
    List(Vec<String>),
    /// `{"price": {"gteq": 10, "lt": 100}}`, `from`/`to` merged into a single range.
    Operators(Vec<(Operator, Operand)>),
}

impl FilterArg {
    pub fn decode(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Err("Empty filter value".to_string()),
            Value::Bool(_) => scalar_text(value)
                .map(FilterArg::Scalar)
                .ok_or_else(|| "Unsupported boolean".to_string()),
            Value::String(_) | Value::Number(_) => scalar_text(value)
                .map(FilterArg::Scalar)
                .ok_or_else(|| "Unsupported scalar".to_string()),
            Value::Array(items) => Ok(FilterArg::List(scalar_list(items))),
            Value::Object(map) => decode_operators(map).map(FilterArg::Operators),
        }
    }
}

/// Text form of a scalar; booleans become engine flags `1`/`0`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(_) => clamp_to_boolean_flag(value).map(|flag| flag.to_string()),
        Value::String(_) | Value::Number(_) => value_to_display(value),
        _ => None,
    }
}

pub(crate) fn scalar_list(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(scalar_text).collect()
}

fn decode_operators(map: &Map<String, Value>) -> Result<Vec<(Operator, Operand)>, String> {
    let mut operators = Vec::new();
    let mut from = None;
    let mut to = None;
    for (key, value) in map {
        match key.as_str() {
            "from" => from = scalar_text(value),
            "to" => to = scalar_text(value),
            "eq" | "gt" | "lt" | "gteq" | "lteq" => {
                let operator: Operator = key
                    .parse()
                    .map_err(|_| format!("Unknown operator `{}`", key))?;
                let operand = match value {
                    Value::Array(items) => Operand::List(scalar_list(items)),
                    _ => Operand::Scalar(
                        scalar_text(value)
                            .ok_or_else(|| format!("Operator `{}` needs a scalar", key))?,
                    ),
                };
                operators.push((operator, operand));
            }
            "in" => {
                let list = match value {
                    Value::Array(items) => scalar_list(items),
                    _ => scalar_text(value)
                        .map(|text| split_list(&text))
                        .unwrap_or_default(),
                };
                operators.push((Operator::In, Operand::List(list)));
            }
            "range" => operators.push((Operator::Range, decode_range(value)?)),
            other => return Err(format!("Unknown operator `{}`", other)),
        }
    }
    if from.is_some() || to.is_some() {
        operators.push((Operator::Range, Operand::Bounds { from, to }));
    }
    if operators.is_empty() {
        return Err("Empty operator map".to_string());
    }
    Ok(operators)
}

/// `{"from": a, "to": b}` or `"a:b"`.
fn decode_range(value: &Value) -> Result<Operand, String> {
    match value {
        Value::Object(bounds) => Ok(Operand::Bounds {
            from: bounds.get("from").and_then(scalar_text),
            to: bounds.get("to").and_then(scalar_text),
        }),
        Value::String(text) => match text.split_once(':') {
            Some((from, to)) => Ok(Operand::Bounds {
                from: non_empty(from),
                to: non_empty(to),
            }),
            None => Err(format!("Range `{}` is not of the form from:to", text)),
        },
        _ => Err("Unsupported range value".to_string()),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',').filter_map(non_empty).collect()
}
