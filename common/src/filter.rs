use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker used on the wire for an open range bound.
pub const OPEN_BOUND: &str = "*";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    In,
    Range,
    Gt,
    Lt,
    Gteq,
    Lteq,
}

/// Entity types a field can be resolved for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    Product,
    Category,
    CmsPage,
    CmsBlock,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Text,
    Int,
    Float,
    Bool,
}

/// A physical, queryable field of the search index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryField {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub multivalued: bool,
}

impl QueryField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            multivalued: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Unbounded,
    Value(String),
}

impl Bound {
    pub fn value(value: impl ToString) -> Self {
        Bound::Value(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Bound::Unbounded => OPEN_BOUND,
            Bound::Value(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionValue {
    Scalar(String),
    List(Vec<String>),
    Range { from: Bound, to: Bound },
}

impl ExpressionValue {
    pub fn scalar(value: impl ToString) -> Self {
        ExpressionValue::Scalar(value.to_string())
    }

    /// Closed numeric range. Reversed endpoints are swapped and a degenerate range is widened
    /// by one so that `from < to` always holds.
    pub fn normalized_range(from: &str, to: &str) -> Result<Self, String> {
        let from_num =
            Number::parse(from).ok_or_else(|| format!("Range start is not numeric: {}", from))?;
        let to_num = Number::parse(to).ok_or_else(|| format!("Range end is not numeric: {}", to))?;
        let (low, high) = match (from_num, to_num) {
            (Number::Int(a), Number::Int(b)) => {
                let (a, b) = if a > b { (b, a) } else { (a, b) };
                let b = if a == b { b.saturating_add(1) } else { b };
                (Number::Int(a), Number::Int(b))
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let (a, b) = if a > b { (b, a) } else { (a, b) };
                let b = if a == b { b + 1.0 } else { b };
                (Number::Float(a), Number::Float(b))
            }
        };
        Ok(ExpressionValue::Range {
            from: Bound::value(low),
            to: Bound::value(high),
        })
    }

    pub fn half_open_from(from: Number) -> Self {
        ExpressionValue::Range {
            from: Bound::value(from),
            to: Bound::Unbounded,
        }
    }

    pub fn half_open_to(to: Number) -> Self {
        ExpressionValue::Range {
            from: Bound::Unbounded,
            to: Bound::value(to),
        }
    }
}

/// Integer-first numeric value used for range arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Number::Int(i));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
    }

    pub fn offset(self, delta: i64) -> Self {
        match self {
            Number::Int(i) => Number::Int(i.saturating_add(delta)),
            Number::Float(f) => Number::Float(f + delta as f64),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// One normalized filter: a resolved field, exactly one operator and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub attribute_code: String,
    pub field: QueryField,
    pub operator: Operator,
    pub value: ExpressionValue,
    /// Set when the user already filtered on this field, so it must not narrow its own facet.
    #[serde(default)]
    pub excluded: bool,
}

impl FilterExpression {
    pub fn new(
        attribute_code: &str,
        field: QueryField,
        operator: Operator,
        value: ExpressionValue,
    ) -> Self {
        Self {
            attribute_code: attribute_code.to_string(),
            field,
            operator,
            value,
            excluded: false,
        }
    }

    pub fn eq(attribute_code: &str, field: QueryField, value: impl ToString) -> Self {
        Self::new(
            attribute_code,
            field,
            Operator::Eq,
            ExpressionValue::scalar(value),
        )
    }

    pub fn excluded_from_facets(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Lucene-style clause, e.g. `price_f:[10 TO *]` or `color:(red OR blue)`.
    pub fn to_query_clause(&self) -> String {
        let name = &self.field.name;
        let body = match (&self.operator, &self.value) {
            (Operator::Gt, ExpressionValue::Scalar(v)) => format!("{{{} TO *]", v),
            (Operator::Lt, ExpressionValue::Scalar(v)) => format!("[* TO {}}}", v),
            (Operator::Gteq, ExpressionValue::Scalar(v)) => format!("[{} TO *]", v),
            (Operator::Lteq, ExpressionValue::Scalar(v)) => format!("[* TO {}]", v),
            (_, ExpressionValue::Scalar(v)) => quote_term(v),
            (_, ExpressionValue::List(values)) => format!(
                "({})",
                values
                    .iter()
                    .map(|v| quote_term(v))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            ),
            (_, ExpressionValue::Range { from, to }) => {
                format!("[{} TO {}]", from.as_str(), to.as_str())
            }
        };
        if self.excluded {
            format!("{{!tag={}}}{}:{}", name, name, body)
        } else {
            format!("{}:{}", name, body)
        }
    }
}

fn quote_term(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_clause())
    }
}

/// A filter entry or document that was skipped instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropped {
    pub key: String,
    pub reason: String,
}

impl Dropped {
    pub fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}
