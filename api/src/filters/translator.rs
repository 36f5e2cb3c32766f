use super::arg::{scalar_list, scalar_text, split_list, FilterArg, Operand};
use crate::config::ResolverConfig;
use crate::fields::AttributeFieldResolver;
use catalog_common::{
    sanitize_attribute_filter, sanitize_filter_token, sanitize_id_list, Dropped, EntityType,
    ExpressionValue, FilterExpression, Number, Operator, Sanitizer,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Result of translating one filter map: the usable expressions in input order, plus every
/// entry that was skipped and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub expressions: Vec<FilterExpression>,
    pub dropped: Vec<Dropped>,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    fn drop_entry(&mut self, key: &str, reason: impl Into<String>) {
        let dropped = Dropped::new(key, reason);
        tracing::debug!(key = %dropped.key, reason = %dropped.reason, "filter entry dropped");
        self.dropped.push(dropped);
    }
}

/// Turns GraphQL filter arguments into [`FilterExpression`]s for one entity type.
pub struct FilterTranslator<'a> {
    config: &'a ResolverConfig,
    fields: &'a dyn AttributeFieldResolver,
    entity: EntityType,
}

impl<'a> FilterTranslator<'a> {
    pub fn new(
        config: &'a ResolverConfig,
        fields: &'a dyn AttributeFieldResolver,
        entity: EntityType,
    ) -> Self {
        Self {
            config,
            fields,
            entity,
        }
    }

    pub fn translate(&self, filter: &Map<String, Value>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for (key, value) in filter {
            match key.as_str() {
                "attributes" => self.translate_attributes(value, &mut outcome),
                "ids" => self.translate_ids(value, &mut outcome),
                "skus" => self.translate_skus(value, &mut outcome),
                "custom" => self.translate_custom(value, &mut outcome),
                // Selects the identifier field of the response, not a filter.
                "id_type" => {}
                _ => self.translate_entry(key, value, &mut outcome),
            }
        }
        outcome
    }

    fn push(
        &self,
        outcome: &mut FilterOutcome,
        key: &str,
        code: &str,
        operator: Operator,
        value: ExpressionValue,
        excluded: bool,
    ) {
        match self.fields.resolve_field(code, Some(&value), self.entity) {
            Some(field) => {
                let expression = FilterExpression::new(code, field, operator, value);
                outcome.expressions.push(if excluded {
                    expression.excluded_from_facets()
                } else {
                    expression
                });
            }
            None => outcome.drop_entry(key, format!("No queryable field for `{}`", code)),
        }
    }

    /// Eq for a single value, In for several.
    fn push_values(
        &self,
        outcome: &mut FilterOutcome,
        key: &str,
        code: &str,
        mut values: Vec<String>,
        excluded: bool,
    ) {
        values.retain(|v| !v.is_empty());
        match values.len() {
            0 => outcome.drop_entry(key, "No usable values"),
            1 => {
                let value = ExpressionValue::Scalar(values.remove(0));
                self.push(outcome, key, code, Operator::Eq, value, excluded);
            }
            _ => {
                let value = ExpressionValue::List(values);
                self.push(outcome, key, code, Operator::In, value, excluded);
            }
        }
    }

    /// Entries of the form `code=v1,v2`, `code=from:to` or `code=value`.
    fn translate_attributes(&self, value: &Value, outcome: &mut FilterOutcome) {
        let entries = match value {
            Value::Array(items) => scalar_list(items),
            other => scalar_text(other).into_iter().collect(),
        };
        for entry in entries {
            let entry = sanitize_attribute_filter(&entry);
            let parts: Vec<&str> = entry.split('=').collect();
            if parts.len() < 2 {
                outcome.drop_entry("attributes", format!("Malformed attribute filter `{}`", entry));
                continue;
            }
            let code = sanitize_filter_token(parts[0]);
            let raw = parts[1];
            if code.is_empty() || raw.is_empty() {
                outcome.drop_entry("attributes", format!("Malformed attribute filter `{}`", entry));
                continue;
            }
            let key = format!("attributes.{}", code);
            if raw.contains(',') {
                let values = split_list(raw)
                    .iter()
                    .map(|v| sanitize_filter_token(v))
                    .collect();
                self.push_values(outcome, &key, &code, values, true);
            } else if let Some((from, to)) = raw.split_once(':') {
                match ExpressionValue::normalized_range(from, to) {
                    Ok(range) => self.push(outcome, &key, &code, Operator::Range, range, true),
                    Err(reason) => outcome.drop_entry(&key, reason),
                }
            } else {
                let value = ExpressionValue::scalar(sanitize_filter_token(raw));
                self.push(outcome, &key, &code, Operator::Eq, value, true);
            }
        }
    }

    fn translate_ids(&self, value: &Value, outcome: &mut FilterOutcome) {
        let ids: Vec<i64> = list_values(value)
            .iter()
            .filter_map(|id| id.trim().parse::<i64>().ok())
            .collect();
        let ids = sanitize_id_list(&ids)
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        self.push_values(outcome, "ids", "id", ids, false);
    }

    fn translate_skus(&self, value: &Value, outcome: &mut FilterOutcome) {
        let sanitizer = self.config.sanitizer_for("sku");
        let skus = list_values(value)
            .iter()
            .map(|sku| sanitizer.apply(sku))
            .collect();
        self.push_values(outcome, "skus", "sku", skus, false);
    }

    /// `[{"code": "color", "input": {"eq": "red"}}, ...]`, one expression per code.
    fn translate_custom(&self, value: &Value, outcome: &mut FilterOutcome) {
        let Some(items) = value.as_array() else {
            outcome.drop_entry("custom", "Expected a list of {code, input}");
            return;
        };
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for item in items {
            let code = item
                .get("code")
                .and_then(scalar_text)
                .map(|code| sanitize_filter_token(&code))
                .unwrap_or_default();
            let value = item
                .get("input")
                .and_then(|input| input.get("eq"))
                .and_then(scalar_text);
            match (code.is_empty(), value) {
                (false, Some(value)) => {
                    let value = self.config.sanitizer_for(&code).apply(&value);
                    grouped.entry(code).or_default().push(value);
                }
                _ => outcome.drop_entry("custom", "Entry needs a code and an eq input"),
            }
        }
        for (code, values) in grouped {
            let key = format!("custom.{}", code);
            self.push_values(outcome, &key, &code, values, false);
        }
    }

    fn translate_entry(&self, key: &str, value: &Value, outcome: &mut FilterOutcome) {
        if key.is_empty() || sanitize_filter_token(key) != key {
            outcome.drop_entry(key, "Invalid attribute code");
            return;
        }
        let sanitizer = self.config.sanitizer_for(key);
        match FilterArg::decode(value) {
            Ok(FilterArg::Scalar(text)) => {
                let value = sanitizer.apply(&text);
                if value.is_empty() {
                    outcome.drop_entry(key, "No usable values");
                } else {
                    let value = ExpressionValue::Scalar(value);
                    self.push(outcome, key, key, Operator::Eq, value, false);
                }
            }
            Ok(FilterArg::List(values)) => {
                let values = sanitize_all(sanitizer, &values);
                self.push_list(outcome, key, values);
            }
            Ok(FilterArg::Operators(operators)) => {
                for (operator, operand) in operators {
                    self.translate_operator(key, sanitizer, operator, operand, outcome);
                }
            }
            Err(reason) => outcome.drop_entry(key, reason),
        }
    }

    fn push_list(&self, outcome: &mut FilterOutcome, key: &str, mut values: Vec<String>) {
        values.retain(|v| !v.is_empty());
        if values.is_empty() {
            outcome.drop_entry(key, "No usable values");
        } else {
            self.push(outcome, key, key, Operator::In, ExpressionValue::List(values), false);
        }
    }

    fn translate_operator(
        &self,
        code: &str,
        sanitizer: Sanitizer,
        operator: Operator,
        operand: Operand,
        outcome: &mut FilterOutcome,
    ) {
        let key = format!("{}.{}", code, operator);
        match (operator, operand) {
            (Operator::Eq, Operand::Scalar(text)) => {
                let value = sanitizer.apply(&text);
                if value.is_empty() {
                    outcome.drop_entry(&key, "No usable values");
                } else {
                    let value = ExpressionValue::Scalar(value);
                    self.push(outcome, &key, code, Operator::Eq, value, false);
                }
            }
            (Operator::Eq | Operator::In, Operand::List(values)) => {
                self.push_list(outcome, code, sanitize_all(sanitizer, &values));
            }
            (Operator::In, Operand::Scalar(text)) => {
                self.push_list(outcome, code, sanitize_all(sanitizer, &split_list(&text)));
            }
            (
                Operator::Gt | Operator::Lt | Operator::Gteq | Operator::Lteq,
                Operand::Scalar(text),
            ) => {
                let Some(number) = Number::parse(&text) else {
                    outcome.drop_entry(&key, format!("`{}` is not numeric", text));
                    return;
                };
                let value = match (operator, number) {
                    // Integer bounds become closed ranges; floats keep an exclusive bound.
                    (Operator::Gt, Number::Int(_)) => {
                        ExpressionValue::half_open_from(number.offset(1))
                    }
                    (Operator::Lt, Number::Int(_)) => {
                        ExpressionValue::half_open_to(number.offset(-1))
                    }
                    (Operator::Gt | Operator::Lt, Number::Float(_)) => {
                        ExpressionValue::Scalar(number.to_string())
                    }
                    (Operator::Gteq, _) => ExpressionValue::half_open_from(number),
                    _ => ExpressionValue::half_open_to(number),
                };
                self.push(outcome, &key, code, operator, value, false);
            }
            (Operator::Range, Operand::Bounds { from, to }) => {
                let value = match (from, to) {
                    (Some(from), Some(to)) => ExpressionValue::normalized_range(&from, &to),
                    (Some(from), None) => numeric_bound(&from).map(ExpressionValue::half_open_from),
                    (None, Some(to)) => numeric_bound(&to).map(ExpressionValue::half_open_to),
                    (None, None) => Err("Range without bounds".to_string()),
                };
                match value {
                    Ok(value) => self.push(outcome, &key, code, Operator::Range, value, false),
                    Err(reason) => outcome.drop_entry(&key, reason),
                }
            }
            (operator, operand) => outcome.drop_entry(
                &key,
                format!("Operator `{}` does not accept {:?}", operator, operand),
            ),
        }
    }
}

fn numeric_bound(text: &str) -> Result<Number, String> {
    Number::parse(text).ok_or_else(|| format!("Range bound is not numeric: {}", text))
}

fn sanitize_all(sanitizer: Sanitizer, values: &[String]) -> Vec<String> {
    values.iter().map(|v| sanitizer.apply(v)).collect()
}

/// List-valued special keys accept a JSON list, a single scalar or a comma separated string.
fn list_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => scalar_list(items),
        other => scalar_text(other)
            .map(|text| split_list(&text))
            .unwrap_or_default(),
    }
}
