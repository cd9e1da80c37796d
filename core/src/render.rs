//! Store-native expression text for a [`QueryRequest`].
//!
//! Attribute names are replaced with `#nN` placeholders and values with `:vN` placeholders, so the rendered text
//! never contains user data. The placeholder maps travel alongside the text.

use std::collections::BTreeMap;

use crate::{
    compiler::QueryRequest,
    condition::Condition,
    value::AttributeValue,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedRequest {
    pub key_condition_expression: String,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: BTreeMap<String, String>,
    pub expression_attribute_values: BTreeMap<String, AttributeValue>,
}

/// Accumulates expression text and the placeholders it refers to.
#[derive(Default)]
pub struct ExpressionBuilder {
    text: String,
    names: BTreeMap<String, String>,
    name_placeholders: BTreeMap<String, String>,
    values: BTreeMap<String, AttributeValue>,
}

impl ExpressionBuilder {
    pub fn new() -> Self { Self::default() }

    fn push(&mut self, s: &str) { self.text.push_str(s); }

    /// Reuses the placeholder of a name seen before.
    fn name(&mut self, attribute: &str) {
        let placeholder = match self.name_placeholders.get(attribute) {
            Some(p) => p.clone(),
            None => {
                let p = format!("#n{}", self.names.len());
                self.names.insert(p.clone(), attribute.to_string());
                self.name_placeholders.insert(attribute.to_string(), p.clone());
                p
            }
        };
        self.text.push_str(&placeholder);
    }

    fn value(&mut self, value: &AttributeValue) {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        self.text.push_str(&placeholder);
    }

    /// Take the text written so far, keeping the placeholder maps.
    pub fn take_text(&mut self) -> String { std::mem::take(&mut self.text) }

    pub fn condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Comparison { attribute, comparator, value } => {
                self.name(attribute);
                self.push(" ");
                self.push(comparator.symbol());
                self.push(" ");
                self.value(value);
            }
            Condition::Between { attribute, low, high } => {
                self.name(attribute);
                self.push(" BETWEEN ");
                self.value(low);
                self.push(" AND ");
                self.value(high);
            }
            Condition::BeginsWith { attribute, prefix } => {
                self.push("begins_with(");
                self.name(attribute);
                self.push(", ");
                self.value(&AttributeValue::String(prefix.clone()));
                self.push(")");
            }
            Condition::In { attribute, values } => {
                self.name(attribute);
                self.push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.value(value);
                }
                self.push(")");
            }
            Condition::Contains { attribute, value } => {
                self.push("contains(");
                self.name(attribute);
                self.push(", ");
                self.value(value);
                self.push(")");
            }
            Condition::AttributeExists(attribute) => {
                self.push("attribute_exists(");
                self.name(attribute);
                self.push(")");
            }
            Condition::AttributeNotExists(attribute) => {
                self.push("attribute_not_exists(");
                self.name(attribute);
                self.push(")");
            }
            Condition::And(inner) => self.junction(inner, " AND "),
            Condition::Or(inner) => self.junction(inner, " OR "),
            Condition::Not(inner) => {
                self.push("NOT (");
                self.condition(inner);
                self.push(")");
            }
        }
    }

    fn junction(&mut self, inner: &[Condition], separator: &str) {
        for (i, c) in inner.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            let nested = matches!(c, Condition::And(_) | Condition::Or(_));
            if nested {
                self.push("(");
            }
            self.condition(c);
            if nested {
                self.push(")");
            }
        }
    }

    pub fn projection(&mut self, attributes: &[String]) {
        for (i, attribute) in attributes.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.name(attribute);
        }
    }

    pub fn build(self) -> (String, BTreeMap<String, String>, BTreeMap<String, AttributeValue>) { (self.text, self.names, self.values) }
}

impl QueryRequest {
    /// Render the key condition, filter and projection as expression text with placeholder maps.
    pub fn render(&self) -> RenderedRequest {
        let mut builder = ExpressionBuilder::new();

        builder.condition(&self.key_condition.to_condition());
        let key_condition_expression = builder.take_text();

        let filter_expression = self.filter.as_ref().map(|filter| {
            builder.condition(filter);
            builder.take_text()
        });

        let projection_expression = self.projection.as_ref().filter(|attrs| !attrs.is_empty()).map(|attrs| {
            builder.projection(attrs);
            builder.take_text()
        });

        let (_, expression_attribute_names, expression_attribute_values) = builder.build();
        RenderedRequest { key_condition_expression, filter_expression, projection_expression, expression_attribute_names, expression_attribute_values }
    }
}
