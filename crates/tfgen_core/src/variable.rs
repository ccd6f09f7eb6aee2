//! Terraform variable metadata as reported by variable discovery.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Base type of a Terraform variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    String,
    Number,
    Bool,
    List,
    Map,
    Object,
    Set,
    Tuple,
    Any,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Number => "number",
            BaseType::Bool => "bool",
            BaseType::List => "list",
            BaseType::Map => "map",
            BaseType::Object => "object",
            BaseType::Set => "set",
            BaseType::Tuple => "tuple",
            BaseType::Any => "any",
        }
    }

    /// Parse a type keyword. Unknown keywords map to `Any`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_lowercase().as_str() {
            "string" => BaseType::String,
            "number" => BaseType::Number,
            "bool" => BaseType::Bool,
            "list" => BaseType::List,
            "map" => BaseType::Map,
            "object" => BaseType::Object,
            "set" => BaseType::Set,
            "tuple" => BaseType::Tuple,
            _ => BaseType::Any,
        }
    }

    /// `string`, `number` and `bool`.
    pub fn is_primitive(&self) -> bool {
        matches!(self, BaseType::String | BaseType::Number | BaseType::Bool)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured type of a variable.
///
/// Deserializes from either a structured object or a Terraform type
/// expression such as `"map(list(string))"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawType")]
pub struct TypeDescriptor {
    pub base_type: BaseType,
    /// Element type of `list`, `set` and `map`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<TypeDescriptor>>,
    /// Attributes of `object`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, TypeDescriptor>,
    /// Positional element types of `tuple`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<TypeDescriptor>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawType {
    Expression(String),
    Structured {
        base_type: BaseType,
        #[serde(default)]
        element: Option<Box<TypeDescriptor>>,
        #[serde(default)]
        attributes: IndexMap<String, TypeDescriptor>,
        #[serde(default)]
        elements: Vec<TypeDescriptor>,
    },
}

impl From<RawType> for TypeDescriptor {
    fn from(raw: RawType) -> Self {
        match raw {
            RawType::Expression(expr) => TypeDescriptor::parse(&expr),
            RawType::Structured {
                base_type,
                element,
                attributes,
                elements,
            } => TypeDescriptor {
                base_type,
                element,
                attributes,
                elements,
            },
        }
    }
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        Self::new(BaseType::Any)
    }
}

impl TypeDescriptor {
    pub fn new(base_type: BaseType) -> Self {
        Self {
            base_type,
            element: None,
            attributes: IndexMap::new(),
            elements: Vec::new(),
        }
    }

    pub fn collection(base_type: BaseType, element: TypeDescriptor) -> Self {
        Self {
            element: Some(Box::new(element)),
            ..Self::new(base_type)
        }
    }

    pub fn object(attributes: IndexMap<String, TypeDescriptor>) -> Self {
        Self {
            attributes,
            ..Self::new(BaseType::Object)
        }
    }

    /// Parse a Terraform type expression. Never fails: anything
    /// unrecognized becomes `any`.
    pub fn parse(expr: &str) -> Self {
        let expr = strip_optional(expr.trim());
        let (head, inner) = match (expr.find('('), expr.rfind(')')) {
            (Some(open), Some(close)) if close > open => (&expr[..open], Some(expr[open + 1..close].trim())),
            _ => (expr, None),
        };

        let base_type = BaseType::from_keyword(head);
        let mut descriptor = Self::new(base_type);
        let inner = match inner.filter(|i| !i.is_empty()) {
            Some(inner) => inner,
            None => return descriptor,
        };

        match base_type {
            BaseType::List | BaseType::Set | BaseType::Map => {
                descriptor.element = Some(Box::new(Self::parse(inner)));
            }
            BaseType::Object => {
                let body = inner.trim_start_matches('{').trim_end_matches('}');
                for field in split_top_level(body) {
                    if let Some((key, ty)) = field.split_once(['=', ':']) {
                        let key = key.trim().trim_matches('"');
                        if !key.is_empty() {
                            descriptor.attributes.insert(key.to_string(), Self::parse(ty));
                        }
                    }
                }
            }
            BaseType::Tuple => {
                let body = inner.trim_start_matches('[').trim_end_matches(']');
                descriptor.elements = split_top_level(body).iter().map(|e| Self::parse(e)).collect();
            }
            _ => {}
        }
        descriptor
    }

    /// Build a representative JSON example for compound types.
    ///
    /// Returns `None` when no meaningful example exists (`any`, empty tuples).
    pub fn example_value(&self) -> Option<Value> {
        match self.base_type {
            BaseType::String => Some(json!("value")),
            BaseType::Number => Some(json!(1)),
            BaseType::Bool => Some(json!(true)),
            BaseType::List | BaseType::Set => match self.element.as_deref() {
                None
                | Some(TypeDescriptor {
                    base_type: BaseType::String,
                    ..
                }) => Some(json!(["item1", "item2"])),
                Some(element) => {
                    let example = element.example_value()?;
                    Some(Value::Array(vec![example.clone(), example]))
                }
            },
            BaseType::Map => match self.element.as_deref() {
                None
                | Some(TypeDescriptor {
                    base_type: BaseType::String,
                    ..
                }) => Some(json!({"key1": "value1", "key2": "value2"})),
                Some(element) => {
                    let example = element.example_value()?;
                    Some(json!({"key1": example.clone(), "key2": example}))
                }
            },
            BaseType::Object => {
                if self.attributes.is_empty() {
                    return Some(json!({"key1": "value1", "key2": "value2"}));
                }
                let mut object = serde_json::Map::new();
                for (name, ty) in &self.attributes {
                    object.insert(name.clone(), ty.example_value()?);
                }
                Some(Value::Object(object))
            }
            BaseType::Tuple => {
                if self.elements.is_empty() {
                    return None;
                }
                self.elements
                    .iter()
                    .map(TypeDescriptor::example_value)
                    .collect::<Option<Vec<_>>>()
                    .map(Value::Array)
            }
            BaseType::Any => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_type {
            BaseType::List | BaseType::Set | BaseType::Map => match &self.element {
                Some(element) => write!(f, "{}({})", self.base_type, element),
                None => write!(f, "{}", self.base_type),
            },
            BaseType::Object if !self.attributes.is_empty() => {
                let fields: Vec<String> = self
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "object({{{}}})", fields.join(", "))
            }
            BaseType::Tuple if !self.elements.is_empty() => {
                let elements: Vec<String> = self.elements.iter().map(|e| e.to_string()).collect();
                write!(f, "tuple([{}])", elements.join(", "))
            }
            _ => write!(f, "{}", self.base_type),
        }
    }
}

/// `optional(string, "x")` → `string`.
fn strip_optional(expr: &str) -> &str {
    match expr.strip_prefix("optional(").and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => split_top_level(inner).into_iter().next().unwrap_or(inner),
        None => expr,
    }
}

/// Split on commas and newlines that are not nested inside brackets.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            ',' | '\n' if depth == 0 => {
                parts.push(&body[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// A validation block attached to a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationRule {
    /// The error message, or the condition when no message is set.
    pub fn summary(&self) -> &str {
        self.error_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.condition)
    }
}

/// A declared input of a Terraform module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,
}

impl Variable {
    pub fn new(name: impl Into<String>, var_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            var_type,
            description: None,
            required: false,
            default: None,
            validation_rules: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = if default.is_null() { None } else { Some(default) };
        self
    }

    pub fn with_validation(mut self, condition: impl Into<String>, error_message: Option<&str>) -> Self {
        self.validation_rules.push(ValidationRule {
            condition: condition.into(),
            error_message: error_message.map(str::to_string),
        });
        self
    }

    /// The default value, ignoring explicit nulls.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }
}
