//! Argument synthesis: Terraform variables → typed tool arguments.

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use tfgen_core::{
    ArgType, ArgumentSpec, BaseType, TypeDescriptor, Variable, MAX_DESCRIPTION_LENGTH, SOURCE_CONFIG_ARG,
};

const NO_DESCRIPTION: &str = "No description";
const ELLIPSIS: &str = "...";

/// A non-fatal problem met while synthesizing an argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisWarning {
    pub variable: String,
    pub message: String,
}

impl SynthesisWarning {
    fn new(variable: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            variable: variable.into(),
            message: message.into(),
        };
        warn!("{}", warning);
        warning
    }
}

impl fmt::Display for SynthesisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variable {}: {}", self.variable, self.message)
    }
}

/// Arguments produced for one module.
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub arguments: Vec<ArgumentSpec>,
    pub warnings: Vec<SynthesisWarning>,
    /// Variables that could not be represented as arguments.
    pub skipped: Vec<String>,
}

/// Map a variable type onto the host's three argument types.
///
/// Compound values travel as JSON text in a `string` argument.
pub fn map_type(var_type: &TypeDescriptor) -> ArgType {
    match var_type.base_type {
        BaseType::Bool => ArgType::Bool,
        BaseType::Number => ArgType::Int,
        BaseType::String
        | BaseType::List
        | BaseType::Map
        | BaseType::Object
        | BaseType::Set
        | BaseType::Tuple
        | BaseType::Any => ArgType::String,
    }
}

/// [`map_type`] for a Terraform type expression such as `list(string)`.
pub fn map_type_expr(expr: &str) -> ArgType {
    map_type(&TypeDescriptor::parse(expr))
}

/// Synthesize arguments for every representable variable, in order.
pub fn synthesize(variables: &IndexMap<String, Variable>) -> Synthesis {
    let mut synthesis = Synthesis::default();

    for (key, variable) in variables {
        let name = if variable.name.trim().is_empty() {
            key.as_str()
        } else {
            variable.name.as_str()
        };

        if !is_representable(name) {
            synthesis
                .warnings
                .push(SynthesisWarning::new(name, "not a usable argument name; skipping"));
            synthesis.skipped.push(name.to_string());
            continue;
        }

        let (argument, warnings) = synthesize_argument(name, variable);
        debug!(
            "Mapped variable {} of type {} to {} (default: {:?})",
            name, variable.var_type, argument.arg_type, argument.default
        );
        synthesis.arguments.push(argument);
        synthesis.warnings.extend(warnings);
    }

    synthesis
}

fn is_representable(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Option<Regex>> = OnceLock::new();
    let identifier = IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").ok());
    name != SOURCE_CONFIG_ARG && identifier.as_ref().map_or(!name.is_empty(), |re| re.is_match(name))
}

/// Build one argument from a variable.
pub fn synthesize_argument(name: &str, variable: &Variable) -> (ArgumentSpec, Vec<SynthesisWarning>) {
    let mut warnings = Vec::new();
    let arg_type = map_type(&variable.var_type);

    let (description, truncated) = describe(variable);
    if truncated {
        warnings.push(SynthesisWarning::new(
            name,
            format!("description truncated to {} characters", MAX_DESCRIPTION_LENGTH),
        ));
    }

    let default = variable.default_value().map(|value| match coerce_default(value, arg_type) {
        Ok(coerced) => coerced,
        Err(message) => {
            warnings.push(SynthesisWarning::new(name, message));
            "0".to_string()
        }
    });

    let argument = ArgumentSpec {
        name: name.to_string(),
        description,
        arg_type,
        required: variable.required,
        default,
    };
    (argument, warnings)
}

/// Compose the argument description. Returns whether it was truncated.
pub fn describe(variable: &Variable) -> (String, bool) {
    let mut description = variable
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();

    description.push_str(if variable.required { "\n[Required]" } else { "\n[Optional]" });

    let default = variable.default_value();
    if let Some(value) = default {
        description.push_str(&format!("\n(Default value if not passed: {})", render_value(value)));
    }

    if !variable.var_type.base_type.is_primitive() {
        let example = default
            .filter(|value| is_meaningful(value))
            .map(Value::to_string)
            .or_else(|| variable.var_type.example_value().map(|v| v.to_string()));

        match example {
            Some(example) => description.push_str(&format!("\nProvide as JSON string, example: {}", example)),
            None => description.push_str("\nProvide as JSON string"),
        }
    }

    for rule in &variable.validation_rules {
        description.push_str(&format!("\nValidation: {}", rule.summary()));
    }

    truncate(description)
}

fn truncate(description: String) -> (String, bool) {
    if description.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return (description, false);
    }
    let mut truncated: String = description
        .chars()
        .take(MAX_DESCRIPTION_LENGTH - ELLIPSIS.len())
        .collect();
    truncated.push_str(ELLIPSIS);
    (truncated, true)
}

/// Strings verbatim, everything else as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Empty strings and collections make poor examples.
fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Encode a default for the target argument type.
///
/// Only `int` can fail; the caller falls back to `"0"`.
pub fn coerce_default(value: &Value, arg_type: ArgType) -> Result<String, String> {
    match arg_type {
        ArgType::String => Ok(render_value(value)),
        ArgType::Bool => Ok(match value {
            Value::Bool(b) => b.to_string(),
            other => render_value(other).to_lowercase(),
        }),
        ArgType::Int => coerce_int(value)
            .map(|n| n.to_string())
            .ok_or_else(|| format!("could not convert default {} to int, using '0'", value)),
        ArgType::Object => Ok(value.to_string()),
    }
}

/// Truncating float-then-int conversion.
fn coerce_int(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    let truncated = number.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(name: &str, ty: &str) -> Variable {
        Variable::new(name, TypeDescriptor::parse(ty))
    }

    #[test]
    fn test_map_type() {
        assert_eq!(map_type_expr("bool"), ArgType::Bool);
        assert_eq!(map_type_expr("number"), ArgType::Int);
        assert_eq!(map_type_expr("list(string)"), ArgType::String);
        for ty in ["string", "list", "map(number)", "object({a = string})", "set(string)", "tuple([string])", "any"] {
            assert_eq!(map_type_expr(ty), ArgType::String, "{}", ty);
        }
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(coerce_default(&json!(3.0), ArgType::Int), Ok("3".to_string()));
        assert_eq!(coerce_default(&json!(3.9), ArgType::Int), Ok("3".to_string()));
        assert_eq!(coerce_default(&json!("-2.5"), ArgType::Int), Ok("-2".to_string()));
        assert_eq!(coerce_default(&json!(true), ArgType::Int), Ok("1".to_string()));
        assert!(coerce_default(&json!("abc"), ArgType::Int).is_err());
        assert!(coerce_default(&json!([1]), ArgType::Int).is_err());
        assert!(coerce_default(&json!("inf"), ArgType::Int).is_err());
    }

    #[test]
    fn test_int_fallback_records_warning() {
        let variable = var("count", "number").with_default(json!("abc"));
        let (argument, warnings) = synthesize_argument("count", &variable);

        assert_eq!(argument.default.as_deref(), Some("0"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].variable, "count");
    }

    #[test]
    fn test_bool_and_string_coercion() {
        assert_eq!(coerce_default(&json!(false), ArgType::Bool), Ok("false".to_string()));
        assert_eq!(coerce_default(&json!("True"), ArgType::Bool), Ok("true".to_string()));
        assert_eq!(coerce_default(&json!("eu-west-1"), ArgType::String), Ok("eu-west-1".to_string()));
        assert_eq!(coerce_default(&json!(42), ArgType::String), Ok("42".to_string()));
        assert_eq!(
            coerce_default(&json!({"Name": "vpc"}), ArgType::String),
            Ok(r#"{"Name":"vpc"}"#.to_string())
        );
    }

    #[test]
    fn test_description_composition() {
        let variable = var("azs", "list(string)")
            .with_description("Availability zones")
            .with_default(json!(["eu-west-1a"]))
            .with_validation("length(var.azs) > 0", Some("At least one AZ is required"))
            .with_validation("alltrue([for az in var.azs : can(regex(\"^eu\", az))])", None);

        let (description, truncated) = describe(&variable);
        assert!(!truncated);
        assert_eq!(
            description,
            "Availability zones\n[Optional]\n(Default value if not passed: [\"eu-west-1a\"])\n\
             Provide as JSON string, example: [\"eu-west-1a\"]\n\
             Validation: At least one AZ is required\n\
             Validation: alltrue([for az in var.azs : can(regex(\"^eu\", az))])"
        );
    }

    #[test]
    fn test_description_placeholder_and_examples() {
        let (description, _) = describe(&var("tags", "map(string)").required());
        assert!(description.starts_with("No description\n[Required]"));
        assert!(description.contains(r#"example: {"key1":"value1","key2":"value2"}"#));

        let (description, _) = describe(&var("anything", "any"));
        assert!(description.ends_with("Provide as JSON string"));

        let (description, _) = describe(&var("names", "list(string)").with_default(json!([])));
        assert!(description.contains(r#"example: ["item1","item2"]"#));

        let (description, _) = describe(&var("region", "string"));
        assert!(!description.contains("JSON"));
    }

    #[test]
    fn test_description_truncated_last() {
        let variable = var("policy", "string").with_description("x".repeat(2000));
        let (argument, warnings) = synthesize_argument("policy", &variable);

        assert_eq!(argument.description.chars().count(), MAX_DESCRIPTION_LENGTH);
        assert!(argument.description.ends_with("..."));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_synthesize_skips_unrepresentable() {
        let mut variables = IndexMap::new();
        variables.insert("region".to_string(), var("region", "string").required());
        variables.insert("source_config".to_string(), var("source_config", "string"));
        variables.insert("9lives".to_string(), var("9lives", "number"));
        variables.insert("enabled".to_string(), var("", "bool").with_default(json!(true)));

        let synthesis = synthesize(&variables);
        let names: Vec<&str> = synthesis.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["region", "enabled"]);
        assert_eq!(synthesis.skipped, vec!["source_config", "9lives"]);
        assert_eq!(synthesis.arguments[1].default.as_deref(), Some("true"));
        assert!(synthesis.arguments[0].required);
        assert!(synthesis.arguments[0].default.is_none());
    }

    #[test]
    fn test_descriptions_bounded() {
        let mut variables = IndexMap::new();
        for i in 0..20 {
            let mut variable = var(&format!("v{}", i), "object({a = string})")
                .with_description("d".repeat(i * 100))
                .with_default(json!({"a": "b".repeat(i * 50)}));
            for _ in 0..i {
                variable = variable.with_validation("true", Some("rule"));
            }
            variables.insert(variable.name.clone(), variable);
        }
        for argument in synthesize(&variables).arguments {
            assert!(argument.description.chars().count() <= MAX_DESCRIPTION_LENGTH);
        }
    }
}
