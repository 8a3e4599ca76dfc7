/// Template token resolution for node parameters
///
/// Two token families can appear inside any string at any depth of a node's
/// parameter tree:
/// - `{{env.KEY}}` resolves against the caller's environment mapping
/// - `{{data.NODE.field.path}}` resolves against outputs recorded earlier in the run
///
/// Resolution is soft-fail: anything that cannot be resolved stays in place as
/// the original token text.

use crate::workflow::types::{EnvVars, NodeOutputs, Parameters};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// `{{env.KEY}}`
pub static ENV_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{env\.((?-u:\w)+)\}\}").expect("valid env token pattern"));

/// `{{data.NODE.path}}`
pub static DATA_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{data\.((?-u:\w)+)\.((?:(?-u:\w)|\.)+)\}\}").expect("valid data token pattern")
});

/// Both families in one alternation so a single left-to-right pass handles
/// them and substituted text is never scanned again.
static ANY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(?:env\.((?-u:\w)+)|data\.((?-u:\w)+)\.((?:(?-u:\w)|\.)+))\}\}")
        .expect("valid token pattern")
});

/// A `{{data.*}}` reference found in a parameter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataReference {
    pub node_id: String,
    pub field_path: String,
    /// Full token text, e.g. `{{data.node1.title}}`
    pub token: String,
}

/// Resolves tokens against one run's environment and outputs-so-far
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    env: &'a EnvVars,
    outputs: &'a NodeOutputs,
}

impl<'a> VariableResolver<'a> {
    pub fn new(env: &'a EnvVars, outputs: &'a NodeOutputs) -> Self {
        Self { env, outputs }
    }

    /// Resolve every string leaf of a parameter mapping; keys are left alone
    pub fn resolve_parameters(&self, parameters: &Parameters) -> Parameters {
        parameters
            .iter()
            .map(|(key, value)| (key.clone(), self.resolve_value(value)))
            .collect()
    }

    /// Resolve a JSON value recursively
    pub fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => self.resolve_str(text),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve_value(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, v)| (key.clone(), self.resolve_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Resolve a single string
    ///
    /// If the string is exactly one resolvable token, the referenced value is
    /// returned as-is (it may be a number, object, ...). Otherwise every token
    /// is replaced by its string form and a string is returned.
    pub fn resolve_str(&self, text: &str) -> Value {
        if !text.contains("{{") {
            return Value::String(text.to_string());
        }

        if let Some(caps) = ANY_TOKEN.captures(text) {
            let whole = caps.get(0).map(|m| m.start() == 0 && m.end() == text.len());
            if whole == Some(true) {
                if let Some(resolved) = self.lookup(&caps) {
                    return resolved;
                }
                tracing::debug!("🔍 Token left unresolved: {}", text);
                return Value::String(text.to_string());
            }
        }

        let replaced = ANY_TOKEN.replace_all(text, |caps: &Captures| match self.lookup(caps) {
            Some(value) => stringify(&value),
            None => {
                tracing::debug!("🔍 Token left unresolved: {}", &caps[0]);
                caps[0].to_string()
            }
        });

        Value::String(replaced.into_owned())
    }

    fn lookup(&self, caps: &Captures) -> Option<Value> {
        if let Some(key) = caps.get(1) {
            return self.env.get(key.as_str()).map(|v| Value::String(v.clone()));
        }

        let node_id = caps.get(2)?.as_str();
        let path = caps.get(3)?.as_str();
        let output = self.outputs.get(node_id)?;
        lookup_path(output, path).cloned()
    }
}

/// Walk a dot-separated path into a JSON value
///
/// Object keys are matched literally; numeric segments index into arrays.
pub fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String form used when a token is embedded in a larger string
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// True if the string still carries an env or data token
pub fn contains_tokens(text: &str) -> bool {
    ANY_TOKEN.is_match(text)
}

/// Collect every `{{data.*}}` reference in a JSON tree
pub fn extract_data_references(value: &Value) -> Vec<DataReference> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

/// Collect every `{{data.*}}` reference in a parameter mapping
pub fn extract_parameter_references(parameters: &Parameters) -> Vec<DataReference> {
    let mut found = Vec::new();
    for value in parameters.values() {
        collect_references(value, &mut found);
    }
    found
}

fn collect_references(value: &Value, found: &mut Vec<DataReference>) {
    match value {
        Value::String(text) => {
            found.extend(DATA_TOKEN.captures_iter(text).map(|caps| DataReference {
                node_id: caps[1].to_string(),
                field_path: caps[2].to_string(),
                token: caps[0].to_string(),
            }));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn outputs(pairs: Vec<(&str, Value)>) -> NodeOutputs {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_env_token_resolves() {
        let env = env(&[("X", "v")]);
        let outs = NodeOutputs::new();
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{env.X}}"), json!("v"));
        assert_eq!(resolver.resolve_str("Bearer {{env.X}}"), json!("Bearer v"));
    }

    #[test]
    fn test_unknown_env_key_is_left_verbatim() {
        let env = EnvVars::new();
        let outs = NodeOutputs::new();
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{env.X}}"), json!("{{env.X}}"));
        assert_eq!(resolver.resolve_str("key={{env.X}};"), json!("key={{env.X}};"));
    }

    #[test]
    fn test_whole_field_data_token_keeps_type() {
        let env = EnvVars::new();
        let outs = outputs(vec![("node1", json!({"a": {"b": 42}}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{data.node1.a.b}}"), json!(42));
        assert_eq!(resolver.resolve_str("{{data.node1.a}}"), json!({"b": 42}));
    }

    #[test]
    fn test_embedded_data_token_is_stringified() {
        let env = EnvVars::new();
        let outs = outputs(vec![("node1", json!({"a": {"b": 42}, "flag": true, "none": null}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("value: {{data.node1.a.b}}"), json!("value: 42"));
        assert_eq!(resolver.resolve_str("{{data.node1.flag}}!"), json!("true!"));
        assert_eq!(resolver.resolve_str("[{{data.node1.none}}]"), json!("[null]"));
        assert_eq!(resolver.resolve_str("obj={{data.node1.a}}"), json!("obj={\"b\":42}"));
    }

    #[test]
    fn test_numeric_segments_index_arrays() {
        let env = EnvVars::new();
        let outs = outputs(vec![("feed", json!({"items": [{"title": "first"}, {"title": "second"}]}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{data.feed.items.1.title}}"), json!("second"));
        assert_eq!(resolver.resolve_str("{{data.feed.items.7.title}}"), json!("{{data.feed.items.7.title}}"));
    }

    #[test]
    fn test_missing_node_or_path_is_left_verbatim() {
        let env = EnvVars::new();
        let outs = outputs(vec![("node1", json!({"a": 1}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{data.node2.a}}"), json!("{{data.node2.a}}"));
        assert_eq!(resolver.resolve_str("x {{data.node1.missing}}"), json!("x {{data.node1.missing}}"));
        assert_eq!(resolver.resolve_str("{{data.node1.a.deeper}}"), json!("{{data.node1.a.deeper}}"));
    }

    #[test]
    fn test_mixed_tokens_in_one_string() {
        let env = env(&[("NAME", "Ada")]);
        let outs = outputs(vec![("n1", json!({"count": 3}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(
            resolver.resolve_str("{{env.NAME}} has {{data.n1.count}} items, {{env.MISSING}}"),
            json!("Ada has 3 items, {{env.MISSING}}")
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let env = env(&[("X", "v")]);
        let outs = NodeOutputs::new();
        let resolver = VariableResolver::new(&env, &outs);

        let once = resolver.resolve_str("plain {{env.X}} text");
        let twice = resolver.resolve_value(&once);
        assert_eq!(once, twice);
        assert_eq!(resolver.resolve_str("no tokens here"), json!("no tokens here"));
    }

    #[test]
    fn test_env_value_containing_token_is_not_rescanned() {
        let env = env(&[("TEMPLATE", "{{data.n1.count}}"), ("OTHER", "{{env.X}}"), ("X", "x")]);
        let outs = outputs(vec![("n1", json!({"count": 3}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{env.TEMPLATE}}"), json!("{{data.n1.count}}"));
        assert_eq!(resolver.resolve_str("v={{env.TEMPLATE}}"), json!("v={{data.n1.count}}"));
        assert_eq!(resolver.resolve_str("{{env.OTHER}}"), json!("{{env.X}}"));
    }

    #[test]
    fn test_hyphenated_node_ids_do_not_match() {
        let env = EnvVars::new();
        let outs = outputs(vec![("node-1", json!({"a": 1}))]);
        let resolver = VariableResolver::new(&env, &outs);

        assert_eq!(resolver.resolve_str("{{data.node-1.a}}"), json!("{{data.node-1.a}}"));
    }

    #[test]
    fn test_nested_parameters_resolve_and_non_strings_untouched() {
        let env = env(&[("TOKEN", "abc")]);
        let outs = outputs(vec![("src", json!({"rows": [1, 2]}))]);
        let resolver = VariableResolver::new(&env, &outs);

        let params = json!({
            "{{env.TOKEN}}": "key untouched",
            "headers": { "Authorization": "Bearer {{env.TOKEN}}" },
            "values": ["{{data.src.rows}}", 7, false, null],
            "limit": 10
        });
        let Value::Object(map) = params else { unreachable!() };

        let resolved = Value::Object(resolver.resolve_parameters(&map));
        assert_eq!(
            resolved,
            json!({
                "{{env.TOKEN}}": "key untouched",
                "headers": { "Authorization": "Bearer abc" },
                "values": [[1, 2], 7, false, null],
                "limit": 10
            })
        );
    }

    #[test]
    fn test_extract_data_references_walks_tree() {
        let tree = json!({
            "text": "{{data.a.title}} and {{data.b.x.y}}",
            "nested": [{ "deep": "{{data.c.0}}" }, "{{env.NOPE}}"],
            "n": 5
        });

        let refs = extract_data_references(&tree);
        let ids: Vec<&str> = refs.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(refs[1].field_path, "x.y");
        assert_eq!(refs[2].token, "{{data.c.0}}");
    }

    #[test]
    fn test_contains_tokens() {
        assert!(contains_tokens("hi {{env.A}}"));
        assert!(contains_tokens("{{data.n.f}}"));
        assert!(!contains_tokens("{{other.A}}"));
        assert!(!contains_tokens("plain"));
    }
}
