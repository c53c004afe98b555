//! # Hydration Specs
//!
//! A spec is either an atomic key, or a nested form whose head key is hydrated
//! first and whose tail specs are then applied inside the head key's value.
//!
//! ```text
//! "user"                          atomic key
//! ["posts", "author"]             hydrate posts, then author inside each post
//! ["posts", "author", ["comments", "user"]]
//! ```
//!
//! Specs are parsed from JSON or from a dotted shorthand (`posts.author`), and
//! validated before any resolver runs. A single-element nested form is rejected.

use crate::error::{HydrationError, HydrationResult};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub enum HydrationSpec {
    /// A single hydration target
    Key(String),
    /// Hydrate `key`, then apply `inner` to the records found under it
    Nested {
        key: String,
        inner: Vec<HydrationSpec>,
    },
}

impl HydrationSpec {
    pub fn key(key: impl Into<String>) -> Self {
        HydrationSpec::Key(key.into())
    }

    /// Build a nested form. `inner` must not be empty.
    pub fn nested(key: impl Into<String>, inner: Vec<HydrationSpec>) -> HydrationResult<Self> {
        let key = key.into();
        if inner.is_empty() {
            return Err(HydrationError::invalid_spec(
                format!("[\"{key}\"]"),
                "nested form needs at least two elements",
            ));
        }
        Ok(HydrationSpec::Nested { key, inner })
    }

    /// Parse a spec from its JSON form
    pub fn from_json(value: &Value) -> HydrationResult<Self> {
        match value {
            Value::String(key) => {
                validate_key(key, value)?;
                Ok(HydrationSpec::Key(key.clone()))
            }
            Value::Array(items) => {
                let Some((head, tail)) = items.split_first() else {
                    return Err(HydrationError::invalid_spec(value, "empty nested form"));
                };
                let Value::String(key) = head else {
                    return Err(HydrationError::invalid_spec(
                        value,
                        "nested form must start with a key",
                    ));
                };
                validate_key(key, value)?;
                if tail.is_empty() {
                    return Err(HydrationError::invalid_spec(
                        value,
                        "nested form needs at least two elements",
                    ));
                }
                let inner = tail
                    .iter()
                    .map(HydrationSpec::from_json)
                    .collect::<HydrationResult<Vec<_>>>()?;
                Ok(HydrationSpec::Nested {
                    key: key.clone(),
                    inner,
                })
            }
            other => Err(HydrationError::invalid_spec(
                other,
                "expected a key or a nested form",
            )),
        }
    }

    /// Parse the dotted shorthand: `posts.author.user`
    pub fn parse_dotted(input: &str) -> HydrationResult<Self> {
        let segments: Vec<&str> = input.split('.').map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(HydrationError::invalid_spec(input, "empty key segment"));
        }

        let mut segments = segments.into_iter().rev();
        // split always yields at least one segment
        let mut spec = HydrationSpec::Key(segments.next().unwrap_or_default().to_string());
        for key in segments {
            spec = HydrationSpec::Nested {
                key: key.to_string(),
                inner: vec![spec],
            };
        }
        Ok(spec)
    }

    /// Parse either form: JSON when it looks like JSON, dotted otherwise
    pub fn parse(input: &str) -> HydrationResult<Self> {
        let trimmed = input.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('"') {
            let value: Value = serde_json::from_str(trimmed)?;
            Self::from_json(&value)
        } else {
            Self::parse_dotted(trimmed)
        }
    }

    /// The key hydrated first by this spec
    pub fn head(&self) -> &str {
        match self {
            HydrationSpec::Key(key) => key,
            HydrationSpec::Nested { key, .. } => key,
        }
    }

    /// Levels of nesting, an atomic key being 1
    pub fn depth(&self) -> usize {
        match self {
            HydrationSpec::Key(_) => 1,
            HydrationSpec::Nested { inner, .. } => {
                1 + inner.iter().map(HydrationSpec::depth).max().unwrap_or(0)
            }
        }
    }

    /// Recursive validation, including the nesting limit
    pub fn validate(&self, max_depth: usize) -> HydrationResult<()> {
        match self {
            HydrationSpec::Key(key) => validate_key(key, self),
            HydrationSpec::Nested { key, inner } => {
                validate_key(key, self)?;
                if inner.is_empty() {
                    return Err(HydrationError::invalid_spec(
                        self,
                        "nested form needs at least two elements",
                    ));
                }
                let depth = self.depth();
                if depth > max_depth {
                    return Err(HydrationError::invalid_spec(
                        self,
                        format!("nesting depth {depth} exceeds the maximum of {max_depth}"),
                    ));
                }
                inner.iter().try_for_each(|spec| spec.validate(max_depth))
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            HydrationSpec::Key(key) => Value::String(key.clone()),
            HydrationSpec::Nested { key, inner } => {
                let mut items = vec![Value::String(key.clone())];
                items.extend(inner.iter().map(HydrationSpec::to_json));
                Value::Array(items)
            }
        }
    }
}

fn validate_key(key: &str, context: impl fmt::Display) -> HydrationResult<()> {
    if key.trim().is_empty() {
        return Err(HydrationError::invalid_spec(context, "key must not be empty"));
    }
    Ok(())
}

impl fmt::Display for HydrationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl TryFrom<Value> for HydrationSpec {
    type Error = HydrationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        HydrationSpec::from_json(&value)
    }
}

impl From<&str> for HydrationSpec {
    fn from(key: &str) -> Self {
        HydrationSpec::Key(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_atomic_key() {
        let spec = HydrationSpec::from_json(&json!("user")).unwrap();
        assert_eq!(spec, HydrationSpec::key("user"));
        assert_eq!(spec.depth(), 1);
        assert_eq!(spec.head(), "user");
    }

    #[test]
    fn test_nested_form() {
        let spec =
            HydrationSpec::from_json(&json!(["posts", "author", ["comments", "user"]])).unwrap();
        assert_eq!(
            spec,
            HydrationSpec::Nested {
                key: "posts".to_string(),
                inner: vec![
                    HydrationSpec::key("author"),
                    HydrationSpec::Nested {
                        key: "comments".to_string(),
                        inner: vec![HydrationSpec::key("user")],
                    },
                ],
            }
        );
        assert_eq!(spec.depth(), 3);
        assert_eq!(spec.to_json(), json!(["posts", "author", ["comments", "user"]]));
    }

    #[test]
    fn test_single_element_nested_form_rejected() {
        let err = HydrationSpec::from_json(&json!(["b"])).unwrap_err();
        assert!(matches!(err, HydrationError::InvalidSpec { .. }));

        let err = HydrationSpec::from_json(&json!(["a", ["b"]])).unwrap_err();
        assert!(matches!(err, HydrationError::InvalidSpec { .. }));

        assert!(HydrationSpec::nested("b", vec![]).is_err());
    }

    #[test]
    fn test_non_key_elements_rejected() {
        let bad_specs = [
            json!(42),
            json!([1, "a"]),
            json!([]),
            json!(["a", {"b": 1}]),
            json!(null),
            json!(""),
        ];
        for bad in bad_specs {
            assert!(
                HydrationSpec::from_json(&bad).is_err(),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn test_dotted_shorthand() {
        assert_eq!(HydrationSpec::parse("user").unwrap(), HydrationSpec::key("user"));
        assert_eq!(
            HydrationSpec::parse("posts.author").unwrap().to_json(),
            json!(["posts", "author"])
        );
        assert_eq!(
            HydrationSpec::parse("posts.comments.user").unwrap().to_json(),
            json!(["posts", ["comments", "user"]])
        );
        assert!(HydrationSpec::parse("posts..user").is_err());
        assert_eq!(
            HydrationSpec::parse(r#"["posts", "author"]"#).unwrap().to_json(),
            json!(["posts", "author"])
        );
    }

    #[test]
    fn test_depth_limit() {
        let spec = HydrationSpec::parse("a.b.c").unwrap();
        assert!(spec.validate(3).is_ok());
        assert!(spec.validate(2).is_err());
    }

    #[test]
    fn test_deserialize() {
        let specs: Vec<HydrationSpec> =
            serde_json::from_value(json!(["user", ["posts", "author"]])).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].head(), "posts");

        let bad: Result<Vec<HydrationSpec>, _> = serde_json::from_value(json!([["b"]]));
        assert!(bad.is_err());
    }
}
