//! Intrinsic functions
//!
//! `Expr` is the value type for any property that may hold either a literal
//! string or a reference to another resource. References are what the
//! construction graph turns into dependency edges, so `collect_references`
//! lives next to the type that produces them.

use serde::Serialize;
use std::collections::BTreeSet;

/// A property value: literal string or CloudFormation intrinsic function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Expr {
    /// Plain string
    Literal(String),

    /// `{ "Ref": "LogicalId" }`
    Ref {
        /// Referenced logical ID, parameter or pseudo parameter
        #[serde(rename = "Ref")]
        target: String,
    },

    /// `{ "Fn::GetAtt": ["LogicalId", "Attribute"] }`
    GetAtt {
        /// (logical ID, attribute name)
        #[serde(rename = "Fn::GetAtt")]
        target: (String, String),
    },

    /// `{ "Fn::Sub": "arn:${AWS::Partition}:..." }`
    Sub {
        /// Template string with `${Name}` / `${Name.Attr}` placeholders
        #[serde(rename = "Fn::Sub")]
        template: String,
    },

    /// `{ "Fn::Join": ["delimiter", [..]] }`
    Join {
        /// (delimiter, values)
        #[serde(rename = "Fn::Join")]
        parts: (String, Vec<Expr>),
    },

    /// `{ "Fn::Select": [index, list] }`
    Select {
        /// (index, list expression)
        #[serde(rename = "Fn::Select")]
        choice: (u32, Box<Expr>),
    },

    /// `{ "Fn::GetAZs": "" }`
    GetAzs {
        /// Region, empty for the stack's own region
        #[serde(rename = "Fn::GetAZs")]
        region: String,
    },
}

impl Expr {
    /// Literal value
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// `Ref` to a resource, parameter or pseudo parameter
    pub fn reference(target: impl Into<String>) -> Self {
        Self::Ref {
            target: target.into(),
        }
    }

    /// `Fn::GetAtt` on a resource attribute
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            target: (logical_id.into(), attribute.into()),
        }
    }

    /// `Fn::Sub` with implicit variables only
    pub fn sub(template: impl Into<String>) -> Self {
        Self::Sub {
            template: template.into(),
        }
    }

    /// `Fn::Join`
    pub fn join(delimiter: impl Into<String>, values: Vec<Expr>) -> Self {
        Self::Join {
            parts: (delimiter.into(), values),
        }
    }

    /// `Fn::Select`
    pub fn select(index: u32, list: Expr) -> Self {
        Self::Select {
            choice: (index, Box::new(list)),
        }
    }

    /// Availability zone `index` of the stack's region
    pub fn availability_zone(index: u32) -> Self {
        Self::select(
            index,
            Self::GetAzs {
                region: String::new(),
            },
        )
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Returns true for CloudFormation pseudo parameters (`AWS::Region`, ...)
#[must_use]
pub fn is_pseudo_parameter(name: &str) -> bool {
    name.starts_with("AWS::")
}

/// Collect every name referenced by intrinsic functions inside `value`
///
/// Walks a serialized property tree and gathers the targets of `Ref`,
/// `Fn::GetAtt` and the `${Name}` / `${Name.Attr}` placeholders of
/// `Fn::Sub`. Escaped placeholders (`${!Literal}`) are skipped. Pseudo
/// parameters are included; callers decide whether to ignore them.
#[must_use]
pub fn collect_references(value: &serde_json::Value) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    walk(value, &mut refs);
    refs
}

fn walk(value: &serde_json::Value, refs: &mut BTreeSet<String>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(target)) = map.get("Ref") {
                    refs.insert(target.clone());
                    return;
                }
                if let Some(serde_json::Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(serde_json::Value::String(target)) = parts.first() {
                        refs.insert(target.clone());
                    }
                    return;
                }
                if let Some(serde_json::Value::String(template)) = map.get("Fn::Sub") {
                    refs.extend(sub_placeholders(template));
                    return;
                }
            }
            for child in map.values() {
                walk(child, refs);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk(item, refs);
            }
        }
        _ => {}
    }
}

/// Names referenced by the `${..}` placeholders of a `Fn::Sub` template
fn sub_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let inner = &after[..end];
        if !inner.starts_with('!') && !inner.is_empty() {
            // `${Bucket.Arn}` depends on `Bucket`
            let name = inner.split('.').next().unwrap_or(inner);
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intrinsics_serialize_in_long_form() {
        assert_eq!(serde_json::to_value(Expr::reference("Vpc")).ok(), Some(json!({"Ref": "Vpc"})));
        assert_eq!(
            serde_json::to_value(Expr::get_att("Bucket", "Arn")).ok(),
            Some(json!({"Fn::GetAtt": ["Bucket", "Arn"]}))
        );
        assert_eq!(
            serde_json::to_value(Expr::availability_zone(1)).ok(),
            Some(json!({"Fn::Select": [1, {"Fn::GetAZs": ""}]}))
        );
        assert_eq!(serde_json::to_value(Expr::literal("c5")).ok(), Some(json!("c5")));
    }

    #[test]
    fn test_collect_references_finds_all_forms() {
        let value = json!({
            "VpcId": {"Ref": "BatchVpc"},
            "Role": {"Fn::GetAtt": ["FnRole", "Arn"]},
            "Uri": {"Fn::Sub": "arn:${AWS::Partition}:s3:::${Bucket}/${Fn.Arn}/${!Escaped}"},
            "List": [{"Ref": "SubnetA"}, "literal"]
        });

        let refs = collect_references(&value);
        let expected: BTreeSet<String> = ["AWS::Partition", "BatchVpc", "Bucket", "Fn", "FnRole", "SubnetA"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(refs, expected);
    }

    #[test]
    fn test_sub_placeholders_ignores_unterminated() {
        assert_eq!(sub_placeholders("prefix-${Open"), Vec::<String>::new());
        assert_eq!(sub_placeholders("${A}${B.Arn}"), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_pseudo_parameters() {
        assert!(is_pseudo_parameter("AWS::Region"));
        assert!(!is_pseudo_parameter("EcrImageName"));
    }
}
