use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use nljson_attr::DataType;
use serde_json::Value;

use crate::attribute::AttributeSpec;
use crate::config::PolicyConfig;
use crate::entry::PolicyEntryDoc;
use crate::error::{Result, SchemaError};

/// Attribute-type keyed tree of compiled policy entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePolicy {
    entries: HashMap<u16, AttributeSpec>,
}

/// Compile a policy document with the default configuration.
pub fn build_policy(doc: &Value) -> Result<AttributePolicy> {
    AttributePolicy::from_value(doc)
}

impl AttributePolicy {
    /// Compile a policy from a JSON value.
    pub fn from_value(doc: &Value) -> Result<Self> {
        Self::from_value_with_config(doc, PolicyConfig::default())
    }

    /// Compile a policy from a JSON value with explicit config.
    pub fn from_value_with_config(doc: &Value, config: PolicyConfig) -> Result<Self> {
        let policy = compile(doc, &config, "", 1)?;
        tracing::debug!(
            entries = policy.len(),
            depth = policy.depth(),
            "compiled attribute policy"
        );
        Ok(policy)
    }

    /// Compile a policy from JSON text.
    pub fn from_json_str(policy_json: &str) -> Result<Self> {
        Self::from_json_str_with_config(policy_json, PolicyConfig::default())
    }

    /// Compile a policy from JSON text with explicit config.
    pub fn from_json_str_with_config(policy_json: &str, config: PolicyConfig) -> Result<Self> {
        if policy_json.len() > config.max_policy_size {
            return Err(SchemaError::LoadFailed(format!(
                "policy too large ({} bytes, max {})",
                policy_json.len(),
                config.max_policy_size
            )));
        }
        let doc: Value = serde_json::from_str(policy_json)?;
        Self::from_value_with_config(&doc, config)
    }

    /// Load a policy from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, PolicyConfig::default())
    }

    /// Load a policy from a file with explicit config.
    pub fn from_file_with_config(path: &Path, config: PolicyConfig) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            SchemaError::LoadFailed(format!("failed opening policy {}: {err}", path.display()))
        })?;
        let metadata = file
            .metadata()
            .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

        if !metadata.is_file() {
            return Err(SchemaError::LoadFailed(format!(
                "policy path is not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > config.max_policy_size as u64 {
            return Err(SchemaError::LoadFailed(format!(
                "policy file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let content = read_bounded(file, config.max_policy_size).map_err(|err| match err {
            SchemaError::LoadFailed(message) => {
                SchemaError::LoadFailed(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        Self::from_json_str_with_config(&content, config)
    }

    /// Load a policy by pulling bytes from `reader` until EOF.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_config(reader, PolicyConfig::default())
    }

    /// Load a policy from a reader with explicit config.
    pub fn from_reader_with_config<R: Read>(reader: R, config: PolicyConfig) -> Result<Self> {
        let content = read_bounded(reader, config.max_policy_size)?;
        Self::from_json_str_with_config(&content, config)
    }

    /// Entry registered for `attr_type`.
    pub fn get(&self, attr_type: u16) -> Option<&AttributeSpec> {
        self.entries.get(&attr_type)
    }

    /// Registered name for `attr_type`.
    pub fn name_of(&self, attr_type: u16) -> Option<&str> {
        self.get(attr_type).map(AttributeSpec::name)
    }

    /// Data type for `attr_type`, [`DataType::Unspecified`] when absent.
    pub fn data_type_of(&self, attr_type: u16) -> DataType {
        self.get(attr_type)
            .map(AttributeSpec::data_type)
            .unwrap_or_default()
    }

    /// Attribute types with entries at this level, ascending.
    pub fn attr_types(&self) -> Vec<u16> {
        let mut types: Vec<u16> = self.entries.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Iterate entries at this level in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.entries.values()
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Levels in the policy tree; an empty policy has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .iter()
            .filter_map(AttributeSpec::nested_policy)
            .map(AttributePolicy::depth)
            .max()
            .unwrap_or(0)
    }
}

fn compile(
    doc: &Value,
    config: &PolicyConfig,
    path: &str,
    depth: usize,
) -> Result<AttributePolicy> {
    if depth > config.max_depth {
        return Err(SchemaError::TooDeep {
            max: config.max_depth,
        });
    }

    let members = doc.as_object().ok_or_else(|| SchemaError::NotAnObject {
        path: path.to_string(),
    })?;

    let mut entries: HashMap<u16, AttributeSpec> = HashMap::with_capacity(members.len());
    for (name, value) in members {
        if name.is_empty() {
            return Err(SchemaError::EmptyName {
                path: path.to_string(),
            });
        }
        let qualified = qualify(path, name);

        let raw = PolicyEntryDoc::parse(&qualified, value)?;
        let attr_type = raw.attr_type(&qualified)?;
        let data_type = DataType::from_label(&raw.data_type);
        if data_type == DataType::Unspecified && raw.data_type != DataType::Unspecified.label() {
            tracing::warn!(
                entry = %qualified,
                data_type = %raw.data_type,
                "unrecognized data_type, treating as NLA_UNSPEC"
            );
        }

        let nested = match data_type {
            DataType::Nested => {
                let sub = raw
                    .policy
                    .as_ref()
                    .ok_or_else(|| SchemaError::MissingNestedPolicy {
                        name: qualified.clone(),
                    })?;
                Some(compile(sub, config, &qualified, depth + 1)?)
            }
            _ => {
                if raw.policy.is_some() {
                    tracing::debug!(entry = %qualified, "ignoring policy on non-nested entry");
                }
                None
            }
        };

        if let Some(existing) = entries.get(&attr_type) {
            return Err(SchemaError::DuplicateAttrType {
                attr_type,
                first: existing.name().to_string(),
                second: name.clone(),
            });
        }

        entries.insert(
            attr_type,
            AttributeSpec::new(
                attr_type,
                data_type,
                name.clone(),
                raw.min_len.unwrap_or(0),
                raw.attr_len.unwrap_or(0),
                nested,
            ),
        );
    }

    Ok(AttributePolicy { entries })
}

fn qualify(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn read_bounded<R: Read>(reader: R, max_bytes: usize) -> Result<String> {
    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    reader
        .take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| SchemaError::LoadFailed(format!("failed reading policy: {err}")))?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "policy too large while reading (max {max_bytes} bytes)"
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    const LINK_POLICY: &str = r#"{
        "IFLA_ADDRESS": { "attr_type": 1, "data_type": "NLA_UNSPEC" },
        "IFLA_IFNAME": { "attr_type": 3, "data_type": "NLA_STRING", "attr_len": 16 },
        "IFLA_MTU": { "attr_type": 4, "data_type": "NLA_U32" },
        "IFLA_LINKINFO": {
            "attr_type": 18,
            "data_type": "NLA_NESTED",
            "policy": {
                "IFLA_INFO_KIND": { "attr_type": 1, "data_type": "NLA_STRING" },
                "IFLA_INFO_DATA": {
                    "attr_type": 2,
                    "data_type": "NLA_NESTED",
                    "policy": {
                        "IFLA_VLAN_ID": { "attr_type": 1, "data_type": "NLA_U16" }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn build_and_lookup() {
        let policy = AttributePolicy::from_json_str(LINK_POLICY).unwrap();

        assert_eq!(policy.len(), 4);
        assert_eq!(policy.attr_types(), vec![1, 3, 4, 18]);
        assert_eq!(policy.name_of(3), Some("IFLA_IFNAME"));
        assert_eq!(policy.data_type_of(4), DataType::U32);
        assert_eq!(policy.get(3).unwrap().max_length(), 16);
        assert!(policy.get(99).is_none());
        assert_eq!(policy.data_type_of(99), DataType::Unspecified);
    }

    #[test]
    fn nested_policies_compile_recursively() {
        let policy = AttributePolicy::from_json_str(LINK_POLICY).unwrap();
        assert_eq!(policy.depth(), 3);

        let linkinfo = policy.get(18).unwrap();
        assert_eq!(linkinfo.data_type(), DataType::Nested);
        let inner = linkinfo.nested_policy().unwrap();
        assert_eq!(inner.name_of(1), Some("IFLA_INFO_KIND"));

        let data = inner.get(2).unwrap().nested_policy().unwrap();
        assert_eq!(data.data_type_of(1), DataType::U16);
        assert!(policy.get(3).unwrap().nested_policy().is_none());
    }

    #[test]
    fn build_policy_matches_from_value() {
        let doc: Value = serde_json::from_str(LINK_POLICY).unwrap();
        assert_eq!(
            build_policy(&doc).unwrap(),
            AttributePolicy::from_value(&doc).unwrap()
        );
    }

    #[test]
    fn unknown_data_type_resolves_to_unspecified() {
        let policy = AttributePolicy::from_value(&json!({
            "A": { "attr_type": 1, "data_type": "NLA_BITFIELD32" },
            "B": { "attr_type": 2, "data_type": "nla_u8" }
        }))
        .unwrap();
        assert_eq!(policy.data_type_of(1), DataType::Unspecified);
        assert_eq!(policy.data_type_of(2), DataType::Unspecified);
    }

    #[test]
    fn min_and_max_lengths_default_to_zero() {
        let policy = AttributePolicy::from_value(&json!({
            "A": { "attr_type": 1, "data_type": "NLA_STRING" },
            "B": { "attr_type": 2, "data_type": "NLA_STRING", "min_len": 2, "attr_len": 8 }
        }))
        .unwrap();
        let a = policy.get(1).unwrap();
        assert_eq!((a.min_length(), a.max_length()), (0, 0));
        let b = policy.get(2).unwrap();
        assert_eq!((b.min_length(), b.max_length()), (2, 8));
    }

    #[test]
    fn empty_document_is_an_empty_policy() {
        let policy = AttributePolicy::from_json_str("{}").unwrap();
        assert!(policy.is_empty());
        assert_eq!(policy.depth(), 1);
    }

    #[test]
    fn top_level_must_be_object() {
        assert!(matches!(
            AttributePolicy::from_json_str("[1, 2]"),
            Err(SchemaError::NotAnObject { .. })
        ));
    }

    #[test]
    fn invalid_json_fails() {
        assert!(matches!(
            AttributePolicy::from_json_str("{\"A\": "),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn nested_without_policy_fails() {
        let err = AttributePolicy::from_value(&json!({
            "N": { "attr_type": 1, "data_type": "NLA_NESTED" }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingNestedPolicy { ref name } if name == "N"));
    }

    #[test]
    fn nested_policy_must_be_object() {
        let err = AttributePolicy::from_value(&json!({
            "N": { "attr_type": 1, "data_type": "NLA_NESTED", "policy": [1] }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject { ref path } if path == "N"));
    }

    #[test]
    fn error_deep_in_tree_fails_whole_build() {
        let err = AttributePolicy::from_value(&json!({
            "OK": { "attr_type": 1, "data_type": "NLA_U8" },
            "OUTER": {
                "attr_type": 2,
                "data_type": "NLA_NESTED",
                "policy": {
                    "INNER": { "attr_type": 1, "data_type": "NLA_NESTED", "policy": {
                        "BAD": { "data_type": "NLA_U8" }
                    }}
                }
            }
        }))
        .unwrap_err();
        assert!(
            matches!(err, SchemaError::InvalidEntry { ref name, .. } if name == "OUTER.INNER.BAD")
        );
    }

    #[test]
    fn duplicate_attr_type_rejected() {
        let err = AttributePolicy::from_value(&json!({
            "A": { "attr_type": 1, "data_type": "NLA_U8" },
            "B": { "attr_type": 1, "data_type": "NLA_U16" }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateAttrType { attr_type: 1, .. }
        ));
    }

    #[test]
    fn same_attr_type_in_different_levels_is_fine() {
        let policy = AttributePolicy::from_value(&json!({
            "A": { "attr_type": 1, "data_type": "NLA_NESTED", "policy": {
                "B": { "attr_type": 1, "data_type": "NLA_U8" }
            }}
        }))
        .unwrap();
        assert_eq!(policy.depth(), 2);
    }

    #[test]
    fn empty_name_rejected() {
        let err = AttributePolicy::from_value(&json!({
            "": { "attr_type": 1, "data_type": "NLA_U8" }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyName { .. }));
    }

    #[test]
    fn depth_limit_enforced() {
        let doc = json!({
            "A": { "attr_type": 1, "data_type": "NLA_NESTED", "policy": {
                "B": { "attr_type": 1, "data_type": "NLA_NESTED", "policy": {} }
            }}
        });
        let config = PolicyConfig {
            max_depth: 2,
            ..PolicyConfig::default()
        };
        assert!(matches!(
            AttributePolicy::from_value_with_config(&doc, config),
            Err(SchemaError::TooDeep { max: 2 })
        ));

        let config = PolicyConfig {
            max_depth: 3,
            ..PolicyConfig::default()
        };
        assert!(AttributePolicy::from_value_with_config(&doc, config).is_ok());
    }

    #[test]
    fn string_size_limit_enforced() {
        let config = PolicyConfig {
            max_policy_size: 8,
            ..PolicyConfig::default()
        };
        assert!(matches!(
            AttributePolicy::from_json_str_with_config(LINK_POLICY, config),
            Err(SchemaError::LoadFailed(_))
        ));
    }

    #[test]
    fn from_reader_loads_policy() {
        let policy = AttributePolicy::from_reader(Cursor::new(LINK_POLICY.as_bytes())).unwrap();
        assert_eq!(policy.len(), 4);
    }

    #[test]
    fn from_reader_pulls_in_small_chunks() {
        let reader = ChunkedReader {
            bytes: LINK_POLICY.as_bytes().to_vec(),
            pos: 0,
            chunk: 3,
        };
        let policy = AttributePolicy::from_reader(reader).unwrap();
        assert_eq!(policy.attr_types(), vec![1, 3, 4, 18]);
    }

    #[test]
    fn from_reader_size_limit_enforced() {
        let config = PolicyConfig {
            max_policy_size: 16,
            ..PolicyConfig::default()
        };
        let result =
            AttributePolicy::from_reader_with_config(Cursor::new(LINK_POLICY.as_bytes()), config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));
    }

    #[test]
    fn from_file_loads_policy() {
        let dir = make_temp_dir("from-file");
        let path = dir.join("link.policy.json");
        std::fs::write(&path, LINK_POLICY).unwrap();

        let policy = AttributePolicy::from_file(&path).unwrap();
        assert_eq!(policy.name_of(18), Some("IFLA_LINKINFO"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_file_missing_path_fails() {
        let dir = make_temp_dir("missing");
        let result = AttributePolicy::from_file(&dir.join("nope.json"));
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_file_rejects_directory() {
        let dir = make_temp_dir("directory");
        let result = AttributePolicy::from_file(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_file_size_limit_enforced() {
        let dir = make_temp_dir("size-limit");
        let path = dir.join("link.policy.json");
        std::fs::write(&path, LINK_POLICY).unwrap();

        let config = PolicyConfig {
            max_policy_size: 8,
            ..PolicyConfig::default()
        };
        let result = AttributePolicy::from_file_with_config(&path, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn policy_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AttributePolicy>();
    }

    fn make_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "nljson-policy-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    struct ChunkedReader {
        bytes: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
