use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_yaml_ng::Value;

use crate::SpliceError;
use crate::SpliceResult;

/// Annotation recording the names a resource had before being renamed.
pub const PREVIOUS_NAMES_ANNOTATION: &str = "internal.config.kubernetes.io/previousNames";
/// Annotation recording the namespaces a resource had before being moved.
pub const PREVIOUS_NAMESPACES_ANNOTATION: &str = "internal.config.kubernetes.io/previousNamespaces";
/// Annotation recording the kinds a resource had before being changed.
pub const PREVIOUS_KINDS_ANNOTATION: &str = "internal.config.kubernetes.io/previousKinds";

/// Field path used when a replacement source or target omits one.
pub const DEFAULT_FIELD_PATH: &str = "metadata.name";

/// A single structured resource, e.g. one Kubernetes manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	root: Value,
}

impl Document {
	pub fn new(root: Value) -> Self {
		Self { root }
	}

	/// Parse exactly one YAML document.
	pub fn from_yaml(content: &str) -> SpliceResult<Self> {
		let root = serde_yaml_ng::from_str(content).map_err(|e| {
			SpliceError::DocumentParse {
				path: "<inline>".to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(Self { root })
	}

	pub fn root(&self) -> &Value {
		&self.root
	}

	pub fn root_mut(&mut self) -> &mut Value {
		&mut self.root
	}

	pub fn into_value(self) -> Value {
		self.root
	}

	pub fn api_version(&self) -> &str {
		self.root
			.get("apiVersion")
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	pub fn kind(&self) -> &str {
		self.root
			.get("kind")
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	pub fn name(&self) -> &str {
		self.metadata_str("name")
	}

	pub fn namespace(&self) -> &str {
		self.metadata_str("namespace")
	}

	/// Annotations as plain strings. Non-string values are rendered as their
	/// scalar text.
	pub fn annotations(&self) -> BTreeMap<String, String> {
		self.metadata_map("annotations")
	}

	pub fn labels(&self) -> BTreeMap<String, String> {
		self.metadata_map("labels")
	}

	/// Serialize this document as YAML.
	pub fn to_yaml(&self) -> SpliceResult<String> {
		serde_yaml_ng::to_string(&self.root).map_err(|e| SpliceError::DocumentWrite(e.to_string()))
	}

	fn metadata_str(&self, field: &str) -> &str {
		self.root
			.get("metadata")
			.and_then(|metadata| metadata.get(field))
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	fn metadata_map(&self, field: &str) -> BTreeMap<String, String> {
		let Some(Value::Mapping(map)) = self.root.get("metadata").and_then(|m| m.get(field)) else {
			return BTreeMap::new();
		};

		map.iter()
			.filter_map(|(key, value)| Some((scalar_text(key)?, scalar_text(value)?)))
			.collect()
	}
}

impl From<Value> for Document {
	fn from(root: Value) -> Self {
		Self::new(root)
	}
}

/// Parse a multi-document YAML stream. Empty documents are skipped.
pub fn parse_documents(content: &str, path_display: &str) -> SpliceResult<Vec<Document>> {
	let mut documents = Vec::new();

	for deserializer in serde_yaml_ng::Deserializer::from_str(content) {
		let root = Value::deserialize(deserializer).map_err(|e| {
			SpliceError::DocumentParse {
				path: path_display.to_string(),
				reason: e.to_string(),
			}
		})?;

		if !root.is_null() {
			documents.push(Document::new(root));
		}
	}

	Ok(documents)
}

/// Read a multi-document YAML file.
pub fn load_documents(path: &Path) -> SpliceResult<Vec<Document>> {
	let content = std::fs::read_to_string(path).map_err(|e| {
		SpliceError::DocumentParse {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	parse_documents(&content, &path.display().to_string())
}

/// Serialize documents as a `---` separated YAML stream.
pub fn write_documents(documents: &[Document]) -> SpliceResult<String> {
	let mut output = String::new();

	for (index, document) in documents.iter().enumerate() {
		if index > 0 {
			output.push_str("---\n");
		}
		output.push_str(&document.to_yaml()?);
	}

	Ok(output)
}

/// The text of a scalar node. Returns `None` for mappings and sequences.
pub fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::Null => Some(String::new()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) => Some(s.clone()),
		Value::Tagged(tagged) => scalar_text(&tagged.value),
		Value::Sequence(_) | Value::Mapping(_) => None,
	}
}

pub fn is_scalar(value: &Value) -> bool {
	!matches!(value, Value::Sequence(_) | Value::Mapping(_))
}

/// Null, empty mappings and empty sequences carry no usable value.
pub fn is_nil_or_empty(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Mapping(map) => map.is_empty(),
		Value::Sequence(seq) => seq.is_empty(),
		Value::Tagged(tagged) => is_nil_or_empty(&tagged.value),
		_ => false,
	}
}

/// Text used when a value is written into a text payload: scalars as-is,
/// anything else as YAML.
pub(crate) fn value_text(value: &Value) -> SpliceResult<String> {
	match scalar_text(value) {
		Some(text) => Ok(text),
		None => serde_yaml_ng::to_string(value).map_err(|e| SpliceError::encode("yaml", e)),
	}
}
