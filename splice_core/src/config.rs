use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml_ng::Value;

use crate::Replacement;
use crate::ReplacementEngine;
use crate::SpliceError;
use crate::SpliceResult;
use crate::document::load_documents;

/// Configuration of a replacement run, usually the function config of the
/// transformer.
///
/// ```yaml
/// apiVersion: config.splice.dev/v1alpha1
/// kind: ReplacementTransformer
/// metadata:
///   name: replacements
/// source: upstream/resources.yaml
/// replacements:
///   - path: shared/replacements.yaml
///   - source:
///       kind: ConfigMap
///       name: cluster
///       fieldPath: data.domain
///     targets:
///       - select:
///           kind: Ingress
///         fieldPaths:
///           - spec.rules.0.host
///         options:
///           delimiter: "."
///           index: 1
/// ```
///
/// `apiVersion`, `kind` and `metadata` are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplacementConfig {
	/// Multi-document YAML file providing the source documents. When absent
	/// the transformed documents are their own sources.
	#[serde(default)]
	pub source: Option<PathBuf>,
	#[serde(default)]
	pub replacements: Vec<ReplacementEntry>,
}

/// A replacement given inline, or a file holding one or more replacements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplacementEntry {
	#[serde(default)]
	pub path: Option<PathBuf>,
	#[serde(flatten)]
	pub replacement: Replacement,
}

impl ReplacementEntry {
	fn is_inline(&self) -> bool {
		self.replacement.source.is_some() || self.replacement.targets.as_ref().is_some_and(|t| !t.is_empty())
	}
}

impl ReplacementConfig {
	pub fn from_yaml(content: &str) -> SpliceResult<Self> {
		serde_yaml_ng::from_str(content).map_err(|e| SpliceError::ConfigParse(e.to_string()))
	}

	pub fn load(path: &Path) -> SpliceResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_yaml(&content)
	}

	/// Load referenced replacement files and the source document set.
	/// Relative paths are resolved against `base_dir`.
	pub fn resolve(&self, base_dir: &Path) -> SpliceResult<ReplacementEngine> {
		let mut replacements = Vec::new();

		for entry in &self.replacements {
			match &entry.path {
				Some(_) if entry.is_inline() => return Err(SpliceError::PathAndInlineReplacement),
				Some(path) => replacements.extend(load_replacement_file(&base_dir.join(path))?),
				None => replacements.push(entry.replacement.clone()),
			}
		}

		let engine = ReplacementEngine::new(replacements);
		match &self.source {
			Some(source) => {
				let sources = load_documents(&base_dir.join(source))?;
				tracing::debug!(
					source = %source.display(),
					count = sources.len(),
					"loaded replacement sources"
				);
				Ok(engine.with_sources(sources))
			}
			None => Ok(engine),
		}
	}
}

/// Parse replacements from a file holding either a single replacement or a
/// list of them.
pub fn load_replacement_file(path: &Path) -> SpliceResult<Vec<Replacement>> {
	let content = std::fs::read_to_string(path)?;
	parse_replacements(&content, &path.display().to_string())
}

pub fn parse_replacements(content: &str, path_display: &str) -> SpliceResult<Vec<Replacement>> {
	let parse_error = |e: serde_yaml_ng::Error| {
		SpliceError::ConfigParse(format!("while unmarshaling replacement path {path_display}: {e}"))
	};
	let value: Value = serde_yaml_ng::from_str(content).map_err(parse_error)?;

	match value {
		Value::Sequence(_) => serde_yaml_ng::from_value(value).map_err(parse_error),
		Value::Mapping(_) => Ok(vec![serde_yaml_ng::from_value(value).map_err(parse_error)?]),
		_ => {
			Err(SpliceError::UnsupportedReplacementFile {
				path: path_display.to_string(),
			})
		}
	}
}
