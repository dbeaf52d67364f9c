use std::collections::BTreeMap;
use std::fmt;

use globset::Glob;
use serde::Deserialize;
use serde::Serialize;

use crate::SpliceError;
use crate::SpliceResult;
use crate::document::Document;
use crate::document::PREVIOUS_KINDS_ANNOTATION;
use crate::document::PREVIOUS_NAMESPACES_ANNOTATION;
use crate::document::PREVIOUS_NAMES_ANNOTATION;

const DEFAULT_NAMESPACE: &str = "default";

/// The identity of a resource at one point of its history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceId {
	pub group: String,
	pub version: String,
	pub kind: String,
	pub name: String,
	pub namespace: String,
}

impl ResourceId {
	/// Split an `apiVersion` into group and version. `v1` has no group.
	pub fn parse_api_version(api_version: &str) -> (String, String) {
		match api_version.split_once('/') {
			Some((group, version)) => (group.to_string(), version.to_string()),
			None => (String::new(), api_version.to_string()),
		}
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let group = if self.group.is_empty() {
			"[noGrp]"
		} else {
			self.group.as_str()
		};
		let namespace = if self.namespace.is_empty() {
			"[noNs]"
		} else {
			self.namespace.as_str()
		};
		write!(
			f,
			"{}.{}.{group}/{}.{namespace}",
			self.kind, self.version, self.name
		)
	}
}

/// Current identity followed by one identity per recorded rename.
pub fn resource_ids(document: &Document) -> SpliceResult<Vec<ResourceId>> {
	let (group, version) = ResourceId::parse_api_version(document.api_version());
	let mut ids = vec![ResourceId {
		group,
		version,
		kind: document.kind().to_string(),
		name: document.name().to_string(),
		namespace: document.namespace().to_string(),
	}];
	ids.extend(previous_ids(document)?);

	Ok(ids)
}

/// Identities reconstructed from the rename-tracking annotations.
pub fn previous_ids(document: &Document) -> SpliceResult<Vec<ResourceId>> {
	let annotations = document.annotations();
	let Some(names) = annotations.get(PREVIOUS_NAMES_ANNOTATION) else {
		return Ok(Vec::new());
	};

	let split = |key: &str| -> Vec<String> {
		annotations
			.get(key)
			.map_or("", String::as_str)
			.split(',')
			.map(str::to_string)
			.collect()
	};
	let names: Vec<String> = names.split(',').map(str::to_string).collect();
	let namespaces = split(PREVIOUS_NAMESPACES_ANNOTATION);
	let kinds = split(PREVIOUS_KINDS_ANNOTATION);

	if names.len() != namespaces.len() || names.len() != kinds.len() {
		return Err(SpliceError::PreviousIdsMismatch {
			resource: format!("{}/{}", document.kind(), document.name()),
			names: names.len(),
			namespaces: namespaces.len(),
			kinds: kinds.len(),
		});
	}

	let (group, version) = ResourceId::parse_api_version(document.api_version());
	Ok(names
		.into_iter()
		.zip(namespaces)
		.zip(kinds)
		.map(|((name, namespace), kind)| {
			ResourceId {
				group: group.clone(),
				version: version.clone(),
				kind,
				name,
				namespace,
			}
		})
		.collect())
}

/// Selects resources by identity and by annotation/label expressions.
/// Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub group: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub version: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub kind: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub name: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub namespace: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub annotation_selector: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub label_selector: String,
}

impl Selector {
	pub fn has_identity(&self) -> bool {
		!(self.group.is_empty()
			&& self.version.is_empty()
			&& self.kind.is_empty()
			&& self.name.is_empty()
			&& self.namespace.is_empty())
	}

	pub fn has_metadata(&self) -> bool {
		!(self.annotation_selector.is_empty() && self.label_selector.is_empty())
	}

	/// Whether a single identity satisfies the group/version/kind/name/namespace
	/// constraints.
	pub fn matches_id(&self, id: &ResourceId) -> bool {
		let namespace = if id.namespace.is_empty() {
			DEFAULT_NAMESPACE
		} else {
			id.namespace.as_str()
		};

		field_matches(&self.group, &id.group)
			&& field_matches(&self.version, &id.version)
			&& field_matches(&self.kind, &id.kind)
			&& field_matches(&self.name, &id.name)
			&& field_matches(&self.namespace, namespace)
	}

	/// Whether any current or historical identity of `document` matches.
	pub fn matches_identity(&self, document: &Document) -> SpliceResult<bool> {
		Ok(resource_ids(document)?.iter().any(|id| self.matches_id(id)))
	}

	/// Whether the annotation and label expressions both hold.
	pub fn matches_metadata(&self, document: &Document) -> SpliceResult<bool> {
		Ok(matches_expression(&self.annotation_selector, &document.annotations())?
			&& matches_expression(&self.label_selector, &document.labels())?)
	}

	pub fn matches(&self, document: &Document) -> SpliceResult<bool> {
		Ok(self.matches_identity(document)? && self.matches_metadata(document)?)
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let fields = [
			("group", &self.group),
			("version", &self.version),
			("kind", &self.kind),
			("name", &self.name),
			("namespace", &self.namespace),
			("annotationSelector", &self.annotation_selector),
			("labelSelector", &self.label_selector),
		];
		let parts: Vec<String> = fields
			.iter()
			.filter(|(_, value)| !value.is_empty())
			.map(|(key, value)| format!("{key}={value}"))
			.collect();

		if parts.is_empty() {
			write!(f, "{{}}")
		} else {
			write!(f, "{{{}}}", parts.join(", "))
		}
	}
}

fn field_matches(pattern: &str, value: &str) -> bool {
	pattern.is_empty() || matches_pattern(pattern, value)
}

/// Exact match, falling back to a glob match when `pattern` is a valid glob.
pub(crate) fn matches_pattern(pattern: &str, value: &str) -> bool {
	if pattern == value {
		return true;
	}

	Glob::new(pattern).is_ok_and(|glob| glob.compile_matcher().is_match(value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
	Exists(String),
	NotExists(String),
	Equals(String, String),
	NotEquals(String, String),
	In(String, Vec<String>),
	NotIn(String, Vec<String>),
}

impl Requirement {
	fn holds(&self, values: &BTreeMap<String, String>) -> bool {
		match self {
			Self::Exists(key) => values.contains_key(key),
			Self::NotExists(key) => !values.contains_key(key),
			Self::Equals(key, expected) => values.get(key) == Some(expected),
			Self::NotEquals(key, expected) => values.get(key) != Some(expected),
			Self::In(key, set) => values.get(key).is_some_and(|value| set.contains(value)),
			Self::NotIn(key, set) => !values.get(key).is_some_and(|value| set.contains(value)),
		}
	}
}

/// Evaluate a Kubernetes label selector expression (`a=b,c!=d,e in (f,g),!h`)
/// against a key/value map. An empty expression always holds.
pub fn matches_expression(expression: &str, values: &BTreeMap<String, String>) -> SpliceResult<bool> {
	Ok(parse_expression(expression)?
		.iter()
		.all(|requirement| requirement.holds(values)))
}

fn parse_expression(expression: &str) -> SpliceResult<Vec<Requirement>> {
	if expression.trim().is_empty() {
		return Ok(Vec::new());
	}

	split_requirements(expression)
		.into_iter()
		.map(|part| parse_requirement(expression, part))
		.collect()
}

/// Split on commas that are not inside a `( ... )` value set.
fn split_requirements(expression: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut depth = 0usize;
	let mut start = 0;

	for (index, ch) in expression.char_indices() {
		match ch {
			'(' => depth += 1,
			')' => depth = depth.saturating_sub(1),
			',' if depth == 0 => {
				parts.push(&expression[start..index]);
				start = index + 1;
			}
			_ => {}
		}
	}
	parts.push(&expression[start..]);

	parts
}

fn parse_requirement(expression: &str, part: &str) -> SpliceResult<Requirement> {
	let invalid = |reason: &str| {
		SpliceError::InvalidSelector {
			expression: expression.to_string(),
			reason: reason.to_string(),
		}
	};
	let part = part.trim();

	if part.is_empty() {
		return Err(invalid("empty requirement"));
	}

	if let Some(key) = part.strip_prefix('!') {
		return Ok(Requirement::NotExists(parse_key(key).ok_or_else(|| invalid("missing key after `!`"))?));
	}

	if let Some((key, values)) = split_keyword(part, "notin") {
		let key = parse_key(key).ok_or_else(|| invalid("missing key before `notin`"))?;
		return Ok(Requirement::NotIn(key, parse_set(values).ok_or_else(|| invalid("expected `(value, ...)`"))?));
	}

	if let Some((key, values)) = split_keyword(part, "in") {
		let key = parse_key(key).ok_or_else(|| invalid("missing key before `in`"))?;
		return Ok(Requirement::In(key, parse_set(values).ok_or_else(|| invalid("expected `(value, ...)`"))?));
	}

	if let Some((key, value)) = part.split_once("!=") {
		let key = parse_key(key).ok_or_else(|| invalid("missing key before `!=`"))?;
		return Ok(Requirement::NotEquals(key, value.trim().to_string()));
	}

	if let Some((key, value)) = part.split_once("==").or_else(|| part.split_once('=')) {
		let key = parse_key(key).ok_or_else(|| invalid("missing key before `=`"))?;
		return Ok(Requirement::Equals(key, value.trim().to_string()));
	}

	parse_key(part)
		.map(Requirement::Exists)
		.ok_or_else(|| invalid("malformed requirement"))
}

fn parse_key(key: &str) -> Option<String> {
	let key = key.trim();
	(!key.is_empty() && !key.contains(char::is_whitespace)).then(|| key.to_string())
}

/// Split `key <keyword> (values)` on a whitespace-delimited keyword.
fn split_keyword<'a>(part: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
	let mut words = part.splitn(2, char::is_whitespace);
	let key = words.next()?;
	let rest = words.next()?.trim_start();
	let values = rest.strip_prefix(keyword)?;

	(values.starts_with(char::is_whitespace) || values.starts_with('(')).then_some((key, values))
}

fn parse_set(values: &str) -> Option<Vec<String>> {
	let inner = values.trim().strip_prefix('(')?.strip_suffix(')')?;

	Some(
		inner
			.split(',')
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string)
			.collect(),
	)
}
