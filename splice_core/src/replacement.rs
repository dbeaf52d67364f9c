use serde::Deserialize;
use serde::Serialize;
use serde_yaml_ng::Value;

use crate::Document;
use crate::Encoding;
use crate::ExtendedPath;
use crate::Extender;
use crate::Selector;
use crate::SpliceError;
use crate::SpliceResult;
use crate::document::DEFAULT_FIELD_PATH;
use crate::document::is_nil_or_empty;
use crate::document::is_scalar;
use crate::document::scalar_text;
use crate::document::value_text;
use crate::selector::resource_ids;
use crate::tree;

/// Options refining how a value is read from a source or written to a
/// target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
	/// Split the scalar on this delimiter.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub delimiter: String,
	/// Element of the split value to read (source) or replace (target). On
	/// targets a negative index prepends and an index past the end appends.
	#[serde(default)]
	pub index: i64,
	/// Source only: decode the whole source value with this encoding.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub encoding: String,
	/// Target only: create missing fields.
	#[serde(default)]
	pub create: bool,
}

/// Where the replacement value comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelector {
	#[serde(flatten)]
	pub selector: Selector,
	/// Defaults to `metadata.name`. May continue into an encoded payload.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub field_path: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<FieldOptions>,
}

/// Where the replacement value goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelector {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub select: Option<Selector>,
	/// Documents matching any of these are skipped for this target.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub reject: Vec<Selector>,
	/// Defaults to `[metadata.name]`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub field_paths: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<FieldOptions>,
}

/// Copy one source value into any number of target fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<SourceSelector>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub targets: Option<Vec<TargetSelector>>,
}

impl Replacement {
	/// The source and targets, or an error if either is missing.
	pub fn parts(&self) -> SpliceResult<(&SourceSelector, &[TargetSelector])> {
		match (&self.source, &self.targets) {
			(Some(source), Some(targets)) if !targets.is_empty() => Ok((source, targets)),
			_ => Err(SpliceError::MissingSourceOrTargets),
		}
	}
}

/// Pick the single document whose identities match `selector`.
pub fn select_source<'d>(documents: &'d [Document], selector: &Selector) -> SpliceResult<&'d Document> {
	let mut matches = Vec::new();

	for document in documents {
		if resource_ids(document)?.iter().any(|id| selector.matches_id(id)) {
			matches.push(document);
		}
	}

	match matches.as_slice() {
		[] => Err(SpliceError::NoSourceMatch(selector.to_string())),
		[document] => Ok(*document),
		_ => {
			Err(SpliceError::AmbiguousSource {
				selector: selector.to_string(),
				count: matches.len(),
			})
		}
	}
}

/// Resolve the replacement value described by `source` from `documents`.
pub fn resolve_source(documents: &[Document], source: &SourceSelector) -> SpliceResult<Value> {
	let document = select_source(documents, &source.selector)?;
	let field_path = if source.field_path.is_empty() {
		DEFAULT_FIELD_PATH
	} else {
		source.field_path.as_str()
	};
	let missing = || {
		SpliceError::MissingSourceField {
			selector: source.selector.to_string(),
			field_path: field_path.to_string(),
		}
	};

	let path: ExtendedPath = field_path.parse()?;
	let field = tree::find_first(document.root(), &path.resource_path)?.ok_or_else(missing)?;
	if is_nil_or_empty(field) {
		return Err(missing());
	}

	let value = path.get(field)?;
	if is_nil_or_empty(&value) {
		return Err(missing());
	}

	refine_value(source.options.as_ref(), value)
}

/// Apply source `options` to a resolved value: take one delimited element,
/// or decode the whole scalar with a value encoding.
pub fn refine_value(options: Option<&FieldOptions>, value: Value) -> SpliceResult<Value> {
	let Some(options) = options.filter(|o| !o.delimiter.is_empty() || !o.encoding.is_empty()) else {
		return Ok(value);
	};
	let text = scalar_text(&value).ok_or(SpliceError::RefineNonScalar)?;

	if !options.delimiter.is_empty() {
		let parts: Vec<&str> = text.split(options.delimiter.as_str()).collect();
		let part = usize::try_from(options.index)
			.ok()
			.and_then(|index| parts.get(index))
			.ok_or_else(|| {
				SpliceError::IndexOutOfBounds {
					index: options.index,
					value: text.clone(),
				}
			})?;
		return Ok(Value::String((*part).to_string()));
	}

	let encoding: Encoding = options.encoding.parse()?;
	if encoding == Encoding::Regex {
		return Err(SpliceError::UnsupportedValueEncoding(encoding.to_string()));
	}

	Extender::decode(encoding, &text)?.get(&[])
}

/// Insert `value` into the `delimiter`-separated `current` string: a
/// negative `index` prepends, an index past the end appends, anything else
/// replaces that element.
pub fn splice_delimited(current: &str, delimiter: &str, index: i64, value: &str) -> String {
	let mut parts: Vec<&str> = current.split(delimiter).collect();

	match usize::try_from(index) {
		Err(_) => parts.insert(0, value),
		Ok(index) if index >= parts.len() => parts.push(value),
		Ok(index) => parts[index] = value,
	}

	parts.join(delimiter)
}

/// Whether `document` is selected by `select` and not excluded by any
/// `reject` entry.
///
/// A reject entry excludes the document when its identity fields match any
/// identity of the document, or when its annotation and label selectors
/// match. Either side on its own is enough. Unset sides never match.
pub fn is_selected(document: &Document, select: &Selector, reject: &[Selector]) -> SpliceResult<bool> {
	if !select.matches(document)? {
		return Ok(false);
	}

	for rejected in reject {
		if rejected.has_identity() && rejected.matches_identity(document)? {
			return Ok(false);
		}
		if rejected.has_metadata() && rejected.matches_metadata(document)? {
			return Ok(false);
		}
	}

	Ok(true)
}

/// Write `value` into every target field of every selected document.
pub fn apply_to_targets(
	documents: &mut [Document],
	value: &Value,
	targets: &[TargetSelector],
) -> SpliceResult<()> {
	for target in targets {
		let select = target.select.as_ref().ok_or(SpliceError::MissingTargetSelect)?;

		for document in documents.iter_mut() {
			if !is_selected(document, select, &target.reject)? {
				continue;
			}

			tracing::debug!(
				kind = document.kind(),
				name = document.name(),
				"applying replacement to target"
			);
			copy_value_to_target(document, value, target)?;
		}
	}

	Ok(())
}

fn copy_value_to_target(document: &mut Document, value: &Value, target: &TargetSelector) -> SpliceResult<()> {
	let default_paths = [DEFAULT_FIELD_PATH.to_string()];
	let field_paths = if target.field_paths.is_empty() {
		&default_paths[..]
	} else {
		target.field_paths.as_slice()
	};
	let options = target.options.as_ref();

	for field_path in field_paths {
		let path: ExtendedPath = field_path.parse()?;

		let locations = if options.is_some_and(|o| o.create) {
			if path.resource_path.iter().any(|token| token == "*") {
				return Err(SpliceError::CreateWithWildcard {
					path: field_path.clone(),
				});
			}
			vec![tree::lookup_create(
				document.root_mut(),
				&path.resource_path,
				value,
			)?]
		} else {
			tree::find(document.root(), &path.resource_path)?
		};

		if locations.is_empty() {
			tracing::debug!(field_path = %field_path, "no matching field in target");
		}

		for location in locations {
			let Some(field) = tree::node_mut(document.root_mut(), &location) else {
				continue;
			};
			set_field_value(options, field, value, &path)?;
		}
	}

	Ok(())
}

fn set_field_value(
	options: Option<&FieldOptions>,
	field: &mut Value,
	value: &Value,
	path: &ExtendedPath,
) -> SpliceResult<()> {
	let mut value = value.clone();

	if let Some(options) = options.filter(|o| !o.delimiter.is_empty()) {
		if path.has_extensions() {
			return Err(SpliceError::DelimiterWithExtensions {
				path: path.to_string(),
			});
		}
		let current = scalar_text(field).ok_or_else(|| {
			SpliceError::DelimiterOnNonScalar {
				path: path.to_string(),
			}
		})?;
		value = Value::String(splice_delimited(
			&current,
			&options.delimiter,
			options.index,
			&value_text(&value)?,
		));
	}

	if is_scalar(field) {
		return path.set(field, &value);
	}

	if path.has_extensions() {
		return Err(SpliceError::ExtensionsOnNonScalar {
			path: path.to_string(),
		});
	}

	*field = value;
	Ok(())
}
