use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use regex::RegexBuilder;
use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

use crate::SpliceError;
use crate::SpliceResult;
use crate::document::scalar_text;
use crate::document::value_text;
use crate::path::Encoding;
use crate::tree;

/// A decoded payload that can be read, modified and re-encoded.
///
/// Structured encodings (YAML, JSON, TOML, INI) are all held as a
/// `serde_yaml_ng::Value` tree so that navigation is shared. Each variant
/// re-serializes with its own format.
#[derive(Debug, Clone, PartialEq)]
pub enum Extender {
	Yaml(Value),
	Json(Value),
	Toml(Value),
	Ini(Value),
	/// Decoded bytes of a standard base64 payload.
	Base64(Vec<u8>),
	/// Free text addressed by `[pattern, captureGroup]`.
	Regex(String),
}

impl Extender {
	pub fn decode(encoding: Encoding, payload: &str) -> SpliceResult<Self> {
		let extender = match encoding {
			Encoding::Yaml => Self::Yaml(decode_yaml(payload)?),
			Encoding::Json => Self::Json(decode_json(payload)?),
			Encoding::Toml => Self::Toml(decode_toml(payload)?),
			Encoding::Ini => Self::Ini(decode_ini(payload)?),
			Encoding::Base64 => {
				// Payloads are often wrapped at 76 columns.
				let compact: Vec<u8> = payload.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
				Self::Base64(
					STANDARD
						.decode(compact)
						.map_err(|e| SpliceError::decode(encoding, e))?,
				)
			}
			Encoding::Regex => Self::Regex(payload.to_string()),
		};

		Ok(extender)
	}

	pub fn encoding(&self) -> Encoding {
		match self {
			Self::Yaml(_) => Encoding::Yaml,
			Self::Json(_) => Encoding::Json,
			Self::Toml(_) => Encoding::Toml,
			Self::Ini(_) => Encoding::Ini,
			Self::Base64(_) => Encoding::Base64,
			Self::Regex(_) => Encoding::Regex,
		}
	}

	/// Read the value at `sub_path`. An empty path returns the whole payload.
	pub fn get(&self, sub_path: &[String]) -> SpliceResult<Value> {
		match self {
			Self::Yaml(tree) | Self::Json(tree) | Self::Toml(tree) | Self::Ini(tree) => {
				tree::find_first(tree, sub_path)?.cloned().ok_or_else(|| {
					SpliceError::SubPathNotFound {
						encoding: self.encoding().to_string(),
						path: sub_path.join("."),
					}
				})
			}
			Self::Base64(bytes) => {
				expect_empty(Encoding::Base64, sub_path)?;
				String::from_utf8(bytes.clone())
					.map(Value::String)
					.map_err(|e| SpliceError::decode(Encoding::Base64, e))
			}
			Self::Regex(text) => {
				let (regex, group) = regex_address(sub_path)?;
				let span = capture_span(&regex, group, text)?;
				Ok(Value::String(text[span].to_string()))
			}
		}
	}

	/// Write `value` at `sub_path`, creating missing mapping keys in
	/// structured payloads. An empty path replaces the whole payload.
	pub fn set(&mut self, sub_path: &[String], value: &Value) -> SpliceResult<()> {
		let encoding = self.encoding();

		match self {
			Self::Yaml(tree) | Self::Json(tree) | Self::Toml(tree) | Self::Ini(tree) => {
				if sub_path.is_empty() {
					*tree = value.clone();
					return Ok(());
				}

				let location = tree::lookup_create(tree, sub_path, value)?;
				let node = tree::node_mut(tree, &location).ok_or_else(|| {
					SpliceError::SubPathNotFound {
						encoding: encoding.to_string(),
						path: sub_path.join("."),
					}
				})?;
				*node = value.clone();
			}
			Self::Base64(bytes) => {
				expect_empty(encoding, sub_path)?;
				*bytes = value_text(value)?.into_bytes();
			}
			Self::Regex(text) => {
				let (regex, group) = regex_address(sub_path)?;
				let span = capture_span(&regex, group, text)?;
				text.replace_range(span, &value_text(value)?);
			}
		}

		Ok(())
	}

	/// Re-encode the (possibly modified) payload.
	pub fn payload(&self) -> SpliceResult<String> {
		match self {
			Self::Yaml(tree) => {
				if tree.is_null() {
					return Ok(String::new());
				}
				serde_yaml_ng::to_string(tree).map_err(|e| SpliceError::encode(Encoding::Yaml, e))
			}
			Self::Json(tree) => {
				let mut json =
					serde_json::to_string_pretty(tree).map_err(|e| SpliceError::encode(Encoding::Json, e))?;
				json.push('\n');
				Ok(json)
			}
			Self::Toml(tree) => {
				let table = yaml_to_toml(tree)?;
				if !table.is_table() {
					return Err(SpliceError::encode(
						Encoding::Toml,
						"top level value must be a table",
					));
				}
				toml::to_string(&table).map_err(|e| SpliceError::encode(Encoding::Toml, e))
			}
			Self::Ini(tree) => encode_ini(tree),
			Self::Base64(bytes) => Ok(STANDARD.encode(bytes)),
			Self::Regex(text) => Ok(text.clone()),
		}
	}
}

fn expect_empty(encoding: Encoding, sub_path: &[String]) -> SpliceResult<()> {
	if sub_path.is_empty() {
		Ok(())
	} else {
		Err(SpliceError::InvalidPath {
			path: sub_path.join("."),
			reason: format!("{encoding} segments take no sub-path"),
		})
	}
}

fn decode_yaml(payload: &str) -> SpliceResult<Value> {
	if payload.trim().is_empty() {
		return Ok(Value::Null);
	}

	serde_yaml_ng::from_str(payload).map_err(|e| SpliceError::decode(Encoding::Yaml, e))
}

fn decode_json(payload: &str) -> SpliceResult<Value> {
	if payload.trim().is_empty() {
		return Ok(Value::Null);
	}

	serde_json::from_str(payload).map_err(|e| SpliceError::decode(Encoding::Json, e))
}

fn decode_toml(payload: &str) -> SpliceResult<Value> {
	let table: toml::Table = toml::from_str(payload).map_err(|e| SpliceError::decode(Encoding::Toml, e))?;
	Ok(toml_to_yaml(toml::Value::Table(table)))
}

fn decode_ini(payload: &str) -> SpliceResult<Value> {
	if payload.trim().is_empty() {
		return Ok(Value::Mapping(Mapping::new()));
	}

	serde_ini::from_str(payload).map_err(|e| SpliceError::decode(Encoding::Ini, e))
}

/// Convert a `toml::Value` into a YAML tree. Datetimes become strings.
fn toml_to_yaml(value: toml::Value) -> Value {
	match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::Number(i.into()),
		toml::Value::Float(f) => Value::Number(f.into()),
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(array) => Value::Sequence(array.into_iter().map(toml_to_yaml).collect()),
		toml::Value::Table(table) => {
			Value::Mapping(
				table
					.into_iter()
					.map(|(key, value)| (Value::String(key), toml_to_yaml(value)))
					.collect(),
			)
		}
	}
}

fn yaml_to_toml(value: &Value) -> SpliceResult<toml::Value> {
	let converted = match value {
		Value::Null => toml::Value::Table(toml::Table::new()),
		Value::Bool(b) => toml::Value::Boolean(*b),
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				toml::Value::Integer(i)
			} else if let Some(f) = n.as_f64() {
				toml::Value::Float(f)
			} else {
				return Err(SpliceError::encode(Encoding::Toml, format!("number {n} out of range")));
			}
		}
		Value::String(s) => toml::Value::String(s.clone()),
		Value::Sequence(seq) => toml::Value::Array(seq.iter().map(yaml_to_toml).collect::<SpliceResult<_>>()?),
		Value::Mapping(map) => {
			let mut table = toml::Table::new();
			for (key, value) in map {
				let key = scalar_text(key)
					.ok_or_else(|| SpliceError::encode(Encoding::Toml, "table keys must be scalars"))?;
				table.insert(key, yaml_to_toml(value)?);
			}
			toml::Value::Table(table)
		}
		Value::Tagged(tagged) => yaml_to_toml(&tagged.value)?,
	};

	Ok(converted)
}

/// Write root keys first, then one `[section]` per nested mapping.
fn encode_ini(tree: &Value) -> SpliceResult<String> {
	let mut root = String::new();
	let mut sections = String::new();

	let Some(map) = tree.as_mapping() else {
		if tree.is_null() {
			return Ok(String::new());
		}
		return Err(SpliceError::encode(Encoding::Ini, "top level value must be a mapping"));
	};

	for (key, value) in map {
		let key = scalar_text(key).ok_or_else(|| SpliceError::encode(Encoding::Ini, "keys must be scalars"))?;

		match value {
			Value::Mapping(section) => {
				writeln!(sections, "\n[{key}]").map_err(|e| SpliceError::encode(Encoding::Ini, e))?;
				for (entry, value) in section {
					let entry = scalar_text(entry)
						.ok_or_else(|| SpliceError::encode(Encoding::Ini, "keys must be scalars"))?;
					let value = scalar_text(value).ok_or_else(|| {
						SpliceError::encode(Encoding::Ini, format!("`{key}.{entry}` is nested too deeply"))
					})?;
					writeln!(sections, "{entry} = {value}").map_err(|e| SpliceError::encode(Encoding::Ini, e))?;
				}
			}
			other => {
				let value = scalar_text(other)
					.ok_or_else(|| SpliceError::encode(Encoding::Ini, format!("`{key}` cannot be a sequence")))?;
				writeln!(root, "{key} = {value}").map_err(|e| SpliceError::encode(Encoding::Ini, e))?;
			}
		}
	}

	if root.is_empty() {
		Ok(sections.trim_start_matches('\n').to_string())
	} else {
		Ok(root + &sections)
	}
}

/// Parse a regex sub-path: `[pattern, captureGroup]`. Patterns are compiled
/// in multi-line mode so `^` and `$` anchor at line boundaries.
fn regex_address(sub_path: &[String]) -> SpliceResult<(Regex, usize)> {
	let [pattern, group] = sub_path else {
		return Err(SpliceError::InvalidPath {
			path: sub_path.join("."),
			reason: "regex segments take exactly a pattern and a capture group index".to_string(),
		});
	};

	let group = group.parse::<usize>().map_err(|_| {
		SpliceError::InvalidPath {
			path: sub_path.join("."),
			reason: format!("`{group}` is not a capture group index"),
		}
	})?;
	let regex = RegexBuilder::new(pattern)
		.multi_line(true)
		.build()
		.map_err(|e| SpliceError::decode(Encoding::Regex, e))?;

	Ok((regex, group))
}

fn capture_span(regex: &Regex, group: usize, text: &str) -> SpliceResult<std::ops::Range<usize>> {
	let captures = regex.captures(text).ok_or_else(|| {
		SpliceError::RegexNoMatch {
			pattern: regex.as_str().to_string(),
		}
	})?;

	captures.get(group).map(|m| m.range()).ok_or_else(|| {
		SpliceError::CaptureOutOfRange {
			pattern: regex.as_str().to_string(),
			index: group,
		}
	})
}
