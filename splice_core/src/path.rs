use std::fmt;
use std::str::FromStr;

use serde_yaml_ng::Value;

use crate::SpliceError;
use crate::SpliceResult;
use crate::document::scalar_text;
use crate::extender::Extender;

/// Prefix that turns a path token into an encoding marker, e.g. `!!yaml`.
pub const MARKER_PREFIX: &str = "!!";

/// Payload encodings that can be addressed inside a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
	Yaml,
	Json,
	Toml,
	Ini,
	Base64,
	Regex,
}

impl Encoding {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Yaml => "yaml",
			Self::Json => "json",
			Self::Toml => "toml",
			Self::Ini => "ini",
			Self::Base64 => "base64",
			Self::Regex => "regex",
		}
	}

	/// Structured encodings decode into a navigable tree.
	pub fn is_structured(self) -> bool {
		matches!(self, Self::Yaml | Self::Json | Self::Toml | Self::Ini)
	}
}

impl FromStr for Encoding {
	type Err = SpliceError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"yaml" => Ok(Self::Yaml),
			"json" => Ok(Self::Json),
			"toml" => Ok(Self::Toml),
			"ini" => Ok(Self::Ini),
			"base64" => Ok(Self::Base64),
			"regex" => Ok(Self::Regex),
			other => Err(SpliceError::UnknownEncoding(other.to_string())),
		}
	}
}

impl fmt::Display for Encoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Split a dotted field path into tokens.
///
/// Dots inside `[...]` do not split, so `[name=a.b].value` is two tokens.
/// `\.` never splits. Outside a regex segment it produces a literal dot;
/// after a `!!regex` marker it is kept as `\.` so the pattern still matches
/// a literal dot. Any other backslash is kept as-is so that regex patterns
/// such as `\s+(\S+)` survive untouched.
pub fn split_path(path: &str) -> Vec<String> {
	let regex_marker = format!("{MARKER_PREFIX}{}", Encoding::Regex);
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut depth = 0usize;
	let mut in_regex = false;
	let mut chars = path.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'\\' if chars.peek() == Some(&'.') => {
				if in_regex {
					current.push('\\');
				}
				current.push('.');
				chars.next();
			}
			'[' => {
				depth += 1;
				current.push(ch);
			}
			']' => {
				depth = depth.saturating_sub(1);
				current.push(ch);
			}
			'.' if depth == 0 => {
				if current.starts_with(MARKER_PREFIX) {
					in_regex = current == regex_marker;
				}
				tokens.push(std::mem::take(&mut current));
			}
			_ => current.push(ch),
		}
	}
	tokens.push(current);

	tokens
}

/// One encoding step of an [`ExtendedPath`]: decode the current payload with
/// `encoding`, then address `sub_path` inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSegment {
	pub encoding: Encoding,
	pub sub_path: Vec<String>,
}

impl ExtendedSegment {
	/// Decode `payload` into an extender for this segment's encoding.
	pub fn extender(&self, payload: &str) -> SpliceResult<Extender> {
		Extender::decode(self.encoding, payload)
	}
}

/// A field path in a document, optionally continued inside the encoded
/// payload held by that field.
///
/// `data.config\.yaml.!!yaml.server.port` addresses the `server.port` key of
/// the YAML text stored in `data["config.yaml"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPath {
	pub resource_path: Vec<String>,
	pub chain: Vec<ExtendedSegment>,
}

impl ExtendedPath {
	/// Build from already split tokens.
	pub fn parse<S: AsRef<str>>(tokens: &[S]) -> SpliceResult<Self> {
		let mut resource_path = Vec::new();
		let mut chain: Vec<ExtendedSegment> = Vec::new();

		for token in tokens {
			let token = token.as_ref();

			if let Some(marker) = token.strip_prefix(MARKER_PREFIX) {
				chain.push(ExtendedSegment {
					encoding: marker.parse()?,
					sub_path: Vec::new(),
				});
				continue;
			}

			match chain.last_mut() {
				Some(segment) => segment.sub_path.push(token.to_string()),
				None => resource_path.push(token.to_string()),
			}
		}

		if chain.is_empty() && resource_path.iter().all(String::is_empty) {
			return Err(SpliceError::InvalidPath {
				path: String::new(),
				reason: "field path is empty".to_string(),
			});
		}

		Ok(Self {
			resource_path,
			chain,
		})
	}

	pub fn has_extensions(&self) -> bool {
		!self.chain.is_empty()
	}

	/// Read the value addressed by the encoding chain inside `field`, the
	/// node found at `resource_path`. Without a chain this is `field` itself.
	pub fn get(&self, field: &Value) -> SpliceResult<Value> {
		let Some((last, outer)) = self.chain.split_last() else {
			return Ok(field.clone());
		};

		let mut payload = self.field_payload(field)?;
		for segment in outer {
			let extender = segment.extender(&payload)?;
			payload = inner_payload(&extender, segment)?;
			tracing::trace!(encoding = %segment.encoding, "decoded chain segment");
		}

		last.extender(&payload)?.get(&last.sub_path)
	}

	/// Write `value` through the encoding chain into `field`, re-encoding every
	/// level on the way out. Without a chain `field` is replaced.
	pub fn set(&self, field: &mut Value, value: &Value) -> SpliceResult<()> {
		if self.chain.is_empty() {
			*field = value.clone();
			return Ok(());
		}

		let mut payload = self.field_payload(field)?;
		let mut stack: Vec<(Extender, &ExtendedSegment)> = Vec::with_capacity(self.chain.len());

		for (position, segment) in self.chain.iter().enumerate() {
			let extender = segment.extender(&payload)?;
			if position + 1 < self.chain.len() {
				payload = inner_payload(&extender, segment)?;
			}
			stack.push((extender, segment));
		}

		let Some((mut innermost, segment)) = stack.pop() else {
			return Ok(());
		};
		innermost.set(&segment.sub_path, value)?;
		let mut payload = innermost.payload()?;

		while let Some((mut outer, segment)) = stack.pop() {
			outer.set(&segment.sub_path, &Value::String(payload))?;
			payload = outer.payload()?;
			tracing::trace!(encoding = %segment.encoding, "re-encoded chain segment");
		}

		*field = Value::String(payload);
		Ok(())
	}

	fn field_payload(&self, field: &Value) -> SpliceResult<String> {
		scalar_text(field).ok_or_else(|| {
			SpliceError::ExtensionsOnNonScalar {
				path: self.to_string(),
			}
		})
	}
}

fn inner_payload(extender: &Extender, segment: &ExtendedSegment) -> SpliceResult<String> {
	let value = extender.get(&segment.sub_path)?;
	scalar_text(&value).ok_or_else(|| {
		SpliceError::NonScalarPayload {
			encoding: segment.encoding.to_string(),
			path: segment.sub_path.join("."),
		}
	})
}

impl FromStr for ExtendedPath {
	type Err = SpliceError;

	fn from_str(path: &str) -> Result<Self, Self::Err> {
		Self::parse(&split_path(path)).map_err(|error| {
			match error {
				SpliceError::InvalidPath { reason, .. } => {
					SpliceError::InvalidPath {
						path: path.to_string(),
						reason,
					}
				}
				other => other,
			}
		})
	}
}

impl fmt::Display for ExtendedPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut tokens: Vec<String> = self
			.resource_path
			.iter()
			.map(|token| token.replace('.', "\\."))
			.collect();

		for segment in &self.chain {
			tokens.push(format!("{MARKER_PREFIX}{}", segment.encoding));
			if segment.encoding == Encoding::Regex {
				tokens.extend(segment.sub_path.iter().cloned());
			} else {
				tokens.extend(segment.sub_path.iter().map(|token| token.replace('.', "\\.")));
			}
		}

		f.write_str(&tokens.join("."))
	}
}
