use miette::Diagnostic;
use thiserror::Error;

/// Broad classes of failure. Every [`SpliceError`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// The replacement rule itself is malformed.
	Spec,
	/// The source selector or source field could not be resolved.
	Selection,
	/// An embedded payload could not be decoded, navigated or re-encoded.
	Encoding,
	/// A document carries contradictory rename-tracking annotations.
	Consistency,
	/// Reading or parsing input files failed.
	Io,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SpliceError {
	#[error(transparent)]
	#[diagnostic(code(splice::io_error))]
	Io(#[from] std::io::Error),

	#[error("replacements must specify a source and at least one target")]
	#[diagnostic(code(splice::missing_source_or_targets))]
	MissingSourceOrTargets,

	#[error("target must specify resources to select")]
	#[diagnostic(
		code(splice::missing_target_select),
		help("add a `select` entry, e.g. `select: {{ kind: Deployment }}`")
	)]
	MissingTargetSelect,

	#[error("delimiter option cannot be used with encoding extensions in `{path}`")]
	#[diagnostic(code(splice::delimiter_with_extensions))]
	DelimiterWithExtensions { path: String },

	#[error("delimiter option can only be used with scalar nodes (field `{path}`)")]
	#[diagnostic(code(splice::delimiter_on_non_scalar))]
	DelimiterOnNonScalar { path: String },

	#[error("cannot support create option in a multi-value target: `{path}`")]
	#[diagnostic(
		code(splice::create_with_wildcard),
		help("remove `*` from the field path or drop `options.create`")
	)]
	CreateWithWildcard { path: String },

	#[error("unknown encoding: `{0}`")]
	#[diagnostic(
		code(splice::unknown_encoding),
		help("available encodings: yaml, json, toml, ini, base64, regex")
	)]
	UnknownEncoding(String),

	#[error("path extensions should start at a scalar node (field `{path}`)")]
	#[diagnostic(code(splice::extensions_on_non_scalar))]
	ExtensionsOnNonScalar { path: String },

	#[error("invalid field path `{path}`: {reason}")]
	#[diagnostic(code(splice::invalid_path))]
	InvalidPath { path: String, reason: String },

	#[error("options.index {index} is out of bounds for value `{value}`")]
	#[diagnostic(code(splice::index_out_of_bounds))]
	IndexOutOfBounds { index: i64, value: String },

	#[error("delimiter or encoding option can only be used with scalar nodes")]
	#[diagnostic(code(splice::refine_non_scalar))]
	RefineNonScalar,

	#[error("`{0}` cannot be used as a source value encoding")]
	#[diagnostic(
		code(splice::unsupported_value_encoding),
		help("use a `!!{0}` segment in the field path instead")
	)]
	UnsupportedValueEncoding(String),

	#[error("invalid selector expression `{expression}`: {reason}")]
	#[diagnostic(code(splice::invalid_selector))]
	InvalidSelector { expression: String, reason: String },

	#[error("cannot specify both path and inline replacement")]
	#[diagnostic(code(splice::path_and_inline_replacement))]
	PathAndInlineReplacement,

	#[error("unsupported replacement type in `{path}`: expected a mapping or a sequence")]
	#[diagnostic(code(splice::unsupported_replacement_file))]
	UnsupportedReplacementFile { path: String },

	#[error("nothing selected by {0}")]
	#[diagnostic(code(splice::no_source_match))]
	NoSourceMatch(String),

	#[error("multiple matches for selector {selector} ({count} documents)")]
	#[diagnostic(
		code(splice::ambiguous_source),
		help("narrow the source selector so that exactly one document matches")
	)]
	AmbiguousSource { selector: String, count: usize },

	#[error("fieldPath `{field_path}` is missing for replacement source {selector}")]
	#[diagnostic(code(splice::missing_source_field))]
	MissingSourceField { selector: String, field_path: String },

	#[error("failed to decode {encoding} payload: {reason}")]
	#[diagnostic(code(splice::decode))]
	Decode { encoding: String, reason: String },

	#[error("failed to encode {encoding} payload: {reason}")]
	#[diagnostic(code(splice::encode))]
	Encode { encoding: String, reason: String },

	#[error("path `{path}` not found in {encoding} payload")]
	#[diagnostic(code(splice::sub_path_not_found))]
	SubPathNotFound { encoding: String, path: String },

	#[error("value at `{path}` in {encoding} payload is not a scalar")]
	#[diagnostic(code(splice::non_scalar_payload))]
	NonScalarPayload { encoding: String, path: String },

	#[error("no match for regex `{pattern}`")]
	#[diagnostic(code(splice::regex_no_match))]
	RegexNoMatch { pattern: String },

	#[error("capture group {index} out of range for regex `{pattern}`")]
	#[diagnostic(code(splice::capture_out_of_range))]
	CaptureOutOfRange { pattern: String, index: usize },

	#[error(
		"number of previous names ({names}), number of previous namespaces ({namespaces}) and \
		 number of previous kinds ({kinds}) not equal for `{resource}`"
	)]
	#[diagnostic(code(splice::previous_ids_mismatch))]
	PreviousIdsMismatch {
		resource: String,
		names: usize,
		namespaces: usize,
		kinds: usize,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(splice::config_parse),
		help("the config must be a YAML mapping with `replacements` and an optional `source`")
	)]
	ConfigParse(String),

	#[error("failed to load documents from `{path}`: {reason}")]
	#[diagnostic(code(splice::document_parse))]
	DocumentParse { path: String, reason: String },

	#[error("failed to serialize documents: {0}")]
	#[diagnostic(code(splice::document_write))]
	DocumentWrite(String),
}

impl SpliceError {
	/// The taxonomy class of this error.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::MissingSourceOrTargets
			| Self::MissingTargetSelect
			| Self::DelimiterWithExtensions { .. }
			| Self::DelimiterOnNonScalar { .. }
			| Self::CreateWithWildcard { .. }
			| Self::UnknownEncoding(_)
			| Self::ExtensionsOnNonScalar { .. }
			| Self::InvalidPath { .. }
			| Self::IndexOutOfBounds { .. }
			| Self::RefineNonScalar
			| Self::UnsupportedValueEncoding(_)
			| Self::InvalidSelector { .. }
			| Self::PathAndInlineReplacement
			| Self::UnsupportedReplacementFile { .. } => ErrorCategory::Spec,
			Self::NoSourceMatch(_) | Self::AmbiguousSource { .. } | Self::MissingSourceField { .. } => {
				ErrorCategory::Selection
			}
			Self::Decode { .. }
			| Self::Encode { .. }
			| Self::SubPathNotFound { .. }
			| Self::NonScalarPayload { .. }
			| Self::RegexNoMatch { .. }
			| Self::CaptureOutOfRange { .. } => ErrorCategory::Encoding,
			Self::PreviousIdsMismatch { .. } => ErrorCategory::Consistency,
			Self::Io(_) | Self::ConfigParse(_) | Self::DocumentParse { .. } | Self::DocumentWrite(_) => {
				ErrorCategory::Io
			}
		}
	}

	pub(crate) fn decode(encoding: impl ToString, reason: impl ToString) -> Self {
		Self::Decode {
			encoding: encoding.to_string(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn encode(encoding: impl ToString, reason: impl ToString) -> Self {
		Self::Encode {
			encoding: encoding.to_string(),
			reason: reason.to_string(),
		}
	}
}

pub type SpliceResult<T> = Result<T, SpliceError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
