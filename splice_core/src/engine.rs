use crate::Document;
use crate::Replacement;
use crate::SpliceResult;
use crate::replacement::apply_to_targets;
use crate::replacement::resolve_source;

/// An ordered list of replacements, optionally resolved against an external
/// set of source documents.
#[derive(Debug, Clone, Default)]
pub struct ReplacementEngine {
	replacements: Vec<Replacement>,
	sources: Option<Vec<Document>>,
}

impl ReplacementEngine {
	pub fn new(replacements: Vec<Replacement>) -> Self {
		Self {
			replacements,
			sources: None,
		}
	}

	/// Resolve sources from `sources` instead of the documents being
	/// transformed.
	#[must_use]
	pub fn with_sources(mut self, sources: Vec<Document>) -> Self {
		self.sources = Some(sources);
		self
	}

	pub fn replacements(&self) -> &[Replacement] {
		&self.replacements
	}

	pub fn sources(&self) -> Option<&[Document]> {
		self.sources.as_deref()
	}

	/// Apply every replacement in order. Later replacements see the changes
	/// made by earlier ones.
	///
	/// The work happens on a copy of `documents`, which is only written back
	/// once every replacement succeeded. On error `documents` is unchanged.
	pub fn apply(&self, documents: &mut [Document]) -> SpliceResult<()> {
		let mut working = documents.to_vec();

		for (index, replacement) in self.replacements.iter().enumerate() {
			let (source, targets) = replacement.parts()?;
			let value = match &self.sources {
				Some(sources) => resolve_source(sources, source)?,
				None => resolve_source(&working, source)?,
			};

			apply_to_targets(&mut working, &value, targets)?;
			tracing::debug!(index, source = %source.selector, "applied replacement");
		}

		for (document, updated) in documents.iter_mut().zip(working) {
			*document = updated;
		}

		Ok(())
	}
}

/// Apply `replacements` to `documents`, resolving sources from the documents
/// themselves.
pub fn apply_replacements(documents: &mut [Document], replacements: &[Replacement]) -> SpliceResult<()> {
	ReplacementEngine::new(replacements.to_vec()).apply(documents)
}
