use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Copy values between Kubernetes resources, including into embedded payloads.",
	long_about = "splice applies kustomize-style replacements to a stream of YAML documents.\n\nField \
	              paths may continue inside the payload of a string field using encoding \
	              markers: `!!yaml`, `!!json`, `!!toml`, `!!ini`, `!!base64` and \
	              `!!regex`.\n\nQuick start:\n  splice apply --config replacements.yaml \
	              resources.yaml\n  splice get --kind ConfigMap --field-path \
	              'data.values\\.yaml.!!yaml.image.tag' resources.yaml"
)]
pub struct SpliceCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Apply a replacement configuration to a stream of documents.
	///
	/// Reads multi-document YAML from the given files, or from stdin when no
	/// file is given, applies every replacement of the configuration in
	/// order and writes the resulting stream. Nothing is written when any
	/// replacement fails.
	Apply {
		/// Replacement configuration. Relative paths inside it are resolved
		/// against its directory.
		#[arg(long, short)]
		config: PathBuf,

		/// Input files holding the documents to transform.
		inputs: Vec<PathBuf>,

		/// Write the result to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Print a diff of the changes instead of the resulting documents.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Print the value at an extended field path of one document.
	///
	/// The selector must match exactly one document. Scalars are printed as
	/// plain text, anything else as YAML.
	Get {
		/// Field path, optionally continuing inside encoded payloads.
		#[arg(long, short)]
		field_path: String,

		/// Kind of the document to read from.
		#[arg(long)]
		kind: Option<String>,

		/// Name of the document to read from. Glob patterns are allowed.
		#[arg(long)]
		name: Option<String>,

		/// Namespace of the document to read from.
		#[arg(long)]
		namespace: Option<String>,

		/// Input files. Reads stdin when none are given.
		inputs: Vec<PathBuf>,
	},
}
