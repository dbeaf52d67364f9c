use std::io::Read as _;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use splice_cli::Commands;
use splice_cli::SpliceCli;
use splice_core::Document;
use splice_core::ReplacementConfig;
use splice_core::Selector;
use splice_core::SourceSelector;
use splice_core::load_documents;
use splice_core::parse_documents;
use splice_core::resolve_source;
use splice_core::scalar_text;
use splice_core::write_documents;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SpliceCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Apply {
			config,
			inputs,
			output,
			diff,
		}) => run_apply(&config, &inputs, output.as_deref(), diff),
		Some(Commands::Get {
			field_path,
			kind,
			name,
			namespace,
			inputs,
		}) => {
			let selector = Selector {
				kind: kind.unwrap_or_default(),
				name: name.unwrap_or_default(),
				namespace: namespace.unwrap_or_default(),
				..Selector::default()
			};
			run_get(&field_path, selector, &inputs)
		}
		None => {
			eprintln!("No subcommand specified. Run `splice --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<splice_core::SpliceError>() {
			Ok(splice_err) => {
				let report: miette::Report = (*splice_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `SPLICE_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_env("SPLICE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

/// Documents from every input file in order, or from stdin when there are
/// none.
fn read_documents(inputs: &[PathBuf]) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
	if inputs.is_empty() {
		let mut content = String::new();
		std::io::stdin().read_to_string(&mut content)?;
		return Ok(parse_documents(&content, "<stdin>")?);
	}

	let mut documents = Vec::new();
	for input in inputs {
		let loaded = load_documents(input)?;
		tracing::debug!(input = %input.display(), count = loaded.len(), "loaded documents");
		documents.extend(loaded);
	}

	Ok(documents)
}

fn run_apply(
	config_path: &Path,
	inputs: &[PathBuf],
	output: Option<&Path>,
	diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let config = ReplacementConfig::load(config_path)?;
	let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
	let engine = config.resolve(base_dir)?;

	let mut documents = read_documents(inputs)?;
	let before = write_documents(&documents)?;
	engine.apply(&mut documents)?;
	let after = write_documents(&documents)?;

	tracing::debug!(
		replacements = engine.replacements().len(),
		documents = documents.len(),
		"applied configuration"
	);

	if let Some(output) = output {
		std::fs::write(output, &after)?;
	}

	if diff {
		if before == after {
			println!("No changes.");
		} else {
			print_diff(&before, &after);
		}
	} else if output.is_none() {
		print!("{after}");
	}

	Ok(())
}

fn run_get(field_path: &str, selector: Selector, inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
	let documents = read_documents(inputs)?;
	let source = SourceSelector {
		selector,
		field_path: field_path.to_string(),
		options: None,
	};
	let value = resolve_source(&documents, &source)?;

	match scalar_text(&value) {
		Some(text) => println!("{text}"),
		None => print!("{}", Document::new(value).to_yaml()?),
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	println!("{}", colored!("--- input", bold));
	println!("{}", colored!("+++ output", bold));

	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("{}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("{}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!(" {change}");
			}
		}
	}
}
