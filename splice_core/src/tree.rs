//! Addressing nodes inside a `serde_yaml_ng::Value` tree.
//!
//! Paths are lists of tokens. A token is one of:
//!
//! - `*`: every value of a mapping or every element of a sequence.
//! - `[field=value]`: sequence elements whose `field` matches `value`
//!   (glob patterns allowed). `[=value]` matches scalar elements directly.
//! - anything else: a mapping key, or an index when the node is a sequence.
//!
//! Lookups produce [`Location`]s, concrete step lists that can be
//! re-walked mutably once the immutable search is over.

use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

use crate::SpliceError;
use crate::SpliceResult;
use crate::document::scalar_text;
use crate::selector::matches_pattern;

/// One concrete step from a node to one of its children.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
	Key(Value),
	Index(usize),
}

pub(crate) type Location = Vec<Step>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
	Wildcard,
	Match { field: &'a str, value: &'a str },
	Field(&'a str),
}

impl<'a> Segment<'a> {
	pub(crate) fn parse(token: &'a str) -> SpliceResult<Self> {
		if token == "*" {
			return Ok(Self::Wildcard);
		}

		if let Some(inner) = token.strip_prefix('[') {
			let inner = inner
				.strip_suffix(']')
				.ok_or_else(|| invalid(token, "unterminated `[`"))?;
			let (field, value) = inner
				.split_once('=')
				.ok_or_else(|| invalid(token, "expected `[field=value]`"))?;
			return Ok(Self::Match { field, value });
		}

		Ok(Self::Field(token))
	}
}

fn invalid(path: &str, reason: &str) -> SpliceError {
	SpliceError::InvalidPath {
		path: path.to_string(),
		reason: reason.to_string(),
	}
}

fn element_matches(element: &Value, field: &str, pattern: &str) -> bool {
	let candidate = if field.is_empty() {
		Some(element)
	} else {
		element.get(field)
	};

	candidate
		.and_then(scalar_text)
		.is_some_and(|text| matches_pattern(pattern, &text))
}

fn children<'v>(node: &'v Value, segment: Segment<'_>) -> Vec<(Step, &'v Value)> {
	match (node, segment) {
		(Value::Mapping(map), Segment::Wildcard) => {
			map.iter()
				.map(|(key, value)| (Step::Key(key.clone()), value))
				.collect()
		}
		(Value::Sequence(seq), Segment::Wildcard) => {
			seq.iter()
				.enumerate()
				.map(|(index, value)| (Step::Index(index), value))
				.collect()
		}
		(Value::Sequence(seq), Segment::Match { field, value }) => {
			seq.iter()
				.enumerate()
				.filter(|(_, element)| element_matches(element, field, value))
				.map(|(index, element)| (Step::Index(index), element))
				.collect()
		}
		(Value::Sequence(seq), Segment::Field(token)) => {
			token
				.parse::<usize>()
				.ok()
				.and_then(|index| seq.get(index).map(|element| (Step::Index(index), element)))
				.into_iter()
				.collect()
		}
		(Value::Mapping(map), Segment::Field(token)) => {
			map.get(token)
				.map(|value| (Step::Key(Value::String(token.to_string())), value))
				.into_iter()
				.collect()
		}
		_ => Vec::new(),
	}
}

/// Every location in `root` addressed by `path`. An empty path addresses
/// the root itself.
pub(crate) fn find(root: &Value, path: &[String]) -> SpliceResult<Vec<Location>> {
	let mut frontier: Vec<(Location, &Value)> = vec![(Vec::new(), root)];

	for token in path {
		let segment = Segment::parse(token)?;
		let mut next = Vec::new();

		for (location, node) in frontier {
			for (step, child) in children(node, segment) {
				let mut child_location = location.clone();
				child_location.push(step);
				next.push((child_location, child));
			}
		}

		frontier = next;
	}

	Ok(frontier.into_iter().map(|(location, _)| location).collect())
}

/// The first node addressed by `path`, if any.
pub(crate) fn find_first<'v>(root: &'v Value, path: &[String]) -> SpliceResult<Option<&'v Value>> {
	let locations = find(root, path)?;
	Ok(locations.first().and_then(|location| node(root, location)))
}

pub(crate) fn node<'v>(root: &'v Value, location: &[Step]) -> Option<&'v Value> {
	location.iter().try_fold(root, |node, step| {
		match (node, step) {
			(Value::Mapping(map), Step::Key(key)) => map.get(key),
			(Value::Sequence(seq), Step::Index(index)) => seq.get(*index),
			_ => None,
		}
	})
}

pub(crate) fn node_mut<'v>(root: &'v mut Value, location: &[Step]) -> Option<&'v mut Value> {
	location.iter().try_fold(root, |node, step| {
		match (node, step) {
			(Value::Mapping(map), Step::Key(key)) => map.get_mut(key),
			(Value::Sequence(seq), Step::Index(index)) => seq.get_mut(*index),
			_ => None,
		}
	})
}

/// Empty node of the same kind as `like`.
fn placeholder(like: &Value) -> Value {
	match like {
		Value::Mapping(_) => Value::Mapping(Mapping::new()),
		Value::Sequence(_) => Value::Sequence(Vec::new()),
		_ => Value::String(String::new()),
	}
}

/// Walk `path`, creating missing mapping keys and sequence elements on the
/// way. The leaf, when created, is an empty node of the same kind as
/// `leaf`. Wildcards cannot be created.
pub(crate) fn lookup_create(root: &mut Value, path: &[String], leaf: &Value) -> SpliceResult<Location> {
	let joined = path.join(".");
	let mut location = Vec::with_capacity(path.len());
	let mut node = root;

	for (position, token) in path.iter().enumerate() {
		let is_leaf = position + 1 == path.len();
		let fresh = || {
			if is_leaf {
				placeholder(leaf)
			} else {
				Value::Null
			}
		};

		let step = match Segment::parse(token)? {
			Segment::Wildcard => {
				return Err(SpliceError::CreateWithWildcard { path: joined });
			}
			Segment::Field(name) => {
				if node.is_null() {
					*node = Value::Mapping(Mapping::new());
				}

				match &mut *node {
					Value::Mapping(map) => {
						let key = Value::String(name.to_string());
						if !map.contains_key(&key) {
							map.insert(key.clone(), fresh());
						}
						Step::Key(key)
					}
					Value::Sequence(seq) => {
						let index = name
							.parse::<usize>()
							.ok()
							.filter(|index| *index < seq.len())
							.ok_or_else(|| invalid(&joined, &format!("no sequence element `{name}`")))?;
						Step::Index(index)
					}
					_ => {
						return Err(invalid(
							&joined,
							&format!("cannot create `{name}` below a scalar"),
						));
					}
				}
			}
			Segment::Match { field, value } => {
				if node.is_null() {
					*node = Value::Sequence(Vec::new());
				}

				let Value::Sequence(seq) = &mut *node else {
					return Err(invalid(&joined, &format!("`{token}` requires a sequence")));
				};

				let index = match seq.iter().position(|element| element_matches(element, field, value)) {
					Some(index) => index,
					None => {
						let element = if field.is_empty() {
							Value::String(value.to_string())
						} else {
							let mut element = Mapping::new();
							element.insert(
								Value::String(field.to_string()),
								Value::String(value.to_string()),
							);
							Value::Mapping(element)
						};
						seq.push(element);
						seq.len() - 1
					}
				};
				Step::Index(index)
			}
		};

		node = match step_into(node, &step) {
			Some(child) => child,
			None => return Err(invalid(&joined, "created node disappeared")),
		};
		location.push(step);
	}

	Ok(location)
}

fn step_into<'v>(node: &'v mut Value, step: &Step) -> Option<&'v mut Value> {
	match (node, step) {
		(Value::Mapping(map), Step::Key(key)) => map.get_mut(key),
		(Value::Sequence(seq), Step::Index(index)) => seq.get_mut(*index),
		_ => None,
	}
}
