use crate::{
	schema::Structured,
	types::{StructuredRef, TypeExpr},
	value::{Mapping, Value},
};
use joinery::JoinableIterator;
use serde::de;
use std::{
	borrow::Cow,
	fmt::{self, Display, Formatter},
};
use taml::{
	diagnostics::Reporter as diagReporter,
	parsing::{parse, IntoToken, Taml, TamlValue},
	Token,
};
use tap::{Conv, Pipe};

mod builder;
mod classify;
mod deserialize_value;
mod from_value;
mod taml_tree;

pub use builder::{build_value, Fields};
pub use classify::{classify, Classification, FieldCategory};
pub use deserialize_value::deserialize_value;
pub use from_value::FromValue;
pub use taml_tree::PositionImpl;

/// Options for one top-level deserialization call.
///
/// Nested records are built with the same options, except for a decremented [`recursion_budget`](`Context::recursion_budget`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
	/// Tolerate keys without matching field.
	pub allow_unknown: bool,
	/// Hand unknown keys to [`Fields::unknown`] instead of discarding them. Requires [`allow_unknown`](`Context::allow_unknown`).
	pub add_unknown_as_is: bool,
	/// Don't fail when a field without default is absent.
	///
	/// The field is then left out of [`Fields`], where [`Fields::take`] falls back to [`FromValue::missing`].
	pub allow_missing_required: bool,
	/// Fill absent fields whose declared type admits null with [`Value::Null`].
	pub allow_missing_nullable: bool,
	/// Check each value's shape against its declared type.
	pub validate_type: bool,
	/// Clone the whole input up front rather than as fields are consumed.
	///
	/// The input is never modified either way.
	pub do_deep_copy: bool,
	/// Accept [`TypeExpr::Candidates`] declarations.
	pub process_candidates: bool,
	/// How many levels of records may still be built. [`None`] means unlimited.
	///
	/// Once this reaches `Some(0)`, values are returned as they are.
	pub recursion_budget: Option<usize>,
}
impl Default for Context {
	fn default() -> Self {
		Self {
			allow_unknown: false,
			add_unknown_as_is: false,
			allow_missing_required: false,
			allow_missing_nullable: true,
			validate_type: true,
			do_deep_copy: false,
			process_candidates: false,
			recursion_budget: None,
		}
	}
}

macro_rules! context_setters {
	($($name:ident: $Type:ty),*$(,)?) => {$(
		#[doc = concat!("Sets [`", stringify!($name), "`](`Context::", stringify!($name), "`).")]
		#[must_use]
		pub fn $name(self, $name: $Type) -> Self {
			Self { $name, ..self }
		}
	)*};
}

impl Context {
	context_setters! {
		allow_unknown: bool,
		add_unknown_as_is: bool,
		allow_missing_required: bool,
		allow_missing_nullable: bool,
		validate_type: bool,
		do_deep_copy: bool,
		process_candidates: bool,
		recursion_budget: Option<usize>,
	}

	/// Removes the recursion limit.
	#[must_use]
	pub fn unlimited(self) -> Self {
		self.recursion_budget(None)
	}

	#[must_use]
	pub fn is_exhausted(&self) -> bool {
		self.recursion_budget == Some(0)
	}

	/// The context for the fields of a record built with `self`.
	#[must_use]
	pub fn descend(self) -> Self {
		Self {
			recursion_budget: self.recursion_budget.map(|budget| budget.saturating_sub(1)),
			..self
		}
	}
}

/// A deserialization error, along with where in the data tree it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
	kind: ErrorKind,
	path: Vec<PathSegment>,
}
impl Error {
	#[must_use]
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// The location of the offending value, outermost first. Empty for the root.
	#[must_use]
	pub fn path(&self) -> &[PathSegment] {
		&self.path
	}

	/// [`path`](`Error::path`) formatted like `outer.items[2].x`.
	#[must_use]
	pub fn path_string(&self) -> String {
		path_string(&self.path)
	}

	fn is_reported(&self) -> bool {
		matches!(self.kind, ErrorKind::Parse)
	}
}
impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.path.is_empty() {
			Display::fmt(&self.kind, f)
		} else {
			write!(f, "{} (at `{}`)", self.kind, self.path_string())
		}
	}
}
impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Self {
		Self { kind, path: vec![] }
	}
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
	/// A [`Schema`](`crate::Schema`) uses a declaration the engine doesn't support.
	Configuration { message: String },
	/// The input contains a key that `target` doesn't declare.
	UnknownField {
		field: String,
		target: String,
		accepted: Vec<String>,
	},
	/// A required field is absent.
	MissingField { field: String, target: String },
	/// A value's shape doesn't match its declared type.
	TypeMismatch { expected: String, found: String },
	/// `target` could not be instantiated from its reconciled fields.
	Construction { target: String, message: String },
	/// The TAML input could not be parsed.
	///
	/// Details were sent to the [reporter](`taml::diagnostics::Reporter`).
	Parse,
	/// A foreign [`Deserializer`](`serde::Deserializer`) failed.
	Input { message: String },
	/// `target` doesn't implement [`Structured::to_mapping`].
	Unsupported { target: String },
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ErrorKind::Configuration { message } => {
				write!(f, "Unsupported declaration: {}.", message)
			}
			ErrorKind::UnknownField {
				field,
				target,
				accepted,
			} => write!(
				f,
				"Unknown field `{}` in `{}`, expected one of: {}.",
				field.replace('`', "\\`"),
				target,
				if accepted.is_empty() {
					Cow::Borrowed("(None)")
				} else {
					Cow::Owned(format!("`{}`", accepted.iter().join_with("`, `")))
				}
			),
			ErrorKind::MissingField { field, target } => write!(
				f,
				"Missing field `{}` in `{}`.",
				field.replace('`', "\\`"),
				target
			),
			ErrorKind::TypeMismatch { expected, found } => {
				write!(f, "Invalid type: Expected {} but found {}.", expected, found)
			}
			ErrorKind::Construction { target, message } => {
				write!(f, "Failed to construct `{}`: {}", target, message)
			}
			ErrorKind::Parse => write!(f, "Reported"),
			ErrorKind::Input { message } => write!(f, "Invalid input: {}", message),
			ErrorKind::Unsupported { target } => write!(
				f,
				"`{}` can't be converted back into a data tree.",
				target
			),
		}
	}
}

/// One step into a data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
	Field(String),
	Index(usize),
}

pub(crate) fn path_string(path: &[PathSegment]) -> String {
	let mut string = String::new();
	for segment in path {
		match segment {
			PathSegment::Field(name) => {
				if !string.is_empty() {
					string.push('.');
				}
				string.push_str(name);
			}
			PathSegment::Index(index) => string.push_str(&format!("[{}]", index)),
		}
	}
	string
}

/// Shorthand for <code>[std]::[result](std::result)::[Result](std::result::Result)&lt;T, [Error]></code>.
pub type Result<T> = std::result::Result<T, Error>;

/// Locates errors inside nested values.
pub(crate) trait Within: Sized {
	fn within(self, segment: impl FnOnce() -> PathSegment) -> Self;

	fn within_field(self, name: &str) -> Self {
		self.within(|| PathSegment::Field(name.to_string()))
	}

	fn within_index(self, index: usize) -> Self {
		self.within(|| PathSegment::Index(index))
	}
}
impl<V> Within for Result<V> {
	fn within(self, segment: impl FnOnce() -> PathSegment) -> Self {
		self.map_err(|mut error| {
			error.path.insert(0, segment());
			error
		})
	}
}

pub(crate) fn type_mismatch(expected: &impl Display, found: &impl Display) -> Error {
	ErrorKind::TypeMismatch {
		expected: expected.to_string(),
		found: found.to_string(),
	}
	.into()
}

/// Builds a `T` from a keyed mapping.
///
/// # Errors
///
/// Iff `data` does not match `T`'s [`Schema`](`crate::Schema`) under `context`,
/// or if the [recursion budget](`Context::recursion_budget`) is already exhausted (since `T` then can't be built).
pub fn from_mapping<T: Structured>(data: &Mapping, context: Context) -> Result<T> {
	build_value(&StructuredRef::of::<T>(), data, context)?.pipe(T::from_value)
}

/// Builds a `T` from a data tree, which must be a [map](`Value::Map`).
///
/// # Errors
///
/// Iff `value` is not a map or [`from_mapping`] fails.
pub fn from_value<T: Structured>(value: Value, context: Context) -> Result<T> {
	match value {
		Value::Map(map) => from_mapping(&map, context),
		other => Err(type_mismatch(&TypeExpr::structured::<T>(), &other.shape())),
	}
}

/// Builds a `T` from any self-describing [Serde](`serde`)-[`Deserializer`](`serde::Deserializer`).
///
/// # Errors
///
/// Iff `deserializer` fails to produce a data tree ([`ErrorKind::Input`]) or [`from_value`] fails.
pub fn from_deserializer<'de, T: Structured, D: de::Deserializer<'de>>(
	deserializer: D,
	context: Context,
) -> Result<T> {
	let value = <Value as de::Deserialize>::deserialize(deserializer).map_err(|error| {
		ErrorKind::Input {
			message: error.to_string(),
		}
		.conv::<Error>()
	})?;
	from_value(value, context)
}

/// Builds a `T` from a TAML-formatted string slice.
///
/// Human-readable diagnostics are [optionally reported](`taml::diagnostics`) in addition to the returned [`Error`].
///
/// # Errors
///
/// Iff `taml_str` is not a valid TAML document, uses TAML features without data tree equivalent, or does not match `T`'s [`Schema`](`crate::Schema`).
pub fn from_taml_str<'de, T: Structured, Reporter: diagReporter<usize>>(
	taml_str: &'de str,
	reporter: &mut Reporter,
	context: Context,
) -> Result<T> {
	use logos::Logos as _;
	let lexer = Token::lexer(taml_str).spanned();
	from_taml_tokens(lexer, reporter, context)
}

/// Builds a `T` from a previously-tokenised TAML document.
///
/// # Errors
///
/// See [`from_taml_str`].
pub fn from_taml_tokens<'de, T: Structured, Position: PositionImpl>(
	tokens: impl IntoIterator<Item = impl IntoToken<'de, Position>>,
	reporter: &mut impl diagReporter<Position>,
	context: Context,
) -> Result<T> {
	let root = parse(tokens, reporter).map_err(|()| ErrorKind::Parse.conv::<Error>())?;

	from_taml_tree(
		&Taml {
			value: TamlValue::Map(root),
			span: Position::default()..Position::default(),
		},
		reporter,
		context,
	)
}

/// Builds a `T` from a pre-parsed TAML document.
///
/// # Errors
///
/// See [`from_taml_str`].
pub fn from_taml_tree<'de, T: Structured, Position: PositionImpl>(
	taml: &Taml<'de, Position>,
	reporter: &mut impl diagReporter<Position>,
	context: Context,
) -> Result<T> {
	let (value, spans) = taml_tree::convert(taml, reporter)?;
	from_value(value, context).map_err(|error| {
		if !error.is_reported() {
			taml_tree::report(&error, &spans, reporter);
		}
		error
	})
}
