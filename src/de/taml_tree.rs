use super::{path_string, Error, ErrorKind, PathSegment, Result};
use crate::value::{Mapping, Value};
use joinery::JoinableIterator;
use std::{borrow::Cow, collections::HashMap, ops::Range};
use taml::{
	diagnostics::{
		Diagnostic, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticType,
		Reporter as diagReporter,
	},
	parsing::{Key, Map, Taml, TamlValue, VariantPayload},
};
use tap::Pipe;

/// Implemented by types usable as `Position` generic type parameter in this library.
pub trait PositionImpl: taml::Position {}
impl PositionImpl for usize {}
impl PositionImpl for () {}

#[derive(Debug)]
struct Spans<Position> {
	key: Option<Range<Position>>,
	value: Range<Position>,
}

/// Source locations of converted values, by [`path_string`].
#[derive(Debug)]
pub(super) struct SpanIndex<Position>(HashMap<String, Spans<Position>>);
impl<Position: PositionImpl> SpanIndex<Position> {
	fn key(&self, path: &str) -> Option<Range<Position>> {
		self.0.get(path).and_then(|spans| spans.key.clone())
	}

	fn value(&self, path: &str) -> Option<Range<Position>> {
		self.0.get(path).map(|spans| spans.value.clone())
	}
}

/// Converts a parsed TAML document into a data tree.
///
/// Every construct without data tree equivalent is reported before this fails.
pub(super) fn convert<Position: PositionImpl, Reporter: diagReporter<Position>>(
	taml: &Taml<'_, Position>,
	reporter: &mut Reporter,
) -> Result<(Value, SpanIndex<Position>)> {
	let mut converter = Converter {
		reporter,
		spans: SpanIndex(HashMap::new()),
		failed: false,
	};
	let value = converter.value(taml, &mut vec![], None);
	if converter.failed {
		Err(ErrorKind::Parse.into())
	} else {
		Ok((value, converter.spans))
	}
}

struct Converter<'a, Position, Reporter> {
	reporter: &'a mut Reporter,
	spans: SpanIndex<Position>,
	failed: bool,
}
impl<'a, Position: PositionImpl, Reporter: diagReporter<Position>> Converter<'a, Position, Reporter> {
	fn value(
		&mut self,
		taml: &Taml<'_, Position>,
		path: &mut Vec<PathSegment>,
		key_span: Option<Range<Position>>,
	) -> Value {
		self.spans.0.insert(
			path_string(path),
			Spans {
				key: key_span,
				value: taml.span.clone(),
			},
		);

		match &taml.value {
			TamlValue::String(string) => Value::String(string.to_string()),
			TamlValue::Integer(integer) => match integer.parse() {
				Ok(integer) => Value::Integer(integer),
				Err(_) => self.unsupported(
					DiagnosticType::InvalidValue,
					"Failed to parse integer. (64-bit signed integers are supported.)",
					&taml.span,
				),
			},
			TamlValue::Decimal(decimal) => match decimal.parse() {
				Ok(float) => Value::Float(float),
				Err(_) => {
					self.unsupported(DiagnosticType::InvalidValue, "Failed to parse float.", &taml.span)
				}
			},
			TamlValue::List(list) => {
				let mut elements = Vec::with_capacity(list.len());
				for (i, element) in list.iter().enumerate() {
					path.push(PathSegment::Index(i));
					elements.push(self.value(element, path, None));
					path.pop();
				}
				Value::List(elements)
			}
			TamlValue::Map(map) => self.map(map, path).pipe(Value::Map),
			TamlValue::EnumVariant {
				key: Key { name, .. },
				payload: VariantPayload::Unit,
			} if name == "true" => Value::Boolean(true),
			TamlValue::EnumVariant {
				key: Key { name, .. },
				payload: VariantPayload::Unit,
			} if name == "false" => Value::Boolean(false),
			TamlValue::EnumVariant { .. } => self.unsupported(
				DiagnosticType::InvalidType,
				"Expected boolean unit variant `true` or `false`. (Other enum variants are not supported.)",
				&taml.span,
			),
			TamlValue::DataLiteral(_) => self.unsupported(
				DiagnosticType::InvalidType,
				"Data literals are not supported.",
				&taml.span,
			),
		}
	}

	fn map(&mut self, map: &Map<'_, Position>, path: &mut Vec<PathSegment>) -> Mapping {
		let mut entries = Mapping::with_capacity(map.len());
		for (key, value) in map.iter() {
			let name = key.name.to_string();
			path.push(PathSegment::Field(name.clone()));
			let value = self.value(value, path, Some(key.span.clone()));
			path.pop();
			entries.insert(name, value);
		}
		entries
	}

	fn unsupported(
		&mut self,
		type_: DiagnosticType,
		msg: &'static str,
		span: &Range<Position>,
	) -> Value {
		self.failed = true;
		let span = span.clone();
		self.reporter.report_with(move || Diagnostic {
			type_,
			labels: vec![DiagnosticLabel::new(
				msg,
				span,
				DiagnosticLabelPriority::Primary,
			)],
		});
		Value::Null
	}
}

/// Reports `error` with the source locations recorded during [`convert`].
pub(super) fn report<Position: PositionImpl>(
	error: &Error,
	spans: &SpanIndex<Position>,
	reporter: &mut impl diagReporter<Position>,
) {
	let path = error.path_string();
	reporter.report_with(|| match error.kind() {
		ErrorKind::UnknownField {
			field, accepted, ..
		} => Diagnostic {
			type_: DiagnosticType::UnknownField,
			labels: vec![
				DiagnosticLabel::new(
					format!("Unknown field `{}`.", field.replace('`', "\\`")),
					error
						.path()
						.iter()
						.cloned()
						.chain(Some(PathSegment::Field(field.clone())))
						.collect::<Vec<_>>()
						.pipe(|path| spans.key(&path_string(&path))),
					DiagnosticLabelPriority::Primary,
				),
				DiagnosticLabel::new(
					if accepted.is_empty() {
						"Hint: This struct does not accept any fields.".pipe(Cow::Borrowed)
					} else {
						format!(
							"Hint: The following fields are accepted here: `{}`.",
							accepted
								.iter()
								.map(|field| field.replace('`', "\\`"))
								.join_with("`, `")
						)
						.pipe(Cow::Owned)
					},
					spans.value(&path),
					DiagnosticLabelPriority::Auxiliary,
				),
			],
		},
		ErrorKind::MissingField { field, .. } => Diagnostic {
			type_: DiagnosticType::MissingField,
			labels: vec![DiagnosticLabel::new(
				format!("Missing field `{}`.", field.replace('`', "\\`")),
				spans.value(&path),
				DiagnosticLabelPriority::Primary,
			)],
		},
		ErrorKind::TypeMismatch { expected, found } => Diagnostic {
			type_: DiagnosticType::InvalidType,
			labels: vec![DiagnosticLabel::new(
				format!("Expected {} but found {}.", expected, found),
				spans.value(&path),
				DiagnosticLabelPriority::Primary,
			)],
		},
		_ => Diagnostic {
			type_: DiagnosticType::CustomErrorFromVisitor,
			labels: vec![DiagnosticLabel::new(
				error.to_string(),
				spans.value(&path),
				DiagnosticLabelPriority::Primary,
			)],
		},
	});
}
