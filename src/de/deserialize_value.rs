use super::{builder, classify, type_mismatch, Context, Result, Within as _};
use crate::{
	types::{ContainerKind, PrimitiveKind, TypeExpr},
	value::Value,
};
use log::trace;

/// Converts `raw` into its declared type, building nested records along the way.
///
/// Records come back as [`Value::Instance`], lists of declared element type element by element.
/// Everything else, including maps, tuples and sets, is returned as is once validated.
///
/// # Errors
///
/// Iff validation is enabled and `raw` doesn't fit `expected`, or building a nested record fails.
pub fn deserialize_value(expected: &TypeExpr, raw: Value, context: Context) -> Result<Value> {
	if context.is_exhausted() {
		trace!("Recursion budget exhausted, keeping {} as is.", raw.shape());
		return Ok(raw);
	}

	if context.validate_type {
		let classification = classify(expected, raw.shape(), context.process_candidates)?;
		if !classification.compatible {
			return Err(type_mismatch(expected, &raw.shape()));
		}
	}

	reinterpret(expected, raw, context)
}

/// [`deserialize_value`] without the validation step, for values the caller already classified.
pub(crate) fn deserialize_validated(
	expected: &TypeExpr,
	raw: Value,
	context: Context,
) -> Result<Value> {
	if context.is_exhausted() {
		trace!("Recursion budget exhausted, keeping {} as is.", raw.shape());
		return Ok(raw);
	}
	reinterpret(expected, raw, context)
}

fn reinterpret(expected: &TypeExpr, raw: Value, context: Context) -> Result<Value> {
	match expected {
		TypeExpr::Optional(inner) => reinterpret_as_first_of(std::slice::from_ref(&**inner), raw, context),
		TypeExpr::Union(alternatives) => reinterpret_as_first_of(alternatives, raw, context),

		TypeExpr::Collection(ContainerKind::List, elements) => match (elements.first(), raw) {
			(Some(element), Value::List(list)) => list
				.into_iter()
				.enumerate()
				.map(|(i, item)| deserialize_value(element, item, context).within_index(i))
				.collect::<Result<_>>()
				.map(Value::List),
			(_, raw) => Ok(raw),
		},

		TypeExpr::Structured(structured) => match raw {
			Value::Map(map) => builder::build_value(structured, &map, context),
			raw => Ok(raw),
		},

		TypeExpr::Primitive(_)
		| TypeExpr::Collection(..)
		| TypeExpr::Unknown
		| TypeExpr::Candidates(_) => Ok(raw),
	}
}

/// Treats `raw` as the first declared non-null alternative.
///
/// This does not look at `raw` to pick a better fitting alternative.
fn reinterpret_as_first_of(alternatives: &[TypeExpr], raw: Value, context: Context) -> Result<Value> {
	if raw.is_null() {
		return Ok(raw);
	}
	let mut non_null = alternatives
		.iter()
		.filter(|alternative| **alternative != TypeExpr::Primitive(PrimitiveKind::Null));
	match non_null.next() {
		Some(first) => {
			if non_null.next().is_some() {
				trace!("Too many alternatives, treating {} as {}.", raw.shape(), first);
			}
			reinterpret(first, raw, context)
		}
		None => Ok(raw),
	}
}
