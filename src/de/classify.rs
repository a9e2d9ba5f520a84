use super::{ErrorKind, Result};
use crate::{
	types::{ContainerKind, PrimitiveKind, TypeExpr},
	value::Shape,
};

/// How a field is handled once its value is known to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
	Unknown,
	Primitive,
	Iterable,
	Structured,
}

/// The classifier's verdict on one (declared type, observed shape) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
	pub compatible: bool,
	pub category: FieldCategory,
}
impl Classification {
	const MISMATCH: Self = Self::new(false, FieldCategory::Unknown);

	#[must_use]
	pub const fn new(compatible: bool, category: FieldCategory) -> Self {
		Self {
			compatible,
			category,
		}
	}
}

/// Decides whether a value of shape `observed` fits `expected`, and what kind of field that makes it.
///
/// Absent values are [`Shape::NULL`].
/// `process_candidates` permits [`TypeExpr::Candidates`] declarations.
///
/// # Errors
///
/// [`ErrorKind::Configuration`] iff `expected` (or the part of it that had to be inspected) is not supported:
/// An empty union or candidate list, or any candidate list while `process_candidates` is `false`.
pub fn classify(
	expected: &TypeExpr,
	observed: Shape,
	process_candidates: bool,
) -> Result<Classification> {
	Ok(match expected {
		TypeExpr::Primitive(PrimitiveKind::Null) => {
			Classification::new(observed == Shape::NULL, FieldCategory::Primitive)
		}

		TypeExpr::Unknown => Classification::new(true, FieldCategory::Unknown),

		TypeExpr::Primitive(kind) => {
			Classification::new(observed == Shape::Primitive(*kind), FieldCategory::Primitive)
		}

		TypeExpr::Optional(inner) => {
			let inner = classify(inner, observed, process_candidates)?;
			if inner.compatible {
				inner
			} else if observed == Shape::NULL {
				Classification::new(true, FieldCategory::Primitive)
			} else {
				Classification::MISMATCH
			}
		}

		TypeExpr::Union(alternatives) if alternatives.is_empty() => {
			return Err(ErrorKind::Configuration {
				message: "a union needs at least one alternative".to_string(),
			}
			.into())
		}
		TypeExpr::Union(alternatives) => {
			first_compatible(alternatives, observed, process_candidates)?
				.unwrap_or(Classification::MISMATCH)
		}

		TypeExpr::Collection(kind, _) => {
			Classification::new(observed == Shape::Container(*kind), FieldCategory::Iterable)
		}

		TypeExpr::Structured(structured) => Classification::new(
			observed == Shape::Container(ContainerKind::Map) || structured.is_instance(observed),
			FieldCategory::Structured,
		),

		TypeExpr::Candidates(_) if !process_candidates => {
			return Err(ErrorKind::Configuration {
				message: format!(
					"candidate list {} is only accepted where candidates are processed",
					expected
				),
			}
			.into())
		}
		TypeExpr::Candidates(alternatives) if alternatives.is_empty() => {
			return Err(ErrorKind::Configuration {
				message: "a candidate list needs at least one alternative".to_string(),
			}
			.into())
		}
		TypeExpr::Candidates(alternatives) => {
			first_compatible(alternatives, observed, process_candidates)?
				.unwrap_or(Classification::MISMATCH)
		}
	})
}

/// Classifies against `alternatives` in order and stops at the first compatible one.
///
/// Alternatives after that one are not inspected at all, so they can't raise configuration errors either.
pub(crate) fn first_compatible(
	alternatives: &[TypeExpr],
	observed: Shape,
	process_candidates: bool,
) -> Result<Option<Classification>> {
	for alternative in alternatives {
		let classification = classify(alternative, observed, process_candidates)?;
		if classification.compatible {
			return Ok(Some(classification));
		}
	}
	Ok(None)
}
