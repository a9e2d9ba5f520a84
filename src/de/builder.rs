use super::{
	classify::{self, FieldCategory},
	deserialize_value::deserialize_validated,
	type_mismatch, Context, ErrorKind, FromValue, Result, Within as _,
};
use crate::{
	types::StructuredRef,
	value::{Mapping, Value},
};
use indexmap::IndexMap;
use log::{debug, trace};
use std::{
	borrow::Cow,
	fmt::{self, Debug, Formatter},
};

/// Builds the record `target` refers to from `data`.
///
/// Returns [`Value::Instance`], or a copy of `data` as [`Value::Map`] if `context`'s recursion budget is exhausted.
/// `data` itself is never modified.
///
/// # Errors
///
/// Iff `data` doesn't match `target`'s [`Schema`](`crate::Schema`) under `context`, or the record can't be constructed.
/// No partially built record is returned in that case.
pub fn build_value(target: &StructuredRef, data: &Mapping, context: Context) -> Result<Value> {
	if context.is_exhausted() {
		trace!("Recursion budget exhausted, not building `{}`.", target.type_name());
		return Ok(Value::Map(data.clone()));
	}

	let schema = target.schema()?;
	debug!("Building `{}` from {} entries.", schema.name(), data.len());

	// Entries are only cloned once they're consumed, unless a deep copy was requested.
	let mut working: IndexMap<&str, Cow<'_, Value>> = data
		.iter()
		.map(|(key, value)| {
			(
				key.as_str(),
				if context.do_deep_copy {
					Cow::Owned(value.clone())
				} else {
					Cow::Borrowed(value)
				},
			)
		})
		.collect();

	let mut unknown = (context.allow_unknown && context.add_unknown_as_is).then(Mapping::new);
	for key in data.keys().filter(|key| !schema.contains(key)) {
		if !context.allow_unknown {
			return Err(ErrorKind::UnknownField {
				field: key.clone(),
				target: schema.name().to_string(),
				accepted: schema.field_names().map(ToString::to_string).collect(),
			}
			.into());
		}

		if let Some(value) = working.shift_remove(key.as_str()) {
			if let Some(unknown) = &mut unknown {
				debug!("Keeping unknown field `{}` of `{}` as is.", key, schema.name());
				unknown.insert(key.clone(), value.into_owned());
			} else {
				debug!("Dropping unknown field `{}` of `{}`.", key, schema.name());
			}
		}
	}

	let child_context = context.descend();
	let mut values = Mapping::with_capacity(schema.len());
	for descriptor in schema.fields() {
		let name = descriptor.name();
		let declared = descriptor.declared();

		let raw = match (working.shift_remove(name), descriptor.default()) {
			(Some(raw), _) => raw,
			(None, Some(default)) => {
				debug!("Using the default for field `{}` of `{}`.", name, schema.name());
				Cow::Borrowed(default)
			}
			(None, None) if context.allow_missing_nullable && declared.is_nullable() => {
				Cow::Owned(Value::Null)
			}
			(None, None) if context.allow_missing_required => {
				debug!("Leaving out missing field `{}` of `{}`.", name, schema.name());
				continue;
			}
			(None, None) => {
				return Err(ErrorKind::MissingField {
					field: name.to_string(),
					target: schema.name().to_string(),
				}
				.into())
			}
		};

		let classification = classify::classify(declared, raw.shape(), context.process_candidates)
			.within_field(name)?;
		trace!(
			"Field `{}` of `{}`: {:?} from {} (compatible: {}).",
			name,
			schema.name(),
			classification.category,
			raw.shape(),
			classification.compatible
		);

		if !classification.compatible {
			if context.validate_type {
				return Err(type_mismatch(declared, &raw.shape())).within_field(name);
			}
		} else if classification.category == FieldCategory::Iterable {
			if let (Some(elements), Some(first)) = (
				declared.collection_elements(),
				raw.elements().and_then(<[Value]>::first),
			) {
				let listed = classify::first_compatible(elements, first.shape(), true)
					.within_field(name)?;
				trace!(
					"First element of field `{}` of `{}`: {:?}.",
					name,
					schema.name(),
					listed
				);
			}
		}

		let value = deserialize_validated(declared, raw.into_owned(), child_context)
			.within_field(name)?;
		values.insert(name.to_string(), value);
	}

	target
		.construct(Fields {
			target: schema.name().to_string(),
			values,
			unknown,
		})
		.map(Value::Instance)
}

/// The reconciled fields of a record that is being built, see [`Structured::construct`](`crate::Structured::construct`).
pub struct Fields {
	target: String,
	values: Mapping,
	unknown: Option<Mapping>,
}
impl Fields {
	/// The [`Schema`](`crate::Schema`) name of the record being built.
	#[must_use]
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Names of the fields that haven't been taken yet.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	/// Removes the field `name` and converts it into a `T`.
	///
	/// Absent fields (see [`Context::allow_missing_required`]) become [`T::missing()`](`FromValue::missing`).
	///
	/// # Errors
	///
	/// [`ErrorKind::Construction`] iff the field is absent without fallback, or its value can't be converted.
	pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T> {
		match self.values.shift_remove(name) {
			Some(value) => T::from_value(value).within_field(name),
			None => T::missing().ok_or_else(|| {
				ErrorKind::Construction {
					target: self.target.clone(),
					message: format!("Field `{}` is absent.", name.replace('`', "\\`")),
				}
				.into()
			}),
		}
	}

	/// Takes the unknown fields that were kept as is.
	///
	/// [`None`] unless both [`Context::allow_unknown`] and [`Context::add_unknown_as_is`] are set.
	pub fn unknown(&mut self) -> Option<Mapping> {
		self.unknown.take()
	}
}
impl Debug for Fields {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Fields")
			.field("target", &self.target)
			.field("names", &self.names().collect::<Vec<_>>())
			.field("unknown", &self.unknown.as_ref().map(Mapping::len))
			.finish()
	}
}
