use super::{Error, ErrorKind, Result, Within as _};
use crate::{
	schema::{self, Structured},
	value::Value,
};
use indexmap::IndexMap;
use std::any;

/// Rust-side conversion of reconciled field values, used by [`Fields::take`](`crate::Fields::take`).
///
/// There is no coercion here either: Only values of the matching shape are accepted.
pub trait FromValue: Sized {
	/// # Errors
	///
	/// [`ErrorKind::Construction`] iff `value` has the wrong shape or doesn't fit into `Self`.
	fn from_value(value: Value) -> Result<Self>;

	/// The fallback for an absent field, if any.
	#[must_use]
	fn missing() -> Option<Self> {
		None
	}
}

fn conversion_error<T>(message: impl Into<String>) -> Error {
	ErrorKind::Construction {
		target: any::type_name::<T>().to_string(),
		message: message.into(),
	}
	.into()
}

fn record_error<T: Structured>(message: impl Into<String>) -> Error {
	ErrorKind::Construction {
		target: schema::record_name::<T>(),
		message: message.into(),
	}
	.into()
}

fn unexpected<T>(expected: &str, found: &Value) -> Error {
	conversion_error::<T>(format!("Expected {} but found {}.", expected, found.shape()))
}

impl FromValue for Value {
	fn from_value(value: Value) -> Result<Self> {
		Ok(value)
	}
}

impl FromValue for String {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::String(string) => Ok(string),
			other => Err(unexpected::<Self>("string", &other)),
		}
	}
}

impl FromValue for bool {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Boolean(boolean) => Ok(boolean),
			other => Err(unexpected::<Self>("boolean", &other)),
		}
	}
}

impl FromValue for f64 {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Float(float) => Ok(float),
			other => Err(unexpected::<Self>("float", &other)),
		}
	}
}

impl FromValue for f32 {
	#[allow(clippy::cast_possible_truncation)]
	fn from_value(value: Value) -> Result<Self> {
		let float = f64::from_value(value)?;
		if float.is_finite() && float.abs() > f64::from(f32::MAX) {
			return Err(conversion_error::<Self>(format!(
				"{} is out of range for f32.",
				float
			)));
		}
		Ok(float as f32)
	}
}

macro_rules! integers {
	($($Type:ident),*$(,)?) => {$(
		impl FromValue for $Type {
			fn from_value(value: Value) -> Result<Self> {
				match value {
					Value::Integer(integer) => $Type::try_from(integer).map_err(|_| {
						conversion_error::<Self>(format!(
							concat!("{} is out of range for ", stringify!($Type), "."),
							integer
						))
					}),
					other => Err(unexpected::<Self>("integer", &other)),
				}
			}
		}
	)*};
}
integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: FromValue> FromValue for Option<T> {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Null => Ok(None),
			value => T::from_value(value).map(Some),
		}
	}

	fn missing() -> Option<Self> {
		Some(None)
	}
}

impl<T: FromValue> FromValue for Vec<T> {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::List(elements) | Value::Tuple(elements) | Value::Set(elements) => elements
				.into_iter()
				.enumerate()
				.map(|(i, element)| T::from_value(element).within_index(i))
				.collect(),
			other => Err(unexpected::<Self>("list", &other)),
		}
	}
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Map(map) => map
				.into_iter()
				.map(|(key, value)| {
					let value = T::from_value(value).within_field(&key)?;
					Ok((key, value))
				})
				.collect(),
			other => Err(unexpected::<Self>("map", &other)),
		}
	}
}

impl<T: Structured> FromValue for T {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Instance(instance) => instance.downcast().map_err(|instance| {
				record_error::<Self>(format!(
					"Expected a built `{}` but found {}.",
					schema::record_name::<Self>(),
					Value::Instance(instance).shape()
				))
			}),
			Value::Map(_) => Err(record_error::<Self>(
				"The record was not built, since the recursion budget was exhausted.",
			)),
			other => Err(record_error::<Self>(format!(
				"Expected record but found {}.",
				other.shape()
			))),
		}
	}
}
