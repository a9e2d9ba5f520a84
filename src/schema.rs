//! Record declarations and the process-wide schema cache.

use crate::{
	de::{ErrorKind, Fields, Result},
	types::TypeExpr,
	value::{Mapping, Value},
};
use indexmap::IndexMap;
use joinery::JoinableIterator;
use lazy_static::lazy_static;
use log::debug;
use std::{
	any::{self, Any, TypeId},
	collections::HashMap,
	sync::{Arc, PoisonError, RwLock},
};

/// Implemented by records that can be built from a keyed [`Mapping`].
///
/// This is the explicit capability marker: A type only takes part in structured deserialization by implementing it.
///
/// ```rust
/// use taml_schema::{Context, Fields, Result, Schema, Structured, TypeExpr, from_mapping};
/// use indexmap::indexmap;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point {
/// 	x: i64,
/// 	y: i64,
/// }
///
/// impl Structured for Point {
/// 	fn schema() -> Schema {
/// 		Schema::new("Point")
/// 			.field("x", TypeExpr::integer())
/// 			.field_with_default("y", TypeExpr::integer(), 0)
/// 	}
///
/// 	fn construct(mut fields: Fields) -> Result<Self> {
/// 		Ok(Self {
/// 			x: fields.take("x")?,
/// 			y: fields.take("y")?,
/// 		})
/// 	}
/// }
///
/// let data = indexmap! { "x".to_string() => 1.into() };
/// assert_eq!(
/// 	from_mapping::<Point>(&data, Context::default()).unwrap(),
/// 	Point { x: 1, y: 0 },
/// );
/// ```
pub trait Structured: Any + Clone + Send + Sync {
	/// Declares this record's fields.
	///
	/// Called at most once per process, see [`schema_of`].
	fn schema() -> Schema;

	/// Builds the record from its reconciled fields.
	///
	/// # Errors
	///
	/// Iff a field can't be converted, usually via [`Fields::take`].
	fn construct(fields: Fields) -> Result<Self>;

	/// Converts the record back into a keyed mapping.
	///
	/// Unimplemented (`None`) unless overridden.
	fn to_mapping(&self) -> Option<Mapping> {
		None
	}
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
	name: String,
	declared: TypeExpr,
	default: Option<Value>,
}
impl FieldDescriptor {
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn declared(&self) -> &TypeExpr {
		&self.declared
	}

	/// [`None`] iff the field is required.
	#[must_use]
	pub fn default(&self) -> Option<&Value> {
		self.default.as_ref()
	}
}

/// The ordered field declarations of one [`Structured`] type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
	name: String,
	fields: IndexMap<String, FieldDescriptor>,
	duplicates: Vec<String>,
}
impl Schema {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: IndexMap::new(),
			duplicates: vec![],
		}
	}

	/// Declares a required field.
	#[must_use]
	pub fn field(self, name: impl Into<String>, declared: TypeExpr) -> Self {
		self.push(name.into(), declared, None)
	}

	/// Declares a field that falls back to `default` when absent.
	#[must_use]
	pub fn field_with_default(
		self,
		name: impl Into<String>,
		declared: TypeExpr,
		default: impl Into<Value>,
	) -> Self {
		self.push(name.into(), declared, Some(default.into()))
	}

	fn push(mut self, name: String, declared: TypeExpr, default: Option<Value>) -> Self {
		if self.fields.contains_key(&name) {
			self.duplicates.push(name);
		} else {
			self.fields.insert(
				name.clone(),
				FieldDescriptor {
					name,
					declared,
					default,
				},
			);
		}
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn get(&self, field_name: &str) -> Option<&FieldDescriptor> {
		self.fields.get(field_name)
	}

	#[must_use]
	pub fn contains(&self, field_name: &str) -> bool {
		self.fields.contains_key(field_name)
	}

	/// Field descriptors in declaration order.
	pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> {
		self.fields.values()
	}

	pub fn field_names(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
		self.fields.keys().map(String::as_str)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	fn validated(self) -> Result<Self> {
		if self.duplicates.is_empty() {
			Ok(self)
		} else {
			Err(ErrorKind::Configuration {
				message: format!(
					"`{}` declares the following fields more than once: `{}`",
					self.name,
					self.duplicates.iter().join_with("`, `"),
				),
			}
			.into())
		}
	}
}

lazy_static! {
	static ref SCHEMAS: RwLock<HashMap<TypeId, Arc<Schema>>> = RwLock::default();
}

/// Retrieves `T`'s schema, declaring and caching it on first use.
///
/// Concurrent first uses may each call [`T::schema`](`Structured::schema`), but only the first stored result is ever handed out.
///
/// # Errors
///
/// Iff the declaration is invalid (for example because a field name is repeated).
pub fn schema_of<T: Structured>() -> Result<Arc<Schema>> {
	let type_id = TypeId::of::<T>();
	if let Some(schema) = SCHEMAS
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.get(&type_id)
	{
		return Ok(Arc::clone(schema));
	}

	let schema: Arc<Schema> = T::schema().validated()?.into();
	debug!(
		"Declared schema for `{}` ({}).",
		any::type_name::<T>(),
		describe_fields(&schema)
	);
	Ok(Arc::clone(
		SCHEMAS
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(type_id)
			.or_insert(schema),
	))
}

/// The declared name of the record type `type_id`, iff its schema is already cached.
pub(crate) fn cached_name(type_id: TypeId) -> Option<String> {
	SCHEMAS
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.get(&type_id)
		.map(|schema| schema.name().to_string())
}

/// `T`'s declared name, falling back to its Rust type name iff the declaration is invalid.
pub(crate) fn record_name<T: Structured>() -> String {
	schema_of::<T>().map_or_else(
		|_| any::type_name::<T>().to_string(),
		|schema| schema.name().to_string(),
	)
}

fn describe_fields(schema: &Schema) -> String {
	if schema.is_empty() {
		"no fields".to_string()
	} else {
		format!("fields `{}`", schema.field_names().join_with("`, `"))
	}
}

/// Converts `record` back into a data tree via [`Structured::to_mapping`].
///
/// # Errors
///
/// Iff `T` doesn't implement the conversion.
pub fn to_value<T: Structured>(record: &T) -> Result<Value> {
	record.to_mapping().map(Value::Map).ok_or_else(|| {
		ErrorKind::Unsupported {
			target: record_name::<T>(),
		}
		.into()
	})
}
