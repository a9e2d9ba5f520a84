use crate::{
	de::{Fields, Result},
	schema::{self, Schema, Structured},
	value::{Instance, Shape},
};
use joinery::JoinableIterator;
use paste::paste;
use std::{
	any::{self, TypeId},
	fmt::{self, Debug, Display, Formatter},
	sync::Arc,
};

/// Scalar kinds a [`Value`](`crate::Value`) can carry.
///
/// [`Null`](`PrimitiveKind::Null`) is the dedicated null primitive: Absent values and absent declarations both normalise to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
	Null,
	String,
	Integer,
	Boolean,
	Float,
}
impl Display for PrimitiveKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			PrimitiveKind::Null => "null",
			PrimitiveKind::String => "string",
			PrimitiveKind::Integer => "integer",
			PrimitiveKind::Boolean => "boolean",
			PrimitiveKind::Float => "float",
		})
	}
}

/// Container kinds a [`Value`](`crate::Value`) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
	List,
	Map,
	Tuple,
	Set,
}
impl Display for ContainerKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ContainerKind::List => "list",
			ContainerKind::Map => "map",
			ContainerKind::Tuple => "tuple",
			ContainerKind::Set => "set",
		})
	}
}

/// A declared field type.
///
/// Type expressions are plain immutable data: They are built once per [`Schema`] and only ever read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
	/// Exactly this scalar kind, without widening.
	Primitive(PrimitiveKind),
	/// Shorthand for a [`Union`](`TypeExpr::Union`) of the inner type and [`PrimitiveKind::Null`], in that order.
	Optional(Box<TypeExpr>),
	/// Alternatives in declaration order. The first compatible one wins.
	Union(Vec<TypeExpr>),
	/// A container of the given kind.
	///
	/// The element types are informational towards the classifier,
	/// but the first one is used to deserialize [`List`](`ContainerKind::List`) elements.
	Collection(ContainerKind, Vec<TypeExpr>),
	/// A nested record.
	Structured(StructuredRef),
	/// Anything goes, without validation.
	Unknown,
	/// An explicit list of acceptable types.
	///
	/// Only legal where the caller opted in via [`Context::process_candidates`](`crate::de::Context::process_candidates`).
	Candidates(Vec<TypeExpr>),
}

macro_rules! primitive_constructors {
	($($Kind:ident),*$(,)?) => {$(
		paste! {
			#[doc = concat!("Shorthand for <code>TypeExpr::Primitive(PrimitiveKind::", stringify!($Kind), ")</code>.")]
			#[must_use]
			pub fn [<$Kind:snake>]() -> Self {
				Self::Primitive(PrimitiveKind::$Kind)
			}
		}
	)*};
}

impl TypeExpr {
	primitive_constructors!(Null, String, Integer, Boolean, Float);

	#[must_use]
	pub fn optional(inner: TypeExpr) -> Self {
		Self::Optional(Box::new(inner))
	}

	pub fn union(alternatives: impl IntoIterator<Item = TypeExpr>) -> Self {
		Self::Union(alternatives.into_iter().collect())
	}

	pub fn candidates(alternatives: impl IntoIterator<Item = TypeExpr>) -> Self {
		Self::Candidates(alternatives.into_iter().collect())
	}

	#[must_use]
	pub fn list(element: TypeExpr) -> Self {
		Self::Collection(ContainerKind::List, vec![element])
	}

	/// A string-keyed map with `value` entries.
	#[must_use]
	pub fn map(value: TypeExpr) -> Self {
		Self::Collection(ContainerKind::Map, vec![Self::string(), value])
	}

	pub fn tuple(elements: impl IntoIterator<Item = TypeExpr>) -> Self {
		Self::Collection(ContainerKind::Tuple, elements.into_iter().collect())
	}

	#[must_use]
	pub fn set(element: TypeExpr) -> Self {
		Self::Collection(ContainerKind::Set, vec![element])
	}

	/// A collection without element type arguments, i.e. a bare `list`.
	#[must_use]
	pub fn bare(kind: ContainerKind) -> Self {
		Self::Collection(kind, vec![])
	}

	#[must_use]
	pub fn structured<T: Structured>() -> Self {
		Self::Structured(StructuredRef::of::<T>())
	}

	/// Whether this declaration explicitly admits [`PrimitiveKind::Null`].
	#[must_use]
	pub fn is_nullable(&self) -> bool {
		match self {
			TypeExpr::Primitive(PrimitiveKind::Null) | TypeExpr::Optional(_) => true,
			TypeExpr::Union(alternatives) => alternatives.iter().any(TypeExpr::is_nullable),
			_ => false,
		}
	}

	/// The element types of this collection, or of the first collection alternative of an optional or union.
	#[must_use]
	pub fn collection_elements(&self) -> Option<&[TypeExpr]> {
		match self {
			TypeExpr::Collection(_, elements) => Some(elements),
			TypeExpr::Optional(inner) => inner.collection_elements(),
			TypeExpr::Union(alternatives) => alternatives.iter().find_map(TypeExpr::collection_elements),
			_ => None,
		}
	}
}

impl Display for TypeExpr {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			TypeExpr::Primitive(kind) => Display::fmt(kind, f),
			TypeExpr::Optional(inner) => write!(f, "optional {}", inner),
			TypeExpr::Union(alternatives) => write!(f, "({})", alternatives.iter().join_with(" | ")),
			TypeExpr::Collection(kind, elements) if elements.is_empty() => Display::fmt(kind, f),
			TypeExpr::Collection(kind, elements) => {
				write!(f, "{}<{}>", kind, elements.iter().join_with(", "))
			}
			TypeExpr::Structured(structured) => write!(f, "`{}`", structured.name()),
			TypeExpr::Unknown => f.write_str("any"),
			TypeExpr::Candidates(alternatives) => {
				write!(f, "one of [{}]", alternatives.iter().join_with(", "))
			}
		}
	}
}

/// A reference to a [`Structured`] type, usable inside [`TypeExpr`]s.
///
/// Only types implementing [`Structured`] can be referenced, so holding one of these is proof of the capability.
#[derive(Clone, Copy)]
pub struct StructuredRef {
	type_id: TypeId,
	type_name: &'static str,
	schema: fn() -> Result<Arc<Schema>>,
	construct: fn(Fields) -> Result<Instance>,
}
impl StructuredRef {
	#[must_use]
	pub fn of<T: Structured>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: any::type_name::<T>(),
			schema: schema::schema_of::<T>,
			construct: |fields| T::construct(fields).map(Instance::new),
		}
	}

	#[must_use]
	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	/// The declared [`Schema::name`], as used in messages.
	///
	/// Falls back to [`type_name`](`StructuredRef::type_name`) iff the declaration is invalid.
	#[must_use]
	pub fn name(&self) -> String {
		self.schema()
			.map_or_else(|_| self.type_name.to_string(), |schema| schema.name().to_string())
	}

	/// The Rust type name.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Retrieves the (cached) schema of the referenced type.
	///
	/// # Errors
	///
	/// Iff the schema declaration is invalid.
	pub fn schema(&self) -> Result<Arc<Schema>> {
		(self.schema)()
	}

	pub(crate) fn construct(&self, fields: Fields) -> Result<Instance> {
		(self.construct)(fields)
	}

	/// Whether `shape` is an already built record of exactly this type.
	#[must_use]
	pub fn is_instance(&self, shape: Shape) -> bool {
		matches!(shape, Shape::Instance { type_id, .. } if type_id == self.type_id)
	}
}
impl PartialEq for StructuredRef {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}
impl Debug for StructuredRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("StructuredRef").field(&self.type_name).finish()
	}
}
