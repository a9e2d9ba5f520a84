use crate::{
	schema::{self, Structured},
	types::{ContainerKind, PrimitiveKind},
};
use indexmap::IndexMap;
use serde::de;
use std::{
	any::{self, Any, TypeId},
	fmt::{self, Debug, Display, Formatter},
	sync::Arc,
};
use tap::Pipe;

/// A string-keyed mapping that remembers insertion order.
pub type Mapping = IndexMap<String, Value>;

/// An untyped data tree, as produced by a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Boolean(bool),
	Integer(i64),
	Float(f64),
	String(String),
	List(Vec<Value>),
	Tuple(Vec<Value>),
	Set(Vec<Value>),
	Map(Mapping),
	/// A record that has already been built from a [`Map`](`Value::Map`).
	Instance(Instance),
}

impl Value {
	#[must_use]
	pub fn shape(&self) -> Shape {
		match self {
			Value::Null => Shape::NULL,
			Value::Boolean(_) => Shape::Primitive(PrimitiveKind::Boolean),
			Value::Integer(_) => Shape::Primitive(PrimitiveKind::Integer),
			Value::Float(_) => Shape::Primitive(PrimitiveKind::Float),
			Value::String(_) => Shape::Primitive(PrimitiveKind::String),
			Value::List(_) => Shape::Container(ContainerKind::List),
			Value::Tuple(_) => Shape::Container(ContainerKind::Tuple),
			Value::Set(_) => Shape::Container(ContainerKind::Set),
			Value::Map(_) => Shape::Container(ContainerKind::Map),
			Value::Instance(instance) => Shape::Instance {
				type_id: instance.type_id(),
				type_name: instance.type_name(),
			},
		}
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// The elements of a list, tuple or set.
	#[must_use]
	pub fn elements(&self) -> Option<&[Value]> {
		match self {
			Value::List(elements) | Value::Tuple(elements) | Value::Set(elements) => Some(elements),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_map(&self) -> Option<&Mapping> {
		match self {
			Value::Map(map) => Some(map),
			_ => None,
		}
	}
}

macro_rules! from_scalar {
	($($Type:ty => $Variant:ident),*$(,)?) => {$(
		impl From<$Type> for Value {
			fn from(value: $Type) -> Self {
				Value::$Variant(value.into())
			}
		}
	)*};
}
from_scalar! {
	bool => Boolean,
	i8 => Integer,
	i16 => Integer,
	i32 => Integer,
	i64 => Integer,
	u8 => Integer,
	u16 => Integer,
	u32 => Integer,
	f32 => Float,
	f64 => Float,
	String => String,
	&str => String,
	Vec<Value> => List,
	Mapping => Map,
}
impl From<()> for Value {
	fn from((): ()) -> Self {
		Value::Null
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

/// The runtime shape of a [`Value`], as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
	Primitive(PrimitiveKind),
	Container(ContainerKind),
	Instance {
		type_id: TypeId,
		type_name: &'static str,
	},
}
impl Shape {
	pub const NULL: Self = Shape::Primitive(PrimitiveKind::Null);
}
impl Display for Shape {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Shape::Primitive(kind) => Display::fmt(kind, f),
			Shape::Container(kind) => Display::fmt(kind, f),
			Shape::Instance { type_id, type_name } => match schema::cached_name(*type_id) {
				Some(name) => write!(f, "instance of `{}`", name),
				None => write!(f, "instance of `{}`", type_name),
			},
		}
	}
}

/// A type-erased, shared [`Structured`] record.
///
/// Equality is identity: Two instances are equal iff they share the same allocation.
#[derive(Clone)]
pub struct Instance {
	type_id: TypeId,
	type_name: &'static str,
	inner: Arc<dyn Any + Send + Sync>,
}
impl Instance {
	pub fn new<T: Structured>(record: T) -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: any::type_name::<T>(),
			inner: Arc::new(record),
		}
	}

	#[must_use]
	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	#[must_use]
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	#[must_use]
	pub fn downcast_ref<T: Structured>(&self) -> Option<&T> {
		self.inner.downcast_ref()
	}

	/// Extracts the record, cloning it only if this instance is shared.
	///
	/// # Errors
	///
	/// Iff the record is not a `T`, in which case `self` is handed back.
	pub fn downcast<T: Structured>(self) -> Result<T, Self> {
		let Self {
			type_id,
			type_name,
			inner,
		} = self;
		inner
			.downcast::<T>()
			.map(|record| Arc::try_unwrap(record).unwrap_or_else(|shared| T::clone(&shared)))
			.map_err(|inner| Self {
				type_id,
				type_name,
				inner,
			})
	}
}
impl PartialEq for Instance {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}
impl Debug for Instance {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Instance").field(&self.type_name).finish()
	}
}

impl<'de> de::Deserialize<'de> for Value {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: de::Deserializer<'de>,
	{
		deserializer.deserialize_any(ValueVisitor)
	}
}

struct ValueVisitor;
impl<'de> de::Visitor<'de> for ValueVisitor {
	type Value = Value;

	fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
		formatter.write_str("a scalar, sequence or string-keyed map")
	}

	fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
		Ok(Value::Boolean(v))
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
		Ok(Value::Integer(v))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
		i64::try_from(v)
			.map(Value::Integer)
			.map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &"a 64-bit signed integer"))
	}

	fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
		Ok(Value::Float(v))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
		Ok(Value::String(v.to_owned()))
	}

	fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
		Ok(Value::String(v))
	}

	fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
		Ok(Value::Null)
	}

	fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
		Ok(Value::Null)
	}

	fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
	where
		D: de::Deserializer<'de>,
	{
		de::Deserialize::deserialize(deserializer)
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
	where
		A: de::SeqAccess<'de>,
	{
		let mut elements = seq.size_hint().unwrap_or_default().pipe(Vec::with_capacity);
		while let Some(element) = seq.next_element()? {
			elements.push(element);
		}
		Ok(Value::List(elements))
	}

	fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
	where
		A: de::MapAccess<'de>,
	{
		let mut entries = map.size_hint().unwrap_or_default().pipe(Mapping::with_capacity);
		while let Some((key, value)) = map.next_entry::<String, Value>()? {
			entries.insert(key, value);
		}
		Ok(Value::Map(entries))
	}
}
