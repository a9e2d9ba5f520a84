use indexmap::indexmap;
use taml_schema::{
	deserialize_value, from_mapping, Context, ErrorKind, Fields, Mapping, Result, Schema,
	Structured, TypeExpr, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Inner {
	x: i64,
}
impl Structured for Inner {
	fn schema() -> Schema {
		Schema::new("Inner").field("x", TypeExpr::integer())
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			x: fields.take("x")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Outer {
	inner: Inner,
}
impl Structured for Outer {
	fn schema() -> Schema {
		Schema::new("Outer").field("inner", TypeExpr::structured::<Inner>())
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			inner: fields.take("inner")?,
		})
	}
}

/// Like [`Outer`], but keeps whatever it gets.
#[derive(Debug, Clone, PartialEq)]
struct Lenient {
	inner: Value,
}
impl Structured for Lenient {
	fn schema() -> Schema {
		Schema::new("Lenient").field("inner", TypeExpr::structured::<Inner>())
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			inner: fields.take("inner")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct DoubleNested {
	field_int_double_nested: i64,
}
impl Structured for DoubleNested {
	fn schema() -> Schema {
		Schema::new("DoubleNested").field("field_int_double_nested", TypeExpr::integer())
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			field_int_double_nested: fields.take("field_int_double_nested")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct SingleNested {
	field_int_single_nested: i64,
	field_class_double_nested: DoubleNested,
}
impl Structured for SingleNested {
	fn schema() -> Schema {
		Schema::new("SingleNested")
			.field("field_int_single_nested", TypeExpr::integer())
			.field(
				"field_class_double_nested",
				TypeExpr::structured::<DoubleNested>(),
			)
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			field_int_single_nested: fields.take("field_int_single_nested")?,
			field_class_double_nested: fields.take("field_class_double_nested")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct RootNested {
	field_int_root: i64,
	field_class_single_nested: SingleNested,
}
impl Structured for RootNested {
	fn schema() -> Schema {
		Schema::new("RootNested")
			.field("field_int_root", TypeExpr::integer())
			.field(
				"field_class_single_nested",
				TypeExpr::structured::<SingleNested>(),
			)
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			field_int_root: fields.take("field_int_root")?,
			field_class_single_nested: fields.take("field_class_single_nested")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Polygon {
	name: Option<String>,
	points: Vec<Inner>,
}
impl Structured for Polygon {
	fn schema() -> Schema {
		Schema::new("Polygon")
			.field("name", TypeExpr::union([TypeExpr::null(), TypeExpr::string()]))
			.field("points", TypeExpr::list(TypeExpr::structured::<Inner>()))
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			name: fields.take("name")?,
			points: fields.take("points")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Chain {
	next: Option<Box<Chain>>,
}
impl Structured for Chain {
	fn schema() -> Schema {
		Schema::new("Chain").field("next", TypeExpr::optional(TypeExpr::structured::<Chain>()))
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			next: fields.take::<Option<Chain>>("next")?.map(Box::new),
		})
	}
}

fn inner_5() -> Mapping {
	indexmap! { "x".to_string() => 5.into() }
}

#[test]
fn nested_record_is_built() {
	let value = deserialize_value(
		&TypeExpr::structured::<Outer>(),
		Value::Map(indexmap! { "inner".to_string() => Value::Map(inner_5()) }),
		Context::default(),
	)
	.unwrap();

	match value {
		Value::Instance(instance) => assert_eq!(
			instance.downcast::<Outer>().unwrap(),
			Outer {
				inner: Inner { x: 5 }
			}
		),
		other => panic!("Expected instance but found {:?}", other),
	}
}

#[test]
fn triple_nesting() {
	let data = indexmap! {
		"field_int_root".to_string() => 42.into(),
		"field_class_single_nested".to_string() => Value::Map(indexmap! {
			"field_int_single_nested".to_string() => 120.into(),
			"field_class_double_nested".to_string() => Value::Map(indexmap! {
				"field_int_double_nested".to_string() => 13.into(),
			}),
		}),
	};

	assert_eq!(
		from_mapping::<RootNested>(&data, Context::default()).unwrap(),
		RootNested {
			field_int_root: 42,
			field_class_single_nested: SingleNested {
				field_int_single_nested: 120,
				field_class_double_nested: DoubleNested {
					field_int_double_nested: 13,
				},
			},
		}
	);
}

#[test]
fn nested_errors_are_located() {
	let data = indexmap! {
		"field_int_root".to_string() => 42.into(),
		"field_class_single_nested".to_string() => Value::Map(indexmap! {
			"field_int_single_nested".to_string() => 120.into(),
			"field_class_double_nested".to_string() => Value::Map(indexmap! {
				"field_int_double_nested".to_string() => "13".into(),
			}),
		}),
	};

	let error = from_mapping::<RootNested>(&data, Context::default()).unwrap_err();
	assert!(matches!(error.kind(), ErrorKind::TypeMismatch { .. }));
	assert_eq!(
		error.path_string(),
		"field_class_single_nested.field_class_double_nested.field_int_double_nested"
	);
}

#[test]
fn lists_of_records() {
	let data = indexmap! {
		"points".to_string() => Value::List(vec![
			Value::Map(indexmap! { "x".to_string() => 1.into() }),
			Value::Map(indexmap! { "x".to_string() => 2.into() }),
		]),
	};

	assert_eq!(
		from_mapping::<Polygon>(&data, Context::default()).unwrap(),
		Polygon {
			name: None,
			points: vec![Inner { x: 1 }, Inner { x: 2 }],
		}
	);
}

#[test]
fn list_element_errors_are_located() {
	let data = indexmap! {
		"name".to_string() => "triangle".into(),
		"points".to_string() => Value::List(vec![
			Value::Map(indexmap! { "x".to_string() => 1.into() }),
			Value::Map(indexmap! { "x".to_string() => "2".into() }),
		]),
	};

	let error = from_mapping::<Polygon>(&data, Context::default()).unwrap_err();
	assert_eq!(error.path_string(), "points[1].x");
}

#[test]
fn union_takes_first_non_null_alternative() {
	let expected = TypeExpr::union([TypeExpr::null(), TypeExpr::structured::<Inner>()]);

	match deserialize_value(&expected, Value::Map(inner_5()), Context::default()).unwrap() {
		Value::Instance(instance) => {
			assert_eq!(instance.downcast_ref::<Inner>(), Some(&Inner { x: 5 }));
		}
		other => panic!("Expected instance but found {:?}", other),
	}

	assert_eq!(
		deserialize_value(&expected, Value::Null, Context::default()).unwrap(),
		Value::Null
	);
	assert_eq!(
		deserialize_value(&TypeExpr::union([TypeExpr::null()]), Value::Null, Context::default())
			.unwrap(),
		Value::Null
	);
}

#[test]
fn mismatch_is_reported() {
	let error = deserialize_value(
		&TypeExpr::structured::<Inner>(),
		"x".into(),
		Context::default(),
	)
	.unwrap_err();
	assert!(matches!(
		error.kind(),
		ErrorKind::TypeMismatch { found, .. } if found == "string"
	));

	// Without validation, there is nothing to reinterpret.
	assert_eq!(
		deserialize_value(
			&TypeExpr::structured::<Inner>(),
			"x".into(),
			Context::default().validate_type(false),
		)
		.unwrap(),
		Value::from("x")
	);
}

#[test]
fn other_collections_pass_through() {
	let tuple = Value::Tuple(vec![1.into(), "a".into()]);
	assert_eq!(
		deserialize_value(
			&TypeExpr::tuple([TypeExpr::integer(), TypeExpr::string()]),
			tuple.clone(),
			Context::default()
		)
		.unwrap(),
		tuple
	);

	let map = Value::Map(indexmap! { "c".to_string() => Value::Map(inner_5()) });
	assert_eq!(
		deserialize_value(
			&TypeExpr::map(TypeExpr::structured::<Inner>()),
			map.clone(),
			Context::default()
		)
		.unwrap(),
		map
	);
}

#[test]
fn primitives_pass_through() {
	for (expected, value) in [
		(TypeExpr::integer(), Value::from(1)),
		(TypeExpr::string(), "a".into()),
		(TypeExpr::Unknown, 2.5.into()),
		(TypeExpr::optional(TypeExpr::boolean()), true.into()),
	] {
		assert_eq!(
			deserialize_value(&expected, value.clone(), Context::default()).unwrap(),
			value
		);
	}
}

#[test]
fn budget_limits_nesting() {
	let data = indexmap! { "inner".to_string() => Value::Map(inner_5()) };

	// One level: The nested record stays a map.
	let context = Context::default().recursion_budget(Some(1));
	assert_eq!(
		from_mapping::<Lenient>(&data, context).unwrap(),
		Lenient {
			inner: Value::Map(inner_5())
		}
	);
	let error = from_mapping::<Outer>(&data, context).unwrap_err();
	assert!(matches!(error.kind(), ErrorKind::Construction { .. }));
	assert_eq!(error.path_string(), "inner");

	assert_eq!(
		from_mapping::<Outer>(&data, Context::default().recursion_budget(Some(2))).unwrap(),
		Outer {
			inner: Inner { x: 5 }
		}
	);

	// Nothing at all.
	let raw = Value::Map(data);
	assert_eq!(
		deserialize_value(
			&TypeExpr::structured::<Outer>(),
			raw.clone(),
			Context::default().recursion_budget(Some(0))
		)
		.unwrap(),
		raw
	);
}

#[test]
fn cyclic_schemas_follow_the_data() {
	let data = indexmap! {
		"next".to_string() => Value::Map(indexmap! {
			"next".to_string() => Value::Map(indexmap! {
				"next".to_string() => Value::Null,
			}),
		}),
	};

	assert_eq!(
		from_mapping::<Chain>(&data, Context::default().unlimited()).unwrap(),
		Chain {
			next: Some(Box::new(Chain {
				next: Some(Box::new(Chain { next: None })),
			})),
		}
	);

	let error = from_mapping::<Chain>(&data, Context::default().recursion_budget(Some(2)))
		.unwrap_err();
	assert_eq!(error.path_string(), "next.next");
}
