use taml_schema::{
	from_deserializer, from_value, Context, ErrorKind, Fields, Result, Schema, Structured,
	TypeExpr, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Primitives {
	int: i64,
	boolean: bool,
	string: String,
	float: f64,
	nothing: Option<String>,
}
impl Structured for Primitives {
	fn schema() -> Schema {
		Schema::new("Primitives")
			.field("int", TypeExpr::integer())
			.field("boolean", TypeExpr::boolean())
			.field("string", TypeExpr::string())
			.field("float", TypeExpr::float())
			.field("nothing", TypeExpr::optional(TypeExpr::string()))
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			int: fields.take("int")?,
			boolean: fields.take("boolean")?,
			string: fields.take("string")?,
			float: fields.take("float")?,
			nothing: fields.take("nothing")?,
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Nested {
	id: u8,
	children: Vec<Nested>,
}
impl Structured for Nested {
	fn schema() -> Schema {
		Schema::new("Nested")
			.field("id", TypeExpr::integer())
			.field_with_default(
				"children",
				TypeExpr::list(TypeExpr::structured::<Nested>()),
				Value::List(vec![]),
			)
	}

	fn construct(mut fields: Fields) -> Result<Self> {
		Ok(Self {
			id: fields.take("id")?,
			children: fields.take("children")?,
		})
	}
}

const PRIMITIVES: &str = r#"{
	"int": -42,
	"string": "Hello world !",
	"float": 2.0,
	"boolean": true,
	"nothing": null
}"#;

fn primitives() -> Primitives {
	Primitives {
		int: -42,
		boolean: true,
		string: "Hello world !".to_string(),
		float: 2.0,
		nothing: None,
	}
}

#[test]
fn from_json_deserializer() {
	assert_eq!(
		from_deserializer::<Primitives, _>(
			&mut serde_json::Deserializer::from_str(PRIMITIVES),
			Context::default()
		)
		.unwrap(),
		primitives()
	);
}

#[test]
fn from_json_value() {
	let value: Value = serde_json::from_str(PRIMITIVES).unwrap();
	assert_eq!(
		from_value::<Primitives>(value, Context::default()).unwrap(),
		primitives()
	);
}

#[test]
fn json_nesting() {
	let json = r#"{ "id": 1, "children": [{ "id": 2 }, { "id": 3, "children": [{ "id": 4 }] }] }"#;
	assert_eq!(
		from_deserializer::<Nested, _>(
			&mut serde_json::Deserializer::from_str(json),
			Context::default()
		)
		.unwrap(),
		Nested {
			id: 1,
			children: vec![
				Nested {
					id: 2,
					children: vec![]
				},
				Nested {
					id: 3,
					children: vec![Nested {
						id: 4,
						children: vec![]
					}]
				},
			]
		}
	);
}

#[test]
fn out_of_range_for_field() {
	let json = r#"{ "id": 256 }"#;
	let error = from_deserializer::<Nested, _>(
		&mut serde_json::Deserializer::from_str(json),
		Context::default(),
	)
	.unwrap_err();
	assert!(matches!(error.kind(), ErrorKind::Construction { .. }));
	assert_eq!(error.path_string(), "id");
}

#[test]
fn invalid_input() {
	for json in ["{ \"id\": ", "{ \"id\": 18446744073709551615 }"] {
		let error = from_deserializer::<Nested, _>(
			&mut serde_json::Deserializer::from_str(json),
			Context::default(),
		)
		.unwrap_err();
		assert!(
			matches!(error.kind(), ErrorKind::Input { .. }),
			"{:?}",
			error
		);
	}
}

#[test]
fn not_a_map() {
	let error = from_deserializer::<Nested, _>(
		&mut serde_json::Deserializer::from_str("[1, 2]"),
		Context::default(),
	)
	.unwrap_err();
	assert!(matches!(error.kind(), ErrorKind::TypeMismatch { .. }));
}
