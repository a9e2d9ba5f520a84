//! Schema-directed loading of untyped data trees into typed records.
//!
//! Records declare their fields once, through [`Structured::schema`].
//! A keyed [`Mapping`] (from [TAML](`taml`), any self-describing [Serde](`serde`) format or plain code)
//! is then reconciled against that declaration: Unknown keys, absent fields, defaults and
//! type mismatches are all handled according to a per-call [`Context`].
//!
//! For TAML syntax help, see the [`taml`] crate's documentation and <https://taml.schichler.dev>.
//!
//! # Example
//!
//! ```rust
//! use taml_schema::{from_taml_str, Context, Fields, Result, Schema, Structured, TypeExpr};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Window {
//! 	title: String,
//! 	size: Option<Size>,
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Size {
//! 	width: i64,
//! 	height: i64,
//! }
//!
//! impl Structured for Window {
//! 	fn schema() -> Schema {
//! 		Schema::new("Window")
//! 			.field("title", TypeExpr::string())
//! 			.field("size", TypeExpr::optional(TypeExpr::structured::<Size>()))
//! 	}
//!
//! 	fn construct(mut fields: Fields) -> Result<Self> {
//! 		Ok(Self {
//! 			title: fields.take("title")?,
//! 			size: fields.take("size")?,
//! 		})
//! 	}
//! }
//!
//! impl Structured for Size {
//! 	fn schema() -> Schema {
//! 		Schema::new("Size")
//! 			.field("width", TypeExpr::integer())
//! 			.field("height", TypeExpr::integer())
//! 	}
//!
//! 	fn construct(mut fields: Fields) -> Result<Self> {
//! 		Ok(Self {
//! 			width: fields.take("width")?,
//! 			height: fields.take("height")?,
//! 		})
//! 	}
//! }
//!
//! let mut diagnostics = vec![]; // Alternatively `()` to skip reporting, though ideally always print diagnostics.
//! let window: Window = from_taml_str(
//! 	"title: \"Hello\"\n\n# size\nwidth: 640\nheight: 480\n",
//! 	&mut diagnostics,
//! 	Context::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//! 	window,
//! 	Window {
//! 		title: "Hello".to_string(),
//! 		size: Some(Size {
//! 			width: 640,
//! 			height: 480,
//! 		}),
//! 	},
//! );
//! assert!(diagnostics.is_empty());
//! ```
//!
//! # Logging
//!
//! Schema declarations and each building step are narrated through the [`log`] facade,
//! at `debug` and `trace` level respectively. No logger is installed by this crate.

#![doc(html_root_url = "https://docs.rs/taml_schema/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(
	clippy::if_not_else,
	clippy::too_many_lines,
	clippy::module_name_repetitions,
	clippy::needless_pass_by_value
)]

/// Field reconciliation, recursive value conversion and the deserialization entry points.
pub mod de;
pub mod schema;
pub mod types;
pub mod value;

pub use de::{
	build_value, classify, deserialize_value, from_deserializer, from_mapping, from_taml_str,
	from_taml_tokens, from_taml_tree, from_value, Classification, Context, Error, ErrorKind,
	FieldCategory, Fields, FromValue, PathSegment, Result,
};
pub use schema::{schema_of, to_value, FieldDescriptor, Schema, Structured};
pub use types::{ContainerKind, PrimitiveKind, StructuredRef, TypeExpr};
pub use value::{Instance, Mapping, Shape, Value};

pub use taml;
