//! Snapshot values, the available-fields catalog and rule validation

pub mod schema;
pub mod validator;
pub mod value;

pub use schema::{FieldCatalog, FieldDescriptor, FieldType};
pub use validator::{RuleValidator, ValidationError};
pub use value::{parse_number, Value};
