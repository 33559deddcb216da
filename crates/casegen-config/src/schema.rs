use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::ConstraintConfig;

/// Emit the JSON Schema for constraint configuration documents.
pub fn config_json_schema() -> RootSchema {
    schema_for!(ConstraintConfig)
}
