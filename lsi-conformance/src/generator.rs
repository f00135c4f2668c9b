//! A generator written once against the views.

use eyre::Result;
use lsi_core::{Artifact, Class, Element, Environment, Generator, Sink};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ClassSchema {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    doc: String,
    supertypes: Vec<String>,
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Serialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    annotations: Vec<String>,
}

impl ClassSchema {
    fn of(class: &dyn Class) -> lsi_core::Result<Self> {
        let fields = class
            .fields()?
            .iter()
            .map(|field| {
                Ok(FieldSchema {
                    name: field.name().to_string(),
                    ty: field.ty()?.to_string(),
                    annotations: field
                        .annotations()
                        .iter()
                        .map(|a| a.simple_name().to_string())
                        .collect(),
                })
            })
            .collect::<lsi_core::Result<Vec<_>>>()?;
        Ok(Self {
            name: class.qualified_name().to_string(),
            kind: class.kind().as_str(),
            doc: class.documentation().to_string(),
            supertypes: class
                .supertypes()?
                .iter()
                .map(ToString::to_string)
                .collect(),
            fields,
        })
    }
}

/// Emits one JSON schema per class at `schema/<qualified name>.json`.
///
/// A class with an unresolved field is skipped with a warning, unless the
/// `schema.strict` option is set, in which case the run is aborted. Adapter
/// mismatches always abort.
#[derive(Debug, Default)]
pub struct SchemaGenerator;

impl Generator for SchemaGenerator {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn generate(
        &self,
        declarations: &[&dyn Element],
        env: &Environment,
        sink: &mut dyn Sink,
    ) -> Result<()> {
        let strict = env.option_parsed("schema.strict", false);
        for class in declarations.iter().filter_map(|d| d.as_class()) {
            match ClassSchema::of(class) {
                Ok(schema) => sink.emit(Artifact::new(
                    format!("schema/{}.json", schema.name),
                    serde_json::to_string_pretty(&schema)?,
                ))?,
                Err(err) if strict || err.is_fatal() => return Err(err.into()),
                Err(err) => env.logger().report(&err),
            }
        }
        Ok(())
    }
}
