use lsi_core::utils::toml_value_to_string;

use crate::error::{BuildError, Result};

/// Options from the `[package.metadata.lsi]` table of a Cargo manifest, with
/// nested tables flattened to dotted keys. A manifest without the table has
/// no options.
pub fn options_from_manifest(text: &str) -> Result<Vec<(String, String)>> {
    let manifest: toml::Table = toml::from_str(text).map_err(|err| BuildError::manifest(text, err))?;
    let table = manifest
        .get("package")
        .and_then(|package| package.get("metadata"))
        .and_then(|metadata| metadata.get("lsi"))
        .and_then(toml::Value::as_table);

    let mut options = Vec::new();
    if let Some(table) = table {
        flatten("", table, &mut options);
    }
    Ok(options)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(nested) => flatten(&key, nested, out),
            other => out.push((key, toml_value_to_string(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_manifest() {
        let options = options_from_manifest(
            r#"
            [package]
            name = "app"

            [package.metadata.lsi]
            dialect = "postgres"
            skip = ["Audit", "Session"]

            [package.metadata.lsi.table]
            prefix = "sys_"
            "#,
        )
        .unwrap();
        assert_eq!(
            options,
            vec![
                ("dialect".to_string(), "postgres".to_string()),
                ("skip".to_string(), "Audit,Session".to_string()),
                ("table.prefix".to_string(), "sys_".to_string()),
            ]
        );
    }

    #[test]
    fn test_manifest_without_metadata() {
        let options = options_from_manifest("[package]\nname = \"app\"\n").unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn test_invalid_manifest() {
        let err = options_from_manifest("[package").unwrap_err();
        assert!(matches!(*err, BuildError::Manifest { .. }));
    }
}
