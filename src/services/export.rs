//! Export transformer.
//!
//! Rebuilds the two flat documents the normalizer consumed:
//!
//! - **users**: one row per user, `{<users key>: id, <group>: 1 | null, ...}`
//!   with a column for every group.
//! - **reports**: one row per report, its stored attributes followed by a
//!   `groups` array listing every group that grants it.
//!
//! Rows and group columns follow the settings' display order, so one export
//! is deterministic. Normalizing the output reproduces an equal [`Settings`].

use super::normalizer::REPORT_GROUPS_FIELD;
use crate::config::PrimaryKeys;
use crate::models::Settings;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the exported users document.
pub const USERS_FILE_NAME: &str = "users.json";
/// File name of the exported reports document.
pub const REPORTS_FILE_NAME: &str = "reports.json";

/// The two exported documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    /// Users document rows.
    pub users: Vec<Value>,
    /// Reports document rows.
    pub reports: Vec<Value>,
}

impl ExportBundle {
    /// Serializes both documents as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if serialization fails.
    pub fn to_files(&self) -> Result<[(&'static str, String); 2]> {
        Ok([
            (USERS_FILE_NAME, serialize(&self.users)?),
            (REPORTS_FILE_NAME, serialize(&self.reports)?),
        ])
    }

    /// Writes `users.json` and `reports.json` into `dir`, creating it if
    /// needed. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the directory or either file
    /// cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|e| Error::OperationFailed {
            operation: "create_export_dir".to_string(),
            cause: format!("{}: {e}", dir.display()),
        })?;

        let mut written = Vec::with_capacity(2);
        for (name, contents) in self.to_files()? {
            let path = dir.join(name);
            fs::write(&path, contents).map_err(|e| Error::OperationFailed {
                operation: "write_export".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
            tracing::info!(path = %path.display(), "Export written");
            written.push(path);
        }
        Ok(written)
    }
}

fn serialize(rows: &[Value]) -> Result<String> {
    serde_json::to_string(rows).map_err(|e| Error::OperationFailed {
        operation: "serialize_export".to_string(),
        cause: e.to_string(),
    })
}

/// Converts settings back into the two source document shapes.
#[must_use]
pub fn to_original_shape(settings: &Settings, keys: &PrimaryKeys) -> ExportBundle {
    let users: Vec<Value> = settings
        .users()
        .iter()
        .map(|user_id| {
            let mut row = Map::new();
            row.insert(keys.users.clone(), Value::from(user_id.as_str()));
            for (group_id, group) in settings.groups() {
                let access = if group.has_user(user_id.as_str()) {
                    Value::from(1)
                } else {
                    Value::Null
                };
                row.insert(group_id.to_string(), access);
            }
            Value::Object(row)
        })
        .collect();

    let reports: Vec<Value> = settings
        .reports()
        .map(|(report_id, attributes)| {
            let mut row = attributes.clone();
            let groups = settings
                .groups_of_report(report_id.as_str())
                .map(|group_id| Value::from(group_id.as_str()))
                .collect();
            row.insert(REPORT_GROUPS_FIELD.to_string(), Value::Array(groups));
            Value::Object(row)
        })
        .collect();

    tracing::debug!(
        users = users.len(),
        reports = reports.len(),
        groups = settings.group_ids().len(),
        "Settings exported"
    );

    ExportBundle { users, reports }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupId, UserId};
    use crate::services::Normalizer;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn normalizer() -> Normalizer {
        Normalizer::new(PrimaryKeys::default())
    }

    fn sample() -> Settings {
        let users = json!([
            {"email": "a@x.com", "G1": 1, "G2": 0},
            {"email": "b@x.com", "G1": "", "G2": true}
        ]);
        let reports = json!([
            {"link": "r1", "title": "T1", "groups": ["G1", "G3"]},
            {"link": "r2", "description": "none"}
        ]);
        normalizer().normalize(users.as_array().unwrap(), reports.as_array().unwrap())
    }

    #[test]
    fn test_user_rows_have_every_group_column() {
        let bundle = to_original_shape(&sample(), &PrimaryKeys::default());
        assert_eq!(
            bundle.users,
            vec![
                json!({"email": "a@x.com", "G1": 1, "G2": null, "G3": null}),
                json!({"email": "b@x.com", "G1": null, "G2": 1, "G3": null}),
            ]
        );
    }

    #[test]
    fn test_report_rows_keep_attributes() {
        let bundle = to_original_shape(&sample(), &PrimaryKeys::default());
        assert_eq!(
            bundle.reports,
            vec![
                json!({"link": "r1", "title": "T1", "groups": ["G1", "G3"]}),
                json!({"link": "r2", "description": "none", "groups": []}),
            ]
        );
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let settings = sample();
        let bundle = to_original_shape(&settings, &PrimaryKeys::default());
        let again = normalizer().normalize(&bundle.users, &bundle.reports);
        assert_eq!(again, settings);
    }

    #[test]
    fn test_export_reflects_saved_membership() {
        let mut settings = sample();
        settings.replace_group(
            &GroupId::from("G1"),
            crate::models::Group::with_members(
                [UserId::from("b@x.com")].into_iter().collect(),
                BTreeSet::new(),
            ),
        );
        let bundle = to_original_shape(&settings, &PrimaryKeys::default());
        assert_eq!(bundle.users[0]["G1"], Value::Null);
        assert_eq!(bundle.users[1]["G1"], json!(1));
        assert_eq!(bundle.reports[0]["groups"], json!(["G3"]));
    }

    #[test]
    fn test_custom_primary_keys() {
        let keys = PrimaryKeys::new("login", "url");
        let users = json!([{"login": "u1", "G": 1}]);
        let reports = json!([{"url": "https://r", "groups": ["G"]}]);
        let settings = Normalizer::new(keys.clone())
            .normalize(users.as_array().unwrap(), reports.as_array().unwrap());
        let bundle = to_original_shape(&settings, &keys);
        assert_eq!(bundle.users, vec![json!({"login": "u1", "G": 1})]);
        assert_eq!(bundle.reports, vec![json!({"url": "https://r", "groups": ["G"]})]);
    }

    #[test]
    fn test_to_files_is_compact_json() {
        let bundle = to_original_shape(&sample(), &PrimaryKeys::default());
        let [(users_name, users), (reports_name, _)] = bundle.to_files().unwrap();
        assert_eq!(users_name, USERS_FILE_NAME);
        assert_eq!(reports_name, REPORTS_FILE_NAME);
        assert!(users.starts_with("[{\"email\":\"a@x.com\",\"G1\":1,"));
        assert!(!users.contains('\n'));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let bundle = to_original_shape(&sample(), &PrimaryKeys::default());

        let written = bundle.write_to_dir(&out).unwrap();

        assert_eq!(written.len(), 2);
        let users: Value =
            serde_json::from_str(&fs::read_to_string(out.join(USERS_FILE_NAME)).unwrap()).unwrap();
        assert_eq!(users, Value::Array(bundle.users));
    }

    #[test]
    fn test_empty_settings_export_empty_arrays() {
        let bundle = to_original_shape(&Settings::new(), &PrimaryKeys::default());
        assert!(bundle.users.is_empty());
        assert!(bundle.reports.is_empty());
        let [(_, users), (_, reports)] = bundle.to_files().unwrap();
        assert_eq!(users, "[]");
        assert_eq!(reports, "[]");
    }

    #[test]
    fn test_report_group_named_like_users_key_round_trips() {
        let users = json!([{"email": "a@x.com", "G1": 1}]);
        let reports = json!([{"link": "r1", "groups": ["email", "G1"]}]);
        let settings = normalizer().normalize(users.as_array().unwrap(), reports.as_array().unwrap());

        let bundle = to_original_shape(&settings, &PrimaryKeys::default());

        assert_eq!(bundle.users, vec![json!({"email": "a@x.com", "G1": 1})]);
        assert_eq!(normalizer().normalize(&bundle.users, &bundle.reports), settings);
    }
}
