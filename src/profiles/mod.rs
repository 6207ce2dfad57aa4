//! Entity profiles.
//!
//! A profile names one entity screen's exchange shape: its [`HeaderSchema`]
//! and its [`RuleSet`]. Profiles are data, loaded from TOML or JSON, so adding
//! an entity never needs a new parser.
//!
//! # File format
//!
//! ```toml
//! name = "asset"
//! description = "Hardware and software assets"
//!
//! [[columns]]
//! key = "asset_tag"
//! label = "Asset Tag"
//! kind = "text"
//!
//! [[columns]]
//! key = "status"
//! label = "Status"
//! kind = { enum = ["In Use", "Retired"] }
//!
//! [[rules]]
//! rule = "pattern"
//! field = "asset_tag"
//! value = "[A-Z]{2,5}-[0-9]{3,8}"
//! ```
//!
//! Rule types: `required`, `min_length`, `max_length`, `min_value`,
//! `max_value`, `pattern` (with `value`), `one_of` (with `values`) and
//! `cross_field` (with `other` and `comparison`).

use crate::io::{ExportService, ImportService, ToRecord, validate_form};
use crate::models::{
    ColumnSpec, Comparison, Constraint, FormValidation, HeaderSchema, ImportReport, Record,
    RuleSet, ValidationRule,
};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Built-in profile sources, by name.
const BUILTIN: &[(&str, &str)] = &[
    ("asset", include_str!("builtin/asset.toml")),
    ("incident", include_str!("builtin/incident.toml")),
    ("sla", include_str!("builtin/sla.toml")),
    ("vulnerability", include_str!("builtin/vulnerability.toml")),
];

/// Returns the names of the built-in profiles.
#[must_use]
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

/// Loads a built-in profile by name.
///
/// # Errors
///
/// Returns [`Error::InvalidProfile`] if no built-in profile has that name.
pub fn builtin(name: &str) -> Result<EntityProfile> {
    let (_, source) = BUILTIN
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| Error::InvalidProfile(format!("no built-in profile named '{name}'")))?;
    EntityProfile::from_toml_str(source)
}

/// One rule as written in a profile file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum RuleSpec {
    Required {
        field: String,
    },
    MinLength {
        field: String,
        value: usize,
    },
    MaxLength {
        field: String,
        value: usize,
    },
    MinValue {
        field: String,
        value: f64,
    },
    MaxValue {
        field: String,
        value: f64,
    },
    Pattern {
        field: String,
        value: String,
    },
    OneOf {
        field: String,
        values: Vec<String>,
    },
    CrossField {
        field: String,
        other: String,
        comparison: Comparison,
    },
}

impl RuleSpec {
    fn into_rule(self) -> Result<ValidationRule> {
        let (field, constraint) = match self {
            Self::Required { field } => (field, Constraint::Required),
            Self::MinLength { field, value } => (field, Constraint::MinLength(value)),
            Self::MaxLength { field, value } => (field, Constraint::MaxLength(value)),
            Self::MinValue { field, value } => (field, Constraint::MinValue(value)),
            Self::MaxValue { field, value } => (field, Constraint::MaxValue(value)),
            Self::Pattern { field, value } => {
                let constraint = Constraint::pattern(value)?;
                (field, constraint)
            },
            Self::OneOf { field, values } => (field, Constraint::one_of(values)),
            Self::CrossField {
                field,
                other,
                comparison,
            } => (field, Constraint::cross_field(other, comparison)),
        };
        Ok(ValidationRule::new(field, constraint))
    }
}

/// Profile file structure (for TOML and JSON parsing).
#[derive(Debug, Deserialize)]
struct ProfileFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

/// A named schema and rule set for one entity screen.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProfile {
    name: String,
    description: Option<String>,
    schema: HeaderSchema,
    rules: RuleSet,
}

impl EntityProfile {
    /// Creates a profile, checking that every rule targets a schema column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if a rule names an unknown field.
    pub fn new(name: impl Into<String>, schema: HeaderSchema, rules: RuleSet) -> Result<Self> {
        let name = name.into();
        rules
            .check_against(&schema)
            .map_err(|e| invalid(&name, &e))?;
        Ok(Self {
            name,
            description: None,
            schema,
            rules,
        })
    }

    /// Parses a profile from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if the text does not parse, the
    /// schema is invalid, a pattern does not compile, or a rule names an
    /// unknown field.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidProfile(format!("invalid profile TOML: {e}")))?;
        Self::from_profile_file(file)
    }

    /// Parses a profile from JSON.
    ///
    /// # Errors
    ///
    /// Same conditions as [`EntityProfile::from_toml_str`].
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(contents)
            .map_err(|e| Error::InvalidProfile(format!("invalid profile JSON: {e}")))?;
        Self::from_profile_file(file)
    }

    /// Loads a profile file, choosing the parser by extension (`.json` or TOML
    /// otherwise).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be read, or
    /// [`Error::InvalidProfile`] if its content is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_profile_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    fn from_profile_file(file: ProfileFile) -> Result<Self> {
        let name = file.name;
        let schema = HeaderSchema::new(file.columns).map_err(|e| invalid(&name, &e))?;
        let rules = file
            .rules
            .into_iter()
            .map(RuleSpec::into_rule)
            .collect::<Result<RuleSet>>()
            .map_err(|e| invalid(&name, &e))?;

        let mut profile = Self::new(name, schema, rules)?;
        profile.description = file.description;
        tracing::debug!(
            profile = %profile.name,
            columns = profile.schema.len(),
            rules = profile.rules.len(),
            "loaded profile"
        );
        Ok(profile)
    }

    /// Restricts a field to a list known only at run time, such as existing
    /// department names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if the field is not in the schema.
    pub fn with_reference_values<I, S>(mut self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.schema.contains(field) {
            return Err(Error::InvalidProfile(format!(
                "{}: reference values for unknown field '{field}'",
                self.name
            )));
        }
        self.rules
            .push(ValidationRule::new(field, Constraint::one_of(values)));
        Ok(self)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Column definitions.
    #[must_use]
    pub const fn schema(&self) -> &HeaderSchema {
        &self.schema
    }

    /// Validation rules.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Exports records with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export<I>(&self, records: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: ToRecord,
    {
        ExportService::default().export_records(records, &self.schema)
    }

    /// Imports a document with the default configuration.
    #[must_use]
    pub fn import(&self, document: &str) -> ImportReport {
        self.import_with(&ImportService::default(), document)
    }

    /// Imports a document through a configured service.
    #[must_use]
    pub fn import_with(&self, service: &ImportService, document: &str) -> ImportReport {
        service.import_document(document, &self.schema, &self.rules)
    }

    /// Validates a single form submission.
    #[must_use]
    pub fn validate_form(&self, record: &Record) -> FormValidation {
        validate_form(record, &self.rules)
    }
}

fn invalid(profile: &str, err: &Error) -> Error {
    let detail = match err {
        Error::InvalidSchema(msg) | Error::InvalidRule(msg) | Error::InvalidProfile(msg) => {
            msg.clone()
        },
        other => other.to_string(),
    };
    Error::InvalidProfile(format!("{profile}: {detail}"))
}
