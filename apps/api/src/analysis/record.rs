//! The seven-field résumé record and strict validation of LLM output into it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder for scalar fields the model could not find.
pub const NOT_FOUND: &str = "Non trouvé";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub entreprise: String,
    pub poste: String,
    pub duree: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub ecole: String,
    pub diplome: String,
    pub annee: String,
}

/// Structured résumé. Every key is always serialized; scalars fall back to
/// `NOT_FOUND`, lists to `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub competences: Vec<String>,
    pub experiences: Vec<Experience>,
    pub formations: Vec<Education>,
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            nom: NOT_FOUND.to_string(),
            prenom: NOT_FOUND.to_string(),
            email: NOT_FOUND.to_string(),
            telephone: NOT_FOUND.to_string(),
            competences: Vec::new(),
            experiences: Vec::new(),
            formations: Vec::new(),
        }
    }
}

impl ResumeRecord {
    /// True when nothing at all was extracted.
    pub fn is_blank(&self) -> bool {
        [&self.nom, &self.prenom, &self.email, &self.telephone]
            .iter()
            .all(|s| s.as_str() == NOT_FOUND)
            && self.competences.is_empty()
            && self.experiences.is_empty()
            && self.formations.is_empty()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("expected a JSON object at top level, got {0}")]
    NotAnObject(&'static str),

    #[error("field '{field}' must be {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Validates the parsed model output against the fixed schema.
///
/// Missing or null fields take their defaults; values of the wrong type are
/// rejected rather than reshaped. Unknown keys are ignored.
pub fn validate_record(value: &Value) -> Result<ResumeRecord, ValidationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ValidationError::NotAnObject(kind(value)))?;

    Ok(ResumeRecord {
        nom: scalar(obj, "nom")?,
        prenom: scalar(obj, "prenom")?,
        email: scalar(obj, "email")?,
        telephone: scalar(obj, "telephone")?,
        competences: list(obj, "competences", |item, field| {
            match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(wrong_type(field, "a string", other)),
            }
        })?
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect(),
        experiences: list(obj, "experiences", |item, field| {
            let entry = item
                .as_object()
                .ok_or_else(|| wrong_type(field, "an object", item))?;
            Ok(Experience {
                entreprise: scalar_at(entry, "entreprise", &format!("{field}.entreprise"))?,
                poste: scalar_at(entry, "poste", &format!("{field}.poste"))?,
                duree: scalar_at(entry, "duree", &format!("{field}.duree"))?,
            })
        })?,
        formations: list(obj, "formations", |item, field| {
            let entry = item
                .as_object()
                .ok_or_else(|| wrong_type(field, "an object", item))?;
            Ok(Education {
                ecole: scalar_at(entry, "ecole", &format!("{field}.ecole"))?,
                diplome: scalar_at(entry, "diplome", &format!("{field}.diplome"))?,
                annee: scalar_at(entry, "annee", &format!("{field}.annee"))?,
            })
        })?,
    })
}

fn scalar(obj: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    scalar_at(obj, field, field)
}

/// Reads `key` from `obj`, reporting type errors against `path`.
fn scalar_at(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(NOT_FOUND.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(NOT_FOUND.to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(wrong_type(path, "a string", other)),
    }
}

fn list<T>(
    obj: &Map<String, Value>,
    field: &str,
    item: impl Fn(&Value, &str) -> Result<T, ValidationError>,
) -> Result<Vec<T>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| item(v, &format!("{field}[{i}]")))
            .collect(),
        Some(other) => Err(wrong_type(field, "an array", other)),
    }
}

fn wrong_type(field: &str, expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::WrongType {
        field: field.to_string(),
        expected,
        found: kind(found),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
