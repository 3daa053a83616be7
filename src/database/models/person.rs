use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// A person record. `seq` is the externally addressed key; `id` is the
/// storage-assigned global key. Rows without a seq (never-backfilled legacy
/// data) are unreachable through owner-scoped operations.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Person {
    pub id: i64,
    #[serde(skip_serializing)]
    pub owner_id: Option<i64>,
    pub seq: Option<i64>,
    pub name: String,
    pub roll: String,
    pub age: i64,
    pub gender: String,
}

/// Full field set for Create and Replace. Deserializing `age` as u32 rejects
/// negative values at the wire boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonInput {
    pub name: String,
    pub roll: String,
    pub age: u32,
    pub gender: String,
}

impl PersonInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.roll.is_empty() {
            return Err("roll must not be empty".to_string());
        }
        if self.gender.is_empty() {
            return Err("gender must not be empty".to_string());
        }
        Ok(())
    }
}

/// Identity fields that a partial update may never name
const PROTECTED_FIELDS: &[&str] = &["id", "owner_id", "seq"];

/// Subset of mutable fields for PartialUpdate, built through an explicit
/// allow-list rather than reflective field-setting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub roll: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum PatchError {
    Empty,
    ProtectedField(String),
    NothingToApply,
    InvalidValue { field: String, expected: &'static str },
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::Empty => write!(f, "update payload must not be empty"),
            PatchError::ProtectedField(field) => {
                write!(f, "field '{}' cannot be modified", field)
            }
            PatchError::NothingToApply => {
                write!(f, "update payload contains no updatable fields")
            }
            PatchError::InvalidValue { field, expected } => {
                write!(f, "field '{}' must be {}", field, expected)
            }
        }
    }
}

impl PersonPatch {
    /// Build a patch from a JSON object. Protected identity fields are
    /// rejected, unknown fields are logged and skipped, and a payload that
    /// applies nothing is an error.
    pub fn from_json(payload: &Map<String, Value>) -> Result<Self, PatchError> {
        if payload.is_empty() {
            return Err(PatchError::Empty);
        }

        let mut patch = PersonPatch::default();
        let mut applied = 0usize;

        for (key, value) in payload {
            if PROTECTED_FIELDS.contains(&key.as_str()) {
                return Err(PatchError::ProtectedField(key.clone()));
            }

            match key.as_str() {
                "name" => {
                    patch.name = Some(expect_string(key, value)?);
                    applied += 1;
                }
                "roll" => {
                    patch.roll = Some(expect_string(key, value)?);
                    applied += 1;
                }
                "age" => {
                    let age = value.as_i64().filter(|a| *a >= 0).ok_or_else(|| {
                        PatchError::InvalidValue {
                            field: key.clone(),
                            expected: "a non-negative integer",
                        }
                    })?;
                    patch.age = Some(age);
                    applied += 1;
                }
                "gender" => {
                    patch.gender = Some(expect_string(key, value)?);
                    applied += 1;
                }
                other => {
                    tracing::warn!("Ignoring unknown update field '{}'", other);
                }
            }
        }

        if applied == 0 {
            return Err(PatchError::NothingToApply);
        }

        Ok(patch)
    }
}

fn expect_string(field: &str, value: &Value) -> Result<String, PatchError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| PatchError::InvalidValue {
            field: field.to_string(),
            expected: "a string",
        })
}
