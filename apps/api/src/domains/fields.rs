//! Profile Collector — field descriptors, generic validation and field-by-field edits.
//!
//! Every domain describes its form as a list of `FieldSpec`s. Validation and edits are
//! driven by that list against the profile's serialized (camelCase) shape, so the six
//! profiles share one implementation.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// A constrained value set rendered as a select control.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    /// Wire spelling, embedded verbatim in prompts.
    fn as_str(&self) -> &'static str;

    fn options() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// One of a fixed option list.
    Choice { options: Vec<&'static str> },
    /// Opaque text. Comma-separated lists are passed through unparsed.
    Text { optional: bool },
    /// Numeric-as-text input.
    Number {
        min: f64,
        max: Option<f64>,
        integer: bool,
        optional: bool,
    },
    /// Clock time, `HH:MM` in 24h.
    Time,
}

impl FieldSpec {
    pub fn choice<C: Choice>(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Choice {
                options: C::options(),
            },
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text { optional: false },
        }
    }

    pub fn optional_text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text { optional: true },
        }
    }

    pub fn number(name: &'static str, label: &'static str, min: f64, max: Option<f64>) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Number {
                min,
                max,
                integer: false,
                optional: false,
            },
        }
    }

    pub fn integer(name: &'static str, label: &'static str, min: f64, max: Option<f64>) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Number {
                min,
                max,
                integer: true,
                optional: false,
            },
        }
    }

    pub fn optional_number(
        name: &'static str,
        label: &'static str,
        min: f64,
        max: Option<f64>,
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Number {
                min,
                max,
                integer: false,
                optional: true,
            },
        }
    }

    pub fn time(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Time,
        }
    }

    /// Checks one raw value against this field's constraints.
    fn check(&self, raw: &str) -> Result<(), String> {
        let value = raw.trim();
        match &self.kind {
            FieldKind::Choice { options } => {
                if options.iter().any(|o| *o == value) {
                    Ok(())
                } else {
                    Err(format!(
                        "{} must be one of [{}]",
                        self.name,
                        options.join(", ")
                    ))
                }
            }
            FieldKind::Text { optional } => {
                if value.is_empty() && !optional {
                    Err(format!("{} is required", self.name))
                } else {
                    Ok(())
                }
            }
            FieldKind::Number {
                min,
                max,
                integer,
                optional,
            } => {
                if value.is_empty() {
                    return if *optional {
                        Ok(())
                    } else {
                        Err(format!("{} is required", self.name))
                    };
                }
                let number = parse_number(value)
                    .ok_or_else(|| format!("{} must be a number", self.name))?;
                if *integer && number.fract() != 0.0 {
                    return Err(format!("{} must be a whole number", self.name));
                }
                if number < *min {
                    return Err(format!("{} must be at least {min}", self.name));
                }
                if let Some(max) = max {
                    if number > *max {
                        return Err(format!("{} must be at most {max}", self.name));
                    }
                }
                Ok(())
            }
            FieldKind::Time => {
                if is_clock_time(value) {
                    Ok(())
                } else {
                    Err(format!("{} must be a time in HH:MM format", self.name))
                }
            }
        }
    }
}

/// Reads numeric-as-text input the same way validation does. `"9"`, `"9.0"` and
/// `"9e0"` are all the number nine.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_clock_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return false;
    }
    matches!(
        (hours.parse::<u8>(), minutes.parse::<u8>()),
        (Ok(h), Ok(m)) if h < 24 && m < 60
    )
}

fn as_object<P: Serialize>(profile: &P) -> Result<serde_json::Map<String, Value>, AppError> {
    match serde_json::to_value(profile) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Internal(anyhow::anyhow!(
            "profile did not serialize to an object"
        ))),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(
            "failed to serialize profile: {e}"
        ))),
    }
}

/// Validates every described field, reporting all problems at once.
pub fn validate_profile<P: Serialize>(fields: &[FieldSpec], profile: &P) -> Result<(), AppError> {
    let map = as_object(profile)?;

    let problems: Vec<String> = fields
        .iter()
        .filter_map(|field| {
            let raw = map.get(field.name).and_then(Value::as_str).unwrap_or("");
            field.check(raw).err()
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

/// Returns a copy of `profile` with one field replaced. Choice fields must name a
/// listed option; other fields accept in-progress input and are checked on submit.
pub fn apply_field<P>(
    fields: &[FieldSpec],
    profile: &P,
    name: &str,
    value: &str,
) -> Result<P, AppError>
where
    P: Serialize + DeserializeOwned,
{
    let field = fields
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| AppError::Validation(format!("Unknown field '{name}'")))?;

    if let FieldKind::Choice { .. } = field.kind {
        field.check(value).map_err(AppError::Validation)?;
    }

    let mut map = as_object(profile)?;
    map.insert(name.to_string(), Value::String(value.to_string()));

    serde_json::from_value(Value::Object(map))
        .map_err(|e| AppError::Validation(format!("Invalid value for '{name}': {e}")))
}
