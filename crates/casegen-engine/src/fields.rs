use chrono::format::{Item, StrftimeItems};
use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_regex::Regex as RandRegex;

use casegen_config::FieldSpec;
use casegen_core::{CharacterSet, FieldCase};

use crate::errors::GenerationError;

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_MAX_REPEAT: u32 = 32;

/// Leaf value algorithm of a field constraint.
///
/// Boundary cases (`min`, `avg`, `max`) map to fixed positions in the
/// field's domain; every other case draws uniformly.
#[derive(Debug, Clone)]
pub enum Field {
    Text {
        min_len: usize,
        max_len: usize,
    },
    Number {
        min: i64,
        max: i64,
    },
    Date {
        min: NaiveDate,
        max: NaiveDate,
        format: String,
    },
    Choice {
        values: Vec<String>,
    },
    Pattern {
        pattern: String,
        regex: RandRegex,
    },
}

impl Field {
    pub fn from_spec(spec: &FieldSpec) -> Result<Self, GenerationError> {
        match spec {
            FieldSpec::Text { min_len, max_len } => {
                if min_len > max_len {
                    return Err(GenerationError::InvalidField(format!(
                        "text min_len {min_len} exceeds max_len {max_len}"
                    )));
                }
                Ok(Field::Text {
                    min_len: *min_len,
                    max_len: *max_len,
                })
            }
            FieldSpec::Number { min, max } => {
                if min > max {
                    return Err(GenerationError::InvalidField(format!(
                        "number min {min} exceeds max {max}"
                    )));
                }
                Ok(Field::Number {
                    min: *min,
                    max: *max,
                })
            }
            FieldSpec::Date { min, max, format } => {
                let min = parse_date(min)?;
                let max = parse_date(max)?;
                if min > max {
                    return Err(GenerationError::InvalidField(format!(
                        "date min {min} is after max {max}"
                    )));
                }
                let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    return Err(GenerationError::InvalidField(format!(
                        "invalid date format '{format}'"
                    )));
                }
                Ok(Field::Date {
                    min,
                    max,
                    format: format.to_string(),
                })
            }
            FieldSpec::Choice { values } => {
                if values.is_empty() {
                    return Err(GenerationError::InvalidField(
                        "choice requires at least one value".to_string(),
                    ));
                }
                Ok(Field::Choice {
                    values: values.clone(),
                })
            }
            FieldSpec::Pattern {
                pattern,
                max_repeat,
            } => {
                let regex =
                    RandRegex::compile(pattern, max_repeat.unwrap_or(DEFAULT_MAX_REPEAT))
                        .map_err(|err| {
                            GenerationError::InvalidField(format!(
                                "invalid regex pattern '{pattern}': {err}"
                            ))
                        })?;
                Ok(Field::Pattern {
                    pattern: pattern.clone(),
                    regex,
                })
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Field::Text { .. } => "text",
            Field::Number { .. } => "number",
            Field::Date { .. } => "date",
            Field::Choice { .. } => "choice",
            Field::Pattern { .. } => "pattern",
        }
    }

    /// Position of a boundary case in the field's domain. Cases sharing a
    /// position produce the same value and count once.
    pub fn boundary_key(&self, case: FieldCase) -> i128 {
        let (low, high) = match self {
            Field::Text { min_len, max_len } => (*min_len as i128, *max_len as i128),
            Field::Number { min, max } => (*min as i128, *max as i128),
            Field::Date { min, max, .. } => (0, (*max - *min).num_days() as i128),
            Field::Choice { values } => (0, values.len() as i128 - 1),
            Field::Pattern { .. } => (0, 0),
        };
        match case {
            FieldCase::Min => low,
            FieldCase::Max => high,
            _ => low + (high - low) / 2,
        }
    }

    /// Boundary cases with distinct positions, in enumeration order.
    pub fn boundary_cases(&self) -> Vec<(FieldCase, i128)> {
        let mut cases: Vec<(FieldCase, i128)> = Vec::new();
        for case in FieldCase::BOUNDARIES {
            let key = self.boundary_key(case);
            if !cases.iter().any(|(_, seen)| *seen == key) {
                cases.push((case, key));
            }
        }
        cases
    }

    pub fn generate(
        &self,
        case: FieldCase,
        charset: &CharacterSet,
        rng: &mut dyn rand::RngCore,
    ) -> Result<String, GenerationError> {
        match self {
            Field::Text { min_len, max_len } => {
                let len = if case.is_boundary() {
                    self.boundary_key(case) as usize
                } else if min_len == max_len {
                    *min_len
                } else {
                    rng.random_range(*min_len..=*max_len)
                };
                let chars = charset.chars();
                let mut value = String::with_capacity(len);
                for _ in 0..len {
                    value.push(chars[rng.random_range(0..chars.len())]);
                }
                Ok(value)
            }
            Field::Number { min, max } => {
                let value = if case.is_boundary() {
                    self.boundary_key(case)
                } else {
                    rng.random_range(*min as i128..=*max as i128)
                };
                Ok(value.to_string())
            }
            Field::Date { min, max, format } => {
                let offset = if case.is_boundary() {
                    self.boundary_key(case) as u64
                } else {
                    rng.random_range(0..=(*max - *min).num_days()) as u64
                };
                let date = min.checked_add_days(Days::new(offset)).ok_or_else(|| {
                    GenerationError::InvalidField(format!("date offset {offset} out of range"))
                })?;
                Ok(date.format(format).to_string())
            }
            Field::Choice { values } => {
                let index = if case.is_boundary() {
                    self.boundary_key(case) as usize
                } else {
                    rng.random_range(0..values.len())
                };
                Ok(values[index].clone())
            }
            Field::Pattern { regex, .. } => Ok(rng.sample::<String, _>(regex)),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, GenerationError> {
    NaiveDate::parse_from_str(value, DATE_INPUT_FORMAT).map_err(|err| {
        GenerationError::InvalidField(format!("invalid date '{value}': {err}"))
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use casegen_core::CharacterSets;

    use super::*;

    fn field(spec: serde_json::Value) -> Field {
        Field::from_spec(&serde_json::from_value(spec).unwrap()).unwrap()
    }

    #[test]
    fn text_boundaries_follow_length_range() {
        let text = field(serde_json::json!({ "kind": "text", "min_len": 2, "max_len": 9 }));
        let charset = CharacterSets::new().get("lower").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(text.generate(FieldCase::Min, &charset, &mut rng).unwrap().len(), 2);
        assert_eq!(text.generate(FieldCase::Avg, &charset, &mut rng).unwrap().len(), 5);
        assert_eq!(text.generate(FieldCase::Max, &charset, &mut rng).unwrap().len(), 9);

        let value = text.generate(FieldCase::Normal, &charset, &mut rng).unwrap();
        assert!((2..=9).contains(&value.len()));
        assert!(value.chars().all(|ch| ch.is_ascii_lowercase()));
    }

    #[test]
    fn collapsed_ranges_have_one_boundary() {
        let fixed = field(serde_json::json!({ "kind": "text", "min_len": 8, "max_len": 8 }));
        assert_eq!(fixed.boundary_cases().len(), 1);

        let pair = field(serde_json::json!({ "kind": "number", "min": 1, "max": 2 }));
        assert_eq!(pair.boundary_cases().len(), 2);

        let range = field(serde_json::json!({ "kind": "number", "min": -5, "max": 5 }));
        assert_eq!(range.boundary_cases().len(), 3);
    }

    #[test]
    fn date_boundaries_use_format() {
        let date = field(serde_json::json!({
            "kind": "date", "min": "2024-01-01", "max": "2024-01-31", "format": "%d.%m.%Y"
        }));
        let charset = CharacterSets::new().get("alnum").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(date.generate(FieldCase::Min, &charset, &mut rng).unwrap(), "01.01.2024");
        assert_eq!(date.generate(FieldCase::Avg, &charset, &mut rng).unwrap(), "16.01.2024");
        assert_eq!(date.generate(FieldCase::Max, &charset, &mut rng).unwrap(), "31.01.2024");
    }

    #[test]
    fn pattern_values_match_expression() {
        let pattern = field(serde_json::json!({ "kind": "pattern", "pattern": "[1-9][0-9]{4}" }));
        let charset = CharacterSets::new().get("alnum").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let matcher = regex::Regex::new("^[1-9][0-9]{4}$").unwrap();

        for _ in 0..20 {
            let value = pattern.generate(FieldCase::Normal, &charset, &mut rng).unwrap();
            assert!(matcher.is_match(&value), "{value}");
        }
    }

    #[test]
    fn rejects_inverted_ranges_and_bad_formats() {
        let inverted: FieldSpec =
            serde_json::from_value(serde_json::json!({ "kind": "number", "min": 5, "max": 1 }))
                .unwrap();
        assert!(Field::from_spec(&inverted).is_err());

        let bad_format: FieldSpec = serde_json::from_value(serde_json::json!({
            "kind": "date", "min": "2024-01-01", "max": "2024-01-02", "format": "%Q"
        }))
        .unwrap();
        assert!(Field::from_spec(&bad_format).is_err());
    }
}
