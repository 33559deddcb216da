use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{CoreError, Result};

/// Character set used when no node in the hierarchy declares one.
pub const DEFAULT_CHARSET_ID: &str = "alnum";

const BUILTIN: &[(&str, &str)] = &[
    ("alpha", "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"),
    (
        "alnum",
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    ),
    ("lower", "abcdefghijklmnopqrstuvwxyz"),
    ("upper", "ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
    ("numeric", "0123456789"),
];

/// Ordered, non-empty list of characters a text field may draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    id: String,
    chars: Vec<char>,
}

impl CharacterSet {
    pub fn new(id: impl Into<String>, chars: &str) -> Result<Self> {
        let id = id.into();
        let mut seen = Vec::new();
        for ch in chars.chars() {
            if !seen.contains(&ch) {
                seen.push(ch);
            }
        }
        if seen.is_empty() {
            return Err(CoreError::InvalidCharacterSet {
                id,
                reason: "must contain at least one character".to_string(),
            });
        }
        Ok(Self { id, chars: seen })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

/// Registry of named character sets, seeded with the built-in tables.
#[derive(Debug, Clone)]
pub struct CharacterSets {
    sets: BTreeMap<String, Rc<CharacterSet>>,
}

impl Default for CharacterSets {
    fn default() -> Self {
        let sets = BUILTIN
            .iter()
            .map(|(id, chars)| {
                (
                    id.to_string(),
                    Rc::new(CharacterSet {
                        id: id.to_string(),
                        chars: chars.chars().collect(),
                    }),
                )
            })
            .collect();
        Self { sets }
    }
}

impl CharacterSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a character set.
    pub fn insert(&mut self, id: &str, chars: &str) -> Result<()> {
        let set = CharacterSet::new(id, chars)?;
        self.sets.insert(id.to_string(), Rc::new(set));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Rc<CharacterSet>> {
        self.sets
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownCharacterSet(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sets.contains_key(id)
    }

    pub fn is_builtin(id: &str) -> bool {
        BUILTIN.iter().any(|(builtin, _)| *builtin == id)
    }
}
