use std::collections::BTreeSet;

use casegen_core::FieldCase;

use crate::constraints::{CachedValue, ChildRef, Constraint, NodeCore, NodeIdentity};
use crate::errors::GenerationError;
use crate::generator::Generator;

/// Stateful node joining the values of its parts.
///
/// Null parts are skipped; the node is null when every part is.
#[derive(Debug)]
pub struct CombinedConstraint {
    core: NodeCore,
    cache: CachedValue,
    parts: Vec<ChildRef>,
    separator: String,
}

impl CombinedConstraint {
    pub fn new(identity: NodeIdentity, parts: Vec<ChildRef>, separator: impl Into<String>) -> Self {
        Self {
            core: NodeCore::new(identity),
            cache: CachedValue::default(),
            parts,
            separator: separator.into(),
        }
    }

    pub fn parts(&self) -> &[ChildRef] {
        &self.parts
    }

    fn generate(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        let mut values = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            if let Some(value) = part.resolve(generator)?.init_values(generator, case)? {
                values.push(value);
            }
        }
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.join(&self.separator)))
    }
}

impl Constraint for CombinedConstraint {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn init_values(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        self.cache
            .init(&self.core, generator, case, |case| self.generate(generator, case))
    }

    fn reset_values(&self) {
        self.cache.reset();
        for part in &self.parts {
            part.reset_values();
        }
    }

    /// Parts advance in lockstep, so the widest part sets the count.
    fn count_cases(&self, generator: &Generator) -> Result<u64, GenerationError> {
        self.core.traverse(|| {
            let mut count = 1;
            for part in &self.parts {
                count = count.max(part.resolve(generator)?.count_cases(generator)?);
            }
            Ok(count)
        })
    }

    fn has_next_case(&self, generator: &Generator) -> Result<bool, GenerationError> {
        self.core.traverse(|| {
            for part in &self.parts {
                if part.resolve(generator)?.has_next_case(generator)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    fn reset_case(&self) {
        for part in &self.parts {
            part.reset_case();
        }
    }

    fn contained_ids(&self, generator: &Generator) -> Result<BTreeSet<String>, GenerationError> {
        self.core.traverse(|| {
            let mut ids: BTreeSet<String> = self.id().map(str::to_string).into_iter().collect();
            for part in &self.parts {
                ids.extend(part.contained_ids(generator)?);
            }
            Ok(ids)
        })
    }
}
