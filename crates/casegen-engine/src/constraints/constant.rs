use std::cell::Cell;

use casegen_core::FieldCase;

use crate::constraints::{Constraint, NodeCore, NodeIdentity, blank};
use crate::errors::GenerationError;
use crate::generator::Generator;

/// Stateless node that always yields the same string.
#[derive(Debug)]
pub struct ConstantConstraint {
    core: NodeCore,
    value: String,
    served: Cell<bool>,
}

impl ConstantConstraint {
    pub fn new(identity: NodeIdentity, value: impl Into<String>) -> Self {
        Self {
            core: NodeCore::new(identity),
            value: value.into(),
            served: Cell::new(false),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Constraint for ConstantConstraint {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn init_values(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        self.core.init_stateless(generator, case, |case| {
            Ok(match case {
                FieldCase::Null => None,
                FieldCase::Blank => Some(blank(&self.value)),
                _ => {
                    self.served.set(true);
                    Some(self.value.clone())
                }
            })
        })
    }

    fn reset_values(&self) {}

    fn count_cases(&self, _generator: &Generator) -> Result<u64, GenerationError> {
        Ok(1)
    }

    fn has_next_case(&self, _generator: &Generator) -> Result<bool, GenerationError> {
        Ok(!self.served.get())
    }

    fn reset_case(&self) {
        self.served.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: &str) -> ConstantConstraint {
        ConstantConstraint::new(NodeIdentity::root(Some("c"), None), value)
    }

    #[test]
    fn honours_null_and_blank() {
        let generator = Generator::default();
        let node = constant("@example.com");

        assert_eq!(
            node.init_values(&generator, FieldCase::Max).unwrap().as_deref(),
            Some("@example.com")
        );
        assert_eq!(node.init_values(&generator, FieldCase::Null).unwrap(), None);
        assert_eq!(
            node.init_values(&generator, FieldCase::Blank).unwrap().as_deref(),
            Some("            ")
        );
    }

    #[test]
    fn single_case_is_exhausted_after_first_value() {
        let generator = Generator::default();
        let node = constant("x");

        assert_eq!(node.count_cases(&generator).unwrap(), 1);
        assert!(node.has_next_case(&generator).unwrap());
        node.init_values(&generator, FieldCase::Normal).unwrap();
        assert!(!node.has_next_case(&generator).unwrap());
        node.reset_case();
        assert!(node.has_next_case(&generator).unwrap());
    }
}
