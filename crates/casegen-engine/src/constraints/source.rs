use std::collections::BTreeSet;

use casegen_core::FieldCase;

use crate::constraints::{ChildRef, Constraint, NodeCore, NodeIdentity};
use crate::errors::GenerationError;
use crate::generator::Generator;

/// Stateless node that forwards every request to its child.
#[derive(Debug)]
pub struct SourceConstraint {
    core: NodeCore,
    child: ChildRef,
}

impl SourceConstraint {
    pub fn new(identity: NodeIdentity, child: ChildRef) -> Self {
        Self {
            core: NodeCore::new(identity),
            child,
        }
    }

    pub fn child(&self) -> &ChildRef {
        &self.child
    }
}

impl Constraint for SourceConstraint {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn init_values(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        self.core.init_stateless(generator, case, |case| {
            self.child.resolve(generator)?.init_values(generator, case)
        })
    }

    fn reset_values(&self) {
        self.child.reset_values();
    }

    fn count_cases(&self, generator: &Generator) -> Result<u64, GenerationError> {
        self.core
            .traverse(|| self.child.resolve(generator)?.count_cases(generator))
    }

    fn has_next_case(&self, generator: &Generator) -> Result<bool, GenerationError> {
        self.core
            .traverse(|| self.child.resolve(generator)?.has_next_case(generator))
    }

    fn reset_case(&self) {
        self.child.reset_case();
    }

    fn contained_ids(&self, generator: &Generator) -> Result<BTreeSet<String>, GenerationError> {
        self.core.traverse(|| {
            let mut ids = self.child.contained_ids(generator)?;
            ids.extend(self.id().map(str::to_string));
            Ok(ids)
        })
    }
}
