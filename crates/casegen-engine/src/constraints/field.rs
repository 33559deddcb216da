use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use casegen_core::{CharacterSet, FieldCase};

use crate::constraints::{CachedValue, Constraint, NodeCore, NodeIdentity};
use crate::errors::GenerationError;
use crate::fields::Field;
use crate::generator::Generator;

/// Stateful leaf node backed by a [`Field`] algorithm.
///
/// Unrequested values serve each boundary position once before falling
/// back to random draws, so case enumeration covers min, avg and max.
#[derive(Debug)]
pub struct FieldConstraint {
    core: NodeCore,
    cache: CachedValue,
    field: Field,
    charset: Rc<CharacterSet>,
    boundaries: Vec<(FieldCase, i128)>,
    served: RefCell<BTreeSet<i128>>,
}

impl FieldConstraint {
    pub fn new(identity: NodeIdentity, field: Field, charset: Rc<CharacterSet>) -> Self {
        let boundaries = field.boundary_cases();
        Self {
            core: NodeCore::new(identity),
            cache: CachedValue::default(),
            field,
            charset,
            boundaries,
            served: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    fn pending_case(&self) -> Option<FieldCase> {
        let served = self.served.borrow();
        self.boundaries
            .iter()
            .find(|(_, key)| !served.contains(key))
            .map(|(case, _)| *case)
    }

    fn generate(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        let case = match case {
            FieldCase::Normal => self.pending_case().unwrap_or(FieldCase::Normal),
            other => other,
        };
        if case.is_boundary() {
            self.served
                .borrow_mut()
                .insert(self.field.boundary_key(case));
        }

        let mut rng = generator.rng();
        let value = self.field.generate(case, &self.charset, &mut *rng)?;
        Ok(Some(value))
    }
}

impl Constraint for FieldConstraint {
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
    }

    fn count_cases(&self, _generator: &Generator) -> Result<u64, GenerationError> {
        Ok(self.boundaries.len() as u64)
    }

    fn has_next_case(&self, _generator: &Generator) -> Result<bool, GenerationError> {
        Ok(self.pending_case().is_some())
    }

    fn reset_case(&self) {
        self.served.borrow_mut().clear();
    }
}
