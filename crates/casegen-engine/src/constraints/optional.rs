use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use casegen_core::{FairChoice, FieldCase};

use crate::constraints::{CachedValue, ChildRef, Constraint, NodeCore, NodeIdentity};
use crate::errors::GenerationError;
use crate::generator::Generator;

/// Whether an optional node must generate its child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mandatory {
    Always,
    Never,
    /// Mandatory while the named constraint yields a non-blank value.
    WhenPresent(String),
}

/// Stateful node that generates its child only when mandatory, when a
/// specific case is requested, or when the fair chooser says so. Otherwise
/// the child is asked for a null value.
#[derive(Debug)]
pub struct ConditionalOptional {
    core: NodeCore,
    cache: CachedValue,
    child: ChildRef,
    mandatory: Mandatory,
    choice: RefCell<FairChoice>,
    last_mandatory: Cell<Option<bool>>,
}

impl ConditionalOptional {
    pub fn new(identity: NodeIdentity, child: ChildRef, mandatory: Mandatory) -> Self {
        Self {
            core: NodeCore::new(identity),
            cache: CachedValue::default(),
            child,
            mandatory,
            choice: RefCell::new(FairChoice::new()),
            last_mandatory: Cell::new(None),
        }
    }

    pub fn child(&self) -> &ChildRef {
        &self.child
    }

    pub fn is_mandatory(&self, generator: &Generator) -> Result<bool, GenerationError> {
        if generator.ignore_optional_constraints() {
            return Ok(true);
        }
        match &self.mandatory {
            Mandatory::Always => Ok(true),
            Mandatory::Never => Ok(false),
            Mandatory::WhenPresent(id) => {
                let value = generator
                    .constraint(id)?
                    .init_values(generator, FieldCase::Normal)?;
                Ok(value.is_some_and(|value| !value.trim().is_empty()))
            }
        }
    }

    /// Mandatory decision known without generating anything. A
    /// `WhenPresent` rule reports the decision of the latest generation, or
    /// `None` before the first one since the last case reset.
    fn known_mandatory(&self, generator: &Generator) -> Option<bool> {
        if generator.ignore_optional_constraints() {
            return Some(true);
        }
        match &self.mandatory {
            Mandatory::Always => Some(true),
            Mandatory::Never => Some(false),
            Mandatory::WhenPresent(_) => self.last_mandatory.get(),
        }
    }

    fn generate(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError> {
        if case == FieldCase::Null {
            return Ok(None);
        }

        let child = self.child.resolve(generator)?;
        let present = case.is_explicit() || {
            let mandatory = self.is_mandatory(generator)?;
            self.last_mandatory.set(Some(mandatory));
            mandatory || {
                let mut rng = generator.rng();
                self.choice.borrow_mut().next(&mut *rng)
            }
        };

        if present {
            child.init_values(generator, case)
        } else {
            child.init_values(generator, FieldCase::Null)
        }
    }
}

impl Constraint for ConditionalOptional {
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
        self.child.reset_values();
    }

    /// Every child case plus its absence, counted both ways, plus the null case.
    fn count_cases(&self, generator: &Generator) -> Result<u64, GenerationError> {
        self.core.traverse(|| {
            let child = self.child.resolve(generator)?.count_cases(generator)?;
            Ok(child.saturating_mul(2).saturating_add(1))
        })
    }

    /// Read-only: a `WhenPresent` target is never asked for a value here.
    fn has_next_case(&self, generator: &Generator) -> Result<bool, GenerationError> {
        self.core.traverse(|| {
            let child_has_next = || -> Result<bool, GenerationError> {
                self.child.resolve(generator)?.has_next_case(generator)
            };
            match self.known_mandatory(generator) {
                Some(true) => child_has_next(),
                Some(false) => Ok(self.choice.borrow().has_next()),
                None => Ok(self.choice.borrow().has_next() || child_has_next()?),
            }
        })
    }

    /// Resets the chooser, and the child only when it is embedded; a
    /// referenced child keeps the enumeration state of its owner.
    fn reset_case(&self) {
        self.choice.borrow_mut().reset();
        self.last_mandatory.set(None);
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
