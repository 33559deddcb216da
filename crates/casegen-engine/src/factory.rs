use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::debug;

use casegen_config::{
    ChildSpec, ConstraintConfig, ConstraintKind, ConstraintSpec, MandatorySpec,
};
use casegen_core::{CharacterSets, DEFAULT_CHARSET_ID};

use crate::constraints::{
    ChildRef, CombinedConstraint, ConditionalOptional, ConstantConstraint, Constraint,
    FieldConstraint, Mandatory, NodeIdentity, SourceConstraint,
};
use crate::errors::GenerationError;
use crate::fields::Field;

/// Registry of constraint nodes by id, and builder for configured trees.
///
/// A node is registered under its id the moment it is built, so every
/// request for that id returns the same instance.
#[derive(Debug, Default)]
pub struct ConstraintFactory {
    nodes: BTreeMap<String, Rc<dyn Constraint>>,
    charsets: CharacterSets,
    pending_references: BTreeSet<String>,
}

impl ConstraintFactory {
    pub fn new(charsets: CharacterSets) -> Self {
        Self {
            nodes: BTreeMap::new(),
            charsets,
            pending_references: BTreeSet::new(),
        }
    }

    pub fn charsets(&self) -> &CharacterSets {
        &self.charsets
    }

    pub fn charsets_mut(&mut self) -> &mut CharacterSets {
        &mut self.charsets
    }

    /// Register a node under its id; anonymous nodes are not registered.
    pub fn register(&mut self, node: Rc<dyn Constraint>) -> Result<(), GenerationError> {
        let Some(id) = node.id() else {
            return Ok(());
        };
        if self.nodes.contains_key(id) {
            return Err(GenerationError::DuplicateId(id.to_string()));
        }
        self.nodes.insert(id.to_string(), node);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Rc<dyn Constraint>, GenerationError> {
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| GenerationError::IdNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> BTreeSet<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build every top-level constraint and return the root ids in order.
    pub fn build_config(
        &mut self,
        config: &ConstraintConfig,
    ) -> Result<Vec<String>, GenerationError> {
        for (id, chars) in &config.charsets {
            self.charsets.insert(id, chars)?;
        }

        let mut roots = Vec::with_capacity(config.constraints.len());
        for spec in &config.constraints {
            let node = self.build(spec, None)?;
            let id = node.id().ok_or_else(|| {
                GenerationError::InvalidConfig(format!(
                    "top-level {} constraint requires an id",
                    spec.type_name()
                ))
            })?;
            roots.push(id.to_string());
        }

        self.verify_references()?;
        debug!(
            constraints = self.nodes.len(),
            roots = roots.len(),
            "constraint tree built"
        );
        Ok(roots)
    }

    /// Build one node (and its embedded children) below `parent`.
    pub fn build(
        &mut self,
        spec: &ConstraintSpec,
        parent: Option<&NodeIdentity>,
    ) -> Result<Rc<dyn Constraint>, GenerationError> {
        let id = spec.id.as_deref();
        let charset = spec.charset.as_deref();
        let identity = match parent {
            Some(parent) => parent.child(id, charset),
            None => NodeIdentity::root(id, charset),
        };

        let node: Rc<dyn Constraint> = match &spec.kind {
            ConstraintKind::Constant { value } => {
                Rc::new(ConstantConstraint::new(identity, value.clone()))
            }
            ConstraintKind::Field { field } => {
                let field = Field::from_spec(field).map_err(|err| {
                    GenerationError::in_node(identity.to_string(), err)
                })?;
                let charset = self
                    .charsets
                    .get(identity.charset_id().unwrap_or(DEFAULT_CHARSET_ID))?;
                Rc::new(FieldConstraint::new(identity, field, charset))
            }
            ConstraintKind::Combined { parts, separator } => {
                let parts = parts
                    .iter()
                    .map(|part| self.child(part, &identity))
                    .collect::<Result<Vec<_>, _>>()?;
                Rc::new(CombinedConstraint::new(identity, parts, separator.clone()))
            }
            ConstraintKind::Optional { child, mandatory } => {
                let child = self.child(child, &identity)?;
                let mandatory = match mandatory {
                    MandatorySpec::Fixed(true) => Mandatory::Always,
                    MandatorySpec::Fixed(false) => Mandatory::Never,
                    MandatorySpec::WhenPresent { when_present } => {
                        self.pending_references.insert(when_present.clone());
                        Mandatory::WhenPresent(when_present.clone())
                    }
                };
                Rc::new(ConditionalOptional::new(identity, child, mandatory))
            }
            ConstraintKind::Source { child } => {
                let child = self.child(child, &identity)?;
                Rc::new(SourceConstraint::new(identity, child))
            }
        };

        self.register(Rc::clone(&node))?;
        Ok(node)
    }

    fn child(
        &mut self,
        spec: &ChildSpec,
        parent: &NodeIdentity,
    ) -> Result<ChildRef, GenerationError> {
        match spec {
            ChildSpec::Reference(reference) => {
                self.pending_references.insert(reference.id.clone());
                Ok(ChildRef::Referenced(reference.id.clone()))
            }
            ChildSpec::Embedded(spec) => Ok(ChildRef::Embedded(self.build(spec, Some(parent))?)),
        }
    }

    /// Fail on the first referenced id that was never built.
    pub fn verify_references(&self) -> Result<(), GenerationError> {
        match self
            .pending_references
            .iter()
            .find(|id| !self.nodes.contains_key(*id))
        {
            Some(missing) => Err(GenerationError::IdNotFound(missing.clone())),
            None => Ok(()),
        }
    }
}
