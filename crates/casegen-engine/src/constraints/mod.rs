//! Constraint node family.
//!
//! Every node produces a value for a [`FieldCase`], can be pinned to a
//! fixed value, and reports how many distinct cases it covers. Stateful
//! nodes cache their value for the current pass until `reset_values`.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use casegen_core::FieldCase;

use crate::errors::GenerationError;
use crate::generator::Generator;

mod base;
mod combined;
mod constant;
mod field;
mod optional;
mod source;

pub use base::{CachedValue, NodeCore, blank};
pub use combined::CombinedConstraint;
pub use constant::ConstantConstraint;
pub use field::FieldConstraint;
pub use optional::{ConditionalOptional, Mandatory};
pub use source::SourceConstraint;

/// Identity reported for nodes without an id anywhere in their ancestry.
pub const ANONYMOUS_ID: &str = "<anonymous>";

/// Deferred fixed value installed on a node; evaluated on every request.
pub type FixedValue = Rc<dyn Fn() -> Option<String>>;

/// Fixed value that always yields `value`.
pub fn fixed_value(value: impl Into<String>) -> FixedValue {
    let value = value.into();
    Rc::new(move || Some(value.clone()))
}

/// Id, nearest ancestor id and inherited character set of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    id: Option<String>,
    last_id: String,
    charset_id: Option<String>,
}

impl NodeIdentity {
    /// Identity of a node with no parent.
    pub fn root(id: Option<&str>, charset_id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            last_id: id.unwrap_or(ANONYMOUS_ID).to_string(),
            charset_id: charset_id.map(str::to_string),
        }
    }

    /// Identity of a node nested below `self`; unset values are inherited.
    pub fn child(&self, id: Option<&str>, charset_id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            last_id: id.unwrap_or(&self.last_id).to_string(),
            charset_id: charset_id
                .map(str::to_string)
                .or_else(|| self.charset_id.clone()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Own id, or the nearest ancestor's id.
    pub fn last_id(&self) -> &str {
        &self.last_id
    }

    pub fn charset_id(&self) -> Option<&str> {
        self.charset_id.as_deref()
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => f.write_str(id),
            None => write!(f, "{} (anonymous child)", self.last_id),
        }
    }
}

/// Common contract of every constraint node.
///
/// Methods that may need to follow references take the owning
/// [`Generator`], which resolves ids and hands out the re-entrancy tokens.
pub trait Constraint: fmt::Debug {
    fn core(&self) -> &NodeCore;

    fn id(&self) -> Option<&str> {
        self.core().identity().id()
    }

    fn last_id_in_hierarchy(&self) -> &str {
        self.core().identity().last_id()
    }

    fn character_set_id(&self) -> Option<&str> {
        self.core().identity().charset_id()
    }

    /// Value for `case`; `None` stands for a null value.
    fn init_values(
        &self,
        generator: &Generator,
        case: FieldCase,
    ) -> Result<Option<String>, GenerationError>;

    /// Discard the cached value here and in owned children.
    fn reset_values(&self);

    /// Install or clear a fixed value. The override wins over any case.
    fn set_fixed_value_override(&self, value: Option<FixedValue>) {
        self.core().set_fixed_value(value);
    }

    fn has_fixed_value_override(&self) -> bool {
        self.core().has_fixed_value()
    }

    /// Number of distinct cases this node covers.
    fn count_cases(&self, generator: &Generator) -> Result<u64, GenerationError>;

    /// True while cases remain that have not been produced since the last reset.
    fn has_next_case(&self, generator: &Generator) -> Result<bool, GenerationError>;

    /// Restart case enumeration here and in owned children.
    fn reset_case(&self);

    /// Own id plus the ids of every reachable descendant.
    fn contained_ids(&self, generator: &Generator) -> Result<BTreeSet<String>, GenerationError> {
        let _ = generator;
        Ok(self.id().map(str::to_string).into_iter().collect())
    }
}

/// Child slot of a composite node.
///
/// Embedded children are owned and follow their parent's resets. Referenced
/// children belong to another part of the tree and are looked up by id.
#[derive(Debug, Clone)]
pub enum ChildRef {
    Embedded(Rc<dyn Constraint>),
    Referenced(String),
}

impl ChildRef {
    pub fn resolve(&self, generator: &Generator) -> Result<Rc<dyn Constraint>, GenerationError> {
        match self {
            ChildRef::Embedded(node) => Ok(Rc::clone(node)),
            ChildRef::Referenced(id) => generator.constraint(id),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, ChildRef::Embedded(_))
    }

    pub fn reset_values(&self) {
        if let ChildRef::Embedded(node) = self {
            node.reset_values();
        }
    }

    pub fn reset_case(&self) {
        if let ChildRef::Embedded(node) = self {
            node.reset_case();
        }
    }

    pub fn contained_ids(&self, generator: &Generator) -> Result<BTreeSet<String>, GenerationError> {
        self.resolve(generator)?.contained_ids(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_identity_inherits_id_and_charset() {
        let root = NodeIdentity::root(Some("login"), Some("lower"));
        let anonymous = root.child(None, None);
        assert_eq!(anonymous.id(), None);
        assert_eq!(anonymous.last_id(), "login");
        assert_eq!(anonymous.charset_id(), Some("lower"));

        let named = anonymous.child(Some("login.user"), Some("upper"));
        assert_eq!(named.last_id(), "login.user");
        assert_eq!(named.charset_id(), Some("upper"));
    }

    #[test]
    fn anonymous_root_uses_placeholder() {
        let identity = NodeIdentity::root(None, None);
        assert_eq!(identity.last_id(), ANONYMOUS_ID);
        assert_eq!(identity.to_string(), "<anonymous> (anonymous child)");
    }

    #[test]
    fn fixed_value_is_reevaluated() {
        let value = fixed_value("pinned");
        assert_eq!(value(), Some("pinned".to_string()));
        assert_eq!(value(), Some("pinned".to_string()));
    }
}
