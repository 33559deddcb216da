use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::debug;

use casegen_core::FieldCase;

use crate::constraints::{FixedValue, NodeIdentity};
use crate::errors::GenerationError;
use crate::generator::Generator;

/// Token value of a node that is not currently generating.
pub(crate) const NO_TOKEN: i64 = -1;

/// Replace every character with a space, keeping the character count.
pub fn blank(value: &str) -> String {
    " ".repeat(value.chars().count())
}

/// State shared by all node variants: identity, fixed-value override,
/// the re-entrancy token and the traversal mark.
pub struct NodeCore {
    identity: NodeIdentity,
    fixed_value: RefCell<Option<FixedValue>>,
    token: Cell<i64>,
    visiting: Cell<bool>,
}

impl fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCore")
            .field("identity", &self.identity)
            .field("fixed", &self.has_fixed_value())
            .field("token", &self.token.get())
            .finish()
    }
}

impl NodeCore {
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            fixed_value: RefCell::new(None),
            token: Cell::new(NO_TOKEN),
            visiting: Cell::new(false),
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// `Some(value)` when an override is installed, whatever it yields.
    ///
    /// An installed override is authoritative: a callback yielding `None`
    /// pins the node to null and generation is skipped. Clear the override
    /// to generate again.
    pub fn fixed_value(&self) -> Option<Option<String>> {
        // Clone the callback out so it may touch this node again.
        let callback = self.fixed_value.borrow().clone();
        callback.map(|callback| callback())
    }

    pub fn set_fixed_value(&self, value: Option<FixedValue>) {
        *self.fixed_value.borrow_mut() = value;
    }

    pub fn has_fixed_value(&self) -> bool {
        self.fixed_value.borrow().is_some()
    }

    /// Token held while this node is generating, or `-1`.
    pub fn token(&self) -> i64 {
        self.token.get()
    }

    /// Run `generate` under the re-entrancy guard.
    ///
    /// A node still holding a token older than the freshly issued one is
    /// being asked for a value from inside its own generation. The token is
    /// cleared when the guard drops, on success and on failure alike.
    pub fn guarded<F>(
        &self,
        generator: &Generator,
        case: FieldCase,
        generate: F,
    ) -> Result<Option<String>, GenerationError>
    where
        F: FnOnce() -> Result<Option<String>, GenerationError>,
    {
        let token = generator.current_token();
        let held = self.token.get();
        if held != NO_TOKEN && held < token {
            return Err(GenerationError::Reentrant {
                node: self.identity.to_string(),
            });
        }

        self.token.set(token);
        let _reset = TokenReset(&self.token);
        debug!(node = %self.identity, token, case = %case, "generating");

        generate().map_err(|err| GenerationError::in_node(self.identity.to_string(), err))
    }

    /// Stateless evaluation: override, else a fresh guarded generation.
    pub fn init_stateless<F>(
        &self,
        generator: &Generator,
        case: FieldCase,
        generate: F,
    ) -> Result<Option<String>, GenerationError>
    where
        F: FnOnce(FieldCase) -> Result<Option<String>, GenerationError>,
    {
        if let Some(value) = self.fixed_value() {
            return Ok(value);
        }
        self.guarded(generator, case, || generate(case))
    }

    /// Run a read-only walk (case counting, id collection) through this node.
    ///
    /// Reaching a node that is already on the walk means the references form
    /// a cycle; that fails with [`GenerationError::Reentrant`] instead of
    /// recursing forever.
    pub fn traverse<T, F>(&self, visit: F) -> Result<T, GenerationError>
    where
        F: FnOnce() -> Result<T, GenerationError>,
    {
        if self.visiting.replace(true) {
            return Err(GenerationError::Reentrant {
                node: self.identity.to_string(),
            });
        }
        let _reset = VisitReset(&self.visiting);

        visit().map_err(|err| GenerationError::in_node(self.identity.to_string(), err))
    }
}

struct VisitReset<'a>(&'a Cell<bool>);

impl Drop for VisitReset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct TokenReset<'a>(&'a Cell<i64>);

impl Drop for TokenReset<'_> {
    fn drop(&mut self) {
        self.0.set(NO_TOKEN);
    }
}

/// Per-pass value cache of a stateful node.
#[derive(Debug, Default)]
pub struct CachedValue {
    initialized: Cell<bool>,
    value: RefCell<Option<String>>,
}

impl CachedValue {
    /// Stateful evaluation.
    ///
    /// The first request of a pass computes the value (a blank request
    /// computes the default case and blanks it, a null request computes and
    /// discards). Later requests in the same pass derive from the cache.
    pub fn init<F>(
        &self,
        core: &NodeCore,
        generator: &Generator,
        case: FieldCase,
        generate: F,
    ) -> Result<Option<String>, GenerationError>
    where
        F: FnOnce(FieldCase) -> Result<Option<String>, GenerationError>,
    {
        if let Some(value) = core.fixed_value() {
            return Ok(value);
        }

        if self.initialized.get() {
            let cached = self.value.borrow().clone();
            return Ok(match case {
                FieldCase::Blank => cached.map(|value| blank(&value)),
                FieldCase::Null => None,
                _ => cached,
            });
        }

        let value = match case {
            FieldCase::Blank => core
                .guarded(generator, FieldCase::DEFAULT, || generate(FieldCase::DEFAULT))?
                .map(|value| blank(&value)),
            FieldCase::Null => {
                core.guarded(generator, case, || generate(case))?;
                None
            }
            _ => core.guarded(generator, case, || generate(case))?,
        };

        *self.value.borrow_mut() = value.clone();
        self.initialized.set(true);
        Ok(value)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn value(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    pub fn reset(&self) {
        self.initialized.set(false);
        *self.value.borrow_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keeps_character_count() {
        assert_eq!(blank("äbc"), "   ");
        assert_eq!(blank(""), "");
    }

    #[test]
    fn token_is_cleared_after_failure() {
        let generator = Generator::default();
        let core = NodeCore::new(NodeIdentity::root(Some("a"), None));

        let result = core.guarded(&generator, FieldCase::Normal, || {
            Err(GenerationError::InvalidField("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(core.token(), NO_TOKEN);
    }

    #[test]
    fn traversal_rejects_revisit_and_clears_mark() {
        let core = NodeCore::new(NodeIdentity::root(Some("a"), None));

        let err = core
            .traverse(|| core.traverse(|| Ok(1_u64)))
            .expect_err("nested visit must fail");
        assert!(err.is_reentrant());
        assert_eq!(err.node_path(), vec!["a", "a"]);

        assert_eq!(core.traverse(|| Ok(2_u64)).unwrap(), 2);
    }

    #[test]
    fn cache_serves_null_and_blank_from_first_value() {
        let generator = Generator::default();
        let core = NodeCore::new(NodeIdentity::root(Some("a"), None));
        let cache = CachedValue::default();

        let first = cache
            .init(&core, &generator, FieldCase::Normal, |_| Ok(Some("abcd".to_string())))
            .unwrap();
        assert_eq!(first.as_deref(), Some("abcd"));

        let blanked = cache
            .init(&core, &generator, FieldCase::Blank, |_| unreachable!())
            .unwrap();
        assert_eq!(blanked.as_deref(), Some("    "));

        let null = cache
            .init(&core, &generator, FieldCase::Null, |_| unreachable!())
            .unwrap();
        assert_eq!(null, None);
        assert_eq!(cache.value().as_deref(), Some("abcd"));
    }

    #[test]
    fn blank_first_request_uses_default_case() {
        let generator = Generator::default();
        let core = NodeCore::new(NodeIdentity::root(Some("a"), None));
        let cache = CachedValue::default();

        let value = cache
            .init(&core, &generator, FieldCase::Blank, |case| {
                assert_eq!(case, FieldCase::DEFAULT);
                Ok(Some("xyz".to_string()))
            })
            .unwrap();

        assert_eq!(value.as_deref(), Some("   "));
        assert_eq!(cache.value().as_deref(), Some("   "));
    }

    #[test]
    fn null_first_request_discards_generated_value() {
        let generator = Generator::default();
        let core = NodeCore::new(NodeIdentity::root(Some("a"), None));
        let cache = CachedValue::default();

        let value = cache
            .init(&core, &generator, FieldCase::Null, |_| Ok(Some("xyz".to_string())))
            .unwrap();

        assert_eq!(value, None);
        assert!(cache.is_initialized());
        let again = cache
            .init(&core, &generator, FieldCase::Normal, |_| unreachable!())
            .unwrap();
        assert_eq!(again, None);
    }
}
