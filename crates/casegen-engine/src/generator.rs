use std::cell::{Cell, RefCell, RefMut};
use std::collections::BTreeSet;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use casegen_config::{
    ConstraintConfig, GeneratorSettings, load_config, load_indexed_fields,
    validate_config_semantics,
};
use casegen_core::{CharacterSets, DataSet, FieldCase, InMemoryDataSet};

use crate::constraints::{Constraint, FixedValue, fixed_value};
use crate::errors::GenerationError;
use crate::factory::ConstraintFactory;

/// Runtime switches of a [`Generator`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Seed override; wins over the configuration seed.
    pub seed: Option<u64>,
    /// Treat every optional constraint as mandatory.
    pub ignore_optional_constraints: bool,
    /// Deterministic mode: seed 0 when nothing else is configured.
    pub test_mode: bool,
    /// Root ids whose values get the 1-based data-set index appended.
    pub indexed_fields: BTreeSet<String>,
}

impl GeneratorOptions {
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GenerationError> {
        let indexed_fields = match &settings.indexed_fields_file {
            Some(path) => load_indexed_fields(path)?,
            None => BTreeSet::new(),
        };
        Ok(Self {
            seed: settings.seed,
            ignore_optional_constraints: settings.ignore_optional_constraints,
            test_mode: settings.test_mode,
            indexed_fields,
        })
    }
}

/// Owner of the constraint tree and of the per-run generation state.
///
/// Hands out monotonically increasing tokens for re-entrancy detection and
/// the seeded random source shared by every node.
#[derive(Debug)]
pub struct Generator {
    factory: ConstraintFactory,
    roots: Vec<String>,
    token: Cell<i64>,
    rng: RefCell<ChaCha8Rng>,
    seed: u64,
    ignore_optional_constraints: bool,
    indexed_fields: BTreeSet<String>,
    data_set_index: Cell<u64>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorOptions::default())
    }
}

impl Generator {
    /// Empty generator; nodes are added with [`Generator::add_root`].
    pub fn new(options: GeneratorOptions) -> Self {
        Self::with_factory(ConstraintFactory::new(CharacterSets::new()), options, None)
    }

    fn with_factory(
        factory: ConstraintFactory,
        options: GeneratorOptions,
        config_seed: Option<u64>,
    ) -> Self {
        let seed = match options.seed.or(config_seed) {
            Some(seed) => seed,
            None if options.test_mode => 0,
            None => rand::random(),
        };
        Self {
            factory,
            roots: Vec::new(),
            token: Cell::new(0),
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
            seed,
            ignore_optional_constraints: options.ignore_optional_constraints,
            indexed_fields: options.indexed_fields,
            data_set_index: Cell::new(0),
        }
    }

    /// Build a generator from a parsed configuration.
    pub fn from_config(
        config: &ConstraintConfig,
        options: GeneratorOptions,
    ) -> Result<Self, GenerationError> {
        let report = validate_config_semantics(config);
        if !report.is_ok() {
            return Err(GenerationError::InvalidConfig(report.summary()));
        }

        let mut factory = ConstraintFactory::new(CharacterSets::new());
        let roots = factory.build_config(config)?;

        let mut generator = Self::with_factory(factory, options, config.seed);
        generator.roots = roots;

        for id in &generator.indexed_fields {
            if !generator.roots.contains(id) {
                warn!(id = %id, "indexed field is not a top-level constraint");
            }
        }

        info!(
            constraints = generator.factory.len(),
            roots = generator.roots.len(),
            seed = generator.seed,
            "generator ready"
        );
        Ok(generator)
    }

    /// Load the configuration named by `settings` and build a generator.
    pub fn load(settings: &GeneratorSettings) -> Result<Self, GenerationError> {
        let validated = load_config(&settings.config_file)?;
        for warning in &validated.warnings {
            warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }
        Self::from_config(&validated.config, GeneratorOptions::from_settings(settings)?)
    }

    /// Register `node` and generate it on every pass.
    pub fn add_root(&mut self, node: Rc<dyn Constraint>) -> Result<(), GenerationError> {
        let id = node
            .id()
            .ok_or_else(|| {
                GenerationError::InvalidConfig("root constraints require an id".to_string())
            })?
            .to_string();
        self.factory.register(node)?;
        self.roots.push(id);
        Ok(())
    }

    pub fn factory(&self) -> &ConstraintFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ConstraintFactory {
        &mut self.factory
    }

    /// Current token; the counter advances on every call.
    pub fn current_token(&self) -> i64 {
        let token = self.token.get();
        self.token.set(token + 1);
        token
    }

    /// Number of tokens handed out so far.
    pub fn tokens_issued(&self) -> i64 {
        self.token.get()
    }

    pub fn constraint(&self, id: &str) -> Result<Rc<dyn Constraint>, GenerationError> {
        self.factory.get(id)
    }

    pub fn constraint_ids(&self) -> BTreeSet<String> {
        self.factory.ids()
    }

    pub fn root_ids(&self) -> &[String] {
        &self.roots
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ignore_optional_constraints(&self) -> bool {
        self.ignore_optional_constraints
    }

    pub fn indexed_fields(&self) -> &BTreeSet<String> {
        &self.indexed_fields
    }

    pub(crate) fn rng(&self) -> RefMut<'_, ChaCha8Rng> {
        self.rng.borrow_mut()
    }

    /// Value of one constraint for `case`, within the current pass.
    pub fn value(&self, id: &str, case: FieldCase) -> Result<Option<String>, GenerationError> {
        self.constraint(id)?.init_values(self, case)
    }

    /// Ids of the constraint and everything reachable below it.
    pub fn contained_ids(&self, id: &str) -> Result<BTreeSet<String>, GenerationError> {
        self.constraint(id)?.contained_ids(self)
    }

    pub fn set_fixed_value(
        &self,
        id: &str,
        value: Option<FixedValue>,
    ) -> Result<(), GenerationError> {
        self.constraint(id)?.set_fixed_value_override(value);
        Ok(())
    }

    /// Pin every constraint the data set fixes; clear the rest.
    pub fn apply_fixed_values(&self, data_set: &dyn DataSet) -> Result<(), GenerationError> {
        for id in self.factory.ids() {
            let value = data_set.fixed_value(&id).map(|value| fixed_value(value));
            self.set_fixed_value(&id, value)?;
        }
        Ok(())
    }

    /// Start a new pass: discard every cached value.
    pub fn reset_values(&self) -> Result<(), GenerationError> {
        for id in &self.roots {
            self.constraint(id)?.reset_values();
        }
        Ok(())
    }

    pub fn reset_cases(&self) -> Result<(), GenerationError> {
        for id in &self.roots {
            self.constraint(id)?.reset_case();
        }
        Ok(())
    }

    /// Roots advance together, so the widest root sets the count.
    pub fn count_cases(&self) -> Result<u64, GenerationError> {
        let mut count = 0;
        for id in &self.roots {
            count = count.max(self.constraint(id)?.count_cases(self)?);
        }
        Ok(count)
    }

    pub fn has_next_case(&self) -> Result<bool, GenerationError> {
        for id in &self.roots {
            if self.constraint(id)?.has_next_case(self)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run one pass and store every root value in `data_set`.
    pub fn generate(
        &self,
        data_set: &mut dyn DataSet,
        case: FieldCase,
    ) -> Result<(), GenerationError> {
        let index = self.data_set_index.get() + 1;
        self.data_set_index.set(index);
        self.reset_values()?;

        for id in &self.roots {
            let mut value = self.constraint(id)?.init_values(self, case)?;
            if self.indexed_fields.contains(id) {
                value = value.map(|value| format!("{value}{index}"));
            }
            data_set.put(id, value);
        }

        info!(data_set = index, case = %case, values = self.roots.len(), "data set generated");
        Ok(())
    }

    /// Generate data sets until no root has an unserved case, or `limit`.
    pub fn enumerate_cases(&self, limit: u64) -> Result<Vec<InMemoryDataSet>, GenerationError> {
        self.reset_cases()?;
        let mut data_sets = Vec::new();
        while self.has_next_case()? {
            if data_sets.len() as u64 >= limit {
                warn!(limit, "case enumeration stopped at limit");
                break;
            }
            let mut data_set = InMemoryDataSet::new();
            self.generate(&mut data_set, FieldCase::Normal)?;
            data_sets.push(data_set);
        }
        Ok(data_sets)
    }
}
