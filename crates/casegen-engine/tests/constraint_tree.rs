use std::path::PathBuf;
use std::rc::Rc;

use casegen_config::{FieldSpec, load_config, load_settings};
use casegen_core::{CharacterSets, DataSet, FieldCase, InMemoryDataSet};
use casegen_engine::constraints::{
    CombinedConstraint, ConditionalOptional, ConstantConstraint, FieldConstraint,
    SourceConstraint,
};
use casegen_engine::fields::Field;
use casegen_engine::{
    ChildRef, Constraint, GenerationError, Generator, GeneratorOptions, Mandatory, NodeIdentity,
    fixed_value,
};

fn text_field(id: Option<&str>, min_len: usize, max_len: usize) -> Rc<dyn Constraint> {
    let field = Field::from_spec(&FieldSpec::Text { min_len, max_len }).expect("text field");
    let charset = CharacterSets::new().get("alnum").expect("alnum charset");
    Rc::new(FieldConstraint::new(
        NodeIdentity::root(id, None),
        field,
        charset,
    ))
}

fn login_generator(options: GeneratorOptions) -> Generator {
    let path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/examples/login.config.json");
    let validated = load_config(&path).expect("load login config");
    Generator::from_config(&validated.config, options).expect("build generator")
}

#[test]
fn override_wins_without_consuming_a_token() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("login.user"), 4, 10))
        .expect("add root");

    generator
        .set_fixed_value("login.user", Some(fixed_value("pinned")))
        .expect("set override");
    for case in [FieldCase::Normal, FieldCase::Null, FieldCase::Blank, FieldCase::Max] {
        let value = generator.value("login.user", case).expect("value");
        assert_eq!(value.as_deref(), Some("pinned"));
    }
    assert_eq!(generator.tokens_issued(), 0);

    generator
        .set_fixed_value("login.user", Some(Rc::new(|| None::<String>)))
        .expect("set null override");
    assert_eq!(generator.value("login.user", FieldCase::Normal).expect("value"), None);

    generator.set_fixed_value("login.user", None).expect("clear override");
    generator.reset_values().expect("reset");
    let value = generator.value("login.user", FieldCase::Min).expect("value");
    assert_eq!(value.map(|value| value.len()), Some(4));
    assert_eq!(generator.tokens_issued(), 1);
}

#[test]
fn stateful_value_is_stable_within_a_pass() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("login.user"), 4, 30))
        .expect("add root");

    let first = generator.value("login.user", FieldCase::Normal).expect("first");
    let second = generator.value("login.user", FieldCase::Normal).expect("second");
    assert_eq!(first, second);
    assert_eq!(generator.tokens_issued(), 1);
}

#[test]
fn null_case_nulls_every_root() {
    let generator = login_generator(GeneratorOptions::default());
    let mut data_set = InMemoryDataSet::new();
    generator
        .generate(&mut data_set, FieldCase::Null)
        .expect("generate");

    for id in generator.root_ids() {
        assert!(data_set.contains(id), "missing {id}");
        assert_eq!(data_set.value(id), None, "{id} should be null");
    }
}

#[test]
fn blank_case_keeps_default_lengths() {
    let generator = login_generator(GeneratorOptions::default());
    let mut data_set = InMemoryDataSet::new();
    generator
        .generate(&mut data_set, FieldCase::Blank)
        .expect("generate");

    assert_eq!(data_set.value("login.user"), Some("       "));
    assert_eq!(data_set.value("login.password"), Some("        "));
    assert_eq!(data_set.value("customer.age"), Some("  "));
    assert!(
        data_set
            .value("customer.email")
            .is_some_and(|value| value.trim().is_empty())
    );
}

#[test]
fn cyclic_references_fail_with_reentrant_error() {
    let mut generator = Generator::default();
    generator
        .add_root(Rc::new(SourceConstraint::new(
            NodeIdentity::root(Some("a"), None),
            ChildRef::Referenced("b".to_string()),
        )))
        .expect("add a");
    generator
        .add_root(Rc::new(SourceConstraint::new(
            NodeIdentity::root(Some("b"), None),
            ChildRef::Referenced("a".to_string()),
        )))
        .expect("add b");

    let err = generator
        .value("a", FieldCase::Normal)
        .expect_err("cycle must fail");
    assert!(err.is_reentrant());
    assert_eq!(err.node_path(), vec!["a", "b", "a"]);

    let a = generator.constraint("a").expect("a");
    assert_eq!(a.core().token(), -1);
    let b = generator.constraint("b").expect("b");
    assert_eq!(b.core().token(), -1);
}

#[test]
fn cyclic_references_fail_case_queries_without_overflow() {
    let mut generator = Generator::default();
    generator
        .add_root(Rc::new(SourceConstraint::new(
            NodeIdentity::root(Some("a"), None),
            ChildRef::Referenced("b".to_string()),
        )))
        .expect("add a");
    generator
        .add_root(Rc::new(CombinedConstraint::new(
            NodeIdentity::root(Some("b"), None),
            vec![ChildRef::Referenced("a".to_string())],
            "",
        )))
        .expect("add b");

    let err = generator.count_cases().expect_err("count must fail");
    assert!(err.is_reentrant());
    assert_eq!(err.node_path(), vec!["a", "b", "a"]);

    let err = generator.has_next_case().expect_err("has next must fail");
    assert!(err.is_reentrant());

    let err = generator.contained_ids("b").expect_err("ids must fail");
    assert_eq!(err.node_path(), vec!["b", "a", "b"]);

    let a = generator.constraint("a").expect("a");
    let ids = a.core().traverse(|| Ok(0_u64)).expect("mark cleared");
    assert_eq!(ids, 0);
}

#[test]
fn when_present_check_does_not_consume_target_boundaries() {
    let mut generator = Generator::default();
    generator
        .add_root(Rc::new(ConditionalOptional::new(
            NodeIdentity::root(Some("newsletter"), None),
            ChildRef::Embedded(Rc::new(ConstantConstraint::new(
                NodeIdentity::root(None, None),
                "weekly",
            ))),
            Mandatory::WhenPresent("login.user".to_string()),
        )))
        .expect("add newsletter");
    generator
        .add_root(text_field(Some("login.user"), 4, 10))
        .expect("add user");

    generator.reset_cases().expect("reset cases");
    assert!(generator.has_next_case().expect("has next"));
    assert_eq!(generator.tokens_issued(), 0);

    let data_sets = generator.enumerate_cases(10).expect("enumerate");
    let mut lengths: Vec<usize> = data_sets
        .iter()
        .map(|data_set| data_set.value("login.user").map_or(0, str::len))
        .collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![4, 7, 10]);
    for data_set in &data_sets {
        assert_eq!(data_set.value("newsletter"), Some("weekly"));
    }
}

#[test]
fn optional_case_reset_leaves_referenced_child_alone() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("shared"), 3, 3))
        .expect("add shared");
    let owned = text_field(None, 3, 3);
    let by_reference = ConditionalOptional::new(
        NodeIdentity::root(Some("by_reference"), None),
        ChildRef::Referenced("shared".to_string()),
        Mandatory::Always,
    );
    let embedding = ConditionalOptional::new(
        NodeIdentity::root(Some("embedding"), None),
        ChildRef::Embedded(Rc::clone(&owned)),
        Mandatory::Always,
    );

    generator.value("shared", FieldCase::Normal).expect("shared");
    owned
        .init_values(&generator, FieldCase::Normal)
        .expect("owned");
    assert!(!by_reference.has_next_case(&generator).expect("has next"));
    assert!(!embedding.has_next_case(&generator).expect("has next"));

    by_reference.reset_case();
    embedding.reset_case();
    assert!(!by_reference.has_next_case(&generator).expect("has next"));
    assert!(embedding.has_next_case(&generator).expect("has next"));
}

#[test]
fn self_referencing_combined_fails() {
    let mut generator = Generator::default();
    generator
        .add_root(Rc::new(CombinedConstraint::new(
            NodeIdentity::root(Some("loop"), None),
            vec![
                ChildRef::Embedded(Rc::new(ConstantConstraint::new(
                    NodeIdentity::root(None, None),
                    "x",
                ))),
                ChildRef::Referenced("loop".to_string()),
            ],
            "",
        )))
        .expect("add root");

    let err = generator
        .value("loop", FieldCase::Normal)
        .expect_err("self reference must fail");
    assert!(matches!(err.root_cause(), GenerationError::Reentrant { node } if node == "loop"));
}

#[test]
fn shared_reference_is_not_a_cycle() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("login.user"), 4, 10))
        .expect("add user");
    generator
        .add_root(Rc::new(CombinedConstraint::new(
            NodeIdentity::root(Some("pair"), None),
            vec![
                ChildRef::Referenced("login.user".to_string()),
                ChildRef::Referenced("login.user".to_string()),
            ],
            "/",
        )))
        .expect("add pair");

    let user = generator
        .value("login.user", FieldCase::Normal)
        .expect("user")
        .expect("non-null user");
    let pair = generator
        .value("pair", FieldCase::Normal)
        .expect("pair")
        .expect("non-null pair");
    assert_eq!(pair, format!("{user}/{user}"));
}

#[test]
fn optional_counts_child_cases_twice_plus_null() {
    let mut generator = Generator::default();
    let optional = Rc::new(ConditionalOptional::new(
        NodeIdentity::root(Some("opt"), None),
        ChildRef::Embedded(text_field(None, 4, 10)),
        Mandatory::Never,
    ));
    generator.add_root(optional).expect("add root");

    assert_eq!(generator.count_cases().expect("count"), 7);
}

#[test]
fn reset_only_reaches_owned_children() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("shared"), 2, 6))
        .expect("add shared");
    let owned = text_field(Some("owned"), 2, 6);
    generator
        .factory_mut()
        .register(Rc::clone(&owned))
        .expect("register owned");

    let parent = Rc::new(CombinedConstraint::new(
        NodeIdentity::root(Some("parent"), None),
        vec![
            ChildRef::Referenced("shared".to_string()),
            ChildRef::Embedded(Rc::clone(&owned)),
        ],
        "",
    ));
    generator
        .add_root(Rc::clone(&parent) as Rc<dyn Constraint>)
        .expect("add parent");

    let shared = generator.constraint("shared").expect("shared");
    for _ in 0..3 {
        generator.reset_values().expect("reset");
        shared.reset_values();
        owned.reset_values();
        generator.value("shared", FieldCase::Normal).expect("shared");
        generator.value("owned", FieldCase::Normal).expect("owned");
    }
    assert!(!shared.has_next_case(&generator).expect("shared has next"));
    assert!(!owned.has_next_case(&generator).expect("owned has next"));

    parent.reset_case();
    assert!(!shared.has_next_case(&generator).expect("shared has next"));
    assert!(owned.has_next_case(&generator).expect("owned has next"));

    generator
        .set_fixed_value("shared", Some(fixed_value("keep")))
        .expect("pin shared");
    parent.reset_values();
    assert!(shared.has_fixed_value_override());
}

#[test]
fn contained_ids_follow_references_and_embedded_nodes() {
    let generator = login_generator(GeneratorOptions::default());

    let password = generator.contained_ids("login.password").expect("ids");
    assert_eq!(
        password.into_iter().collect::<Vec<_>>(),
        vec!["login.password", "login.password.value"]
    );

    let email = generator.contained_ids("customer.email").expect("ids");
    assert!(email.contains("customer.email"));
    assert!(email.contains("login.user"));
    assert_eq!(email.len(), 2);
}

#[test]
fn optional_password_alternates_and_drives_newsletter() {
    let generator = login_generator(GeneratorOptions::default());

    let mut present = 0;
    for _ in 0..10 {
        let mut data_set = InMemoryDataSet::new();
        generator
            .generate(&mut data_set, FieldCase::Normal)
            .expect("generate");

        match data_set.value("login.password") {
            Some(password) => {
                present += 1;
                assert_eq!(password.chars().count(), 8);
                assert!(data_set.value("customer.newsletter").is_some());
            }
            None => assert!(data_set.contains("login.password")),
        }
    }
    assert_eq!(present, 5);
}

#[test]
fn ignoring_optional_constraints_always_generates() {
    let generator = login_generator(GeneratorOptions {
        ignore_optional_constraints: true,
        ..GeneratorOptions::default()
    });

    for _ in 0..6 {
        let mut data_set = InMemoryDataSet::new();
        generator
            .generate(&mut data_set, FieldCase::Normal)
            .expect("generate");
        assert!(data_set.value("login.password").is_some());
        assert!(data_set.value("customer.newsletter").is_some());
    }
}

#[test]
fn email_and_login_reuse_the_user_value() {
    let generator = login_generator(GeneratorOptions::default());
    let mut data_set = InMemoryDataSet::new();
    generator
        .generate(&mut data_set, FieldCase::Normal)
        .expect("generate");

    let user = data_set.value("login.user").expect("user");
    assert_eq!(data_set.value("customer.login"), Some(user));
    assert_eq!(
        data_set.value("customer.email"),
        Some(format!("{user}@example.com").as_str())
    );
}

#[test]
fn case_enumeration_covers_boundaries() {
    let generator = login_generator(GeneratorOptions::default());
    assert_eq!(generator.count_cases().expect("count"), 5);

    let data_sets = generator.enumerate_cases(100).expect("enumerate");
    assert!(data_sets.len() >= 3);
    assert!(data_sets.len() <= 100);
    assert!(!generator.has_next_case().expect("has next"));

    let ages: Vec<&str> = data_sets
        .iter()
        .filter_map(|data_set| data_set.value("customer.age"))
        .collect();
    for boundary in ["18", "58", "99"] {
        assert!(ages.contains(&boundary), "missing age {boundary}");
    }

    let salutations: Vec<&str> = data_sets
        .iter()
        .filter_map(|data_set| data_set.value("customer.salutation"))
        .collect();
    for boundary in ["Mr", "Ms", "Dr"] {
        assert!(salutations.contains(&boundary), "missing salutation {boundary}");
    }
}

#[test]
fn case_enumeration_respects_limit() {
    let generator = login_generator(GeneratorOptions::default());
    let data_sets = generator.enumerate_cases(2).expect("enumerate");
    assert_eq!(data_sets.len(), 2);
    assert!(generator.has_next_case().expect("has next"));
}

#[test]
fn load_builds_generator_from_settings_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/examples/casegen.toml");
    let settings = load_settings(&path).expect("load settings");
    let generator = Generator::load(&settings).expect("load generator");

    assert_eq!(generator.seed(), 42);
    assert_eq!(generator.root_ids().len(), 10);
    assert!(generator.indexed_fields().contains("customer.login"));
}

#[test]
fn source_resets_embedded_child_but_not_referenced_one() {
    let mut generator = Generator::default();
    generator
        .add_root(text_field(Some("shared"), 4, 30))
        .expect("add shared");
    let referencing = Rc::new(SourceConstraint::new(
        NodeIdentity::root(Some("copy"), None),
        ChildRef::Referenced("shared".to_string()),
    ));
    let embedding = Rc::new(SourceConstraint::new(
        NodeIdentity::root(Some("wrapper"), None),
        ChildRef::Embedded(text_field(Some("owned"), 4, 30)),
    ));
    generator
        .add_root(Rc::clone(&referencing) as Rc<dyn Constraint>)
        .expect("add copy");
    generator
        .add_root(Rc::clone(&embedding) as Rc<dyn Constraint>)
        .expect("add wrapper");

    let shared = generator.value("copy", FieldCase::Normal).expect("copy");
    generator.value("wrapper", FieldCase::Normal).expect("wrapper");

    referencing.reset_values();
    let before = generator.tokens_issued();
    assert_eq!(generator.value("shared", FieldCase::Normal).expect("shared"), shared);
    assert_eq!(generator.tokens_issued(), before);

    embedding.reset_values();
    generator.value("wrapper", FieldCase::Normal).expect("wrapper");
    assert_eq!(generator.tokens_issued(), before + 2);
}

#[test]
fn password_enumeration_yields_value_and_null() {
    let generator = login_generator(GeneratorOptions::default());
    let password = generator.constraint("login.password").expect("password");
    assert_eq!(password.count_cases(&generator).expect("count"), 3);

    password.reset_case();
    let mut seen_value = false;
    let mut seen_null = false;
    let mut passes = 0;
    while password.has_next_case(&generator).expect("has next") {
        generator.reset_values().expect("reset");
        match generator
            .value("login.password", FieldCase::Normal)
            .expect("password")
        {
            Some(value) => {
                assert_eq!(value.chars().count(), 8);
                seen_value = true;
            }
            None => seen_null = true,
        }
        passes += 1;
        assert!(passes <= 10, "enumeration did not terminate");
    }
    assert!(seen_value);
    assert!(seen_null);
}
