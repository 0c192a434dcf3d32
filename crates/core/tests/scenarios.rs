//! End-to-end static pipeline tests: lex -> parse -> validate.

use dictum_core::{check, parse, ErrorKind, InputRef, Item, ModifierValue, Registry};

#[test]
fn analyze_with_scalar_modifiers() {
    let registry = Registry::standard();
    let script = check(
        "ANALYZE: \"great product\" --focus=sentiment --output=summary\n",
        &registry,
    )
    .unwrap();
    assert_eq!(script.items.len(), 1);
    let inv = match &script.items[0] {
        Item::Invocation(inv) => inv,
        _ => panic!("expected a top-level invocation"),
    };
    assert_eq!(inv.command, "ANALYZE");
    assert_eq!(inv.input, InputRef::Literal("great product".into()));
    assert_eq!(
        inv.modifiers["focus"],
        ModifierValue::Scalar("sentiment".into())
    );
    assert_eq!(
        inv.modifiers["output"],
        ModifierValue::Scalar("summary".into())
    );
}

#[test]
fn compare_with_weighted_modifier() {
    let registry = Registry::standard();
    let script = check(
        "COMPARE: \"AWS\" \"Azure\" --weight=price:0.5,services:0.3,support:0.2\n",
        &registry,
    )
    .unwrap();
    let inv = match &script.items[0] {
        Item::Invocation(inv) => inv,
        _ => panic!("expected a top-level invocation"),
    };
    assert_eq!(
        inv.modifiers["weight"],
        ModifierValue::WeightedList(vec![
            ("price".into(), 0.5),
            ("services".into(), 0.3),
            ("support".into(), 0.2),
        ])
    );
}

#[test]
fn unknown_command_fails_before_validation() {
    let registry = Registry::standard();
    let err = check("BOGUS: \"x\"\n", &registry).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn out_of_domain_enum_value_fails_validation() {
    let registry = Registry::standard();
    let err = check("ANALYZE: \"x\" --focus=unknown_focus_value\n", &registry).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.key.as_deref(), Some("focus"));
    // The diagnostic names the accepted domain
    assert!(err.message.contains("sentiment"));
}

#[test]
fn list_modifier_round_trip() {
    let registry = Registry::standard();
    let script = check("EVALUATE: \"draft\" --criteria=a,b,c\n", &registry).unwrap();
    let inv = match &script.items[0] {
        Item::Invocation(inv) => inv,
        _ => panic!("expected a top-level invocation"),
    };
    assert_eq!(
        inv.modifiers["criteria"],
        ModifierValue::List(vec!["a".into(), "b".into(), "c".into()])
    );
}

#[test]
fn single_step_chain_has_literal_input() {
    let registry = Registry::standard();
    let script = check("CHAIN:\n  SEARCH: \"only step\"\n", &registry).unwrap();
    let chain = match &script.items[0] {
        Item::Chain(c) => c,
        _ => panic!("expected a chain"),
    };
    assert_eq!(chain.steps.len(), 1);
    assert!(matches!(chain.steps[0].input, InputRef::Literal(_)));
}

#[test]
fn zero_step_chain_is_parse_error() {
    let registry = Registry::standard();
    let err = check("CHAIN:\nEXPLAIN: \"next item\"\n", &registry).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn ast_is_structurally_identical_across_reparses() {
    let registry = Registry::standard();
    let src = "CHAIN:\n  SEARCH: \"x\" --scope=web --limit=10\n  ANALYZE: search results --focus=thematic\n  SUMMARIZE: analysis --length=brief\n";
    let a = parse(src, &registry).unwrap();
    let b = parse(src, &registry).unwrap();
    assert_eq!(a, b);
}

#[test]
fn dedent_terminates_chain_scope() {
    let registry = Registry::standard();
    let script = check(
        "CHAIN:\n  SEARCH: \"x\"\n  SUMMARIZE: search results\nEXPLAIN: \"after the chain\" --level=beginner\n",
        &registry,
    )
    .unwrap();
    assert_eq!(script.items.len(), 2);
    assert!(matches!(script.items[0], Item::Chain(_)));
    assert!(matches!(script.items[1], Item::Invocation(_)));
}

#[test]
fn ast_serializes_to_json() {
    let registry = Registry::standard();
    let script = check("ANALYZE: \"x\" --depth=2\n", &registry).unwrap();
    let json = serde_json::to_value(&script).unwrap();
    assert!(json["items"].is_array());
}
