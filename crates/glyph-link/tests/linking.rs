//! End-to-end linking tests

use glyph_link::{
    ConformanceProblem, Diagnostics, LinkError, LinkOptions, LinkWarning, LinkedProgram, Linker,
    OverrideProblem, ProgramDecl, Promise,
};
use glyph_types::{Class, MemberKind, Program};
use serde_json::{json, Value};

fn program(items: Value) -> ProgramDecl {
    serde_json::from_value(json!({
        "packages": [{ "name": "_", "items": items }]
    }))
    .unwrap()
}

fn link(items: Value) -> Result<LinkedProgram, Diagnostics> {
    Linker::new().link(&program(items))
}

fn linked(items: Value) -> Program {
    match link(items) {
        Ok(linked) => linked.program,
        Err(diagnostics) => panic!("link failed: {:?}", diagnostics.errors()),
    }
}

fn errors(items: Value) -> Vec<LinkError> {
    match link(items) {
        Ok(_) => panic!("link unexpectedly succeeded"),
        Err(diagnostics) => diagnostics.errors().to_vec(),
    }
}

fn class<'p>(program: &'p Program, name: &str) -> &'p Class {
    program
        .classes()
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn vti(program: &Program, class_name: &str, kind: MemberKind, member: &str) -> u16 {
    class(program, class_name)
        .table(kind)
        .get(member)
        .and_then(|m| m.vti)
        .unwrap_or_else(|| panic!("no VTI for {class_name}.{member}"))
}

#[test]
fn test_override_reuses_slot_and_siblings_continue_numbering() {
    let program = linked(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true }, { "name": "n" }] },
        { "kind": "class", "name": "C", "superclass": { "name": "A" },
          "methods": [{ "name": "p" }] }
    ]));

    assert_eq!(vti(&program, "A", MemberKind::Method, "m"), 0);
    assert_eq!(vti(&program, "B", MemberKind::Method, "m"), 0);
    assert_eq!(vti(&program, "B", MemberKind::Method, "n"), 1);
    assert_eq!(vti(&program, "C", MemberKind::Method, "p"), 1);
    assert_eq!(class(&program, "A").link.next_method_vti, 1);
    assert_eq!(class(&program, "B").link.next_method_vti, 2);
    assert_eq!(class(&program, "C").link.next_method_vti, 2);
}

#[test]
fn test_superclass_must_be_declared_first() {
    let errors = errors(json!([
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "n" }, { "name": "m", "override": true }] },
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] }
    ]));
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        LinkError::MissingSupertype { class, superclass, .. } if class == "B" && superclass == "A"
    ));

    let decl: ProgramDecl = serde_json::from_value(json!({
        "packages": [
            { "name": "_", "items": [
                { "kind": "class", "name": "Mine", "superclass": { "name": "Later", "namespace": "s" } }
            ] },
            { "name": "s", "items": [
                { "kind": "class", "name": "Later", "exported": true }
            ] }
        ]
    }))
    .unwrap();
    let diagnostics = Linker::new().link(&decl).unwrap_err();
    assert!(matches!(
        diagnostics.errors(),
        [LinkError::MissingSupertype { superclass, .. }] if superclass == "Later"
    ));
}

#[test]
fn test_every_reachable_superclass_method_keeps_its_slot() {
    let program = linked(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "a" }, { "name": "b" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "c" }, { "name": "b", "override": true }] },
        { "kind": "class", "name": "C", "superclass": { "name": "B" },
          "methods": [{ "name": "a", "override": true }, { "name": "c", "override": true }, { "name": "d" }] }
    ]));

    for (sub, sup) in [("B", "A"), ("C", "B")] {
        let sub_class = class(&program, sub);
        let sub_id = sub_class.id;
        for member in sub_class.methods.iter() {
            let super_id = class(&program, sup).id;
            if let Some(parent) = program.lookup_method(super_id, &member.name) {
                assert_eq!(member.vti, parent.vti, "{sub}.{} shadows {sup}", member.name);
            }
        }
        assert!(program.superclass(sub_id).is_some());
    }
    assert_eq!(vti(&program, "C", MemberKind::Method, "d"), 3);
}

#[test]
fn test_type_methods_are_numbered_independently() {
    let program = linked(json!([
        { "kind": "class", "name": "A",
          "methods": [{ "name": "m" }, { "name": "n" }],
          "type_methods": [{ "name": "t" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "type_methods": [{ "name": "u" }, { "name": "t", "override": true }] }
    ]));
    assert_eq!(vti(&program, "A", MemberKind::TypeMethod, "t"), 0);
    assert_eq!(vti(&program, "B", MemberKind::TypeMethod, "u"), 1);
    assert_eq!(vti(&program, "B", MemberKind::TypeMethod, "t"), 0);
    assert_eq!(class(&program, "B").link.next_method_vti, 2);
}

#[test]
fn test_linking_is_idempotent() {
    let items = json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }, { "name": "k" }],
          "initializers": [{ "name": "🆕", "required": true }, { "name": "🐣" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "methods": [{ "name": "m", "override": true }, { "name": "n" }],
          "initializers": [{ "name": "🆕" }] }
    ]);
    let first = linked(items.clone());
    let second = linked(items);
    for (a, b) in first.classes().iter().zip(second.classes()) {
        assert_eq!(a.link, b.link);
        for kind in [MemberKind::Method, MemberKind::TypeMethod, MemberKind::Initializer] {
            let left: Vec<_> = a.table(kind).iter().map(|m| (m.name.clone(), m.vti)).collect();
            let right: Vec<_> = b.table(kind).iter().map(|m| (m.name.clone(), m.vti)).collect();
            assert_eq!(left, right);
        }
    }
}

#[test]
fn test_conformance_builds_dispatch_table() {
    let program = linked(json!([
        { "kind": "protocol", "name": "Eq", "methods": [{
            "name": "equals",
            "arguments": [{ "name": "other", "type": { "name": "🐕" } }],
            "returns": { "name": "👌" }
        }] },
        { "kind": "class", "name": "X", "conformances": [{ "name": "Eq" }],
          "methods": [
            { "name": "hash", "returns": { "name": "🚂" } },
            { "name": "equals",
              "arguments": [{ "name": "other", "type": { "name": "🐕" } }],
              "returns": { "name": "👌" } }
          ] }
    ]));
    let x = class(&program, "X");
    assert_eq!(x.conformances.len(), 1);
    assert_eq!(x.conformances[0].vtis, vec![vti(&program, "X", MemberKind::Method, "equals")]);
    assert_eq!(x.conformances[0].vtis, vec![1]);
    assert!(program.protocols()[0].uses_self());
}

#[test]
fn test_missing_protocol_method_names_class_protocol_and_method() {
    let errors = errors(json!([
        { "kind": "protocol", "name": "Eq", "methods": [{
            "name": "equals",
            "arguments": [{ "name": "other", "type": { "name": "🐕" } }],
            "returns": { "name": "👌" }
        }] },
        { "kind": "class", "name": "Y", "conformances": [{ "name": "Eq" }] }
    ]));
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        LinkError::ConformanceViolation {
            class,
            protocol,
            method,
            problem,
            ..
        } => {
            assert_eq!(class, "Y");
            assert_eq!(protocol, "Eq");
            assert_eq!(method, "equals");
            assert_eq!(*problem, ConformanceProblem::MissingMethod);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_incompatible_protocol_method() {
    let errors = errors(json!([
        { "kind": "protocol", "name": "Counter", "methods": [
            { "name": "count", "returns": { "name": "🚂" } }
        ] },
        { "kind": "class", "name": "Z", "conformances": [{ "name": "Counter" }],
          "methods": [{ "name": "count", "returns": { "name": "🚀" } }] }
    ]));
    assert!(matches!(
        &errors[0],
        LinkError::ConformanceViolation {
            problem: ConformanceProblem::ReturnType { .. },
            ..
        }
    ));
}

#[test]
fn test_dispatch_tables_match_protocol_length_and_order() {
    let program = linked(json!([
        { "kind": "protocol", "name": "P", "methods": [
            { "name": "first" }, { "name": "second" }, { "name": "third" }
        ] },
        { "kind": "protocol", "name": "Q", "methods": [{ "name": "second" }] },
        { "kind": "class", "name": "Base", "methods": [{ "name": "third" }, { "name": "first" }] },
        { "kind": "class", "name": "K", "superclass": { "name": "Base" },
          "conformances": [{ "name": "Q" }, { "name": "P" }],
          "methods": [{ "name": "second" }] }
    ]));
    let k = class(&program, "K");
    assert_eq!(k.conformances[0].vtis, vec![2]);
    assert_eq!(k.conformances[1].vtis, vec![1, 2, 0]);
    for conformance in &k.conformances {
        let protocol = program.protocol(conformance.protocol);
        assert_eq!(conformance.vtis.len(), protocol.methods.len());
        assert!(conformance.vtis.iter().all(|v| *v < k.link.next_method_vti));
    }
    assert_eq!(k.protocol_index_range(), Some((0, 1)));
}

#[test]
fn test_generic_protocol_conformance() {
    let program = linked(json!([
        { "kind": "protocol", "name": "Source", "generics": [{ "name": "T" }], "methods": [
            { "name": "next", "returns": { "variable": "T", "optional": true } }
        ] },
        { "kind": "class", "name": "Digits", "conformances": [{ "name": "Source", "args": [{ "name": "🚂" }] }],
          "methods": [{ "name": "next", "returns": { "name": "🚂", "optional": true } }] }
    ]));
    assert_eq!(class(&program, "Digits").conformances[0].vtis, vec![0]);

    let errors = errors(json!([
        { "kind": "protocol", "name": "Source", "generics": [{ "name": "T" }], "methods": [
            { "name": "next", "returns": { "variable": "T" } }
        ] },
        { "kind": "class", "name": "Digits", "conformances": [{ "name": "Source", "args": [{ "name": "🚂" }] }],
          "methods": [{ "name": "next", "returns": { "name": "👌" } }] }
    ]));
    assert!(matches!(errors[0], LinkError::ConformanceViolation { .. }));
}

#[test]
fn test_invalid_conformances() {
    let errors = errors(json!([
        { "kind": "protocol", "name": "P" },
        { "kind": "class", "name": "A" },
        { "kind": "class", "name": "B", "conformances": [
            { "name": "A" }, { "name": "P", "optional": true }, { "name": "P" }, { "name": "P" }
        ] }
    ]));
    assert!(matches!(errors[0], LinkError::InvalidConformance { .. }));
    assert!(matches!(errors[1], LinkError::InvalidConformance { .. }));
    assert!(matches!(errors[2], LinkError::DuplicateDeclaration { .. }));
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_enum_values_are_contiguous() {
    let decl = serde_json::from_value::<ProgramDecl>(json!({
        "packages": [{ "name": "_", "items": [
            { "kind": "enum", "name": "Light", "values": ["red", "yellow", "green"] }
        ] }]
    }))
    .unwrap();
    let program = Linker::new().link(&decl).unwrap().program;
    let light = &program.enums()[0];
    assert_eq!(
        light.values().collect::<Vec<_>>(),
        [("red", 0), ("yellow", 1), ("green", 2)]
    );

    let errors = errors(json!([
        { "kind": "enum", "name": "Light", "values": ["red", "red"] }
    ]));
    assert!(matches!(
        &errors[0],
        LinkError::DuplicateDeclaration { what: "Enum value", name, .. } if name == "red"
    ));
}

#[test]
fn test_initializer_inheritance() {
    let program = linked(json!([
        { "kind": "class", "name": "A",
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "initializers": [{ "name": "🆕" }, { "name": "🐣" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m" }] }
    ]));
    let a = class(&program, "A");
    let b = class(&program, "B");
    assert!(!a.link.inherits_initializers);
    assert!(b.link.inherits_initializers);
    assert_eq!(b.link.next_initializer_vti, a.link.next_initializer_vti);
    assert_eq!(b.link.next_initializer_vti, 2);
    assert_eq!(b.link.instance_variable_total, 1);
}

#[test]
fn test_required_initializers_occupy_low_slots() {
    let program = linked(json!([
        { "kind": "class", "name": "A",
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "initializers": [{ "name": "🐣" }, { "name": "🆕", "required": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": [{ "name": "y", "type": { "name": "🚂" } }],
          "initializers": [
            { "name": "🥚" },
            { "name": "🆙", "required": true },
            { "name": "🆕" }
          ] }
    ]));

    assert_eq!(vti(&program, "A", MemberKind::Initializer, "🆕"), 0);
    assert_eq!(vti(&program, "A", MemberKind::Initializer, "🐣"), 1);
    assert_eq!(class(&program, "A").link.next_initializer_vti, 2);

    assert_eq!(vti(&program, "B", MemberKind::Initializer, "🆕"), 0);
    assert_eq!(vti(&program, "B", MemberKind::Initializer, "🆙"), 1);
    assert_eq!(vti(&program, "B", MemberKind::Initializer, "🥚"), 2);
    let b = class(&program, "B");
    assert_eq!(b.link.next_initializer_vti, 3);
    assert!(b.initializers.get("🆕").map_or(false, |i| i.required));
    assert_eq!(b.required_initializers.len(), 2);
    assert_eq!(b.link.instance_variable_total, 2);
}

#[test]
fn test_missing_required_initializer() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "initializers": [{ "name": "🆕", "required": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "initializers": [{ "name": "🐣" }] }
    ]));
    assert!(matches!(
        &errors[0],
        LinkError::MissingRequiredInitializer { class, initializer, .. }
            if class == "B" && initializer == "🆕"
    ));
}

#[test]
fn test_inheriting_initializers_satisfies_required() {
    let program = linked(json!([
        { "kind": "class", "name": "A", "initializers": [{ "name": "🆕", "required": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" } }
    ]));
    let b = class(&program, "B");
    assert!(b.link.inherits_initializers);
    assert!(b.required_initializers.contains("🆕"));
}

#[test]
fn test_promise_violations() {
    let return_type = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m", "returns": { "name": "🚂" } }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true, "returns": { "name": "🚂", "optional": true } }] }
    ]));
    assert!(matches!(
        return_type[0],
        LinkError::PromiseViolation { promise: Promise::ReturnType, .. }
    ));

    let count = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true,
                        "arguments": [{ "name": "x", "type": { "name": "🚂" } }] }] }
    ]));
    assert!(matches!(
        count[0],
        LinkError::PromiseViolation { promise: Promise::ArgumentCount, .. }
    ));

    let argument = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m",
            "arguments": [{ "name": "x", "type": { "name": "🚂", "optional": true } }] }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true,
                        "arguments": [{ "name": "x", "type": { "name": "🚂" } }] }] }
    ]));
    assert!(matches!(
        argument[0],
        LinkError::PromiseViolation { promise: Promise::Argument(0), .. }
    ));
}

#[test]
fn test_covariant_return_and_contravariant_argument() {
    let program = linked(json!([
        { "kind": "class", "name": "Animal", "methods": [{ "name": "mate",
            "arguments": [{ "name": "other", "type": { "name": "Dog" } }],
            "returns": { "name": "Animal", "optional": true } }] },
        { "kind": "class", "name": "Dog", "superclass": { "name": "Animal" },
          "methods": [{ "name": "mate", "override": true,
            "arguments": [{ "name": "other", "type": { "name": "Animal" } }],
            "returns": { "name": "Dog" } }] }
    ]));
    assert_eq!(vti(&program, "Dog", MemberKind::Method, "mate"), 0);
}

#[test]
fn test_override_through_generic_superclass() {
    let program = linked(json!([
        { "kind": "class", "name": "Box", "generics": [{ "name": "T" }],
          "methods": [{ "name": "get", "returns": { "variable": "T" } }] },
        { "kind": "class", "name": "IntBox", "superclass": { "name": "Box", "args": [{ "name": "🚂" }] },
          "methods": [{ "name": "get", "override": true, "returns": { "name": "🚂" } }] }
    ]));
    let int_box = class(&program, "IntBox");
    assert_eq!(int_box.generics.total_count(), 1);
    assert_eq!(vti(&program, "IntBox", MemberKind::Method, "get"), 0);

    let errors = errors(json!([
        { "kind": "class", "name": "Box", "generics": [{ "name": "T" }],
          "methods": [{ "name": "get", "returns": { "variable": "T" } }] },
        { "kind": "class", "name": "IntBox", "superclass": { "name": "Box", "args": [{ "name": "🚂" }] },
          "methods": [{ "name": "get", "override": true, "returns": { "name": "👌" } }] }
    ]));
    assert!(matches!(errors[0], LinkError::PromiseViolation { .. }));
}

#[test]
fn test_override_attribute_discipline() {
    let missing = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" }, "methods": [{ "name": "m" }] }
    ]));
    assert!(matches!(
        missing[0],
        LinkError::InvalidOverride { problem: OverrideProblem::MissingAttribute, .. }
    ));

    let nothing = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m", "override": true }] }
    ]));
    assert!(matches!(
        nothing[0],
        LinkError::InvalidOverride { problem: OverrideProblem::NothingToOverride, .. }
    ));

    let final_member = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m", "final": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true }] }
    ]));
    assert!(matches!(
        final_member[0],
        LinkError::InvalidOverride { problem: OverrideProblem::FinalMember, .. }
    ));
}

#[test]
fn test_final_initializer_cannot_be_redeclared() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "initializers": [{ "name": "🆕", "final": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "initializers": [{ "name": "🆕" }] }
    ]));
    assert!(matches!(
        &errors[..],
        [LinkError::InvalidOverride { class, problem: OverrideProblem::FinalMember, kind: "Initializer", .. }]
            if class == "B"
    ));

    let program = linked(json!([
        { "kind": "class", "name": "A", "initializers": [{ "name": "🆕", "final": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "initializers": [{ "name": "🆕🆕" }] }
    ]));
    assert_eq!(vti(&program, "B", MemberKind::Initializer, "🆕🆕"), 0);
}

#[test]
fn test_failed_class_stops_its_subclasses() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m", "override": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "n", "override": true }] },
        { "kind": "class", "name": "C", "methods": [{ "name": "o", "override": true }] }
    ]));
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_superclass_errors() {
    let missing = errors(json!([
        { "kind": "class", "name": "B", "superclass": { "name": "Nope" } }
    ]));
    assert!(matches!(missing[0], LinkError::MissingSupertype { .. }));

    let not_a_class = errors(json!([
        { "kind": "protocol", "name": "P" },
        { "kind": "class", "name": "B", "superclass": { "name": "P" } },
        { "kind": "class", "name": "C", "superclass": { "name": "🚂" } },
        { "kind": "class", "name": "D", "superclass": { "name": "B", "optional": true } }
    ]));
    assert_eq!(not_a_class.len(), 3);
    assert!(not_a_class
        .iter()
        .all(|e| matches!(e, LinkError::InvalidSupertype { .. })));

    let cycle = errors(json!([
        { "kind": "class", "name": "A", "superclass": { "name": "A" } }
    ]));
    assert!(matches!(
        cycle[0],
        LinkError::InvalidSupertype { reason: "inheritance cycle", .. }
    ));

    let mutual = errors(json!([
        { "kind": "class", "name": "A", "superclass": { "name": "B" } },
        { "kind": "class", "name": "B", "superclass": { "name": "A" } }
    ]));
    assert_eq!(mutual.len(), 1);
    assert!(matches!(mutual[0], LinkError::MissingSupertype { .. }));
}

#[test]
fn test_entry_point() {
    let program = linked(json!([
        { "kind": "class", "name": "Main",
          "type_methods": [{ "name": "helper" }, { "name": "🏁", "returns": { "name": "🚂" } }] }
    ]));
    let entry = program.entry_point().unwrap();
    assert_eq!(program.class(entry.class).name, "Main");
    assert_eq!(program.entry_point_vti(), Some(1));

    let duplicate = errors(json!([
        { "kind": "class", "name": "A", "type_methods": [{ "name": "🏁", "returns": { "name": "🚂" } }] },
        { "kind": "class", "name": "B", "type_methods": [{ "name": "🏁", "returns": { "name": "🚂" } }] }
    ]));
    assert!(matches!(
        &duplicate[0],
        LinkError::DuplicateEntryPoint { class, previous, .. } if class == "B" && previous == "A"
    ));

    let wrong_return = errors(json!([
        { "kind": "class", "name": "A", "type_methods": [{ "name": "🏁" }] }
    ]));
    assert!(matches!(wrong_return[0], LinkError::InvalidEntryPoint { .. }));
}

#[test]
fn test_reserved_method_name() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "🍇" }] }
    ]));
    assert!(matches!(errors[0], LinkError::ReservedName { .. }));
}

#[test]
fn test_native_bodies_need_a_binary() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m", "body": { "kind": "native" } }] }
    ]));
    assert!(matches!(errors[0], LinkError::NativeNotAllowed { .. }));

    let decl: ProgramDecl = serde_json::from_value(json!({
        "packages": [
            { "name": "s", "requires_binary": true, "items": [
                { "kind": "class", "name": "List", "exported": true,
                  "methods": [{ "name": "count", "body": { "kind": "native" } }] }
            ] },
            { "name": "_", "items": [
                { "kind": "extension", "class": { "name": "List" },
                  "methods": [{ "name": "first" }, { "name": "sum", "body": { "kind": "native" } }] }
            ] }
        ]
    }))
    .unwrap();
    let errors = Linker::new().link(&decl).unwrap_err();
    assert_eq!(errors.errors().len(), 1);
    assert!(matches!(
        &errors.errors()[0],
        LinkError::NativeNotAllowed { member, .. } if member == "sum"
    ));
}

#[test]
fn test_extension_members_are_numbered_with_the_class() {
    let program = linked(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] },
        { "kind": "extension", "class": { "name": "A" }, "methods": [{ "name": "x" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" }, "methods": [{ "name": "y" }] }
    ]));
    assert_eq!(vti(&program, "A", MemberKind::Method, "x"), 1);
    assert_eq!(vti(&program, "B", MemberKind::Method, "y"), 2);
}

#[test]
fn test_cross_package_visibility() {
    let decl: ProgramDecl = serde_json::from_value(json!({
        "packages": [
            { "name": "s", "items": [
                { "kind": "class", "name": "Exported", "exported": true, "methods": [{ "name": "m" }] },
                { "kind": "class", "name": "Hidden" }
            ] },
            { "name": "_", "items": [
                { "kind": "class", "name": "Mine", "superclass": { "name": "Exported" },
                  "methods": [{ "name": "m", "override": true }] },
                { "kind": "class", "name": "Other", "superclass": { "name": "Hidden" } }
            ] }
        ]
    }))
    .unwrap();
    let errors = Linker::new().link(&decl).unwrap_err();
    assert_eq!(errors.errors().len(), 1);
    assert!(matches!(
        &errors.errors()[0],
        LinkError::MissingSupertype { superclass, .. } if superclass == "Hidden"
    ));
}

#[test]
fn test_instance_variables_without_initializers_warn() {
    let items = json!([
        { "kind": "class", "name": "A",
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }] }
    ]);
    let result = link(items.clone()).unwrap();
    assert!(matches!(
        result.diagnostics.warnings(),
        [LinkWarning::InstanceVariablesWithoutInitializers { count: 1, .. }]
    ));

    let strict = Linker::with_options(LinkOptions {
        warnings_as_errors: true,
    });
    let diagnostics = strict.link(&program(items)).unwrap_err();
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.warnings().len(), 1);
}

#[test]
fn test_unknown_types_are_collected() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "methods": [
            { "name": "m", "returns": { "name": "Nope" } },
            { "name": "n", "arguments": [{ "name": "x", "type": { "variable": "T" } }] }
        ] }
    ]));
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], LinkError::UnknownType { .. }));
    assert!(matches!(errors[1], LinkError::UnresolvedGenericVariable { .. }));
}

#[test]
fn test_duplicate_declarations() {
    let errors = errors(json!([
        { "kind": "class", "name": "A", "generics": [{ "name": "T" }, { "name": "T" }] },
        { "kind": "enum", "name": "A" },
        { "kind": "class", "name": "B", "methods": [{ "name": "m" }, { "name": "m" }] }
    ]));
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|e| matches!(e, LinkError::DuplicateDeclaration { .. })));
}

#[test]
fn test_instance_variable_limit_counts_inherited() {
    let ivars = |prefix: &str, count: usize| -> Vec<Value> {
        (0..count)
            .map(|i| json!({ "name": format!("{prefix}{i}"), "type": { "name": "🚂" } }))
            .collect()
    };
    let init = json!([{ "name": "🆕" }]);

    let at_limit = linked(json!([
        { "kind": "class", "name": "A", "instance_variables": ivars("a", 40_000), "initializers": init },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": ivars("b", 25_535), "initializers": init }
    ]));
    assert_eq!(class(&at_limit, "B").link.instance_variable_total, u16::MAX);

    let errors = errors(json!([
        { "kind": "class", "name": "A", "instance_variables": ivars("a", 40_000), "initializers": init },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "instance_variables": ivars("b", 25_536), "initializers": init }
    ]));
    assert!(matches!(
        errors[..],
        [LinkError::SerializationLimitExceeded {
            what: "instance variables",
            limit: 65_535,
            actual: 65_536,
            ..
        }]
    ));
}

#[test]
fn test_package_limit() {
    let packages: Vec<Value> = (0..254)
        .map(|i| json!({ "name": format!("p{i}"), "items": [] }))
        .collect();
    let decl: ProgramDecl = serde_json::from_value(json!({ "packages": packages })).unwrap();
    let diagnostics = Linker::new().link(&decl).unwrap_err();
    assert!(matches!(
        diagnostics.errors(),
        [LinkError::SerializationLimitExceeded {
            what: "packages",
            limit: 253,
            actual: 254,
            ..
        }]
    ));

    let packages: Vec<Value> = (0..253)
        .map(|i| json!({ "name": format!("p{i}"), "items": [] }))
        .collect();
    let decl: ProgramDecl = serde_json::from_value(json!({ "packages": packages })).unwrap();
    assert!(Linker::new().link(&decl).is_ok());
}
