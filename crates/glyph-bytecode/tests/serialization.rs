//! Integration tests for metadata serialization

use glyph_bytecode::metadata::{flags, tags};
use glyph_bytecode::{
    serialize, DecodeError, MetadataImage, SerializeError, SerializeOptions, TypeImage,
};
use glyph_link::{Linker, ProgramDecl};
use glyph_types::Program;
use serde_json::{json, Value};

fn link(packages: Value) -> Program {
    let decl: ProgramDecl = serde_json::from_value(json!({ "packages": packages })).unwrap();
    match Linker::new().link(&decl) {
        Ok(linked) => linked.program,
        Err(diagnostics) => panic!("link failed: {:?}", diagnostics.errors()),
    }
}

fn main_package(items: Value) -> Program {
    link(json!([{ "name": "_", "items": items }]))
}

fn entry_class() -> Value {
    json!({ "kind": "class", "name": "Main",
            "type_methods": [{ "name": "🏁", "returns": { "name": "🚂" } }] })
}

fn image(program: &Program) -> MetadataImage {
    let bytes = serialize(program, &SerializeOptions::default()).unwrap();
    MetadataImage::decode(&bytes).unwrap()
}

#[test]
fn test_minimal_program_layout() {
    let program = main_package(json!([entry_class()]));
    let bytes = serialize(&program, &SerializeOptions::default()).unwrap();

    #[rustfmt::skip]
    let expected: Vec<u8> = vec![
        3,                      // version
        1, 0,                   // class count
        1,                      // package count
        2, 0, b'_', 0,          // package name
        0, 0, 0, 0,             // version 0.0
        0,                      // no native binary
        0x01,                   // class follows
        4, 0,                   // name
        b'M', 0, 0, 0, b'a', 0, 0, 0, b'i', 0, 0, 0, b'n', 0, 0, 0,
        0, 0,                   // inherits from itself
        0, 0,                   // instance variables
        0, 0,                   // method table
        1, 0,                   // type-method table
        1,                      // inherits initializers
        0, 0,                   // initializer table
        0, 0, 0, 0, 1, 0,       // own methods, initializers, type methods
        1, 0, 0xC1, 0xF3, 0x01, 0x00, // 🏁
        0, 0,                   // VTI
        0,                      // public
        0,                      // flags
        0,                      // arguments
        tags::INTEGER, 0,       // returns 🚂
        0, 0,                   // locals
        0, 0, 0, 0,             // code length
        0, 0,                   // literals
        0, 0,                   // conformances
        0x00,                   // end of classes
        1, 0, 0, 0,             // literal pool: the empty string
        0, 0, 0, 0,             // entry point class and VTI
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn test_every_package_terminates_its_class_list() {
    let class = |name: &str| json!({ "kind": "class", "name": name, "exported": true });
    let program = link(json!([
        { "name": "a", "items": [class("A1"), class("A2")] },
        { "name": "b", "version": { "major": 1, "minor": 2 }, "items": [class("B1"), class("B2")] },
        { "name": "_", "items": [class("C1"), entry_class()] }
    ]));
    let bytes = serialize(&program, &SerializeOptions::default()).unwrap();
    assert_eq!(bytes[3], 3);

    let image = MetadataImage::decode(&bytes).unwrap();
    assert_eq!(image.class_count, 6);
    assert_eq!(image.packages.len(), 3);
    for package in &image.packages {
        assert_eq!(package.classes.len(), 2);
    }
    assert_eq!(image.packages[1].version.major, 1);
    assert_eq!(image.packages[1].version.minor, 2);
    assert_eq!(image.entry_class, 5);

    // The header of the second package starts right after the first
    // package's terminator.
    let mut offset = 4 + 2 + "a".len() + 1 + 5;
    for _ in 0..2 {
        assert_eq!(bytes[offset], 0x01);
        offset += 1 + class_record_len(&bytes[offset + 1..]);
    }
    assert_eq!(bytes[offset], 0x00);
    assert_eq!(&bytes[offset + 1..offset + 3], &[2, 0]);
    assert_eq!(bytes[offset + 3], b'b');
}

/// Length of a class record without members or conformances
fn class_record_len(bytes: &[u8]) -> usize {
    let name_len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let record = 2 + name_len * 4 + 2 * 5 + 1 + 2 * 3 + 2;
    assert_eq!(&bytes[record - 2..record], &[0, 0]);
    record
}

#[test]
fn test_class_records() {
    let program = main_package(json!([
        { "kind": "protocol", "name": "Greeter", "methods": [{ "name": "greet" }] },
        { "kind": "protocol", "name": "Unused" },
        { "kind": "protocol", "name": "Counter", "methods": [
            { "name": "count", "returns": { "name": "🚂" } }
        ] },
        { "kind": "class", "name": "A",
          "instance_variables": [{ "name": "x", "type": { "name": "🚂" } }],
          "methods": [{ "name": "greet" }],
          "initializers": [{ "name": "🆕", "required": true, "can_return_nothing": true }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "conformances": [{ "name": "Counter" }, { "name": "Greeter" }],
          "instance_variables": [{ "name": "y", "type": { "name": "👌" } }],
          "methods": [{ "name": "greet", "override": true }, { "name": "count", "returns": { "name": "🚂" } }],
          "initializers": [{ "name": "🆕" }] },
        entry_class()
    ]));
    let image = image(&program);

    let (a_index, a) = image.classes().enumerate().find(|(_, c)| c.name == "A").unwrap();
    let (b_index, b) = image.classes().enumerate().find(|(_, c)| c.name == "B").unwrap();
    assert!(a_index < b_index);
    assert_eq!(a.inherit_from as usize, a_index);
    assert_eq!(b.inherit_from as usize, a_index);

    assert_eq!(a.instance_variables, 1);
    assert_eq!(b.instance_variables, 2);
    assert_eq!((a.method_table, b.method_table), (1, 2));
    assert!(!b.inherits_initializers);
    assert_eq!(b.initializer_table, 1);

    let init = &a.initializers[0];
    assert!(init.has_flag(flags::REQUIRED));
    assert!(init.has_flag(flags::CAN_RETURN_NOTHING));
    assert_eq!(
        init.return_type,
        TypeImage::Class {
            index: a_index as u16,
            args: vec![],
            optional: true
        }
    );
    assert!(b.initializers[0].has_flag(flags::REQUIRED));
    assert_eq!(b.initializers[0].vti, 0);

    assert!(b.methods[0].has_flag(flags::OVERRIDE));
    assert_eq!(b.methods[0].vti, 0);
    assert_eq!(b.methods[1].vti, 1);

    assert_eq!(b.protocol_range, Some((0, 2)));
    assert_eq!(b.conformances.len(), 2);
    assert_eq!((b.conformances[0].protocol, b.conformances[0].vtis.clone()), (2, vec![1]));
    assert_eq!((b.conformances[1].protocol, b.conformances[1].vtis.clone()), (0, vec![0]));
    assert_eq!(a.protocol_range, None);
}

#[test]
fn test_literal_pool_is_deduplicated() {
    let program = main_package(json!([
        { "kind": "class", "name": "Main",
          "methods": [
            { "name": "a", "body": { "kind": "code", "locals": 2, "code": [7, 8, 9], "literals": ["hi", "yo", "hi"] } },
            { "name": "b", "body": { "kind": "code", "literals": ["yo", ""] } }
          ],
          "type_methods": [{ "name": "🏁", "returns": { "name": "🚂" } }] }
    ]));
    let image = image(&program);
    assert_eq!(image.literals, vec!["", "hi", "yo"]);

    let main = image.class_named("Main").unwrap();
    let a = main.methods[0].body.as_ref().unwrap();
    assert_eq!(a.locals, 2);
    assert_eq!(a.code, vec![7, 8, 9]);
    assert_eq!(a.literals, vec![1, 2, 1]);
    assert_eq!(main.methods[1].body.as_ref().unwrap().literals, vec![2, 0]);
}

#[test]
fn test_native_members_have_no_body() {
    let program = link(json!([
        { "name": "s", "requires_binary": true, "items": [
            { "kind": "class", "name": "List", "exported": true,
              "methods": [{ "name": "count", "final": true, "deprecated": true,
                            "body": { "kind": "native" }, "returns": { "name": "🚂" } }] }
        ] },
        { "name": "_", "items": [entry_class()] }
    ]));
    let image = image(&program);
    assert!(image.packages[0].requires_binary);
    let count = &image.class_named("List").unwrap().methods[0];
    assert_eq!(count.flags, flags::NATIVE | flags::FINAL | flags::DEPRECATED);
    assert_eq!(count.body, None);
}

#[test]
fn test_signature_types() {
    let program = main_package(json!([
        { "kind": "enum", "name": "Light", "values": ["red"] },
        { "kind": "class", "name": "Box", "generics": [{ "name": "T" }],
          "methods": [
            { "name": "get", "returns": { "variable": "T", "optional": true } },
            { "name": "map", "generics": [{ "name": "U" }],
              "arguments": [{ "name": "f", "type": {
                  "params": [{ "variable": "T" }], "returns": { "variable": "U" } } }],
              "returns": { "name": "Box", "args": [{ "variable": "U" }] } },
            { "name": "light", "arguments": [{ "name": "l", "type": { "name": "Light" } }] }
          ] },
        entry_class()
    ]));
    let image = image(&program);
    let class = image.class_named("Box").unwrap();
    assert_eq!(
        class.methods[0].return_type,
        TypeImage::Reference {
            index: 0,
            optional: true
        }
    );
    assert_eq!(
        class.methods[1].arguments[0],
        TypeImage::Callable {
            params: vec![TypeImage::Reference {
                index: 0,
                optional: false
            }],
            returns: Box::new(TypeImage::LocalReference {
                index: 0,
                optional: false
            }),
            optional: false,
        }
    );
    assert_eq!(
        class.methods[2].arguments[0],
        TypeImage::Enum {
            index: 0,
            optional: false
        }
    );
    assert_eq!(
        class.methods[2].return_type,
        TypeImage::Simple {
            tag: tags::NOTHINGNESS,
            optional: false
        }
    );
}

#[test]
fn test_version_option() {
    let program = main_package(json!([entry_class()]));
    let bytes = serialize(&program, &SerializeOptions { version: 7 }).unwrap();
    assert_eq!(bytes[0], 7);
    assert_eq!(MetadataImage::decode(&bytes).unwrap().version, 7);
}

#[test]
fn test_entry_point_is_required() {
    let program = main_package(json!([{ "kind": "class", "name": "A" }]));
    assert_eq!(
        serialize(&program, &SerializeOptions::default()),
        Err(SerializeError::MissingEntryPoint)
    );
}

#[test]
fn test_decode_rejects_damaged_streams() {
    let program = main_package(json!([entry_class()]));
    let bytes = serialize(&program, &SerializeOptions::default()).unwrap();

    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(
        MetadataImage::decode(truncated),
        Err(DecodeError::UnexpectedEnd(_))
    ));

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert_eq!(
        MetadataImage::decode(&trailing),
        Err(DecodeError::TrailingBytes(1))
    );

    let mut miscounted = bytes.clone();
    miscounted[1] = 2;
    assert_eq!(
        MetadataImage::decode(&miscounted),
        Err(DecodeError::ClassCountMismatch {
            declared: 2,
            found: 1
        })
    );

    let mut bad_marker = bytes;
    bad_marker[13] = 0x07;
    assert_eq!(
        MetadataImage::decode(&bad_marker),
        Err(DecodeError::InvalidMarker {
            byte: 0x07,
            offset: 13
        })
    );
}

#[test]
fn test_serialization_is_deterministic() {
    let items = json!([
        { "kind": "protocol", "name": "P", "methods": [{ "name": "p" }] },
        { "kind": "class", "name": "A", "conformances": [{ "name": "P" }], "methods": [{ "name": "p" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" }, "methods": [{ "name": "q" }] },
        entry_class()
    ]);
    let first = serialize(&main_package(items.clone()), &SerializeOptions::default()).unwrap();
    let second = serialize(&main_package(items), &SerializeOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_summary_lists_classes() {
    let program = main_package(json!([
        { "kind": "class", "name": "A", "methods": [{ "name": "m" }] },
        { "kind": "class", "name": "B", "superclass": { "name": "A" },
          "methods": [{ "name": "m", "override": true }] },
        entry_class()
    ]));
    let summary = image(&program).to_string();
    assert!(summary.starts_with("version 3, 3 classes, 1 packages, 1 literals"));
    assert!(summary.contains("[1] B < [0]"));
    assert!(summary.contains("method m @0 () -> ✨"));
    assert!(summary.ends_with("entry point [2] @0"));
}
