//! Descriptor round-trips through the public API
//!
//! # Running Tests
//! ```bash
//! cargo test -p jvmlink-types --test descriptor_tests
//! ```

use jvmlink_types::{Kind, MethodSignature, SignatureError, Type, TypeName, Typed};

#[test]
fn test_signature_from_types_matches_parsed_form() {
    let built = MethodSignature::new(
        vec![
            Type::Boolean,
            Type::Char,
            Type::Double,
            Type::array(Type::class("java.util.Map")),
        ],
        Type::class("java/lang/Object"),
    )
    .unwrap();
    let text = built.to_string();
    assert_eq!(text, "(ZCD[Ljava/util/Map;)Ljava/lang/Object;");
    assert_eq!(MethodSignature::parse(&text).unwrap(), built);
}

#[test]
fn test_class_name_spellings_share_a_descriptor() {
    let a = Type::Class(TypeName::new("demo.nested.Widget"));
    let b = Type::Class(TypeName::new("demo/nested/Widget"));
    assert_eq!(a.type_string(), b.type_string());
    assert_eq!(a.kind(), Kind::Class);
}

#[test]
fn test_malformed_reports_offset() {
    match MethodSignature::parse("(IQ)V") {
        Err(SignatureError::Malformed { offset, .. }) => assert_eq!(offset, 2),
        other => panic!("unexpected result: {:?}", other),
    }
}
