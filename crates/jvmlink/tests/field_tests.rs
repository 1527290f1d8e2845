//! Field Access Tests
//!
//! Reads and writes of static and instance fields of every kind, through
//! both receivers.
//!
//! # Running Tests
//! ```bash
//! cargo test --test field_tests
//! ```

mod common;

use common::{setup, CHILD, FIXTURE};
use jvmlink::prelude::*;

// ===== Static fields =====

#[test]
fn test_static_int_array_field() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let data = class.get_int_array_field(&env, true, "DATA").unwrap();
    assert_eq!(data, vec![1, 2, 3]);
    assert_eq!(data.len(), 3);
}

#[test]
fn test_static_long_array_field() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let wide = class.get_long_array_field(&env, true, "WIDE").unwrap();
    assert_eq!(wide, vec![-1, 1 << 33]);
}

#[test]
fn test_null_array_field_reads_as_empty() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    assert!(class.get_int_array_field(&env, true, "EMPTY").unwrap().is_empty());
    assert_eq!(vm.pinned(), 0);
}

#[test]
fn test_static_fields_through_object() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    assert_eq!(obj.get_int_array_field(&env, true, "DATA").unwrap(), vec![1, 2, 3]);
    assert_eq!(obj.get_int_field(&env, true, "LIMIT").unwrap(), 100);
}

#[test]
fn test_static_string_field() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    assert_eq!(
        class.get_string_field(&env, true, "LABEL").unwrap().as_deref(),
        Some("fixture")
    );
    class.set_string_field(&env, true, "LABEL", "étiquette").unwrap();
    assert_eq!(
        class.get_string_field(&env, true, "LABEL").unwrap().as_deref(),
        Some("étiquette")
    );
    class
        .set_object_field(&env, true, "LABEL", &Type::string(), None)
        .unwrap();
    assert_eq!(class.get_string_field(&env, true, "LABEL").unwrap(), None);
}

#[test]
fn test_static_int_field_write() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    class.set_int_field(&env, true, "LIMIT", -5).unwrap();
    assert_eq!(class.get_int_field(&env, true, "LIMIT").unwrap(), -5);
}

// ===== Instance fields =====

#[test]
fn test_every_instance_field_kind() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    obj.set_int_field(&env, false, "count", 3).unwrap();
    obj.set_boolean_field(&env, false, "flag", true).unwrap();
    obj.set_short_field(&env, false, "small", -12).unwrap();
    obj.set_long_field(&env, false, "total", i64::MAX).unwrap();
    obj.set_float_field(&env, false, "scale", 2.5).unwrap();
    obj.set_double_field(&env, false, "ratio", 0.125).unwrap();

    assert_eq!(obj.get_int_field(&env, false, "count").unwrap(), 3);
    assert!(obj.get_boolean_field(&env, false, "flag").unwrap());
    assert_eq!(obj.get_short_field(&env, false, "small").unwrap(), -12);
    assert_eq!(obj.get_long_field(&env, false, "total").unwrap(), i64::MAX);
    assert_eq!(obj.get_float_field(&env, false, "scale").unwrap(), 2.5);
    assert_eq!(obj.get_double_field(&env, false, "ratio").unwrap(), 0.125);
}

#[test]
fn test_fresh_instance_fields_are_zero() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    assert_eq!(obj.get_int_field(&env, false, "count").unwrap(), 0);
    assert!(!obj.get_boolean_field(&env, false, "flag").unwrap());
    assert_eq!(obj.get_string_field(&env, false, "name").unwrap(), None);
}

#[test]
fn test_instance_string_field() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    obj.set_string_field(&env, false, "name", "Zoë").unwrap();
    assert_eq!(
        obj.get_string_field(&env, false, "name").unwrap().as_deref(),
        Some("Zoë")
    );
    let name = obj
        .get_object_field(&env, false, "name", &Type::string())
        .unwrap()
        .unwrap();
    assert_eq!(name.name(&env).unwrap(), "java.lang.String");
}

#[test]
fn test_inherited_fields() {
    let (_vm, env) = setup();
    let child = env.new_instance_str(CHILD, &[]).unwrap();

    child.set_int_field(&env, false, "count", 9).unwrap();
    assert_eq!(child.get_int_field(&env, false, "count").unwrap(), 9);
    assert_eq!(child.get_int_array_field(&env, true, "DATA").unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_instances_do_not_share_fields() {
    let (_vm, env) = setup();
    let a = env.new_instance_str(FIXTURE, &[]).unwrap();
    let b = env.new_instance_str(FIXTURE, &[]).unwrap();

    a.set_int_field(&env, false, "count", 1).unwrap();
    assert_eq!(b.get_int_field(&env, false, "count").unwrap(), 0);
}

#[test]
fn test_object_field_rejects_primitive_type() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    let err = obj
        .get_object_field(&env, false, "count", &Type::Int)
        .unwrap_err();
    assert!(matches!(err, Error::Signature(_)));
    let err = obj
        .set_object_field(&env, false, "count", &Type::Int, None)
        .unwrap_err();
    assert!(matches!(err, Error::ValueMismatch { .. }));
}

#[test]
fn test_void_field_type_rejected() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    let err = obj
        .get_field::<()>(&env, false, "count")
        .unwrap_err();
    assert!(matches!(err, Error::Signature(_)));
}
