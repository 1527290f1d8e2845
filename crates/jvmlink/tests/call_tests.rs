//! Call Matrix Tests
//!
//! Calls through every cell of the matrix (return kind x static/instance x
//! class/object receiver) against the simulated VM, with every argument
//! kind:
//! - construction and primitive returns
//! - string arguments and results, including multi-byte text
//! - array results, null arrays and null strings
//! - object arguments typed by runtime class or by a declared type
//! - virtual dispatch through the object receiver
//!
//! # Running Tests
//! ```bash
//! cargo test --test call_tests
//! ```

mod common;

use common::{setup, CHILD, FIXTURE};
use jvmlink::prelude::*;
use jvmlink::MethodSignature;

// ===== End-to-end scenarios =====

#[test]
fn test_construct_and_call_int() {
    let (_vm, env) = setup();

    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();
    assert_eq!(obj.call_int(&env, false, "answer", &[]).unwrap(), 42);
}

#[test]
fn test_multibyte_text_echo() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    for text in ["héllo wörld", "€ 100", "日本語テキスト", "emoji 🦀 crab", ""] {
        let echoed = class
            .call_string(&env, true, "echo", &[text.into()])
            .unwrap();
        assert_eq!(echoed.as_deref(), Some(text));
    }
}

#[test]
fn test_string_round_trip_through_object() {
    let (_vm, env) = setup();

    let text = "Grüße, Ελληνικά, 中文";
    let string = env.new_string_object(text).unwrap();
    assert_eq!(env.to_string(Some(&*string)).unwrap().as_deref(), Some(text));
    assert_eq!(string.to_java_string(&env).unwrap().as_deref(), Some(text));
    assert_eq!(
        string.call_int(&env, false, "length", &[]).unwrap(),
        text.encode_utf16().count() as i32
    );
}

// ===== Return kinds =====

#[test]
fn test_every_primitive_return_kind() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    assert!(obj.call_boolean(&env, false, "isReady", &[]).unwrap());
    assert_eq!(obj.call_char(&env, false, "initial", &[]).unwrap(), 'J' as u16);
    assert_eq!(obj.call_short(&env, false, "small", &[]).unwrap(), -3);
    assert_eq!(obj.call_byte(&env, false, "tiny", &[]).unwrap(), 9);
    assert_eq!(obj.call_long(&env, false, "big", &[]).unwrap(), 1 << 40);
    assert_eq!(obj.call_float(&env, false, "half", &[]).unwrap(), 0.5);
    assert_eq!(obj.call_double(&env, false, "third", &[]).unwrap(), 1.0 / 3.0);
}

#[test]
fn test_generic_call_picks_descriptor_from_result_type() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let ping: i32 = class.call(&env, true, "ping", &[]).unwrap();
    assert_eq!(ping, 7);
    let squares: Vec<i64> = class.call(&env, true, "squares", &[4i32.into()]).unwrap();
    assert_eq!(squares, vec![0, 1, 4, 9]);
}

#[test]
fn test_void_call() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[12i32.into()]).unwrap();

    obj.call_void(&env, false, "reset", &[]).unwrap();
    assert_eq!(obj.get_int_field(&env, false, "count").unwrap(), 0);
}

#[test]
fn test_null_string_result_is_none() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    assert_eq!(class.call_string(&env, true, "nothing", &[]).unwrap(), None);
}

#[test]
fn test_null_arrays_read_as_empty() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let items = class
        .call_object_array(&env, true, "noItems", &Type::string(), &[])
        .unwrap();
    assert!(items.is_empty());
    assert!(class.call_int_array(&env, true, "noInts", &[]).unwrap().is_empty());
}

#[test]
fn test_object_array_result_keeps_null_elements() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let items = class
        .call_object_array(&env, true, "items", &Type::string(), &[])
        .unwrap();
    let texts: Vec<Option<String>> = items
        .iter()
        .map(|item| env.to_string(item.as_deref()).unwrap())
        .collect();
    assert_eq!(texts, vec![Some("a".to_string()), None, Some("b".to_string())]);
}

#[test]
fn test_long_array_result() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let squares = class
        .call_long_array(&env, true, "squares", &[5i32.into()])
        .unwrap();
    assert_eq!(squares, vec![0, 1, 4, 9, 16]);
    assert!(class
        .call_long_array(&env, true, "squares", &[0i32.into()])
        .unwrap()
        .is_empty());
}

#[test]
fn test_object_result() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let echoed = class
        .call_object(&env, true, "echo", &Type::string(), &["x".into()])
        .unwrap()
        .unwrap();
    assert_eq!(echoed.name(&env).unwrap(), "java.lang.String");
}

#[test]
fn test_object_result_rejects_primitive_type() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let err = class
        .call_object(&env, true, "ping", &Type::Int, &[])
        .unwrap_err();
    assert!(matches!(err, Error::Signature(_)));
}

// ===== Arguments =====

#[test]
fn test_every_primitive_argument_kind() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let total = class
        .call_double(
            &env,
            true,
            "mix",
            &[
                true.into(),
                1i8.into(),
                ('a' as u16).into(),
                2i16.into(),
                3i32.into(),
                4i64.into(),
                0.5f32.into(),
                0.25f64.into(),
            ],
        )
        .unwrap();
    assert_eq!(total, 108.75);
}

#[test]
fn test_computed_descriptor() {
    let (_vm, env) = setup();

    let form = env
        .form_for(
            &Type::Double,
            &[true.into(), 1i64.into(), "s".into(), Arg::null("java.util.List")],
        )
        .unwrap();
    assert_eq!(form, "(ZJLjava/lang/String;Ljava/util/List;)D");
    assert_eq!(
        form.parse::<MethodSignature>().unwrap().params().len(),
        4
    );
}

#[test]
fn test_void_argument_type_rejected_before_lookup() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let lookups = vm.stats().method_lookups;

    let err = class
        .call_int(&env, true, "ping", &[Arg::Null(Type::Void)])
        .unwrap_err();
    assert!(matches!(err, Error::Signature(_)));
    assert_eq!(vm.stats().method_lookups, lookups);
}

#[test]
fn test_byte_slice_argument() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let bytes: &[u8] = &[0, 1, 2, 255];
    assert_eq!(class.call_int(&env, true, "byteCount", &[bytes.into()]).unwrap(), 4);
}

#[test]
fn test_object_array_argument() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let a = env.new_string_object("x").unwrap();
    let b = env.new_string_object("ÿ").unwrap();
    let joined = class
        .call_string(
            &env,
            true,
            "join",
            &[Arg::ObjectArray(&[&*a, &*b], TypeName::string())],
        )
        .unwrap();
    assert_eq!(joined.as_deref(), Some("x,ÿ"));
}

#[test]
fn test_object_argument_uses_runtime_class() {
    let (_vm, env) = setup();
    let list = env.new_instance_str("java.util.ArrayList", &[]).unwrap();
    let item = env.new_string_object("item").unwrap();

    // add(Object) is not add(String)
    let err = list
        .call_boolean(&env, false, "add", &[(&item).into()])
        .unwrap_err();
    let exception = err.as_exception().unwrap();
    assert_eq!(exception.message(), "java.lang.NoSuchMethodError: add");

    assert!(list
        .call_boolean(&env, false, "add", &[Arg::as_object(&item)])
        .unwrap());
    assert_eq!(list.call_int(&env, false, "size", &[]).unwrap(), 1);

    let first = list
        .call_object(&env, false, "get", &Type::object(), &[0i32.into()])
        .unwrap()
        .unwrap();
    assert!(env.is_same_object(Some(&*first), Some(&*item)));

    let all = list
        .call_object_array(&env, false, "toArray", &Type::object(), &[])
        .unwrap();
    assert_eq!(all.len(), 1);
    let text = all[0].as_ref().unwrap().to_java_string(&env).unwrap();
    assert_eq!(text.as_deref(), Some("item"));
}

#[test]
fn test_typed_argument_as_named_class() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let child = env.new_instance_str(CHILD, &[]).unwrap();

    let name = class
        .call_string(&env, true, "typeOf", &[Arg::typed(&child, "java.lang.Object")])
        .unwrap();
    assert_eq!(name.as_deref(), Some("demo.Child"));
    let name = class
        .call_string(&env, true, "typeOf", &[Arg::null("java.lang.Object")])
        .unwrap();
    assert_eq!(name.as_deref(), Some("null"));
}

#[test]
fn test_constructor_chosen_by_arguments() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let obj = class.new_instance(&env, &[12i32.into()]).unwrap();
    assert_eq!(obj.get_int_field(&env, false, "count").unwrap(), 12);

    let err = class.new_instance(&env, &[1i64.into()]).unwrap_err();
    assert_eq!(
        err.as_exception().unwrap().message(),
        "java.lang.NoSuchMethodError: <init>"
    );
}

// ===== Receivers =====

#[test]
fn test_instance_method_with_string_argument() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    let greeting = obj.call_string(&env, false, "greet", &["Zoë".into()]).unwrap();
    assert_eq!(greeting.as_deref(), Some("hello, Zoë"));
}

#[test]
fn test_static_call_through_object() {
    let (_vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    assert_eq!(obj.call_int(&env, true, "ping", &[]).unwrap(), 7);
}

#[test]
fn test_virtual_dispatch_on_runtime_class() {
    let (_vm, env) = setup();
    let child = env.new_instance_str(CHILD, &[]).unwrap();

    assert_eq!(child.call_int(&env, false, "answer", &[]).unwrap(), 43);
    // inherited
    assert_eq!(child.call_long(&env, false, "big", &[]).unwrap(), 1 << 40);
    assert_eq!(child.name(&env).unwrap(), "demo.Child");
}

#[test]
fn test_instance_call_on_class_receiver() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    // looked up on demo.Fixture, declared on java.lang.Object
    let via_class = class.call_int(&env, false, "hashCode", &[]).unwrap();
    let via_object = class
        .as_object()
        .call_int(&env, false, "hashCode", &[])
        .unwrap();
    assert_eq!(via_class, via_object);
    assert!(vm.violations().is_empty(), "{:?}", vm.violations());
}

#[test]
fn test_class_and_object_names() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let obj = class.new_instance(&env, &[]).unwrap();

    assert_eq!(class.name(&env).unwrap(), "demo.Fixture");
    assert_eq!(obj.name(&env).unwrap(), "demo.Fixture");
    let runtime_class = obj.object_class(&env).unwrap();
    assert!(env.is_same_object(Some(runtime_class.as_object()), Some(class.as_object())));
}
