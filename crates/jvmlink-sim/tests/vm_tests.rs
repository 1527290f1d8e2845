//! Simulated VM Tests
//!
//! Drives the simulated VM through the raw native interface and checks
//! that misuse a real JVM would not tolerate is recorded:
//! - class definition errors
//! - calls with an exception pending
//! - local references crossing attachments
//! - deleting through the wrong entry point
//! - arguments not matching the descriptor
//!
//! # Running Tests
//! ```bash
//! cargo test -p jvmlink-sim --test vm_tests
//! ```

use std::ffi::CString;
use std::thread;

use jvmlink::{JValue, Runtime, ValueKind};
use jvmlink_sim::{ClassBuilder, FieldInit, SimError, SimValue, SimVm, Violation};

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

fn counter() -> ClassBuilder {
    ClassBuilder::new("t.Counter")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .field("value", "I")
        .method("bump", "(I)I", |frame, args| {
            let this = frame.this_or_throw()?;
            let by = args.first().and_then(SimValue::as_int).unwrap_or(0);
            let next = frame.field(this, "value").as_int().unwrap_or(0) + by;
            frame.set_field(this, "value", SimValue::Int(next));
            Ok(SimValue::Int(next))
        })
        .static_method("boom", "()V", |frame, _| {
            Err(frame.throw("java/lang/IllegalStateException", "boom"))
        })
}

// ===== Class definitions =====

#[test]
fn test_duplicate_class_rejected() {
    let vm = SimVm::new();
    vm.define(counter()).unwrap();
    assert_eq!(
        vm.define(counter()).unwrap_err(),
        SimError::DuplicateClass("t/Counter".to_string())
    );
}

#[test]
fn test_unknown_superclass_rejected() {
    let vm = SimVm::new();
    let err = vm
        .define(ClassBuilder::new("t.Orphan").extends("t.Missing"))
        .unwrap_err();
    assert_eq!(err, SimError::UnknownClass("t/Missing".to_string()));
}

#[test]
fn test_bad_descriptor_rejected() {
    let vm = SimVm::new();
    let err = vm
        .define(ClassBuilder::new("t.Bad").method("m", "(Q)V", |_, _| Ok(SimValue::Void)))
        .unwrap_err();
    assert!(matches!(err, SimError::BadDescriptor { .. }));
}

#[test]
fn test_bad_initializer_leaves_class_unloaded() {
    let vm = SimVm::new();
    let long_init = FieldInit::Value(SimValue::Long(1));
    let err = vm
        .define(ClassBuilder::new("t.Init").static_field("N", "I", long_init))
        .unwrap_err();
    assert_eq!(err, SimError::BadInitializer("N".to_string()));

    let int_init = FieldInit::Value(SimValue::Int(1));
    vm.define(ClassBuilder::new("t.Init").static_field("N", "I", int_init))
        .unwrap();
}

// ===== Instances =====

#[test]
fn test_instance_state() {
    let vm = SimVm::new();
    vm.define(counter()).unwrap();
    let env = vm.attach();

    let class = env.find_class(&c("t/Counter")).unwrap();
    let ctor = env.get_method_id(class, &c("<init>"), &c("()V"), false).unwrap();
    let bump = env.get_method_id(class, &c("bump"), &c("(I)I"), false).unwrap();
    let obj = env.new_object(class, ctor, &[]).unwrap();

    env.call_method(ValueKind::Int, obj, bump, false, &[JValue::Int(2)]);
    let out = env.call_method(ValueKind::Int, obj, bump, false, &[JValue::Int(3)]);
    assert_eq!(out, JValue::Int(5));

    let value = env.get_field_id(class, &c("value"), &c("I"), false).unwrap();
    assert_eq!(env.get_field(ValueKind::Int, obj, value, false), JValue::Int(5));
    assert!(vm.violations().is_empty());
}

// ===== Misuse =====

#[test]
fn test_call_with_pending_exception_recorded() {
    let vm = SimVm::new();
    vm.define(counter()).unwrap();
    let env = vm.attach();

    let class = env.find_class(&c("t/Counter")).unwrap();
    let boom = env.get_method_id(class, &c("boom"), &c("()V"), true).unwrap();
    env.call_method(ValueKind::Void, class, boom, true, &[]);
    assert!(env.exception_check());

    env.find_class(&c("java/lang/Object"));
    assert_eq!(
        vm.violations(),
        vec![Violation::PendingException { op: "FindClass" }]
    );

    // describing clears the exception
    env.exception_describe();
    assert!(!env.exception_check());
    assert_eq!(vm.diagnostics().len(), 1);
    assert!(vm.diagnostics()[0].ends_with("java.lang.IllegalStateException: boom"));
}

#[test]
fn test_local_reference_used_on_another_thread() {
    let vm = SimVm::new();
    let env = vm.attach();
    let local = env.find_class(&c("java/lang/Object")).unwrap();
    let addr = local.addr();

    let other = vm.clone();
    thread::spawn(move || {
        let env = other.attach();
        let raw = jvmlink::RawRef::from_addr(addr).unwrap();
        env.new_global_ref(raw);
    })
    .join()
    .unwrap();

    assert_eq!(
        vm.violations(),
        vec![Violation::ForeignLocal { op: "NewGlobalRef" }]
    );
}

#[test]
fn test_global_deleted_as_local() {
    let vm = SimVm::new();
    let env = vm.attach();
    let local = env.find_class(&c("java/lang/Object")).unwrap();
    let global = env.new_global_ref(local).unwrap();

    env.delete_local_ref(global);
    assert_eq!(
        vm.violations(),
        vec![Violation::WrongDelete {
            op: "DeleteLocalRef",
            raw: global.addr()
        }]
    );
    env.delete_global_ref(global);
    assert_eq!(vm.live_globals(), 0);
}

#[test]
fn test_mismatched_arguments_recorded() {
    let vm = SimVm::new();
    vm.define(counter()).unwrap();
    let env = vm.attach();

    let class = env.find_class(&c("t/Counter")).unwrap();
    let ctor = env.get_method_id(class, &c("<init>"), &c("()V"), false).unwrap();
    let bump = env.get_method_id(class, &c("bump"), &c("(I)I"), false).unwrap();
    let obj = env.new_object(class, ctor, &[]).unwrap();

    env.call_method(ValueKind::Int, obj, bump, false, &[JValue::Long(1)]);
    assert_eq!(
        vm.violations(),
        vec![Violation::WrongArguments {
            method: "bump".to_string()
        }]
    );
}

#[test]
fn test_unsupported_charset_throws() {
    let vm = SimVm::new();
    let env = vm.attach();

    let string = env.find_class(&c("java/lang/String")).unwrap();
    let ctor = env
        .get_method_id(string, &c("<init>"), &c("([BLjava/lang/String;)V"), false)
        .unwrap();
    let bytes = env.new_byte_array(0).unwrap();
    let charset = env.new_string_utf(&c("LATIN-0")).unwrap();

    let created = env.new_object(
        string,
        ctor,
        &[JValue::Object(Some(bytes)), JValue::Object(Some(charset))],
    );
    assert!(created.is_none());
    env.exception_describe();
    assert!(vm.diagnostics()[0].ends_with("java.io.UnsupportedEncodingException: LATIN-0"));
    assert!(vm.violations().is_empty());
}

#[test]
fn test_instance_call_on_unrelated_receiver_recorded() {
    let vm = SimVm::new();
    vm.define(counter()).unwrap();
    let env = vm.attach();

    let class = env.find_class(&c("t/Counter")).unwrap();
    let bump = env.get_method_id(class, &c("bump"), &c("(I)I"), false).unwrap();
    let hash = env
        .get_method_id(class, &c("hashCode"), &c("()I"), false)
        .unwrap();

    // the class object is a java.lang.Object but not a t.Counter
    env.call_method(ValueKind::Int, class, hash, false, &[]);
    assert!(vm.violations().is_empty());

    let out = env.call_method(ValueKind::Int, class, bump, false, &[JValue::Int(1)]);
    assert_eq!(out, JValue::Int(0));
    assert_eq!(
        vm.violations(),
        vec![Violation::WrongReceiver {
            method: "bump".to_string()
        }]
    );
}
