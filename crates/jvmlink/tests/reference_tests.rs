//! Reference Lifecycle Tests
//!
//! Uses the simulated VM's reference accounting to check that:
//! - class lookups are cached per environment
//! - member ids of cached classes are resolved once
//! - temporaries created for a call are released when it returns
//! - no reference is deleted twice or used after deletion
//! - globals are released when their environment goes away
//! - environments on different threads are independent
//!
//! # Running Tests
//! ```bash
//! cargo test --test reference_tests
//! ```

mod common;

use std::rc::Rc;
use std::thread;

use common::{setup, setup_with, FIXTURE};
use jvmlink::prelude::*;
use jvmlink::Config;

// ===== Class cache =====

#[test]
fn test_class_lookup_is_cached() {
    let (vm, env) = setup();

    let first = env.get_class_str(FIXTURE).unwrap();
    let second = env.get_class_str("demo/Fixture").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(env.is_same_object(Some(first.as_object()), Some(second.as_object())));
    assert!(env.is_cached_class(&first));

    let obj = first.new_instance(&env, &[]).unwrap();
    obj.call_int(&env, false, "answer", &[]).unwrap();
    env.get_class(&TypeName::new(FIXTURE)).unwrap();

    assert_eq!(vm.stats().find_class_count("demo/Fixture"), 1);
    assert_eq!(env.cached_class_count(), 1);
}

#[test]
fn test_runtime_class_is_not_the_cached_reference() {
    let (_vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let obj = class.new_instance(&env, &[]).unwrap();

    let runtime_class = obj.object_class(&env).unwrap();
    assert!(!env.is_cached_class(&runtime_class));
    assert!(env.is_same_object(Some(runtime_class.as_object()), Some(class.as_object())));
}

#[test]
fn test_string_class_looked_up_once_for_many_strings() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    for text in ["a", "b", "c"] {
        class.call_string(&env, true, "echo", &[text.into()]).unwrap();
    }
    assert_eq!(vm.stats().find_class_count("java/lang/String"), 1);
}

// ===== Member cache =====

#[test]
fn test_member_ids_cached_for_cached_classes() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();

    let before = vm.stats().method_lookups;
    for _ in 0..5 {
        class.call_int(&env, true, "ping", &[]).unwrap();
    }
    assert_eq!(vm.stats().method_lookups, before + 1);

    let before = vm.stats().field_lookups;
    class.get_int_field(&env, true, "LIMIT").unwrap();
    class.set_int_field(&env, true, "LIMIT", 1).unwrap();
    assert_eq!(vm.stats().field_lookups, before + 1);
    assert!(env.cached_member_count() >= 2);
}

#[test]
fn test_member_cache_disabled() {
    let config = Config {
        cache_members: false,
        ..Config::default()
    };
    let (vm, env) = setup_with(config);
    let class = env.get_class_str(FIXTURE).unwrap();

    let before = vm.stats().method_lookups;
    for _ in 0..3 {
        class.call_int(&env, true, "ping", &[]).unwrap();
    }
    assert_eq!(vm.stats().method_lookups, before + 3);
    assert_eq!(env.cached_member_count(), 0);
}

#[test]
fn test_object_receiver_resolves_every_time() {
    let (vm, env) = setup();
    let obj = env.new_instance_str(FIXTURE, &[]).unwrap();

    let before = vm.stats().method_lookups;
    obj.call_int(&env, false, "answer", &[]).unwrap();
    obj.call_int(&env, false, "answer", &[]).unwrap();
    assert_eq!(vm.stats().method_lookups, before + 2);
}

// ===== Call-scoped references =====

#[test]
fn test_call_temporaries_released() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let obj = class.new_instance(&env, &[]).unwrap();
    let item = env.new_string_object("held").unwrap();
    let baseline = vm.live_locals();

    class.call_string(&env, true, "echo", &["scoped".into()]).unwrap();
    obj.call_string(&env, false, "greet", &[(&item).into()]).unwrap();
    class
        .call_string(&env, true, "typeOf", &[Arg::as_object(&item)])
        .unwrap();
    class
        .call_string(&env, true, "join", &[Arg::ObjectArray(&[&*item, &*item], TypeName::string())])
        .unwrap();
    let bytes: &[u8] = &[1, 2, 3];
    class.call_int(&env, true, "byteCount", &[bytes.into()]).unwrap();
    class.get_int_array_field(&env, true, "DATA").unwrap();
    obj.set_string_field(&env, false, "name", "temp").unwrap();
    obj.get_string_field(&env, false, "name").unwrap();

    assert_eq!(vm.live_locals(), baseline);
    assert_eq!(vm.pinned(), 0);
    assert!(vm.violations().is_empty(), "{:?}", vm.violations());
}

#[test]
fn test_temporaries_released_on_error_paths() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let list = env.new_instance_str("java.util.ArrayList", &[]).unwrap();
    let item = env.new_string_object("x").unwrap();
    let baseline = vm.live_locals();

    class.call_void(&env, true, "failWith", &["bad".into()]).unwrap_err();
    class.call_int(&env, true, "nope", &["unused".into()]).unwrap_err();
    list.call_boolean(&env, false, "add", &[(&item).into()]).unwrap_err();

    assert_eq!(vm.live_locals(), baseline);
    assert!(vm.violations().is_empty(), "{:?}", vm.violations());
}

#[test]
fn test_failed_construction_releases_temporaries() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    env.new_string_object("warm").unwrap();
    let baseline = vm.live_locals();

    let err = class.new_instance(&env, &["rejected".into()]).unwrap_err();
    assert_eq!(err.to_string(), "java.lang.IllegalArgumentException: rejected");
    assert!(!env.exception_check());
    drop(err);

    assert_eq!(vm.live_locals(), baseline);
    assert!(vm.violations().is_empty(), "{:?}", vm.violations());
}

#[test]
fn test_returned_locals_owned_by_caller() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let baseline = vm.live_locals();

    let items = class
        .call_object_array(&env, true, "items", &Type::string(), &[])
        .unwrap();
    // two non-null elements
    assert_eq!(vm.live_locals(), baseline + 2);
    drop(items);
    assert_eq!(vm.live_locals(), baseline);
}

// ===== Globals =====

#[test]
fn test_new_instance_is_global() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    let globals = vm.live_globals();
    let locals = vm.live_locals();

    let obj = env.new_instance(&class, &[]).unwrap();
    assert_eq!(vm.live_globals(), globals + 1);
    assert_eq!(vm.live_locals(), locals);
    drop(obj);
    assert_eq!(vm.live_globals(), globals);
}

#[test]
fn test_local_and_global_conversions() {
    let (vm, env) = setup();
    let local = env.new_string_object("ref").unwrap();

    let global = local.to_global().unwrap();
    let again = global.to_local().unwrap();
    let copy = env.new_local_ref(&local).unwrap();
    let other_global = env.new_global_ref(&again).unwrap();
    assert!(env.is_same_object(Some(&*again), Some(&*local)));
    assert!(env.is_same_object(Some(&*copy), Some(&*other_global)));
    assert!(env.is_same_object(None, None));
    assert!(!env.is_same_object(Some(&*local), None));

    drop((local, global, again, copy, other_global));
    assert!(vm.violations().is_empty());
}

#[test]
fn test_raw_ownership_transfer() {
    let (vm, env) = setup();
    let local = env.new_string_object("raw").unwrap();
    let baseline = vm.live_locals();

    let raw = local.into_raw();
    assert_eq!(vm.live_locals(), baseline);
    let back: Local<Object> = unsafe { Local::from_raw(&env, raw) };
    assert_eq!(back.to_java_string(&env).unwrap().as_deref(), Some("raw"));
    drop(back);
    assert_eq!(vm.live_locals(), baseline - 1);
    assert!(vm.violations().is_empty());
}

#[test]
fn test_object_array_construction() {
    let (vm, env) = setup();
    let string = env.get_class_str("java.lang.String").unwrap();
    let fill = env.new_string_object("fill").unwrap();

    let array = env.new_object_array(2, &string, Some(&*fill)).unwrap();
    let other = env.new_string_object("other").unwrap();
    env.set_object_array_element(&array, 1, Some(&*other)).unwrap();
    assert_eq!(env.array_length(&array), 2);

    let items = env.to_object_array(Some(&*array)).unwrap();
    let texts: Vec<_> = items
        .iter()
        .map(|item| env.to_string(item.as_deref()).unwrap())
        .collect();
    assert_eq!(texts, vec![Some("fill".to_string()), Some("other".to_string())]);

    let err = env.set_object_array_element(&array, 5, None).unwrap_err();
    assert!(err.to_string().starts_with("java.lang.ArrayIndexOutOfBoundsException"));
    assert!(vm.violations().is_empty());
}

#[test]
fn test_environment_drop_releases_everything() {
    let (vm, env) = setup();
    let class = env.get_class_str(FIXTURE).unwrap();
    class.call_string(&env, true, "echo", &["é".into()]).unwrap();
    class.call_void(&env, true, "fail", &[]).unwrap_err();
    assert!(vm.live_globals() >= 2);

    drop(class);
    drop(env);
    let stats = vm.stats();
    assert_eq!(stats.live_globals(), 0);
    assert_eq!(stats.live_locals(), 0);
    assert_eq!(stats.locals_discarded, 0);
    assert!(stats.violations.is_empty());
}

// ===== Threads =====

#[test]
fn test_one_environment_per_thread() {
    let vm = common::vm();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let vm = vm.clone();
            thread::spawn(move || {
                let env = Environment::new(vm.attach());
                let class = env.get_class_str(FIXTURE).unwrap();
                let text = format!("thread {} ✓", i);
                let echoed = class
                    .call_string(&env, true, "echo", &[text.as_str().into()])
                    .unwrap();
                assert_eq!(echoed.as_deref(), Some(text.as_str()));
                class.call_void(&env, true, "fail", &[]).unwrap_err();
                class.call_int(&env, true, "ping", &[]).unwrap()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 7);
    }
    let stats = vm.stats();
    assert_eq!(stats.find_class_count("demo/Fixture"), 4);
    assert_eq!(stats.live_globals(), 0);
    assert!(stats.violations.is_empty());
}
