//! Shared fixtures for the integration tests
//!
//! `demo/Fixture` exercises every return kind, field kind and argument
//! kind; `demo/Child` overrides one of its methods.

#![allow(dead_code)]

use jvmlink::{Config, Environment};
use jvmlink_sim::{ClassBuilder, FieldInit, SimValue, SimVm};

pub const FIXTURE: &str = "demo.Fixture";
pub const CHILD: &str = "demo.Child";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn arg(args: &[SimValue], index: usize) -> SimValue {
    args.get(index).copied().unwrap_or(SimValue::NULL)
}

fn fixture() -> ClassBuilder {
    ClassBuilder::new("demo/Fixture")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .constructor("(I)V", |frame, args| {
            let this = frame.this_or_throw()?;
            frame.set_field(this, "count", arg(args, 0));
            Ok(SimValue::Void)
        })
        .constructor("(Ljava/lang/String;)V", |frame, args| {
            let message = frame.string(arg(args, 0))?;
            Err(frame.throw("java/lang/IllegalArgumentException", &message))
        })
        .method("answer", "()I", |_, _| Ok(SimValue::Int(42)))
        .method("reset", "()V", |frame, _| {
            let this = frame.this_or_throw()?;
            frame.set_field(this, "count", SimValue::Int(0));
            Ok(SimValue::Void)
        })
        .method("isReady", "()Z", |_, _| Ok(SimValue::Boolean(true)))
        .method("initial", "()C", |_, _| Ok(SimValue::Char('J' as u16)))
        .method("small", "()S", |_, _| Ok(SimValue::Short(-3)))
        .method("tiny", "()B", |_, _| Ok(SimValue::Byte(9)))
        .method("big", "()J", |_, _| Ok(SimValue::Long(1 << 40)))
        .method("half", "()F", |_, _| Ok(SimValue::Float(0.5)))
        .method("third", "()D", |_, _| Ok(SimValue::Double(1.0 / 3.0)))
        .method("greet", "(Ljava/lang/String;)Ljava/lang/String;", |frame, args| {
            let name = frame.string(arg(args, 0))?;
            Ok(frame.new_string(&format!("hello, {}", name)).into())
        })
        .static_method("ping", "()I", |_, _| Ok(SimValue::Int(7)))
        .static_method("fail", "()V", |frame, _| {
            Err(frame.throw("java/lang/IllegalStateException", "boom"))
        })
        .static_method("failWith", "(Ljava/lang/String;)V", |frame, args| {
            let message = frame.string(arg(args, 0))?;
            Err(frame.throw("java/lang/IllegalArgumentException", &message))
        })
        .static_method(
            "echo",
            "(Ljava/lang/String;)Ljava/lang/String;",
            |_, args| Ok(arg(args, 0)),
        )
        .static_method("nothing", "()Ljava/lang/String;", |_, _| Ok(SimValue::NULL))
        .static_method("noItems", "()[Ljava/lang/String;", |_, _| Ok(SimValue::NULL))
        .static_method("noInts", "()[I", |_, _| Ok(SimValue::NULL))
        .static_method("items", "()[Ljava/lang/String;", |frame, _| {
            let a = frame.new_string("a");
            let b = frame.new_string("b");
            Ok(frame
                .new_object_array("java/lang/String", vec![Some(a), None, Some(b)])
                .into())
        })
        .static_method("squares", "(I)[J", |frame, args| {
            let n = arg(args, 0).as_int().unwrap_or_default();
            let items = (0..i64::from(n)).map(|i| i * i).collect();
            Ok(frame.new_long_array(items).into())
        })
        .static_method("mix", "(ZBCSIJFD)D", |_, args| {
            let mut total = 0.0;
            for value in args {
                total += match *value {
                    SimValue::Boolean(b) => f64::from(u8::from(b)),
                    SimValue::Byte(v) => f64::from(v),
                    SimValue::Char(v) => f64::from(v),
                    SimValue::Short(v) => f64::from(v),
                    SimValue::Int(v) => f64::from(v),
                    SimValue::Long(v) => v as f64,
                    SimValue::Float(v) => f64::from(v),
                    SimValue::Double(v) => v,
                    _ => 0.0,
                };
            }
            Ok(SimValue::Double(total))
        })
        .static_method("byteCount", "([B)I", |frame, args| {
            let bytes = frame.bytes(arg(args, 0))?;
            Ok(SimValue::Int(bytes.len() as i32))
        })
        .static_method("join", "([Ljava/lang/String;)Ljava/lang/String;", |frame, args| {
            let mut parts = Vec::new();
            for item in frame.objects(arg(args, 0))? {
                parts.push(frame.string(SimValue::Ref(item))?);
            }
            Ok(frame.new_string(&parts.join(",")).into())
        })
        .static_method("typeOf", "(Ljava/lang/Object;)Ljava/lang/String;", |frame, args| {
            let name = match arg(args, 0) {
                SimValue::Ref(Some(obj)) => frame.class_name(obj),
                _ => "null".to_string(),
            };
            Ok(frame.new_string(&name).into())
        })
        .native_method("tick", "()I", true)
        .field("count", "I")
        .field("flag", "Z")
        .field("small", "S")
        .field("total", "J")
        .field("scale", "F")
        .field("ratio", "D")
        .field("name", "Ljava/lang/String;")
        .static_field("DATA", "[I", FieldInit::IntArray(vec![1, 2, 3]))
        .static_field("WIDE", "[J", FieldInit::LongArray(vec![-1, 1 << 33]))
        .static_field("EMPTY", "[I", FieldInit::Default)
        .static_field("LABEL", "Ljava/lang/String;", FieldInit::Str("fixture".to_string()))
        .static_field("LIMIT", "I", FieldInit::Value(SimValue::Int(100)))
}

fn child() -> ClassBuilder {
    ClassBuilder::new("demo/Child")
        .extends("demo/Fixture")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .method("answer", "()I", |_, _| Ok(SimValue::Int(43)))
}

/// A VM with the fixture classes loaded.
pub fn vm() -> SimVm {
    init_logger();
    let vm = SimVm::new();
    vm.define(fixture()).expect("fixture loads");
    vm.define(child()).expect("child loads");
    vm
}

/// A VM and one environment on it.
pub fn setup() -> (SimVm, Environment) {
    let vm = vm();
    let env = Environment::new(vm.attach());
    (vm, env)
}

/// [`setup`] with a custom configuration.
pub fn setup_with(config: Config) -> (SimVm, Environment) {
    let vm = vm();
    let env = Environment::with_config(vm.attach(), config).expect("valid config");
    (vm, env)
}
