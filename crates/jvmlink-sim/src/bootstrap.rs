//! Classes every simulated VM starts with
//!
//! A small slice of `java.lang` (plus `java.util.ArrayList`): enough for the
//! binding's own needs (`Class.getName`, `String(byte[], String)`,
//! `String.getBytes(String)`, `Throwable.toString`) and for realistic test
//! programs.

use log::error;

use crate::class::ClassBuilder;
use crate::frame::Frame;
use crate::state::VmState;
use crate::value::{ClassId, ObjId, SimValue, Thrown};

const THROWABLES: &[(&str, &str)] = &[
    ("java/lang/Exception", "java/lang/Throwable"),
    ("java/lang/RuntimeException", "java/lang/Exception"),
    ("java/lang/Error", "java/lang/Throwable"),
    ("java/lang/LinkageError", "java/lang/Error"),
    ("java/lang/IllegalStateException", "java/lang/RuntimeException"),
    ("java/lang/IllegalArgumentException", "java/lang/RuntimeException"),
    ("java/lang/NullPointerException", "java/lang/RuntimeException"),
    ("java/lang/ClassCastException", "java/lang/RuntimeException"),
    ("java/lang/IndexOutOfBoundsException", "java/lang/RuntimeException"),
    (
        "java/lang/ArrayIndexOutOfBoundsException",
        "java/lang/IndexOutOfBoundsException",
    ),
    ("java/lang/NegativeArraySizeException", "java/lang/RuntimeException"),
    ("java/lang/UnsatisfiedLinkError", "java/lang/LinkageError"),
    ("java/lang/NoSuchMethodError", "java/lang/LinkageError"),
    ("java/lang/NoSuchFieldError", "java/lang/LinkageError"),
    ("java/lang/NoClassDefFoundError", "java/lang/LinkageError"),
    ("java/io/IOException", "java/lang/Exception"),
    ("java/io/UnsupportedEncodingException", "java/io/IOException"),
];

/// Charsets `String(byte[], String)` and `getBytes(String)` accept.
fn is_utf8(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("UTF8") || charset.eq_ignore_ascii_case("UTF-8")
}

fn check_charset(frame: &mut Frame<'_>, value: SimValue) -> Result<(), Thrown> {
    let charset = frame.string(value)?;
    if is_utf8(&charset) {
        Ok(())
    } else {
        Err(frame.throw("java/io/UnsupportedEncodingException", &charset))
    }
}

fn arg(args: &[SimValue], index: usize) -> SimValue {
    args.get(index).copied().unwrap_or(SimValue::NULL)
}

fn object_class() -> ClassBuilder {
    ClassBuilder::root("java/lang/Object")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .method("getClass", "()Ljava/lang/Class;", |frame, _| {
            let this = frame.this_or_throw()?;
            Ok(frame.class_object_of(this).into())
        })
        .method("hashCode", "()I", |frame, _| {
            let this = frame.this_or_throw()?;
            Ok(SimValue::Int(identity_hash(this)))
        })
        .method("equals", "(Ljava/lang/Object;)Z", |frame, args| {
            let this = frame.this_or_throw()?;
            Ok(SimValue::Boolean(arg(args, 0) == SimValue::from(this)))
        })
        .method("toString", "()Ljava/lang/String;", |frame, _| {
            let this = frame.this_or_throw()?;
            let text = format!("{}@{:x}", frame.class_name(this), identity_hash(this));
            Ok(frame.new_string(&text).into())
        })
}

fn identity_hash(obj: ObjId) -> i32 {
    (obj.0 as i32).wrapping_mul(31).wrapping_add(0x1b0b)
}

fn class_class() -> ClassBuilder {
    ClassBuilder::new("java/lang/Class").method("getName", "()Ljava/lang/String;", |frame, _| {
        let this = frame.this_or_throw()?;
        let name = frame.name_of_class(this)?;
        Ok(frame.new_string(&name).into())
    })
}

fn string_class() -> ClassBuilder {
    ClassBuilder::new("java/lang/String")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .constructor("(Ljava/lang/String;)V", |frame, args| {
            let this = frame.this_or_throw()?;
            let text = frame.string(arg(args, 0))?;
            frame.set_string(this, text);
            Ok(SimValue::Void)
        })
        .constructor("([BLjava/lang/String;)V", |frame, args| {
            let this = frame.this_or_throw()?;
            let bytes = frame.bytes(arg(args, 0))?;
            check_charset(frame, arg(args, 1))?;
            frame.set_string(this, String::from_utf8_lossy(&bytes).into_owned());
            Ok(SimValue::Void)
        })
        .method("getBytes", "(Ljava/lang/String;)[B", |frame, args| {
            let this = frame.this_or_throw()?;
            let text = frame.string(this.into())?;
            check_charset(frame, arg(args, 0))?;
            Ok(frame.new_bytes(text.as_bytes()).into())
        })
        .method("length", "()I", |frame, _| {
            let this = frame.this_or_throw()?;
            let text = frame.string(this.into())?;
            Ok(SimValue::Int(text.encode_utf16().count() as i32))
        })
        .method("toString", "()Ljava/lang/String;", |frame, _| {
            Ok(frame.this_or_throw()?.into())
        })
        .method("equals", "(Ljava/lang/Object;)Z", |frame, args| {
            let this = frame.this_or_throw()?;
            let text = frame.string(this.into())?;
            let other = match arg(args, 0) {
                SimValue::Ref(Some(other)) if frame.is_instance(other, "java/lang/String") => {
                    Some(frame.string(other.into())?)
                }
                _ => None,
            };
            Ok(SimValue::Boolean(other.as_deref() == Some(text.as_str())))
        })
        .method("concat", "(Ljava/lang/String;)Ljava/lang/String;", |frame, args| {
            let this = frame.this_or_throw()?;
            let mut text = frame.string(this.into())?;
            text.push_str(&frame.string(arg(args, 0))?);
            Ok(frame.new_string(&text).into())
        })
        .static_method("valueOf", "(I)Ljava/lang/String;", |frame, args| {
            let value = arg(args, 0).as_int().unwrap_or_default();
            Ok(frame.new_string(&value.to_string()).into())
        })
}

fn throwable_class() -> ClassBuilder {
    ClassBuilder::new("java/lang/Throwable")
        .field("detailMessage", "Ljava/lang/String;")
        .throwable_constructors()
        .method("getMessage", "()Ljava/lang/String;", |frame, _| {
            let this = frame.this_or_throw()?;
            Ok(frame.field(this, "detailMessage"))
        })
        .method("toString", "()Ljava/lang/String;", |frame, _| {
            let this = frame.this_or_throw()?;
            let text = frame.describe_throwable(this);
            Ok(frame.new_string(&text).into())
        })
}

fn elements(frame: &mut Frame<'_>) -> Result<(ObjId, Vec<Option<ObjId>>), Thrown> {
    let this = frame.this_or_throw()?;
    let items = match frame.field(this, "elementData") {
        SimValue::Ref(Some(data)) => frame.objects(data.into())?,
        _ => Vec::new(),
    };
    Ok((this, items))
}

fn array_list_class() -> ClassBuilder {
    ClassBuilder::new("java/util/ArrayList")
        .field("elementData", "[Ljava/lang/Object;")
        .constructor("()V", |_, _| Ok(SimValue::Void))
        .method("add", "(Ljava/lang/Object;)Z", |frame, args| {
            let (this, mut items) = elements(frame)?;
            items.push(arg(args, 0).as_object().flatten());
            let data = frame.new_object_array("java/lang/Object", items);
            frame.set_field(this, "elementData", data.into());
            Ok(SimValue::Boolean(true))
        })
        .method("size", "()I", |frame, _| {
            let (_, items) = elements(frame)?;
            Ok(SimValue::Int(items.len() as i32))
        })
        .method("get", "(I)Ljava/lang/Object;", |frame, args| {
            let (_, items) = elements(frame)?;
            let index = arg(args, 0).as_int().unwrap_or_default();
            match usize::try_from(index).ok().and_then(|i| items.get(i)) {
                Some(item) => Ok(SimValue::Ref(*item)),
                None => {
                    let message =
                        format!("Index {} out of bounds for length {}", index, items.len());
                    Err(frame.throw("java/lang/IndexOutOfBoundsException", &message))
                }
            }
        })
        .method("toArray", "()[Ljava/lang/Object;", |frame, _| {
            let (_, items) = elements(frame)?;
            Ok(frame.new_object_array("java/lang/Object", items).into())
        })
}

fn load(state: &mut VmState, builder: ClassBuilder) -> Option<ClassId> {
    let path = builder.name().as_path();
    match state.define(builder) {
        Ok(id) => Some(id),
        Err(err) => {
            error!("built-in class {} failed to load: {}", path, err);
            None
        }
    }
}

/// Load the built-in classes into a fresh state.
pub(crate) fn bootstrap(state: &mut VmState) {
    if let Some(id) = load(state, object_class()) {
        state.core.object = id;
    }
    if let Some(id) = load(state, class_class()) {
        state.core.class = id;
    }
    if let Some(id) = load(state, string_class()) {
        state.core.string = id;
    }
    if let Some(id) = load(state, throwable_class()) {
        state.core.throwable = id;
    }
    for (name, superclass) in THROWABLES {
        load(state, ClassBuilder::new(name).extends(superclass).throwable_constructors());
    }
    load(state, array_list_class());
}
