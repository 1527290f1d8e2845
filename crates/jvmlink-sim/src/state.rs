//! Simulated VM state
//!
//! Holds the heap, the loaded classes, the reference table and the
//! per-thread pending exceptions. Every native-interface operation of
//! [`crate::SimEnv`] is a method here taking the attachment id.
//!
//! References handed out are entries of one table shared by all
//! attachments. Entries are never reused, so a deleted reference stays
//! recognisable and double deletes are reported instead of corrupting
//! another reference.

use std::ffi::c_void;
use std::ptr::NonNull;

use jvmlink::{FieldId, JValue, MethodId, RawRef, ValueKind};
use jvmlink_types::{Type, TypeName};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::class::{ClassBuilder, FieldDef, FieldInit, MethodDef};
use crate::error::SimError;
use crate::frame::Frame;
use crate::stats::{Stats, Violation};
use crate::value::{ClassId, ObjId, SimValue, Thrown};

pub(crate) enum HeapValue {
    Instance(FxHashMap<String, SimValue>),
    Str(String),
    Bytes(Vec<i8>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Objects(Vec<Option<ObjId>>),
    Class(ClassId),
}

pub(crate) struct HeapObj {
    pub(crate) class: ClassId,
    pub(crate) value: HeapValue,
}

pub(crate) struct ClassDef {
    pub(crate) path: String,
    pub(crate) superclass: Option<ClassId>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) statics: FxHashMap<String, SimValue>,
    pub(crate) object: ObjId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Local(u32),
    Global,
}

struct RefEntry {
    obj: ObjId,
    kind: RefKind,
}

enum PinBuffer {
    Bytes(Box<[i8]>),
    Ints(Box<[i32]>),
    Longs(Box<[i64]>),
}

struct Pin {
    array: ObjId,
    addr: usize,
    _buffer: PinBuffer,
}

/// A native method bound with `RegisterNatives`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBinding {
    /// Class internal name
    pub class: String,
    /// Method name
    pub name: String,
    /// Method descriptor
    pub signature: String,
    /// Bound function pointer
    pub fn_ptr: usize,
}

#[derive(Default, Clone, Copy)]
pub(crate) struct Core {
    pub(crate) object: ClassId,
    pub(crate) class: ClassId,
    pub(crate) string: ClassId,
    pub(crate) throwable: ClassId,
}

pub(crate) struct VmState {
    pub(crate) heap: Vec<HeapObj>,
    pub(crate) classes: Vec<ClassDef>,
    by_path: FxHashMap<String, ClassId>,
    pub(crate) core: Core,
    refs: FxHashMap<usize, RefEntry>,
    next_ref: usize,
    deleted: FxHashSet<usize>,
    method_ids: Vec<(ClassId, usize)>,
    method_index: FxHashMap<(ClassId, usize), usize>,
    field_ids: Vec<(ClassId, usize)>,
    field_index: FxHashMap<(ClassId, usize), usize>,
    pins: Vec<Pin>,
    pending: FxHashMap<u32, ObjId>,
    next_attach: u32,
    pub(crate) natives: Vec<NativeBinding>,
    pub(crate) native_calls: usize,
    pub(crate) silent_lookups: bool,
    pub(crate) refuse_allocations: bool,
    pub(crate) diagnostics: Vec<String>,
    pub(crate) stats: Stats,
}

const REF_STRIDE: usize = 8;

impl VmState {
    pub(crate) fn new() -> Self {
        Self {
            heap: Vec::new(),
            classes: Vec::new(),
            by_path: FxHashMap::default(),
            core: Core::default(),
            refs: FxHashMap::default(),
            next_ref: 0,
            deleted: FxHashSet::default(),
            method_ids: Vec::new(),
            method_index: FxHashMap::default(),
            field_ids: Vec::new(),
            field_index: FxHashMap::default(),
            pins: Vec::new(),
            pending: FxHashMap::default(),
            next_attach: 0,
            natives: Vec::new(),
            native_calls: 0,
            silent_lookups: false,
            refuse_allocations: false,
            diagnostics: Vec::new(),
            stats: Stats::default(),
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Load a class described by `builder`.
    pub(crate) fn define(&mut self, builder: ClassBuilder) -> Result<ClassId, SimError> {
        if let Some(err) = builder.errors.into_iter().next() {
            return Err(err);
        }
        let path = builder.name.as_path();
        if self.by_path.contains_key(&path) {
            return Err(SimError::DuplicateClass(path));
        }
        let superclass = match &builder.superclass {
            Some(name) => Some(
                self.class_by_path(&name.as_path())
                    .ok_or_else(|| SimError::UnknownClass(name.as_path()))?,
            ),
            None => None,
        };

        let mut statics = FxHashMap::default();
        for field in builder.fields.iter().filter(|f| f.is_static) {
            let value = self.initial_value(field)?;
            statics.insert(field.name.clone(), value);
        }

        let id = ClassId(self.classes.len() as u32);
        let object = self.alloc(self.core.class, HeapValue::Class(id));
        self.classes.push(ClassDef {
            path: path.clone(),
            superclass,
            methods: builder.methods,
            fields: builder.fields,
            statics,
            object,
        });
        self.by_path.insert(path.clone(), id);
        debug!("defined class {}", path);
        Ok(id)
    }

    fn initial_value(&mut self, field: &FieldDef) -> Result<SimValue, SimError> {
        let bad = || SimError::BadInitializer(field.name.clone());
        let value = match &field.init {
            FieldInit::Default => SimValue::zero(&field.ty),
            FieldInit::Value(value) if value.fits(&field.ty) => *value,
            FieldInit::Value(_) => return Err(bad()),
            FieldInit::Str(text) if field.ty == Type::string() => {
                SimValue::from(self.new_string(text))
            }
            FieldInit::IntArray(items) if field.ty == Type::array(Type::Int) => {
                SimValue::from(self.new_array(HeapValue::Ints(items.clone()), "[I"))
            }
            FieldInit::LongArray(items) if field.ty == Type::array(Type::Long) => {
                SimValue::from(self.new_array(HeapValue::Longs(items.clone()), "[J"))
            }
            FieldInit::Bytes(items) if field.ty == Type::array(Type::Byte) => {
                let bytes = items.iter().map(|b| *b as i8).collect();
                SimValue::from(self.new_array(HeapValue::Bytes(bytes), "[B"))
            }
            _ => return Err(bad()),
        };
        Ok(value)
    }

    /// Class by internal name; array classes are created on first use.
    pub(crate) fn class_by_path(&mut self, path: &str) -> Option<ClassId> {
        if let Some(id) = self.by_path.get(path) {
            return Some(*id);
        }
        if !path.starts_with('[') {
            return None;
        }
        let ty = Type::parse(path).ok()?;
        if let Some(Type::Class(element)) = ty.element() {
            self.class_by_path(&element.as_path())?;
        }
        let mut builder = ClassBuilder::new(path);
        builder.name = TypeName::from_segments([path]);
        self.define(builder).ok()
    }

    pub(crate) fn class_of(&self, obj: ObjId) -> ClassId {
        let heap_obj = &self.heap[obj.index()];
        match heap_obj.value {
            HeapValue::Class(_) => self.core.class,
            _ => heap_obj.class,
        }
    }

    /// `getName()` spelling: dots for packages, descriptors for arrays.
    pub(crate) fn dotted_name(&self, class: ClassId) -> String {
        self.classes[class.index()].path.replace('/', ".")
    }

    fn chain(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), |c| self.classes[c.index()].superclass)
    }

    pub(crate) fn is_subclass(&self, class: ClassId, of: ClassId) -> bool {
        self.chain(class).any(|c| c == of)
    }

    fn find_method(
        &self,
        class: ClassId,
        name: &str,
        descriptor: &str,
    ) -> Option<(ClassId, usize)> {
        if name == "<init>" {
            let index = self.classes[class.index()]
                .methods
                .iter()
                .position(|m| m.name == name && m.descriptor == descriptor)?;
            return Some((class, index));
        }
        self.chain(class).find_map(|c| {
            self.classes[c.index()]
                .methods
                .iter()
                .position(|m| m.name == name && m.descriptor == descriptor)
                .map(|index| (c, index))
        })
    }

    fn find_field(&self, class: ClassId, name: &str, descriptor: &str) -> Option<(ClassId, usize)> {
        self.chain(class).find_map(|c| {
            self.classes[c.index()]
                .fields
                .iter()
                .position(|f| f.name == name && f.descriptor == descriptor)
                .map(|index| (c, index))
        })
    }

    // ========================================================================
    // Heap
    // ========================================================================

    pub(crate) fn alloc(&mut self, class: ClassId, value: HeapValue) -> ObjId {
        let id = ObjId(self.heap.len() as u32);
        self.heap.push(HeapObj { class, value });
        id
    }

    /// New instance with every instance field of the hierarchy zeroed.
    pub(crate) fn instantiate(&mut self, class: ClassId) -> ObjId {
        if class == self.core.string {
            return self.alloc(class, HeapValue::Str(String::new()));
        }
        let fields = self
            .chain(class)
            .flat_map(|c| self.classes[c.index()].fields.iter())
            .filter(|f| !f.is_static)
            .map(|f| (f.name.clone(), SimValue::zero(&f.ty)))
            .collect();
        self.alloc(class, HeapValue::Instance(fields))
    }

    pub(crate) fn new_string(&mut self, text: &str) -> ObjId {
        self.alloc(self.core.string, HeapValue::Str(text.to_string()))
    }

    pub(crate) fn new_array(&mut self, value: HeapValue, class_path: &str) -> ObjId {
        let class = self.class_by_path(class_path).unwrap_or(self.core.object);
        self.alloc(class, value)
    }

    pub(crate) fn string(&self, obj: ObjId) -> Option<&str> {
        match &self.heap[obj.index()].value {
            HeapValue::Str(text) => Some(text),
            _ => None,
        }
    }

    /// A new throwable of `class` (falling back to `Throwable`) with `message`.
    pub(crate) fn make_throwable(&mut self, class: &str, message: Option<&str>) -> ObjId {
        let class = self
            .class_by_path(class)
            .filter(|c| self.is_subclass(*c, self.core.throwable))
            .unwrap_or(self.core.throwable);
        let obj = self.instantiate(class);
        let message = match message {
            Some(text) => SimValue::from(self.new_string(text)),
            None => SimValue::NULL,
        };
        if let HeapValue::Instance(fields) = &mut self.heap[obj.index()].value {
            fields.insert("detailMessage".to_string(), message);
        }
        obj
    }

    /// `toString()` of a throwable: class name, then `: message` if set.
    pub(crate) fn describe_throwable(&self, obj: ObjId) -> String {
        let name = self.dotted_name(self.class_of(obj));
        let message = match &self.heap[obj.index()].value {
            HeapValue::Instance(fields) => match fields.get("detailMessage") {
                Some(SimValue::Ref(Some(msg))) => self.string(*msg).map(str::to_string),
                _ => None,
            },
            _ => None,
        };
        match message {
            Some(message) => format!("{}: {}", name, message),
            None => name,
        }
    }

    fn throw(&mut self, attach: u32, class: &str, message: &str) {
        let throwable = self.make_throwable(class, Some(message));
        debug!("sim-{} throws {}: {}", attach, class, message);
        self.pending.insert(attach, throwable);
    }

    // ========================================================================
    // References
    // ========================================================================

    pub(crate) fn attach(&mut self) -> u32 {
        self.next_attach += 1;
        self.next_attach
    }

    pub(crate) fn detach(&mut self, attach: u32) {
        let before = self.refs.len();
        self.refs
            .retain(|_, entry| entry.kind != RefKind::Local(attach));
        self.stats.locals_discarded += before - self.refs.len();
        self.pending.remove(&attach);
    }

    fn new_ref(&mut self, obj: ObjId, kind: RefKind) -> Option<RawRef> {
        self.next_ref += 1;
        let raw = self.next_ref * REF_STRIDE;
        self.refs.insert(raw, RefEntry { obj, kind });
        match kind {
            RefKind::Local(_) => self.stats.locals_created += 1,
            RefKind::Global => self.stats.globals_created += 1,
        }
        RawRef::from_addr(raw)
    }

    pub(crate) fn local(&mut self, attach: u32, obj: ObjId) -> Option<RawRef> {
        self.new_ref(obj, RefKind::Local(attach))
    }

    fn resolve(&mut self, attach: u32, raw: RawRef, op: &'static str) -> Option<ObjId> {
        match self.refs.get(&raw.addr()) {
            Some(entry) => {
                if matches!(entry.kind, RefKind::Local(owner) if owner != attach) {
                    self.stats.violations.push(Violation::ForeignLocal { op });
                }
                Some(entry.obj)
            }
            None => {
                self.stats.violations.push(Violation::InvalidReference {
                    op,
                    raw: raw.addr(),
                });
                None
            }
        }
    }

    fn resolve_opt(&mut self, attach: u32, raw: Option<RawRef>, op: &'static str) -> Option<ObjId> {
        raw.and_then(|raw| self.resolve(attach, raw, op))
    }

    fn resolve_class(&mut self, attach: u32, raw: RawRef, op: &'static str) -> Option<ClassId> {
        let obj = self.resolve(attach, raw, op)?;
        match self.heap[obj.index()].value {
            HeapValue::Class(class) => Some(class),
            _ => {
                self.stats.violations.push(Violation::InvalidReference {
                    op,
                    raw: raw.addr(),
                });
                None
            }
        }
    }

    fn delete_ref(&mut self, attach: u32, raw: RawRef, global: bool) {
        let op = if global {
            "DeleteGlobalRef"
        } else {
            "DeleteLocalRef"
        };
        let addr = raw.addr();
        let Some(entry) = self.refs.get(&addr) else {
            let violation = if self.deleted.contains(&addr) {
                Violation::DoubleDelete { raw: addr }
            } else {
                Violation::InvalidReference { op, raw: addr }
            };
            self.stats.violations.push(violation);
            return;
        };
        let matches_kind = match entry.kind {
            RefKind::Global => global,
            RefKind::Local(owner) => !global && owner == attach,
        };
        if !matches_kind {
            self.stats
                .violations
                .push(Violation::WrongDelete { op, raw: addr });
            return;
        }
        self.refs.remove(&addr);
        self.deleted.insert(addr);
        if global {
            self.stats.globals_deleted += 1;
        } else {
            self.stats.locals_deleted += 1;
        }
    }

    fn check_pending(&mut self, attach: u32, op: &'static str) {
        if self.pending.contains_key(&attach) {
            self.stats
                .violations
                .push(Violation::PendingException { op });
        }
    }

    // ========================================================================
    // Native interface
    // ========================================================================

    pub(crate) fn find_class(&mut self, attach: u32, path: &str) -> Option<RawRef> {
        self.check_pending(attach, "FindClass");
        *self.stats.find_class.entry(path.to_string()).or_default() += 1;
        match self.class_by_path(path) {
            Some(class) => {
                let object = self.classes[class.index()].object;
                self.local(attach, object)
            }
            None => {
                if !self.silent_lookups {
                    self.throw(attach, "java/lang/NoClassDefFoundError", path);
                }
                None
            }
        }
    }

    pub(crate) fn get_object_class(&mut self, attach: u32, raw: RawRef) -> Option<RawRef> {
        let obj = self.resolve(attach, raw, "GetObjectClass")?;
        let class = self.class_of(obj);
        let object = self.classes[class.index()].object;
        self.local(attach, object)
    }

    pub(crate) fn get_method_id(
        &mut self,
        attach: u32,
        class: RawRef,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Option<MethodId> {
        self.check_pending(attach, "GetMethodID");
        self.stats.method_lookups += 1;
        let class = self.resolve_class(attach, class, "GetMethodID")?;
        let found = self
            .find_method(class, name, descriptor)
            .filter(|(c, i)| self.classes[c.index()].methods[*i].is_static == is_static);
        let Some(key) = found else {
            if !self.silent_lookups {
                self.throw(attach, "java/lang/NoSuchMethodError", name);
            }
            return None;
        };
        let index = match self.method_index.get(&key) {
            Some(index) => *index,
            None => {
                self.method_ids.push(key);
                self.method_index.insert(key, self.method_ids.len());
                self.method_ids.len()
            }
        };
        MethodId::from_addr(index)
    }

    pub(crate) fn get_field_id(
        &mut self,
        attach: u32,
        class: RawRef,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Option<FieldId> {
        self.check_pending(attach, "GetFieldID");
        self.stats.field_lookups += 1;
        let class = self.resolve_class(attach, class, "GetFieldID")?;
        let found = self
            .find_field(class, name, descriptor)
            .filter(|(c, i)| self.classes[c.index()].fields[*i].is_static == is_static);
        let Some(key) = found else {
            if !self.silent_lookups {
                self.throw(attach, "java/lang/NoSuchFieldError", name);
            }
            return None;
        };
        let index = match self.field_index.get(&key) {
            Some(index) => *index,
            None => {
                self.field_ids.push(key);
                self.field_index.insert(key, self.field_ids.len());
                self.field_ids.len()
            }
        };
        FieldId::from_addr(index)
    }

    fn import(&mut self, attach: u32, value: &JValue, op: &'static str) -> SimValue {
        match *value {
            JValue::Void => SimValue::Void,
            JValue::Boolean(b) => SimValue::Boolean(b != jvmlink::JNI_FALSE),
            JValue::Byte(v) => SimValue::Byte(v),
            JValue::Char(v) => SimValue::Char(v),
            JValue::Short(v) => SimValue::Short(v),
            JValue::Int(v) => SimValue::Int(v),
            JValue::Long(v) => SimValue::Long(v),
            JValue::Float(v) => SimValue::Float(v),
            JValue::Double(v) => SimValue::Double(v),
            JValue::Object(raw) => SimValue::Ref(self.resolve_opt(attach, raw, op)),
        }
    }

    fn export(&mut self, attach: u32, value: SimValue) -> JValue {
        match value {
            SimValue::Void => JValue::Void,
            SimValue::Boolean(b) => JValue::from_bool(b),
            SimValue::Byte(v) => JValue::Byte(v),
            SimValue::Char(v) => JValue::Char(v),
            SimValue::Short(v) => JValue::Short(v),
            SimValue::Int(v) => JValue::Int(v),
            SimValue::Long(v) => JValue::Long(v),
            SimValue::Float(v) => JValue::Float(v),
            SimValue::Double(v) => JValue::Double(v),
            SimValue::Ref(obj) => JValue::Object(obj.and_then(|obj| self.local(attach, obj))),
        }
    }

    /// Run a method body (or a bound native) with `this` and `args`.
    fn run(
        &mut self,
        attach: u32,
        (class, index): (ClassId, usize),
        this: Option<ObjId>,
        args: &[JValue],
    ) -> Result<SimValue, Thrown> {
        let method = self.classes[class.index()].methods[index].clone();
        let args: Vec<SimValue> = args
            .iter()
            .map(|arg| self.import(attach, arg, "Call*MethodA"))
            .collect();
        if args.len() != method.signature.params().len()
            || args
                .iter()
                .zip(method.signature.params())
                .any(|(arg, ty)| !arg.fits(ty))
        {
            self.stats.violations.push(Violation::WrongArguments {
                method: method.name.clone(),
            });
            return Ok(SimValue::zero(method.signature.ret()));
        }
        let Some(body) = method.body else {
            let bound = self.natives.iter().any(|n| {
                n.class == self.classes[class.index()].path
                    && n.name == method.name
                    && n.signature == method.descriptor
            });
            if !bound {
                let text = format!(
                    "{}.{}{}",
                    self.dotted_name(class),
                    method.name,
                    method.descriptor
                );
                return Err(Thrown(
                    self.make_throwable("java/lang/UnsatisfiedLinkError", Some(&text)),
                ));
            }
            self.native_calls += 1;
            return Ok(SimValue::zero(method.signature.ret()));
        };
        let mut frame = Frame::new(self, this);
        body(&mut frame, &args)
    }

    pub(crate) fn call_method(
        &mut self,
        attach: u32,
        kind: ValueKind,
        target: RawRef,
        method: MethodId,
        is_static: bool,
        args: &[JValue],
    ) -> JValue {
        self.check_pending(attach, "Call*MethodA");
        self.stats.calls += 1;
        let Some(&declared) = method.addr().checked_sub(1).and_then(|i| self.method_ids.get(i))
        else {
            self.stats
                .violations
                .push(Violation::UnknownId { op: "Call*MethodA" });
            return JValue::zero(kind);
        };
        let Some(target) = self.resolve(attach, target, "Call*MethodA") else {
            return JValue::zero(kind);
        };

        let def = &self.classes[declared.0.index()].methods[declared.1];
        let (name, descriptor) = (def.name.clone(), def.descriptor.clone());
        if def.is_static != is_static || ValueKind::of(def.signature.ret()) != kind {
            self.stats
                .violations
                .push(Violation::WrongReturnKind { method: name });
            return JValue::zero(kind);
        }
        if !is_static && !self.is_subclass(self.class_of(target), declared.0) {
            self.stats
                .violations
                .push(Violation::WrongReceiver { method: name });
            return JValue::zero(kind);
        }

        // instance calls dispatch on the receiver's runtime class
        let (resolved, this) = if is_static {
            (declared, None)
        } else {
            let runtime = self.class_of(target);
            let resolved = self
                .find_method(runtime, &name, &descriptor)
                .filter(|(c, i)| !self.classes[c.index()].methods[*i].is_static)
                .unwrap_or(declared);
            (resolved, Some(target))
        };

        match self.run(attach, resolved, this, args) {
            Ok(value) => self.export(attach, value),
            Err(Thrown(throwable)) => {
                self.pending.insert(attach, throwable);
                JValue::zero(kind)
            }
        }
    }

    pub(crate) fn new_object(
        &mut self,
        attach: u32,
        class: RawRef,
        ctor: MethodId,
        args: &[JValue],
    ) -> Option<RawRef> {
        self.check_pending(attach, "NewObjectA");
        self.stats.calls += 1;
        let class = self.resolve_class(attach, class, "NewObjectA")?;
        let Some(&declared) = ctor.addr().checked_sub(1).and_then(|i| self.method_ids.get(i))
        else {
            self.stats
                .violations
                .push(Violation::UnknownId { op: "NewObjectA" });
            return None;
        };
        if declared.0 != class || self.classes[class.index()].methods[declared.1].name != "<init>" {
            self.stats
                .violations
                .push(Violation::UnknownId { op: "NewObjectA" });
            return None;
        }
        if self.refuse_allocations {
            return None;
        }
        let obj = self.instantiate(class);
        match self.run(attach, declared, Some(obj), args) {
            Ok(_) => self.local(attach, obj),
            Err(Thrown(throwable)) => {
                self.pending.insert(attach, throwable);
                None
            }
        }
    }

    fn field_def(&mut self, field: FieldId, op: &'static str) -> Option<(ClassId, FieldDef)> {
        let found = field
            .addr()
            .checked_sub(1)
            .and_then(|i| self.field_ids.get(i))
            .copied();
        let Some((class, index)) = found else {
            self.stats.violations.push(Violation::UnknownId { op });
            return None;
        };
        Some((class, self.classes[class.index()].fields[index].clone()))
    }

    pub(crate) fn get_field(
        &mut self,
        attach: u32,
        kind: ValueKind,
        target: RawRef,
        field: FieldId,
        is_static: bool,
    ) -> JValue {
        self.check_pending(attach, "Get*Field");
        let Some((class, def)) = self.field_def(field, "Get*Field") else {
            return JValue::zero(kind);
        };
        if def.is_static != is_static || ValueKind::of(&def.ty) != kind {
            self.stats
                .violations
                .push(Violation::WrongFieldKind { field: def.name });
            return JValue::zero(kind);
        }
        let Some(target) = self.resolve(attach, target, "Get*Field") else {
            return JValue::zero(kind);
        };
        let value = if is_static {
            self.classes[class.index()].statics.get(&def.name).copied()
        } else {
            match &self.heap[target.index()].value {
                HeapValue::Instance(fields) => fields.get(&def.name).copied(),
                _ => None,
            }
        };
        let value = value.unwrap_or_else(|| SimValue::zero(&def.ty));
        self.export(attach, value)
    }

    pub(crate) fn set_field(
        &mut self,
        attach: u32,
        target: RawRef,
        field: FieldId,
        is_static: bool,
        value: JValue,
    ) {
        self.check_pending(attach, "Set*Field");
        let Some((class, def)) = self.field_def(field, "Set*Field") else {
            return;
        };
        if def.is_static != is_static || ValueKind::of(&def.ty) != value.kind() {
            self.stats
                .violations
                .push(Violation::WrongFieldKind { field: def.name });
            return;
        }
        let Some(target) = self.resolve(attach, target, "Set*Field") else {
            return;
        };
        let value = self.import(attach, &value, "Set*Field");
        if is_static {
            self.classes[class.index()].statics.insert(def.name, value);
        } else if let HeapValue::Instance(fields) = &mut self.heap[target.index()].value {
            fields.insert(def.name, value);
        }
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    pub(crate) fn exception_check(&self, attach: u32) -> bool {
        self.pending.contains_key(&attach)
    }

    pub(crate) fn exception_occurred(&mut self, attach: u32) -> Option<RawRef> {
        let throwable = *self.pending.get(&attach)?;
        self.local(attach, throwable)
    }

    pub(crate) fn exception_describe(&mut self, attach: u32) {
        if let Some(throwable) = self.pending.remove(&attach) {
            let text = self.describe_throwable(throwable);
            self.diagnostics
                .push(format!("Exception in thread \"sim-{}\" {}", attach, text));
            self.stats.describes += 1;
        }
    }

    pub(crate) fn exception_clear(&mut self, attach: u32) {
        self.pending.remove(&attach);
    }

    /// Raise `throwable` on `attach` as if thrown by the VM.
    pub(crate) fn raise(&mut self, attach: u32, throwable: ObjId) {
        self.pending.insert(attach, throwable);
    }

    // ========================================================================
    // References
    // ========================================================================

    pub(crate) fn new_local_ref(&mut self, attach: u32, raw: RawRef) -> Option<RawRef> {
        let obj = self.resolve(attach, raw, "NewLocalRef")?;
        self.local(attach, obj)
    }

    pub(crate) fn delete_local_ref(&mut self, attach: u32, raw: RawRef) {
        self.delete_ref(attach, raw, false);
    }

    pub(crate) fn new_global_ref(&mut self, attach: u32, raw: RawRef) -> Option<RawRef> {
        let obj = self.resolve(attach, raw, "NewGlobalRef")?;
        self.new_ref(obj, RefKind::Global)
    }

    pub(crate) fn delete_global_ref(&mut self, attach: u32, raw: RawRef) {
        self.delete_ref(attach, raw, true);
    }

    pub(crate) fn is_same_object(
        &mut self,
        attach: u32,
        a: Option<RawRef>,
        b: Option<RawRef>,
    ) -> bool {
        let a = self.resolve_opt(attach, a, "IsSameObject");
        let b = self.resolve_opt(attach, b, "IsSameObject");
        a == b
    }

    // ========================================================================
    // Strings and arrays
    // ========================================================================

    pub(crate) fn new_string_utf(&mut self, attach: u32, text: &str) -> Option<RawRef> {
        self.check_pending(attach, "NewStringUTF");
        let obj = self.new_string(text);
        self.local(attach, obj)
    }

    pub(crate) fn array_len(&self, obj: ObjId) -> Option<usize> {
        match &self.heap[obj.index()].value {
            HeapValue::Bytes(v) => Some(v.len()),
            HeapValue::Ints(v) => Some(v.len()),
            HeapValue::Longs(v) => Some(v.len()),
            HeapValue::Objects(v) => Some(v.len()),
            _ => None,
        }
    }

    pub(crate) fn get_array_length(&mut self, attach: u32, array: RawRef) -> i32 {
        let Some(obj) = self.resolve(attach, array, "GetArrayLength") else {
            return 0;
        };
        match self.array_len(obj) {
            Some(len) => i32::try_from(len).unwrap_or(i32::MAX),
            None => {
                self.stats.violations.push(Violation::InvalidReference {
                    op: "GetArrayLength",
                    raw: array.addr(),
                });
                0
            }
        }
    }

    pub(crate) fn new_byte_array(&mut self, attach: u32, len: i32) -> Option<RawRef> {
        self.check_pending(attach, "NewByteArray");
        let Ok(len) = usize::try_from(len) else {
            self.throw(attach, "java/lang/NegativeArraySizeException", &len.to_string());
            return None;
        };
        let obj = self.new_array(HeapValue::Bytes(vec![0; len]), "[B");
        self.local(attach, obj)
    }

    pub(crate) fn set_byte_array_region(
        &mut self,
        attach: u32,
        array: RawRef,
        start: i32,
        bytes: &[i8],
    ) {
        self.check_pending(attach, "SetByteArrayRegion");
        let Some(obj) = self.resolve(attach, array, "SetByteArrayRegion") else {
            return;
        };
        let in_bounds = match (&mut self.heap[obj.index()].value, usize::try_from(start)) {
            (HeapValue::Bytes(target), Ok(start)) => {
                match target.get_mut(start..start + bytes.len()) {
                    Some(slot) => {
                        slot.copy_from_slice(bytes);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };
        if !in_bounds {
            self.throw(attach, "java/lang/ArrayIndexOutOfBoundsException", &start.to_string());
        }
    }

    pub(crate) fn new_object_array(
        &mut self,
        attach: u32,
        len: i32,
        element: RawRef,
        init: Option<RawRef>,
    ) -> Option<RawRef> {
        self.check_pending(attach, "NewObjectArray");
        let element = self.resolve_class(attach, element, "NewObjectArray")?;
        let init = self.resolve_opt(attach, init, "NewObjectArray");
        let Ok(len) = usize::try_from(len) else {
            self.throw(attach, "java/lang/NegativeArraySizeException", &len.to_string());
            return None;
        };
        let element_path = &self.classes[element.index()].path;
        let path = if element_path.starts_with('[') {
            format!("[{}", element_path)
        } else {
            format!("[L{};", element_path)
        };
        let obj = self.new_array(HeapValue::Objects(vec![init; len]), &path);
        self.local(attach, obj)
    }

    pub(crate) fn get_object_array_element(
        &mut self,
        attach: u32,
        array: RawRef,
        index: i32,
    ) -> Option<RawRef> {
        self.check_pending(attach, "GetObjectArrayElement");
        let obj = self.resolve(attach, array, "GetObjectArrayElement")?;
        let item = match (&self.heap[obj.index()].value, usize::try_from(index)) {
            (HeapValue::Objects(items), Ok(i)) => items.get(i).copied(),
            _ => None,
        };
        match item {
            Some(item) => item.and_then(|item| self.local(attach, item)),
            None => {
                self.throw(attach, "java/lang/ArrayIndexOutOfBoundsException", &index.to_string());
                None
            }
        }
    }

    pub(crate) fn set_object_array_element(
        &mut self,
        attach: u32,
        array: RawRef,
        index: i32,
        value: Option<RawRef>,
    ) {
        self.check_pending(attach, "SetObjectArrayElement");
        let Some(obj) = self.resolve(attach, array, "SetObjectArrayElement") else {
            return;
        };
        let value = self.resolve_opt(attach, value, "SetObjectArrayElement");
        let stored = match (&mut self.heap[obj.index()].value, usize::try_from(index)) {
            (HeapValue::Objects(items), Ok(i)) => match items.get_mut(i) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !stored {
            self.throw(attach, "java/lang/ArrayIndexOutOfBoundsException", &index.to_string());
        }
    }

    pub(crate) fn get_array_elements(
        &mut self,
        attach: u32,
        array: RawRef,
        element: ValueKind,
    ) -> Option<NonNull<c_void>> {
        self.check_pending(attach, "Get*ArrayElements");
        let obj = self.resolve(attach, array, "Get*ArrayElements")?;
        let buffer = match (&self.heap[obj.index()].value, element) {
            (HeapValue::Bytes(v), ValueKind::Byte) => {
                PinBuffer::Bytes(v.clone().into_boxed_slice())
            }
            (HeapValue::Ints(v), ValueKind::Int) => PinBuffer::Ints(v.clone().into_boxed_slice()),
            (HeapValue::Longs(v), ValueKind::Long) => {
                PinBuffer::Longs(v.clone().into_boxed_slice())
            }
            _ => {
                self.stats.violations.push(Violation::InvalidReference {
                    op: "Get*ArrayElements",
                    raw: array.addr(),
                });
                return None;
            }
        };
        let ptr: *mut c_void = match &buffer {
            PinBuffer::Bytes(b) => b.as_ptr() as *mut c_void,
            PinBuffer::Ints(b) => b.as_ptr() as *mut c_void,
            PinBuffer::Longs(b) => b.as_ptr() as *mut c_void,
        };
        self.pins.push(Pin {
            array: obj,
            addr: ptr as usize,
            _buffer: buffer,
        });
        self.stats.pins += 1;
        NonNull::new(ptr)
    }

    pub(crate) fn release_array_elements(
        &mut self,
        attach: u32,
        array: RawRef,
        elements: NonNull<c_void>,
    ) {
        let Some(obj) = self.resolve(attach, array, "Release*ArrayElements") else {
            return;
        };
        let addr = elements.as_ptr() as usize;
        match self
            .pins
            .iter()
            .position(|pin| pin.array == obj && pin.addr == addr)
        {
            Some(index) => {
                self.pins.swap_remove(index);
                self.stats.unpins += 1;
            }
            None => self.stats.violations.push(Violation::BadRelease),
        }
    }

    pub(crate) fn pinned(&self) -> usize {
        self.pins.len()
    }

    // ========================================================================
    // Natives
    // ========================================================================

    pub(crate) fn register_native(
        &mut self,
        attach: u32,
        class: RawRef,
        name: &str,
        descriptor: &str,
        fn_ptr: *mut c_void,
    ) -> i32 {
        self.check_pending(attach, "RegisterNatives");
        let Some(class) = self.resolve_class(attach, class, "RegisterNatives") else {
            return -1;
        };
        let declared = self.classes[class.index()]
            .methods
            .iter()
            .any(|m| m.name == name && m.descriptor == descriptor && m.body.is_none());
        if !declared {
            self.throw(attach, "java/lang/NoSuchMethodError", name);
            return -1;
        }
        let binding = NativeBinding {
            class: self.classes[class.index()].path.clone(),
            name: name.to_string(),
            signature: descriptor.to_string(),
            fn_ptr: fn_ptr as usize,
        };
        self.natives.retain(|n| {
            !(n.class == binding.class
                && n.name == binding.name
                && n.signature == binding.signature)
        });
        self.natives.push(binding);
        0
    }

    pub(crate) fn unregister_natives(&mut self, attach: u32, class: RawRef) -> i32 {
        let Some(class) = self.resolve_class(attach, class, "UnregisterNatives") else {
            return -1;
        };
        let path = self.classes[class.index()].path.clone();
        self.natives.retain(|n| n.class != path);
        0
    }
}
