//! What a method body sees of the VM

use crate::state::{HeapValue, VmState};
use crate::value::{ObjId, SimValue, Thrown};

/// Access to the heap from inside a running method.
///
/// Accessors that expect an object of some shape throw the exception the
/// JVM would throw (`NullPointerException`, `ClassCastException`) instead
/// of panicking, so bodies can use `?` throughout.
pub struct Frame<'a> {
    state: &'a mut VmState,
    this: Option<ObjId>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(state: &'a mut VmState, this: Option<ObjId>) -> Self {
        Self { state, this }
    }

    /// The receiver; `None` in static methods.
    pub fn this(&self) -> Option<ObjId> {
        self.this
    }

    /// The receiver, throwing if called from a static method.
    pub fn this_or_throw(&mut self) -> Result<ObjId, Thrown> {
        match self.this {
            Some(this) => Ok(this),
            None => Err(self.throw("java/lang/IllegalStateException", "no receiver")),
        }
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// A new throwable of `class` with `message`, ready to return as `Err`.
    pub fn throw(&mut self, class: &str, message: &str) -> Thrown {
        Thrown(self.state.make_throwable(class, Some(message)))
    }

    /// `NullPointerException`
    pub fn npe(&mut self) -> Thrown {
        Thrown(
            self.state
                .make_throwable("java/lang/NullPointerException", None),
        )
    }

    fn class_cast(&mut self, obj: ObjId, expected: &str) -> Thrown {
        let message = format!("{} cannot be cast to {}", self.class_name(obj), expected);
        self.throw("java/lang/ClassCastException", &message)
    }

    /// The object behind a reference argument; throws on null.
    pub fn object(&mut self, value: SimValue) -> Result<ObjId, Thrown> {
        match value {
            SimValue::Ref(Some(obj)) => Ok(obj),
            _ => Err(self.npe()),
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// `getName()` of the runtime class of `obj`.
    pub fn class_name(&self, obj: ObjId) -> String {
        self.state.dotted_name(self.state.class_of(obj))
    }

    /// The `java.lang.Class` object of `obj`'s runtime class.
    pub fn class_object_of(&self, obj: ObjId) -> ObjId {
        let class = self.state.class_of(obj);
        self.state.classes[class.index()].object
    }

    /// The `java.lang.Class` object for an internal name.
    pub fn class_object(&mut self, path: &str) -> Option<ObjId> {
        let class = self.state.class_by_path(path)?;
        Some(self.state.classes[class.index()].object)
    }

    /// `getName()` of a `java.lang.Class` object.
    pub fn name_of_class(&mut self, class_object: ObjId) -> Result<String, Thrown> {
        match self.state.heap[class_object.index()].value {
            HeapValue::Class(class) => Ok(self.state.dotted_name(class)),
            _ => Err(self.class_cast(class_object, "java.lang.Class")),
        }
    }

    /// True if `obj` is an instance of the class named `path` or a subclass.
    pub fn is_instance(&mut self, obj: ObjId, path: &str) -> bool {
        match self.state.class_by_path(path) {
            Some(class) => self.state.is_subclass(self.state.class_of(obj), class),
            None => false,
        }
    }

    // ========================================================================
    // Strings
    // ========================================================================

    /// A new `java.lang.String`.
    pub fn new_string(&mut self, text: &str) -> ObjId {
        self.state.new_string(text)
    }

    /// Text of a `java.lang.String` argument.
    pub fn string(&mut self, value: SimValue) -> Result<String, Thrown> {
        let obj = self.object(value)?;
        match self.state.string(obj) {
            Some(text) => Ok(text.to_string()),
            None => Err(self.class_cast(obj, "java.lang.String")),
        }
    }

    /// Replace the text of a `java.lang.String` under construction.
    pub fn set_string(&mut self, obj: ObjId, text: String) {
        if let HeapValue::Str(current) = &mut self.state.heap[obj.index()].value {
            *current = text;
        }
    }

    /// `toString()` of a throwable.
    pub fn describe_throwable(&self, obj: ObjId) -> String {
        self.state.describe_throwable(obj)
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// A new `byte[]`.
    pub fn new_bytes(&mut self, bytes: &[u8]) -> ObjId {
        let bytes = bytes.iter().map(|b| *b as i8).collect();
        self.state.new_array(HeapValue::Bytes(bytes), "[B")
    }

    /// Contents of a `byte[]` argument.
    pub fn bytes(&mut self, value: SimValue) -> Result<Vec<u8>, Thrown> {
        let obj = self.object(value)?;
        match &self.state.heap[obj.index()].value {
            HeapValue::Bytes(bytes) => Ok(bytes.iter().map(|b| *b as u8).collect()),
            _ => Err(self.class_cast(obj, "byte[]")),
        }
    }

    /// A new `int[]`.
    pub fn new_int_array(&mut self, items: Vec<i32>) -> ObjId {
        self.state.new_array(HeapValue::Ints(items), "[I")
    }

    /// Contents of an `int[]` argument.
    pub fn int_array(&mut self, value: SimValue) -> Result<Vec<i32>, Thrown> {
        let obj = self.object(value)?;
        match &self.state.heap[obj.index()].value {
            HeapValue::Ints(items) => Ok(items.clone()),
            _ => Err(self.class_cast(obj, "int[]")),
        }
    }

    /// A new `long[]`.
    pub fn new_long_array(&mut self, items: Vec<i64>) -> ObjId {
        self.state.new_array(HeapValue::Longs(items), "[J")
    }

    /// A new array of references; `element` is the element's internal name.
    pub fn new_object_array(&mut self, element: &str, items: Vec<Option<ObjId>>) -> ObjId {
        let path = if element.starts_with('[') {
            format!("[{}", element)
        } else {
            format!("[L{};", element)
        };
        self.state.new_array(HeapValue::Objects(items), &path)
    }

    /// Contents of a reference array argument.
    pub fn objects(&mut self, value: SimValue) -> Result<Vec<Option<ObjId>>, Thrown> {
        let obj = self.object(value)?;
        match &self.state.heap[obj.index()].value {
            HeapValue::Objects(items) => Ok(items.clone()),
            _ => Err(self.class_cast(obj, "java.lang.Object[]")),
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Instance field of `obj`; `Void` if it has none of that name.
    pub fn field(&self, obj: ObjId, name: &str) -> SimValue {
        match &self.state.heap[obj.index()].value {
            HeapValue::Instance(fields) => fields.get(name).copied().unwrap_or(SimValue::Void),
            _ => SimValue::Void,
        }
    }

    /// Store an instance field of `obj`.
    pub fn set_field(&mut self, obj: ObjId, name: &str, value: SimValue) {
        if let HeapValue::Instance(fields) = &mut self.state.heap[obj.index()].value {
            fields.insert(name.to_string(), value);
        }
    }

    /// Static field of the class named `path`.
    pub fn static_field(&mut self, path: &str, name: &str) -> SimValue {
        self.state
            .class_by_path(path)
            .and_then(|class| self.state.classes[class.index()].statics.get(name).copied())
            .unwrap_or(SimValue::Void)
    }

    /// Store a static field of the class named `path`.
    pub fn set_static_field(&mut self, path: &str, name: &str, value: SimValue) {
        if let Some(class) = self.state.class_by_path(path) {
            self.state.classes[class.index()]
                .statics
                .insert(name.to_string(), value);
        }
    }
}
