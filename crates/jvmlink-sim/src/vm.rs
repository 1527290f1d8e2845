//! The simulated VM and its thread attachments

use std::ffi::{c_void, CStr};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use jvmlink::{FieldId, JValue, MethodId, RawRef, Runtime, ValueKind};
use log::debug;
use parking_lot::Mutex;

use crate::bootstrap::bootstrap;
use crate::class::ClassBuilder;
use crate::error::SimError;
use crate::state::{NativeBinding, VmState};
use crate::stats::{Stats, Violation};
use crate::value::ClassId;

/// An in-process JVM.
///
/// Cheap to clone; clones share the heap, the loaded classes and the
/// reference table. Each thread talks to it through its own [`SimEnv`].
#[derive(Clone)]
pub struct SimVm {
    state: Arc<Mutex<VmState>>,
}

impl SimVm {
    /// A VM with the built-in classes loaded.
    pub fn new() -> Self {
        let mut state = VmState::new();
        bootstrap(&mut state);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Load a class.
    pub fn define(&self, builder: ClassBuilder) -> Result<ClassId, SimError> {
        self.state.lock().define(builder)
    }

    /// Attach the calling thread; the attachment detaches on drop.
    pub fn attach(&self) -> SimEnv {
        let id = self.state.lock().attach();
        debug!("attached sim-{}", id);
        SimEnv {
            vm: self.clone(),
            id,
        }
    }

    /// Make failed `FindClass`, `GetMethodID` and `GetFieldID` calls
    /// return null without raising an exception.
    pub fn set_silent_lookups(&self, silent: bool) {
        self.state.lock().silent_lookups = silent;
    }

    /// Make `NewObjectA` return null without running the constructor or
    /// raising an exception.
    pub fn set_refuse_allocations(&self, refuse: bool) {
        self.state.lock().refuse_allocations = refuse;
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> Stats {
        self.state.lock().stats.clone()
    }

    /// Misuse of the native interface seen so far.
    pub fn violations(&self) -> Vec<Violation> {
        self.state.lock().stats.violations.clone()
    }

    /// Lines written by `ExceptionDescribe`.
    pub fn diagnostics(&self) -> Vec<String> {
        self.state.lock().diagnostics.clone()
    }

    /// Native methods currently bound.
    pub fn registered_natives(&self) -> Vec<NativeBinding> {
        self.state.lock().natives.clone()
    }

    /// Calls that reached a bound native method.
    pub fn native_calls(&self) -> usize {
        self.state.lock().native_calls
    }

    /// Local references not yet deleted or discarded.
    pub fn live_locals(&self) -> usize {
        self.state.lock().stats.live_locals()
    }

    /// Global references not yet deleted.
    pub fn live_globals(&self) -> usize {
        self.state.lock().stats.live_globals()
    }

    /// Arrays currently pinned.
    pub fn pinned(&self) -> usize {
        self.state.lock().pinned()
    }
}

impl Default for SimVm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimVm")
            .field("classes", &state.classes.len())
            .field("heap", &state.heap.len())
            .finish()
    }
}

/// One attached thread of a [`SimVm`]; implements [`Runtime`].
pub struct SimEnv {
    vm: SimVm,
    id: u32,
}

impl SimEnv {
    /// The VM this attachment belongs to.
    pub fn vm(&self) -> &SimVm {
        &self.vm
    }

    /// Attachment id; describes name the thread `sim-<id>`.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Raise an exception of `class` on this thread, as if the last call threw.
    pub fn raise(&self, class: &str, message: &str) {
        let mut state = self.vm.state.lock();
        let throwable = state.make_throwable(class, Some(message));
        state.raise(self.id, throwable);
    }
}

impl Drop for SimEnv {
    fn drop(&mut self) {
        self.vm.state.lock().detach(self.id);
        debug!("detached sim-{}", self.id);
    }
}

impl fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimEnv").field("id", &self.id).finish()
    }
}

impl Runtime for SimEnv {
    fn find_class(&self, path: &CStr) -> Option<RawRef> {
        self.vm
            .state
            .lock()
            .find_class(self.id, &path.to_string_lossy())
    }

    fn get_object_class(&self, obj: RawRef) -> Option<RawRef> {
        self.vm.state.lock().get_object_class(self.id, obj)
    }

    fn get_method_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<MethodId> {
        self.vm.state.lock().get_method_id(
            self.id,
            class,
            &name.to_string_lossy(),
            &signature.to_string_lossy(),
            is_static,
        )
    }

    fn get_field_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<FieldId> {
        self.vm.state.lock().get_field_id(
            self.id,
            class,
            &name.to_string_lossy(),
            &signature.to_string_lossy(),
            is_static,
        )
    }

    fn call_method(
        &self,
        kind: ValueKind,
        target: RawRef,
        method: MethodId,
        is_static: bool,
        args: &[JValue],
    ) -> JValue {
        self.vm
            .state
            .lock()
            .call_method(self.id, kind, target, method, is_static, args)
    }

    fn new_object(&self, class: RawRef, ctor: MethodId, args: &[JValue]) -> Option<RawRef> {
        self.vm.state.lock().new_object(self.id, class, ctor, args)
    }

    fn get_field(
        &self,
        kind: ValueKind,
        target: RawRef,
        field: FieldId,
        is_static: bool,
    ) -> JValue {
        self.vm
            .state
            .lock()
            .get_field(self.id, kind, target, field, is_static)
    }

    fn set_field(&self, target: RawRef, field: FieldId, is_static: bool, value: JValue) {
        self.vm
            .state
            .lock()
            .set_field(self.id, target, field, is_static, value)
    }

    fn exception_check(&self) -> bool {
        self.vm.state.lock().exception_check(self.id)
    }

    fn exception_occurred(&self) -> Option<RawRef> {
        self.vm.state.lock().exception_occurred(self.id)
    }

    fn exception_describe(&self) {
        self.vm.state.lock().exception_describe(self.id)
    }

    fn exception_clear(&self) {
        self.vm.state.lock().exception_clear(self.id)
    }

    fn new_local_ref(&self, obj: RawRef) -> Option<RawRef> {
        self.vm.state.lock().new_local_ref(self.id, obj)
    }

    fn delete_local_ref(&self, obj: RawRef) {
        self.vm.state.lock().delete_local_ref(self.id, obj)
    }

    fn new_global_ref(&self, obj: RawRef) -> Option<RawRef> {
        self.vm.state.lock().new_global_ref(self.id, obj)
    }

    fn delete_global_ref(&self, obj: RawRef) {
        self.vm.state.lock().delete_global_ref(self.id, obj)
    }

    fn is_same_object(&self, a: Option<RawRef>, b: Option<RawRef>) -> bool {
        self.vm.state.lock().is_same_object(self.id, a, b)
    }

    fn new_string_utf(&self, text: &CStr) -> Option<RawRef> {
        self.vm
            .state
            .lock()
            .new_string_utf(self.id, &text.to_string_lossy())
    }

    fn get_array_length(&self, array: RawRef) -> i32 {
        self.vm.state.lock().get_array_length(self.id, array)
    }

    fn new_byte_array(&self, len: i32) -> Option<RawRef> {
        self.vm.state.lock().new_byte_array(self.id, len)
    }

    fn set_byte_array_region(&self, array: RawRef, start: i32, bytes: &[i8]) {
        self.vm
            .state
            .lock()
            .set_byte_array_region(self.id, array, start, bytes)
    }

    fn new_object_array(
        &self,
        len: i32,
        element_class: RawRef,
        init: Option<RawRef>,
    ) -> Option<RawRef> {
        self.vm
            .state
            .lock()
            .new_object_array(self.id, len, element_class, init)
    }

    fn get_object_array_element(&self, array: RawRef, index: i32) -> Option<RawRef> {
        self.vm
            .state
            .lock()
            .get_object_array_element(self.id, array, index)
    }

    fn set_object_array_element(&self, array: RawRef, index: i32, value: Option<RawRef>) {
        self.vm
            .state
            .lock()
            .set_object_array_element(self.id, array, index, value)
    }

    fn get_array_elements(&self, array: RawRef, element: ValueKind) -> Option<NonNull<c_void>> {
        self.vm
            .state
            .lock()
            .get_array_elements(self.id, array, element)
    }

    fn release_array_elements(
        &self,
        array: RawRef,
        _element: ValueKind,
        elements: NonNull<c_void>,
    ) {
        self.vm
            .state
            .lock()
            .release_array_elements(self.id, array, elements)
    }

    fn register_native(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        fn_ptr: *mut c_void,
    ) -> i32 {
        self.vm.state.lock().register_native(
            self.id,
            class,
            &name.to_string_lossy(),
            &signature.to_string_lossy(),
            fn_ptr,
        )
    }

    fn unregister_natives(&self, class: RawRef) -> i32 {
        self.vm.state.lock().unregister_natives(self.id, class)
    }
}
