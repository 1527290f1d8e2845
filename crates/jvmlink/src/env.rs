//! Environment: one attached JVM thread
//!
//! An `Environment` wraps a [`Runtime`] together with the per-environment
//! state the binding keeps:
//!
//! - the class cache (name to global class reference)
//! - the member-id cache for cached classes
//! - the mute flag for exception descriptions
//! - the charset object used for string conversion
//!
//! Cloning an `Environment` is cheap and shares all of the above. The type
//! is `!Send`: an environment is bound to the thread it was attached on.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::ffi::CString;
use std::fmt;
use std::rc::{Rc, Weak};

use jvmlink_types::TypeName;
use log::debug;
use once_cell::unsync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::args::Arg;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::handle::{Class, Global, Handle, Local, Object};
use crate::resolve::MemberCache;
use crate::runtime::Runtime;
use crate::value::RawRef;

pub(crate) struct EnvInner {
    runtime: Rc<dyn Runtime>,
    config: Config,
    classes: RefCell<FxHashMap<String, Rc<Global<Class>>>>,
    cached: RefCell<FxHashSet<RawRef>>,
    members: RefCell<MemberCache>,
    muted: Cell<bool>,
    charset: OnceCell<Global<Object>>,
}

/// A JVM attachment plus the binding's cached state.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<EnvInner>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("classes", &self.cached_class_count())
            .field("members", &self.cached_member_count())
            .field("muted", &self.muted())
            .field("charset", &self.config().charset)
            .finish()
    }
}

/// Restores the previous mute state when dropped.
pub struct MuteGuard {
    env: Environment,
    previous: bool,
}

impl Drop for MuteGuard {
    fn drop(&mut self) {
        self.env.mute(self.previous);
    }
}

/// `CString` for a name or descriptor.
pub(crate) fn c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|_| Error::InvalidName(text.to_string()))
}

impl Environment {
    /// Wrap a runtime with the default configuration.
    pub fn new<R: Runtime + 'static>(runtime: R) -> Self {
        Self::from_runtime(Rc::new(runtime), Config::default())
    }

    /// Wrap a runtime with a validated configuration.
    pub fn with_config<R: Runtime + 'static>(runtime: R, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_runtime(Rc::new(runtime), config))
    }

    /// Wrap a shared runtime.
    pub fn from_runtime(runtime: Rc<dyn Runtime>, config: Config) -> Self {
        let muted = config.mute_exceptions;
        Self {
            inner: Rc::new(EnvInner {
                runtime,
                config,
                classes: RefCell::new(FxHashMap::default()),
                cached: RefCell::new(FxHashSet::default()),
                members: RefCell::new(MemberCache::default()),
                muted: Cell::new(muted),
                charset: OnceCell::new(),
            }),
        }
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &Rc<dyn Runtime> {
        &self.inner.runtime
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> Weak<EnvInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<EnvInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn inner_members(&self) -> Ref<'_, MemberCache> {
        self.inner.members.borrow()
    }

    pub(crate) fn inner_members_mut(&self) -> RefMut<'_, MemberCache> {
        self.inner.members.borrow_mut()
    }

    // ========================================================================
    // Exception description
    // ========================================================================

    /// Suppress (or re-enable) describing exceptions before they are cleared.
    pub fn mute(&self, mute: bool) {
        self.inner.muted.set(mute);
    }

    /// True when exception descriptions are suppressed.
    pub fn muted(&self) -> bool {
        self.inner.muted.get()
    }

    /// Mute until the returned guard is dropped.
    pub fn mute_scope(&self) -> MuteGuard {
        let previous = self.muted();
        self.mute(true);
        MuteGuard {
            env: self.clone(),
            previous,
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Look up a class, caching it for the life of the environment.
    ///
    /// The first lookup of a name promotes the class to a global reference;
    /// later lookups of the same name return that reference without asking
    /// the JVM.
    pub fn get_class(&self, name: &TypeName) -> Result<Rc<Global<Class>>> {
        let key = name.as_path();
        if let Some(class) = self.inner.classes.borrow().get(&key) {
            return Ok(class.clone());
        }

        debug!("class cache miss: {}", key);
        let path = c_string(&key)?;
        let Some(raw) = self.runtime().find_class(&path) else {
            return Err(self.pending_or(Error::ClassNotFound(key)));
        };
        let local: Local<Class> = Local::new(self.runtime().clone(), raw);
        let global = Rc::new(local.to_global()?);

        self.inner.cached.borrow_mut().insert(global.raw());
        self.inner.classes.borrow_mut().insert(key, global.clone());
        Ok(global)
    }

    /// [`Environment::get_class`] for a dotted or slashed name.
    pub fn get_class_str(&self, name: &str) -> Result<Rc<Global<Class>>> {
        let name: TypeName = name.parse()?;
        self.get_class(&name)
    }

    /// True if `class` is a reference held by the class cache.
    pub fn is_cached_class(&self, class: &Class) -> bool {
        self.inner.cached.borrow().contains(&class.raw())
    }

    /// Number of classes in the cache.
    pub fn cached_class_count(&self) -> usize {
        self.inner.classes.borrow().len()
    }

    /// The runtime class of `obj`.
    pub fn get_object_class(&self, obj: &Object) -> Result<Local<Class>> {
        match self.runtime().get_object_class(obj.raw()) {
            Some(raw) => Ok(Local::new(self.runtime().clone(), raw)),
            None => Err(self.pending_or(Error::AllocationFailed("class reference"))),
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    /// New local reference to `obj`.
    pub fn new_local_ref(&self, obj: &Object) -> Result<Local<Object>> {
        match self.runtime().new_local_ref(obj.raw()) {
            Some(raw) => Ok(Local::new(self.runtime().clone(), raw)),
            None => Err(Error::AllocationFailed("local reference")),
        }
    }

    /// New global reference to `obj`.
    pub fn new_global_ref(&self, obj: &Object) -> Result<Global<Object>> {
        match self.runtime().new_global_ref(obj.raw()) {
            Some(raw) => Ok(Global::new(self.runtime().clone(), raw)),
            None => Err(Error::AllocationFailed("global reference")),
        }
    }

    /// JVM identity comparison; two nulls are the same object.
    pub fn is_same_object(&self, a: Option<&Object>, b: Option<&Object>) -> bool {
        self.runtime()
            .is_same_object(a.map(Object::as_raw), b.map(Object::as_raw))
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Construct an instance, returning a global reference to it.
    ///
    /// The constructor is chosen by the descriptor computed from `args`.
    pub fn new_instance(&self, class: &Class, args: &[Arg<'_>]) -> Result<Global<Object>> {
        let local = self.construct(class, args)?;
        local.into_global()
    }

    /// [`Environment::new_instance`] for a class looked up by name.
    pub fn new_instance_str(&self, name: &str, args: &[Arg<'_>]) -> Result<Global<Object>> {
        let class = self.get_class_str(name)?;
        self.new_instance(&class, args)
    }

    /// Construct an instance, returning the local reference.
    pub fn construct(&self, class: &Class, args: &[Arg<'_>]) -> Result<Local<Object>> {
        let ctor = self.resolve_constructor(class, args)?;
        let list = self.marshal(args)?;
        // temporaries in `list` are released after the exception check
        match self.runtime().new_object(class.raw(), ctor, list.cells()) {
            Some(raw) => Ok(Local::new(self.runtime().clone(), raw)),
            None => Err(self.pending_or(Error::AllocationFailed("object"))),
        }
    }

    /// New `java.lang.String` decoded from `text` with the configured charset.
    pub fn new_string_object(&self, text: &str) -> Result<Local<Object>> {
        let string = self.get_class(&TypeName::string())?;
        let charset = self.charset()?;
        self.construct(
            &string,
            &[
                Arg::Bytes(text.as_bytes()),
                Arg::Typed(charset, jvmlink_types::Type::string()),
            ],
        )
    }

    /// New `byte[]` holding a copy of `bytes`.
    pub fn new_byte_array(&self, bytes: &[u8]) -> Result<Local<Object>> {
        let len = array_len(bytes.len())?;
        let Some(raw) = self.runtime().new_byte_array(len) else {
            return Err(self.pending_or(Error::AllocationFailed("byte array")));
        };
        let array = Local::new(self.runtime().clone(), raw);
        if !bytes.is_empty() {
            // SAFETY: u8 and i8 have the same layout.
            let signed =
                unsafe { std::slice::from_raw_parts(bytes.as_ptr().cast::<i8>(), bytes.len()) };
            self.runtime().set_byte_array_region(raw, 0, signed);
            self.check_exception()?;
        }
        Ok(array)
    }

    /// New object array of `len` elements of `element`, each set to `init`.
    pub fn new_object_array(
        &self,
        len: usize,
        element: &Class,
        init: Option<&Object>,
    ) -> Result<Local<Object>> {
        let len = array_len(len)?;
        match self
            .runtime()
            .new_object_array(len, element.raw(), init.map(Object::as_raw))
        {
            Some(raw) => Ok(Local::new(self.runtime().clone(), raw)),
            None => Err(self.pending_or(Error::AllocationFailed("object array"))),
        }
    }

    /// Store `value` at `index` of an object array.
    pub fn set_object_array_element(
        &self,
        array: &Object,
        index: usize,
        value: Option<&Object>,
    ) -> Result<()> {
        let index = array_len(index)?;
        self.runtime()
            .set_object_array_element(array.raw(), index, value.map(Object::as_raw));
        self.check_exception()
    }

    /// The configured charset as a `java.lang.String`, created on first use.
    pub(crate) fn charset(&self) -> Result<&Object> {
        let charset = self.inner.charset.get_or_try_init(|| {
            let name = c_string(&self.config().charset)?;
            let Some(raw) = self.runtime().new_string_utf(&name) else {
                return Err(self.pending_or(Error::AllocationFailed("charset name")));
            };
            let local: Local<Object> = Local::new(self.runtime().clone(), raw);
            local.into_global()
        })?;
        Ok(charset)
    }
}

fn array_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::ArrayIndex(len))
}
