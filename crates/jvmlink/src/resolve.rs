//! Member resolution
//!
//! Maps (receiver, staticness, name, descriptor) to a method or field id
//! plus the reference the call is made on:
//!
//! | Receiver | Static | Looked up on | Called on |
//! |----------|--------|--------------|-----------|
//! | class    | yes    | the class    | the class |
//! | class    | no     | the class    | the class object |
//! | object   | no     | its class    | the object |
//! | object   | yes    | its class    | its class |
//!
//! Ids resolved on classes held by the class cache are remembered when
//! `cache_members` is enabled; ids are only valid while their class is
//! loaded, and cached classes are pinned by a global reference.

use log::debug;
use rustc_hash::FxHashMap;

use jvmlink_types::{Type, Typed};

use crate::args::Arg;
use crate::env::{c_string, Environment};
use crate::error::{Error, MemberKind, Result};
use crate::handle::{Class, Handle, Local, Object};
use crate::value::{FieldId, MethodId, RawRef};

/// What a call or field access is made on.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A class
    Class(&'a Class),
    /// An instance
    Object(&'a Object),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemberKey {
    class: RawRef,
    name: String,
    signature: String,
    is_static: bool,
}

/// Resolved ids of members of cached classes.
#[derive(Default)]
pub(crate) struct MemberCache {
    methods: FxHashMap<MemberKey, MethodId>,
    fields: FxHashMap<MemberKey, FieldId>,
}

impl MemberCache {
    pub(crate) fn len(&self) -> usize {
        self.methods.len() + self.fields.len()
    }
}

/// A resolved member and the reference to use it on.
///
/// For static members reached through an object this holds the object's
/// class until the member has been used.
pub(crate) struct Resolved<I> {
    pub(crate) id: I,
    pub(crate) target: RawRef,
    _class: Option<Local<Class>>,
}

struct Located {
    lookup: RawRef,
    target: RawRef,
    class: Option<Local<Class>>,
    cacheable: bool,
}

impl Environment {
    fn locate(&self, target: Target<'_>, is_static: bool) -> Result<Located> {
        match target {
            Target::Class(class) => Ok(Located {
                lookup: class.raw(),
                target: class.raw(),
                class: None,
                cacheable: self.config().cache_members && self.is_cached_class(class),
            }),
            Target::Object(obj) => {
                let class = self.get_object_class(obj)?;
                let target = if is_static { class.raw() } else { obj.raw() };
                Ok(Located {
                    lookup: class.raw(),
                    target,
                    class: Some(class),
                    cacheable: false,
                })
            }
        }
    }

    /// Resolve a method whose descriptor is computed from `args` and `ret`.
    pub(crate) fn resolve_method(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ret: &Type,
        args: &[Arg<'_>],
    ) -> Result<Resolved<MethodId>> {
        let signature = self.form_for(ret, args)?;
        let located = self.locate(target, is_static)?;
        let id = self.method_id(
            located.lookup,
            name,
            &signature,
            is_static,
            located.cacheable,
            MemberKind::method(is_static),
        )?;
        Ok(Resolved {
            id,
            target: located.target,
            // an instance call no longer needs the receiver's class
            _class: if is_static { located.class } else { None },
        })
    }

    /// Resolve the constructor of `class` matching `args`.
    pub(crate) fn resolve_constructor(&self, class: &Class, args: &[Arg<'_>]) -> Result<MethodId> {
        let signature = self.form_for(&Type::Void, args)?;
        let cacheable = self.config().cache_members && self.is_cached_class(class);
        self.method_id(
            class.raw(),
            "<init>",
            &signature,
            false,
            cacheable,
            MemberKind::Constructor,
        )
    }

    /// Resolve a field of type `ty`.
    pub(crate) fn resolve_field(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ty: &Type,
    ) -> Result<Resolved<FieldId>> {
        ty.check_value("field")?;
        let signature = ty.type_string();
        let located = self.locate(target, is_static)?;
        let key = located.cacheable.then(|| MemberKey {
            class: located.lookup,
            name: name.to_string(),
            signature: signature.clone(),
            is_static,
        });
        if let Some(id) = key
            .as_ref()
            .and_then(|key| self.inner_members().fields.get(key).copied())
        {
            return Ok(Resolved {
                id,
                target: located.target,
                _class: None,
            });
        }

        let kind = MemberKind::field(is_static);
        debug!("resolving {} {} {}", kind, name, signature);
        let c_name = c_string(name)?;
        let c_sig = c_string(&signature)?;
        let Some(id) = self
            .runtime()
            .get_field_id(located.lookup, &c_name, &c_sig, is_static)
        else {
            return Err(self.pending_or(Error::MemberNotFound {
                kind,
                name: name.to_string(),
                signature,
            }));
        };
        if let Some(key) = key {
            self.inner_members_mut().fields.insert(key, id);
        }
        Ok(Resolved {
            id,
            target: located.target,
            _class: if is_static { located.class } else { None },
        })
    }

    fn method_id(
        &self,
        class: RawRef,
        name: &str,
        signature: &str,
        is_static: bool,
        cacheable: bool,
        kind: MemberKind,
    ) -> Result<MethodId> {
        let key = cacheable.then(|| MemberKey {
            class,
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
        });
        if let Some(id) = key
            .as_ref()
            .and_then(|key| self.inner_members().methods.get(key).copied())
        {
            return Ok(id);
        }

        debug!("resolving {} {} {}", kind, name, signature);
        let c_name = c_string(name)?;
        let c_sig = c_string(signature)?;
        let Some(id) = self
            .runtime()
            .get_method_id(class, &c_name, &c_sig, is_static)
        else {
            return Err(self.pending_or(Error::MemberNotFound {
                kind,
                name: name.to_string(),
                signature: signature.to_string(),
            }));
        };
        if let Some(key) = key {
            self.inner_members_mut().methods.insert(key, id);
        }
        Ok(id)
    }

    /// Number of member ids currently cached.
    pub fn cached_member_count(&self) -> usize {
        self.inner_members().len()
    }
}
