//! JVM to host conversions
//!
//! Strings are read by asking the JVM to encode them with the configured
//! charset and copying the resulting `byte[]`. Primitive arrays are copied
//! out of pinned elements; the pin is released on every path.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use jvmlink_types::Type;

use crate::args::Arg;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::handle::{Handle, Local, Object};
use crate::resolve::Target;
use crate::runtime::Runtime;
use crate::value::{RawRef, ValueKind};

mod private {
    pub trait Sealed {}
}

/// Element type of a primitive array that can be pinned.
pub trait ArrayElement: Copy + private::Sealed {
    /// Entry point used to pin and release.
    const KIND: ValueKind;
}

macro_rules! array_element {
    ($($ty:ty => $kind:ident),*) => {
        $(
            impl private::Sealed for $ty {}
            impl ArrayElement for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )*
    };
}

array_element!(i8 => Byte, i16 => Short, i32 => Int, i64 => Long, f32 => Float, f64 => Double);

/// Pinned elements of a primitive array; released on drop.
pub(crate) struct PinnedElements<'a, T: ArrayElement> {
    runtime: &'a dyn Runtime,
    array: RawRef,
    elements: NonNull<c_void>,
    len: usize,
    _element: PhantomData<T>,
}

impl<T: ArrayElement> PinnedElements<'_, T> {
    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: the runtime guarantees `len` contiguous elements of `T`
        // at `elements` until they are released in `drop`.
        unsafe { std::slice::from_raw_parts(self.elements.as_ptr().cast::<T>(), self.len) }
    }
}

impl<T: ArrayElement> Drop for PinnedElements<'_, T> {
    fn drop(&mut self) {
        self.runtime
            .release_array_elements(self.array, T::KIND, self.elements);
    }
}

impl Environment {
    /// Length of an array object.
    pub fn array_length(&self, array: &Object) -> usize {
        usize::try_from(self.runtime().get_array_length(array.raw())).unwrap_or(0)
    }

    /// Pin a non-empty primitive array.
    pub(crate) fn pin<T: ArrayElement>(&self, array: &Object) -> Result<PinnedElements<'_, T>> {
        let len = self.array_length(array);
        let Some(elements) = self.runtime().get_array_elements(array.raw(), T::KIND) else {
            return Err(self.pending_or(Error::AllocationFailed("array elements")));
        };
        Ok(PinnedElements {
            runtime: &**self.runtime(),
            array: array.raw(),
            elements,
            len,
            _element: PhantomData,
        })
    }

    fn copy_array<T: ArrayElement>(&self, array: &Object) -> Result<Vec<T>> {
        if self.array_length(array) == 0 {
            return Ok(Vec::new());
        }
        let pinned = self.pin::<T>(array)?;
        Ok(pinned.as_slice().to_vec())
    }

    /// Copy an `int[]`.
    pub fn to_int_array(&self, array: &Object) -> Result<Vec<i32>> {
        self.copy_array(array)
    }

    /// Copy a `long[]`.
    pub fn to_long_array(&self, array: &Object) -> Result<Vec<i64>> {
        self.copy_array(array)
    }

    /// Copy a `byte[]`.
    pub fn to_byte_array(&self, array: &Object) -> Result<Vec<u8>> {
        let bytes: Vec<i8> = self.copy_array(array)?;
        Ok(bytes.into_iter().map(|b| b as u8).collect())
    }

    /// Local references to every element of an object array.
    ///
    /// A null array reads as empty.
    pub fn to_object_array(&self, array: Option<&Object>) -> Result<Vec<Option<Local<Object>>>> {
        let Some(array) = array else {
            return Ok(Vec::new());
        };
        let len = self.array_length(array);
        let mut items = Vec::with_capacity(len);
        for index in 0..len {
            let index = i32::try_from(index).map_err(|_| Error::ArrayIndex(index))?;
            let raw = self
                .runtime()
                .get_object_array_element(array.raw(), index);
            self.check_exception()?;
            items.push(raw.map(|raw| Local::new(self.runtime().clone(), raw)));
        }
        Ok(items)
    }

    /// Host text of a `java.lang.String`, decoded with the configured charset.
    ///
    /// `None` for a null string. Bytes that are not valid UTF-8 are
    /// replaced rather than rejected.
    pub fn to_string(&self, string: Option<&Object>) -> Result<Option<String>> {
        let Some(string) = string else {
            return Ok(None);
        };
        let charset = self.charset()?;
        let bytes = self.call_object(
            Target::Object(string),
            false,
            "getBytes",
            &Type::array(Type::Byte),
            &[Arg::Typed(charset, Type::string())],
        )?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let bytes = self.to_byte_array(&bytes)?;
        Ok(Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }))
    }
}
