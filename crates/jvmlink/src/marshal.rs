//! Argument marshalling
//!
//! Turns host arguments into a contiguous run of argument cells. Objects
//! created along the way (strings, byte arrays, object arrays) are owned by
//! the list and released when it drops, which the dispatcher does right
//! after the call returns.

use log::trace;

use crate::args::Arg;
use crate::env::Environment;
use crate::error::Result;
use crate::handle::{Handle, Local, Object};
use crate::value::JValue;

/// Marshalled arguments of one call.
pub(crate) struct ArgumentList {
    cells: Vec<JValue>,
    created: Vec<Local<Object>>,
}

impl ArgumentList {
    /// Cells in declaration order.
    pub(crate) fn cells(&self) -> &[JValue] {
        &self.cells
    }

    fn keep(&mut self, obj: Local<Object>) -> JValue {
        let cell = JValue::Object(Some(obj.raw()));
        self.created.push(obj);
        cell
    }
}

impl Environment {
    /// Marshal `args`.
    ///
    /// On failure the objects created so far are released with the
    /// partially built list.
    pub(crate) fn marshal(&self, args: &[Arg<'_>]) -> Result<ArgumentList> {
        let mut list = ArgumentList {
            cells: Vec::with_capacity(args.len()),
            created: Vec::new(),
        };
        for arg in args {
            let cell = match arg {
                Arg::Boolean(b) => JValue::from_bool(*b),
                Arg::Byte(v) => JValue::Byte(*v),
                Arg::Char(v) => JValue::Char(*v),
                Arg::Short(v) => JValue::Short(*v),
                Arg::Int(v) => JValue::Int(*v),
                Arg::Long(v) => JValue::Long(*v),
                Arg::Float(v) => JValue::Float(*v),
                Arg::Double(v) => JValue::Double(*v),
                Arg::Str(text) => {
                    let string = self.new_string_object(text)?;
                    list.keep(string)
                }
                Arg::Bytes(bytes) => {
                    let array = self.new_byte_array(bytes)?;
                    list.keep(array)
                }
                Arg::Object(obj) | Arg::Typed(obj, _) => JValue::Object(Some(obj.raw())),
                Arg::ObjectArray(items, element) => {
                    let class = self.get_class(element)?;
                    let array = self.new_object_array(items.len(), &class, None)?;
                    for (index, item) in items.iter().enumerate() {
                        self.set_object_array_element(&array, index, Some(*item))?;
                    }
                    list.keep(array)
                }
                Arg::Null(_) => JValue::Object(None),
            };
            list.cells.push(cell);
        }
        trace!(
            "marshalled {} arguments ({} temporaries)",
            list.cells.len(),
            list.created.len()
        );
        Ok(list)
    }
}
