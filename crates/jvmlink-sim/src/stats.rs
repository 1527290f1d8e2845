//! Accounting of everything the binding asks the simulated VM to do

use std::fmt;

use rustc_hash::FxHashMap;

/// A use of the native interface that a real JVM would not tolerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A reference that was never handed out, or already deleted
    InvalidReference {
        /// Entry point that received it
        op: &'static str,
        /// Raw reference value
        raw: usize,
    },
    /// A deleted reference deleted again
    DoubleDelete {
        /// Raw reference value
        raw: usize,
    },
    /// A global deleted as a local or vice versa
    WrongDelete {
        /// Entry point used
        op: &'static str,
        /// Raw reference value
        raw: usize,
    },
    /// A local reference used on another attachment
    ForeignLocal {
        /// Entry point that received it
        op: &'static str,
    },
    /// A call made while an exception was pending
    PendingException {
        /// Entry point called
        op: &'static str,
    },
    /// A method called through the entry point of another return kind
    WrongReturnKind {
        /// Method name
        method: String,
    },
    /// A field accessed through the entry point of another kind
    WrongFieldKind {
        /// Field name
        field: String,
    },
    /// An instance method called on an object that is not an instance of
    /// the method's class
    WrongReceiver {
        /// Method name
        method: String,
    },
    /// Arguments that do not match the method descriptor
    WrongArguments {
        /// Method name
        method: String,
    },
    /// An id that was never handed out
    UnknownId {
        /// Entry point that received it
        op: &'static str,
    },
    /// Pinned elements released twice or never pinned
    BadRelease,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvalidReference { op, raw } => {
                write!(f, "{}: invalid reference {:#x}", op, raw)
            }
            Violation::DoubleDelete { raw } => write!(f, "reference {:#x} deleted twice", raw),
            Violation::WrongDelete { op, raw } => {
                write!(f, "{}: {:#x} is not of that reference kind", op, raw)
            }
            Violation::ForeignLocal { op } => {
                write!(f, "{}: local reference of another thread", op)
            }
            Violation::PendingException { op } => {
                write!(f, "{} called with an exception pending", op)
            }
            Violation::WrongReturnKind { method } => {
                write!(f, "{} called through the wrong return kind", method)
            }
            Violation::WrongFieldKind { field } => {
                write!(f, "{} accessed through the wrong field kind", field)
            }
            Violation::WrongReceiver { method } => {
                write!(f, "{} called on an object of an unrelated class", method)
            }
            Violation::WrongArguments { method } => {
                write!(f, "{} called with arguments not matching its descriptor", method)
            }
            Violation::UnknownId { op } => write!(f, "{}: unknown member id", op),
            Violation::BadRelease => f.write_str("release of elements that are not pinned"),
        }
    }
}

/// Counters kept by the simulated VM.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// `FindClass` calls per internal name
    pub find_class: FxHashMap<String, usize>,
    /// `Get(Static)MethodID` calls
    pub method_lookups: usize,
    /// `Get(Static)FieldID` calls
    pub field_lookups: usize,
    /// Method invocations, constructors included
    pub calls: usize,
    /// Local references created
    pub locals_created: usize,
    /// Local references deleted
    pub locals_deleted: usize,
    /// Local references still alive when their thread detached
    pub locals_discarded: usize,
    /// Global references created
    pub globals_created: usize,
    /// Global references deleted
    pub globals_deleted: usize,
    /// `Get<T>ArrayElements` calls
    pub pins: usize,
    /// `Release<T>ArrayElements` calls
    pub unpins: usize,
    /// `ExceptionDescribe` calls that had something to describe
    pub describes: usize,
    /// Misuse of the native interface
    pub violations: Vec<Violation>,
}

impl Stats {
    /// `FindClass` calls for one name.
    pub fn find_class_count(&self, path: &str) -> usize {
        self.find_class.get(path).copied().unwrap_or(0)
    }

    /// Local references created but not yet deleted.
    pub fn live_locals(&self) -> usize {
        self.locals_created
            .saturating_sub(self.locals_deleted + self.locals_discarded)
    }

    /// Global references created but not yet deleted.
    pub fn live_globals(&self) -> usize {
        self.globals_created.saturating_sub(self.globals_deleted)
    }
}
