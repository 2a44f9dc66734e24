use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by note and connection ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind generated ids, shared so `note_3` and `conn_3` never collide
/// within a session. Restarts at zero per process; `with_prefix` skips any
/// candidate already interned (e.g. by a loaded snapshot).
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Declares an interned identifier type: 4 bytes, `Copy`, O(1) `Eq`/`Hash`,
/// serialized as its plain string.
macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh id with the default prefix.
            pub fn fresh() -> Self {
                Self::with_prefix($prefix)
            }

            /// Generate a fresh id with a custom prefix (e.g. `idea_4`).
            /// Never returns a string that is already interned.
            pub fn with_prefix(prefix: &str) -> Self {
                loop {
                    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                    let candidate = format!("{prefix}_{n}");
                    if !INTERNER.contains(&candidate) {
                        return Self::intern(&candidate);
                    }
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Stable identifier of a note card.
    NoteId,
    "note"
);

interned_id!(
    /// Stable identifier of a connection between two notes.
    ConnectionId,
    "conn"
);
