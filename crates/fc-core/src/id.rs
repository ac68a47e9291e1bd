use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for element IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Shared counter so generated node and connector IDs never repeat within a process.
static COUNTER: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Prefix used for generated IDs (`node_7`, `conn_12`).
            pub const PREFIX: &'static str = $prefix;

            /// Intern a string as an ID, or return the existing one.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a process-unique ID such as `node_3`.
            ///
            /// Uniqueness within a graph is the graph's job: it skips IDs that
            /// are already taken (e.g. by a loaded document).
            pub fn generate() -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{}_{n}", Self::PREFIX))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

interned_id!(
    /// Identifier of a node (a visual shape) on the canvas.
    NodeId,
    "node"
);

interned_id!(
    /// Identifier of a connector between two nodes.
    ConnectorId,
    "conn"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("start");
        let b = NodeId::intern("start");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "start");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node_"));
        assert!(ConnectorId::generate().as_str().starts_with("conn_"));
    }

    #[test]
    fn display_is_the_raw_id() {
        assert_eq!(ConnectorId::intern("c1").to_string(), "c1");
    }
}
