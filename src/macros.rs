#![allow(unused_macros)]

/// Declares a strongly-typed `u32`-backed index.
///
/// The generated type is `Copy`, ordered and hashable, converts to and from `usize`, and
/// formats as `<prefix><index>` for [`std::fmt::Display`] and `Name(index)` for
/// [`std::fmt::Debug`].
///
/// ```rust, ignore
///  define_index!(
///      /// Identifies a basic block.
///      BlockId, "bb"
///  );
///  let block = BlockId::new(3);
///  assert_eq!(block.to_string(), "bb3");
/// ```
macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// Creates an index from its raw position.
            ///
            /// # Panics
            ///
            /// Panics if `index` does not fit into 32 bits.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                assert!(index <= u32::MAX as usize, "index overflow");
                Self(index as u32)
            }

            /// Returns the raw position of this index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self::new(index)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.index()
            }
        }
    };
}
