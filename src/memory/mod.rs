//! Arena storage and index newtypes shared by the base forest and the cluster hierarchy.
//!
//! Clusters point at each other through plain indices into a [`Slab`], so parent links and vertex
//! handles never own anything.
pub mod slab;

pub use slab::Slab;

/// An index into one of the arenas of this crate.
pub trait EntityIndex: Copy + Eq + Default {
    /// Creates an index from its position.
    ///
    /// # Panics
    ///
    /// Panics when the position does not fit into the backing integer.
    fn new(index: usize) -> Self {
        Self::try_new(index).expect("index out of range for its backing type")
    }

    fn try_new(index: usize) -> Option<Self>;
    fn index(self) -> usize;
}

/// Provides the common implementation of an n-bit entity index.
///
/// Based on [`cranelift_entity`'s `entity_impl!`][entity_impl].
///
/// [entity_impl]: https://docs.rs/cranelift-entity/0.89.2/cranelift_entity/macro.entity_impl.html
#[macro_export]
macro_rules! entity_impl {
    ($entity:ident, $backing:ty) => {
        impl $crate::memory::EntityIndex for $entity {
            #[inline(always)]
            fn try_new(ix: usize) -> Option<Self> {
                if ix <= (<$backing>::MAX as usize) || (<$backing>::BITS) > usize::BITS {
                    Some($entity(ix as $backing))
                } else {
                    None
                }
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$entity> for usize {
            #[inline(always)]
            fn from(value: $entity) -> usize {
                value.0 as usize
            }
        }

        impl std::fmt::Display for $entity {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Declares index newtypes backed by an unsigned integer.
#[macro_export]
macro_rules! make_entity {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident($backing:ty);)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
            $vis struct $name($backing);

            $crate::entity_impl!($name, $backing);
        )*
    };
}
