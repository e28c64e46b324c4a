//! Shared identifiers for the type engine.
//!
//! - [`Name`]: interned identifier (class names, type parameter names, members)
//! - [`TypeId`]: handle to an interned type
//! - [`ConstructorId`]: handle to a class or type-parameter declaration
//! - [`Span`]: byte range into a declaration script
//!
//! All handles are 32-bit `Copy` values with O(1) equality and hashing.

/// Compile-time assertion that a type has a specific size.
///
/// Used to keep the handle types from silently growing.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod ids;
mod interner;
mod span;

pub use ids::{ConstructorId, Name, TypeId};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use span::Span;

static_assert_size!(Name, 4);
static_assert_size!(TypeId, 4);
static_assert_size!(ConstructorId, 4);
static_assert_size!(Span, 8);
