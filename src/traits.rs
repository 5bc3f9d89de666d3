//! Helper traits for large zero-initialized tables.

use std::alloc;

/// Types whose zero value is the all-zeros bit pattern,
/// allowing large count tables to be heap allocated without going through the stack.
///
/// # Safety
/// The zero value of the type must be representable by the all zeros bit pattern
#[allow(unsafe_code)]
pub unsafe trait ZeroedIsZero: Sized + Copy {
    /// Allocates a zeroed value directly on the heap.
    #[must_use]
    fn box_zeroed() -> Box<Self> {
        unsafe {
            let layout = alloc::Layout::new::<Self>();
            let ptr = alloc::alloc_zeroed(layout).cast::<Self>();
            if ptr.is_null() {
                alloc::handle_alloc_error(layout)
            }
            Box::from_raw(ptr)
        }
    }
}

#[allow(unsafe_code)]
unsafe impl ZeroedIsZero for u8 {}

#[allow(unsafe_code)]
unsafe impl ZeroedIsZero for u32 {}

#[allow(unsafe_code)]
unsafe impl<T: ZeroedIsZero, const N: usize> ZeroedIsZero for [T; N] {}
