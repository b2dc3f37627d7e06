//! The opaque, word-sized payload carried by every slot.

use core::fmt;
use core::mem::{align_of, size_of, MaybeUninit};
use core::ptr;

/// One machine word of opaque payload.
///
/// The engine copies words in and out of slots without looking at them. A
/// word may hold an integer, a raw pointer, or (inside this crate) the bytes
/// of any value small enough to fit. Storage is `MaybeUninit<*mut ()>`, so
/// pointer provenance survives the trip through the queue.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Word(MaybeUninit<*mut ()>);

const _: () = assert!(size_of::<Word>() == size_of::<usize>());

impl Word {
    pub(crate) const fn uninit() -> Self {
        Word(MaybeUninit::uninit())
    }

    /// Wrap an integer.
    ///
    /// The integer becomes a pointer with no provenance. Read it back only
    /// with [`Word::into_usize`]; never dereference it via
    /// [`Word::into_ptr`].
    pub fn from_usize(value: usize) -> Self {
        Word(MaybeUninit::new(value as *mut ()))
    }

    /// Read back a word created with [`Word::from_usize`].
    pub fn into_usize(self) -> usize {
        // SAFETY: every public constructor initializes the word.
        unsafe { self.0.assume_init() as usize }
    }

    /// Wrap a raw pointer. Ownership of the pointee is whatever the caller
    /// says it is; the queue never dereferences it.
    pub const fn from_ptr(ptr: *mut ()) -> Self {
        Word(MaybeUninit::new(ptr))
    }

    /// Read back a word created with [`Word::from_ptr`].
    pub fn into_ptr(self) -> *mut () {
        // SAFETY: every public constructor initializes the word.
        unsafe { self.0.assume_init() }
    }

    /// True if a `T` can be stored in a word by value.
    pub(crate) const fn fits<T>() -> bool {
        size_of::<T>() <= size_of::<Word>() && align_of::<T>() <= align_of::<Word>()
    }

    /// Move `value` into a word bytewise.
    ///
    /// # Safety
    ///
    /// `Word::fits::<T>()` must hold. The word now owns `value`: it must be
    /// unpacked as `T` exactly once, or the value leaks.
    pub(crate) unsafe fn pack<T>(value: T) -> Self {
        debug_assert!(Self::fits::<T>());
        let mut word = Word::uninit();
        ptr::write(word.0.as_mut_ptr().cast::<T>(), value);
        word
    }

    /// Move a `T` back out of a word.
    ///
    /// # Safety
    ///
    /// The word must have come from `Word::pack::<T>` and must not have been
    /// unpacked before. Unpacking a copy twice duplicates ownership.
    pub(crate) unsafe fn unpack<T>(self) -> T {
        debug_assert!(Self::fits::<T>());
        ptr::read(self.0.as_ptr().cast::<T>())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Word(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_pointer_handles() {
        assert_eq!(Word::from_usize(usize::MAX).into_usize(), usize::MAX);

        let mut target = 7u64;
        let raw = (&mut target as *mut u64).cast::<()>();
        assert_eq!(Word::from_ptr(raw).into_ptr(), raw);
    }

    #[test]
    fn fits_by_size_and_alignment() {
        assert!(Word::fits::<()>());
        assert!(Word::fits::<u8>());
        assert!(Word::fits::<usize>());
        assert!(Word::fits::<Box<String>>());
        assert!(Word::fits::<Option<Box<u32>>>());
        assert!(!Word::fits::<[usize; 2]>());
        assert!(!Word::fits::<String>());
    }

    #[test]
    fn pack_moves_owned_box() {
        let word = unsafe { Word::pack(Box::new(String::from("boxed"))) };
        let back: Box<String> = unsafe { word.unpack() };
        assert_eq!(*back, "boxed");
    }

    #[test]
    fn pack_small_values() {
        let word = unsafe { Word::pack((-3i16, 9u8)) };
        assert_eq!(unsafe { word.unpack::<(i16, u8)>() }, (-3, 9));

        let word = unsafe { Word::pack(Some('x')) };
        assert_eq!(unsafe { word.unpack::<Option<char>>() }, Some('x'));
    }
}
