//! Zeroizing containers for key material and decrypted plaintext.
//!
//! - [`SecretBuffer`]: variable length, used for decrypted payloads
//! - [`SecretBytes`]: fixed length, used for derived session keys
//!
//! Both keep their bytes in a heap allocation that does not move for the
//! container's lifetime, so the best-effort `mlock` taken at construction
//! keeps covering the bytes however often the container itself is moved.

use std::fmt;

use secrecy::{ExposeSecret, SecretSlice};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// `mlock` over a heap range owned by the enclosing container.
///
/// Must be declared before the allocation it covers so it is dropped
/// (unlocked) while the range is still allocated.
struct PageLock {
    ptr: *const u8,
    len: usize,
    held: bool,
}

// SAFETY: the pointer is only passed to mlock/munlock, never dereferenced.
unsafe impl Send for PageLock {}
unsafe impl Sync for PageLock {}

impl PageLock {
    fn acquire(bytes: &[u8]) -> Self {
        let held = platform::mlock(bytes.as_ptr(), bytes.len());
        if !held {
            static WARNED: std::sync::Once = std::sync::Once::new();
            WARNED.call_once(|| {
                tracing::warn!(
                    bytes = bytes.len(),
                    "mlock failed; secrets may be swapped to disk (raise RLIMIT_MEMLOCK)"
                );
            });
        }
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
            held,
        }
    }
}

impl Drop for PageLock {
    fn drop(&mut self) {
        if self.held {
            platform::munlock(self.ptr, self.len);
        }
    }
}

/// Heap buffer for decrypted plaintext. Zeroized on drop.
pub struct SecretBuffer {
    lock: PageLock,
    inner: SecretSlice<u8>,
}

impl SecretBuffer {
    /// Copy `data` into a new locked allocation.
    ///
    /// The caller remains responsible for wiping its own copy of `data`.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        let inner: SecretSlice<u8> = data.to_vec().into();
        let lock = PageLock::acquire(inner.expose_secret());
        Self { lock, inner }
    }

    /// Borrow the plaintext. Keep the borrow short.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

/// Fixed-size secret such as a derived AES key.
///
/// Boxed so the locked address is the address of the key for as long as
/// the value lives. Wiped on drop before the pages are unlocked.
pub struct SecretBytes<const N: usize> {
    lock: PageLock,
    bytes: Box<[u8; N]>,
}

impl<const N: usize> SecretBytes<N> {
    /// Move `data` into a locked heap allocation.
    ///
    /// The caller remains responsible for wiping its own copy of `data`.
    #[must_use]
    pub fn new(data: [u8; N]) -> Self {
        let bytes = Box::new(data);
        let lock = PageLock::acquire(bytes.as_slice());
        Self { lock, bytes }
    }

    #[must_use]
    pub fn expose(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Drop for SecretBytes<N> {
    fn drop(&mut self) {
        self.bytes.as_mut_slice().zeroize();
    }
}

impl<const N: usize> ZeroizeOnDrop for SecretBytes<N> {}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>(***)")
    }
}

#[cfg(unix)]
mod platform {
    pub(super) fn mlock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: mlock only inspects the address range; a bad range yields
        // an error code, treated as "not locked".
        unsafe { libc::mlock(ptr.cast(), len) == 0 }
    }

    pub(super) fn munlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: the range is still allocated (see `PageLock`); failure is
        // ignored.
        unsafe {
            libc::munlock(ptr.cast(), len);
        }
    }
}

#[cfg(not(unix))]
mod platform {
    pub(super) const fn mlock(_ptr: *const u8, len: usize) -> bool {
        len == 0
    }

    pub(super) const fn munlock(_ptr: *const u8, _len: usize) {}
}
