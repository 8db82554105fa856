//! Containers for unlocked master keys, derived AES material and decrypted
//! payloads.
//!
//! Everything here is erased on drop and prints as `***`. Heap buffers are
//! additionally pinned in RAM with `mlock` when the OS allows it; failure to
//! pin is reported through [`SecretBuffer::is_mlocked`], never as an error.

use std::fmt;

use secrecy::{ExposeSecret, SecretSlice};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Page pinning
// ---------------------------------------------------------------------------

/// Keeps a heap range `mlock`ed until dropped.
struct PinnedPages {
    addr: usize,
    len: usize,
    pinned: bool,
}

impl PinnedPages {
    fn pin(bytes: &[u8]) -> Self {
        let addr = bytes.as_ptr() as usize;
        let len = bytes.len();
        Self {
            addr,
            len,
            pinned: len > 0 && os::lock_range(addr, len),
        }
    }
}

impl Drop for PinnedPages {
    fn drop(&mut self) {
        if self.pinned {
            os::unlock_range(self.addr, self.len);
        }
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Heap bytes holding a master key or a decrypted entry payload.
///
/// Backed by [`SecretSlice`], so the allocation is zeroized when dropped.
pub struct SecretBuffer {
    bytes: SecretSlice<u8>,
    pages: PinnedPages,
}

impl SecretBuffer {
    /// Copy `data` into a fresh pinned allocation.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        let bytes: SecretSlice<u8> = data.to_vec().into();
        let pages = PinnedPages::pin(bytes.expose_secret());
        Self { bytes, pages }
    }

    /// Borrow the plaintext bytes.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Whether the allocation is pinned in RAM.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.pages.pinned
    }

    /// Equality check whose timing does not depend on where the first
    /// mismatch is. Differing lengths compare unequal immediately.
    #[must_use]
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        let mine = self.expose();
        mine.len() == other.len()
            && mine
                .iter()
                .zip(other)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl Clone for SecretBuffer {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer({} bytes, ***)", self.len())
    }
}

// ---------------------------------------------------------------------------
// SecretBytes<N>
// ---------------------------------------------------------------------------

/// Stack array for a derived AES key or IV, wiped on drop.
///
/// Not pinned: the value moves freely, so there is no stable address to
/// `mlock`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes<const N: usize>([u8; N]);

impl<const N: usize> SecretBytes<N> {
    #[must_use]
    pub const fn new(data: [u8; N]) -> Self {
        Self(data)
    }

    #[must_use]
    pub const fn expose(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>(***)")
    }
}

// ---------------------------------------------------------------------------
// Process hardening
// ---------------------------------------------------------------------------

/// Set `RLIMIT_CORE` to zero so a crash cannot write unlocked keys to disk.
///
/// No-op on non-Unix targets.
///
/// # Errors
///
/// Returns `CryptoError::SecureMemory` if the limit cannot be lowered.
pub fn disable_core_dumps() -> Result<(), CryptoError> {
    if os::zero_core_limit() {
        Ok(())
    } else {
        Err(CryptoError::SecureMemory("setrlimit(RLIMIT_CORE) failed".into()))
    }
}

#[cfg(unix)]
mod os {
    pub(super) fn lock_range(addr: usize, len: usize) -> bool {
        // SAFETY: mlock only inspects the address range; a bad range yields
        // ENOMEM and is reported as unpinned.
        unsafe { libc::mlock(addr as *const libc::c_void, len) == 0 }
    }

    pub(super) fn unlock_range(addr: usize, len: usize) {
        // SAFETY: the range was successfully locked by `lock_range`.
        unsafe {
            libc::munlock(addr as *const libc::c_void, len);
        }
    }

    pub(super) fn zero_core_limit() -> bool {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: plain POSIX call with a valid, initialized struct.
        unsafe { libc::setrlimit(libc::RLIMIT_CORE, &raw const limit) == 0 }
    }
}

#[cfg(not(unix))]
mod os {
    pub(super) const fn lock_range(_addr: usize, _len: usize) -> bool {
        false
    }

    pub(super) const fn unlock_range(_addr: usize, _len: usize) {}

    pub(super) const fn zero_core_limit() -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
