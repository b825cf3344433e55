//! Linear stand-in for the pool's scatter/gather buffer (ABD)
//!
//! The RAID-Z core only needs a handful of operations from its buffer type:
//! fallible allocation, offset views, byte comparison and chunked iteration.
//! Allocation goes through `try_reserve_exact` so that memory pressure surfaces
//! as [`RaidzError::OutOfMemory`] instead of aborting the process.

use crate::error::{RaidzError, Result};
use std::cmp::Ordering;

/// An owned, contiguous I/O buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Abd {
    buf: Vec<u8>,
}

impl Abd {
    /// Allocate a zero-filled buffer of `size` bytes
    pub fn alloc(size: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| RaidzError::OutOfMemory { bytes: size })?;
        buf.resize(size, 0);
        Ok(Self { buf })
    }

    /// Wrap an existing vector without copying
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Borrow `len` bytes starting at `offset`
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn view(&self, offset: usize, len: usize) -> &[u8] {
        &self.buf[offset..offset + len]
    }

    /// Mutably borrow `len` bytes starting at `offset`
    pub fn view_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.buf[offset..offset + len]
    }

    /// Compare contents, shorter buffers ordering first on a common prefix
    pub fn cmp_bytes(&self, other: &[u8]) -> Ordering {
        self.buf.as_slice().cmp(other)
    }

    pub fn zero(&mut self) {
        self.buf.fill(0);
    }

    /// Copy `src` into the start of this buffer
    pub fn copy_from(&mut self, src: &[u8]) {
        let n = src.len().min(self.buf.len());
        self.buf[..n].copy_from_slice(&src[..n]);
    }

    /// Call `f` on consecutive chunks of at most `chunk` bytes within
    /// `[offset, offset + len)`, stopping at the first error
    pub fn iterate<F, E>(&mut self, offset: usize, len: usize, chunk: usize, mut f: F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut [u8]) -> std::result::Result<(), E>,
    {
        let chunk = chunk.max(1);
        for piece in self.view_mut(offset, len).chunks_mut(chunk) {
            f(piece)?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Abd {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsMut<[u8]> for Abd {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}
