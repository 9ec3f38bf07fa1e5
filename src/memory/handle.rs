/*!
 * Memory Handle
 *
 * Owning handle to one off-heap block with unchecked typed access.
 *
 * # Example
 *
 * ```no_run
 * # use offheap::Allocator;
 * let allocator = Allocator::new()?;
 * let block = allocator.allocate(1000)?;
 * unsafe {
 *     block.put_int(8, 130);
 *     assert_eq!(block.get_int(8), 130);
 * }
 * block.free();
 * # Ok::<(), offheap::OffHeapError>(())
 * ```
 *
 * # Unchecked access
 *
 * Accessors mirror the native primitive they sit on: no bounds check, no
 * synchronization. Every get/put is `unsafe` and requires
 * `offset + width <= size()`. Debug builds assert the bound.
 */

use super::manager::{Allocator, AllocatorState};
use super::reclaim::{handle_notice, ReclaimNotice, WorkerMessage};
use super::traits::Primitive;
use super::ReclaimMode;
use super::types::ReleaseCause;
use crate::core::types::{Address, Size, Ticket};
use std::fmt;
use std::ptr;
use std::sync::Arc;

/// Handle to a live off-heap block
///
/// Not `Clone`: one handle per block. Dropping a handle that was not freed
/// hands the block to the reclaim worker.
pub struct Handle {
    address: Address,
    size: Size,
    ticket: Ticket,
    state: Arc<AllocatorState>,
    /// Cleared once the block was freed or deliberately leaked
    armed: bool,
}

impl Handle {
    pub(crate) fn new(
        address: Address,
        size: Size,
        ticket: Ticket,
        state: Arc<AllocatorState>,
    ) -> Self {
        Self {
            address,
            size,
            ticket,
            state,
            armed: true,
        }
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Size requested at allocation
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Ticket binding this handle to its tracking record
    #[inline]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.address as *mut u8
    }

    /// The allocator this block came from
    pub fn allocator(&self) -> Allocator {
        Allocator::from_state(Arc::clone(&self.state))
    }

    /// Whether the allocator still tracks this handle's allocation
    pub fn is_live(&self) -> bool {
        self.state
            .blocks
            .get(self.address)
            .is_some_and(|record| record.ticket == self.ticket)
    }

    /// Release the block now
    pub fn free(mut self) {
        self.armed = false;
        self.state
            .release_block(self.address, Some(self.ticket), ReleaseCause::Explicit);
    }

    /// Give up the handle without releasing the block
    ///
    /// The block stays tracked until `Allocator::release`, `release_all`, the
    /// shutdown sweep, or the allocator's teardown frees it.
    pub fn leak(mut self) -> Address {
        self.armed = false;
        self.address
    }

    #[inline]
    fn debug_check(&self, offset: Size, width: usize) {
        debug_assert!(
            offset
                .checked_add(width)
                .is_some_and(|end| end <= self.size),
            "off-heap access out of bounds: offset {} width {} size {}",
            offset,
            width,
            self.size
        );
    }

    /// Read a `T` at `offset`
    ///
    /// # Safety
    ///
    /// `offset + T::WIDTH <= self.size()`, the block has not been released,
    /// and no other thread writes the same bytes concurrently.
    #[inline]
    pub unsafe fn get<T: Primitive>(&self, offset: Size) -> T {
        self.debug_check(offset, T::WIDTH);
        ptr::read_unaligned(self.as_ptr().add(offset) as *const T)
    }

    /// Write a `T` at `offset`
    ///
    /// # Safety
    ///
    /// Same contract as [`Handle::get`].
    #[inline]
    pub unsafe fn put<T: Primitive>(&self, offset: Size, value: T) {
        self.debug_check(offset, T::WIDTH);
        ptr::write_unaligned(self.as_ptr().add(offset) as *mut T, value);
    }

    /// Copy `src` into the block at `offset`
    ///
    /// # Safety
    ///
    /// `offset + src.len() <= self.size()` and the block is live.
    pub unsafe fn copy_from_slice(&self, offset: Size, src: &[u8]) {
        self.debug_check(offset, src.len());
        ptr::copy_nonoverlapping(src.as_ptr(), self.as_ptr().add(offset), src.len());
    }

    /// Copy bytes at `offset` into `dst`
    ///
    /// # Safety
    ///
    /// `offset + dst.len() <= self.size()` and the block is live.
    pub unsafe fn copy_to_slice(&self, offset: Size, dst: &mut [u8]) {
        self.debug_check(offset, dst.len());
        ptr::copy_nonoverlapping(self.as_ptr().add(offset), dst.as_mut_ptr(), dst.len());
    }

    /// Set every byte of the block to `value`
    ///
    /// # Safety
    ///
    /// The block is live.
    pub unsafe fn fill(&self, value: u8) {
        ptr::write_bytes(self.as_ptr(), value, self.size);
    }
}

macro_rules! accessors {
    ($($name:literal: $get:ident, $put:ident => $ty:ty;)*) => {
        impl Handle {
            $(
                #[doc = concat!("Read a ", $name, " at `offset`")]
                ///
                /// # Safety
                ///
                /// Same contract as [`Handle::get`].
                #[inline]
                pub unsafe fn $get(&self, offset: Size) -> $ty {
                    self.get::<$ty>(offset)
                }

                #[doc = concat!("Write a ", $name, " at `offset`")]
                ///
                /// # Safety
                ///
                /// Same contract as [`Handle::get`].
                #[inline]
                pub unsafe fn $put(&self, offset: Size, value: $ty) {
                    self.put::<$ty>(offset, value)
                }
            )*
        }
    };
}

accessors! {
    "byte (i8)": get_byte, put_byte => i8;
    "short (i16)": get_short, put_short => i16;
    "char (u16 code unit)": get_char, put_char => u16;
    "int (i32)": get_int, put_int => i32;
    "float (f32)": get_float, put_float => f32;
    "long (i64)": get_long, put_long => i64;
    "double (f64)": get_double, put_double => f64;
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let notice = ReclaimNotice {
            address: self.address,
            ticket: self.ticket,
        };
        match self.state.config.reclaim {
            ReclaimMode::Immediate => handle_notice(&self.state, notice),
            ReclaimMode::Deferred => {
                if self.state.notices.send(WorkerMessage::Reclaim(notice)).is_err() {
                    // Worker gone; release on this thread instead
                    handle_notice(&self.state, notice);
                }
            }
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("address", &format_args!("0x{:x}", self.address))
            .field("size", &self.size)
            .field("ticket", &self.ticket)
            .field("allocator", &self.state.id)
            .finish()
    }
}
