use core::fmt;
use core::mem::size_of;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use std::io;

use thiserror::Error;

/// Page size assumed when the operating system can't tell us.
pub const FALLBACK_PAGE_SIZE: usize = 4096;

/// How a [`PageAllocator`] obtains aligned memory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy
{
	/// The platform's own aligned allocation (`posix_memalign`).
	Native,
	/// Over-allocate with `malloc` and keep the original address just below the aligned one.
	Offset,
}

impl Strategy
{
	pub fn is_available(self) -> bool
	{
		match self
		{
			Strategy::Native => cfg!(unix),
			Strategy::Offset => true,
		}
	}

	fn platform_default() -> Self
	{
		if Strategy::Native.is_available() {Strategy::Native} else {Strategy::Offset}
	}
}

#[cfg(unix)]
fn query_page_size() -> usize
{
	let rc = unsafe{libc::sysconf(libc::_SC_PAGESIZE)};
	match usize::try_from(rc)
	{
		Ok(size) if size.is_power_of_two() && size >= size_of::<*mut u8>() => size,
		_ =>
		{
			tracing::debug!(rc, "sysconf(_SC_PAGESIZE) unusable, assuming {FALLBACK_PAGE_SIZE}");
			FALLBACK_PAGE_SIZE
		},
	}
}

#[cfg(not(unix))]
fn query_page_size() -> usize
{
	FALLBACK_PAGE_SIZE
}

/// Hands out memory blocks starting on a page boundary.
///
/// The page size is looked up once when the allocator is created. Every pointer returned by
/// [`PageAllocator::allocate`] must go back through [`PageAllocator::free`] of an allocator with
/// the same page size and strategy; a [`PageBuffer`] takes care of that on its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageAllocator
{
	page_size: usize,
	strategy: Strategy,
}

impl PageAllocator
{
	pub fn new() -> Self
	{
		Self{page_size: query_page_size(), strategy: Strategy::platform_default()}
	}

	pub fn with_page_size(page_size: usize) -> Result<Self, AllocError>
	{
		// the offset strategy stores a pointer right below the aligned address
		if !page_size.is_power_of_two() || page_size < size_of::<*mut u8>()
		{
			return Err(AllocError::PageSize(page_size));
		}
		Ok(Self{page_size, strategy: Strategy::platform_default()})
	}

	pub fn with_strategy(self, strategy: Strategy) -> Result<Self, AllocError>
	{
		if !strategy.is_available()
		{
			return Err(AllocError::Unsupported(strategy));
		}
		Ok(Self{strategy, ..self})
	}

	pub fn page_size(&self) -> usize
	{
		self.page_size
	}

	pub fn strategy(&self) -> Strategy
	{
		self.strategy
	}

	/// Extra bytes the offset strategy requests on top of the caller's size.
	pub fn padding(&self) -> usize
	{
		self.page_size + self.page_size - 1
	}

	/// Allocates at least `size` bytes starting on a page boundary. The contents are uninitialized.
	pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError>
	{
		match self.strategy
		{
			Strategy::Native => self.allocate_native(size),
			Strategy::Offset => self.allocate_offset(size),
		}
	}

	#[cfg(unix)]
	fn allocate_native(&self, size: usize) -> Result<NonNull<u8>, AllocError>
	{
		let mut out: *mut libc::c_void = ptr::null_mut();
		// a zero-sized request may legally come back as null
		let rc = unsafe{libc::posix_memalign(&mut out, self.page_size, size.max(1))};
		if rc != 0
		{
			return Err(AllocError::Native{size, source: io::Error::from_raw_os_error(rc)});
		}
		let ptr = NonNull::new(out.cast::<u8>()).ok_or_else(|| AllocError::Native{size, source: io::ErrorKind::OutOfMemory.into()})?;
		track_acquire(ptr.as_ptr());
		Ok(ptr)
	}

	#[cfg(not(unix))]
	fn allocate_native(&self, _: usize) -> Result<NonNull<u8>, AllocError>
	{
		Err(AllocError::Unsupported(Strategy::Native))
	}

	fn allocate_offset(&self, size: usize) -> Result<NonNull<u8>, AllocError>
	{
		let padding = self.padding();
		let Some(total) = size.checked_add(padding) else {return Err(AllocError::Overflow{size, padding})};
		let original = unsafe{libc::malloc(total)}.cast::<u8>();
		if original.is_null()
		{
			return Err(AllocError::Malloc{size: total, source: io::Error::last_os_error()});
		}
		track_acquire(original);
		// same as `((original + padding) & !(page_size - 1)) - original`, always in `page_size..=padding`
		let misalign = original as usize & (self.page_size - 1);
		let offset = if misalign == 0 {self.page_size} else {2 * self.page_size - misalign};
		unsafe
		{
			let aligned = original.add(offset);
			aligned.sub(size_of::<*mut u8>()).cast::<*mut u8>().write(original);
			Ok(NonNull::new_unchecked(aligned))
		}
	}

	/// Releases a block obtained from [`PageAllocator::allocate`].
	///
	/// # Safety
	/// `ptr` must have been returned by `allocate` of an allocator equal to this one and must not
	/// have been freed already.
	pub unsafe fn free(&self, ptr: NonNull<u8>)
	{
		let block = match self.strategy
		{
			Strategy::Native => ptr.as_ptr(),
			Strategy::Offset => ptr.as_ptr().sub(size_of::<*mut u8>()).cast::<*mut u8>().read(),
		};
		track_release(block);
		libc::free(block.cast());
	}

	/// Allocates a zeroed buffer that frees itself when dropped.
	pub fn buffer(&self, size: usize) -> Result<PageBuffer, AllocError>
	{
		let ptr = self.allocate(size)?;
		unsafe{ptr::write_bytes(ptr.as_ptr(), 0, size);}
		Ok(PageBuffer{ptr, len: size, alloc: *self})
	}
}

impl Default for PageAllocator
{
	fn default() -> Self
	{
		Self::new()
	}
}

#[derive(Debug, Error)]
pub enum AllocError
{
	#[error("invalid page size ({0})")]
	PageSize(usize),
	#[error("{0:?} allocation is not available on this platform")]
	Unsupported(Strategy),
	#[error("allocation size overflow ({size} bytes plus {padding} padding)")]
	Overflow{size: usize, padding: usize},
	#[error("posix_memalign {size} bytes")]
	Native{size: usize, #[source] source: io::Error},
	#[error("malloc {size} bytes")]
	Malloc{size: usize, #[source] source: io::Error},
}

impl AllocError
{
	/// The operating system error behind this failure, if there is one.
	pub fn os_error(&self) -> Option<&io::Error>
	{
		match self
		{
			Self::Native{source, ..} | Self::Malloc{source, ..} => Some(source),
			_ => None,
		}
	}
}

/// Owned page-aligned memory, zeroed on creation.
pub struct PageBuffer
{
	ptr: NonNull<u8>,
	len: usize,
	alloc: PageAllocator,
}

impl PageBuffer
{
	pub fn page_size(&self) -> usize
	{
		self.alloc.page_size
	}

	pub fn as_ptr(&self) -> *const u8
	{
		self.ptr.as_ptr()
	}

	pub fn as_mut_ptr(&mut self) -> *mut u8
	{
		self.ptr.as_ptr()
	}
}

impl Deref for PageBuffer
{
	type Target = [u8];

	fn deref(&self) -> &[u8]
	{
		unsafe{core::slice::from_raw_parts(self.ptr.as_ptr(), self.len)}
	}
}

impl DerefMut for PageBuffer
{
	fn deref_mut(&mut self) -> &mut [u8]
	{
		unsafe{core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)}
	}
}

impl Drop for PageBuffer
{
	fn drop(&mut self)
	{
		// the buffer only ever holds pointers from `self.alloc`
		unsafe{self.alloc.free(self.ptr);}
	}
}

impl fmt::Debug for PageBuffer
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		f.debug_struct("PageBuffer").field("ptr", &self.ptr).field("len", &self.len).field("alloc", &self.alloc).finish()
	}
}

#[cfg(not(test))]
fn track_acquire(_: *mut u8) {}

#[cfg(not(test))]
fn track_release(_: *mut u8) {}

#[cfg(test)]
fn track_acquire(block: *mut u8)
{
	ledger::LIVE.with(|live| live.borrow_mut().insert(block as usize));
}

#[cfg(test)]
fn track_release(block: *mut u8)
{
	if !ledger::LIVE.with(|live| live.borrow_mut().remove(&(block as usize)))
	{
		ledger::STRAY.with(|stray| stray.set(stray.get() + 1));
	}
}
