use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::FromRawFd;
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	c_void,
	mmap,
	munmap,
	open,
};

/// Register block mapped from a device file.
#[derive(Debug)]
pub struct Mapped {
	ptr: ptr::NonNull<u8>, // u8 instead of void for easier offset operations
	len: usize,
}

impl Drop for Mapped {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				self.len,
			);
			if 0 != res {
				error!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl Mapped {
	pub fn read_dword(&self, offset: usize) -> u32 {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset) as *const u32) }
	}

	pub fn write_dword(&mut self, offset: usize, data: u32) {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset) as *mut u32, data) }
	}
}

// character devices don't report a size, so the caller passes it
pub fn open_mapped(path: &str, len: usize) -> io::Result<Mapped> {
	let path = CString::new(path)?;

	let fd = unsafe { open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak; the mapping stays valid
	// after close
	let _f = unsafe { fs::File::from_raw_fd(fd) };

	let area = unsafe {
		mmap(
			ptr::null_mut(),
			len,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			0,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u8) {
		None => Err(io::Error::new(io::ErrorKind::Other, "mmap returned NULL")),
		Some(area) => Ok(Mapped {
			ptr: area,
			len,
		}),
	}
}
