use std::ffi::OsStr;
use std::io::{Read, Write};
use std::os::windows::ffi::OsStrExt;
use std::time::Duration;

use tracing::debug;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_BROKEN_PIPE, ERROR_MORE_DATA, ERROR_PIPE_BUSY,
    ERROR_SEM_TIMEOUT, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{CreateFileW, ReadFile, WriteFile, OPEN_EXISTING};
use windows_sys::Win32::System::Pipes::{
    SetNamedPipeHandleState, WaitNamedPipeW, PIPE_READMODE_BYTE, PIPE_READMODE_MESSAGE,
};

use crate::error::{Result, TransportError};
use crate::traits::{PipeConnector, PipeMode, PipeStream};

/// Windows named pipe backend (`\\.\pipe\...`).
#[derive(Debug, Clone, Default)]
pub struct NamedPipeConnector;

impl NamedPipeConnector {
    pub fn new() -> Self {
        Self
    }
}

fn to_wide(address: &str) -> Vec<u16> {
    OsStr::new(address)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

fn last_error() -> u32 {
    // SAFETY: GetLastError only reads thread-local error state.
    unsafe { GetLastError() }
}

fn os_error(code: u32) -> std::io::Error {
    std::io::Error::from_raw_os_error(code as i32)
}

impl PipeConnector for NamedPipeConnector {
    type Stream = NamedPipeStream;

    fn try_connect(&self, address: &str) -> Result<NamedPipeStream> {
        let wide = to_wide(address);

        // SAFETY: `wide` is a NUL-terminated UTF-16 buffer that outlives the call;
        // null security attributes and template handle are permitted.
        let handle = unsafe {
            CreateFileW(
                wide.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0,
                std::ptr::null(),
                OPEN_EXISTING,
                0,
                std::ptr::null_mut(),
            )
        };

        if handle == INVALID_HANDLE_VALUE || handle.is_null() {
            return match last_error() {
                ERROR_PIPE_BUSY => Err(TransportError::Busy {
                    address: address.to_string(),
                }),
                0 => Err(TransportError::InvalidHandle {
                    address: address.to_string(),
                }),
                code => Err(TransportError::Connect {
                    address: address.to_string(),
                    source: os_error(code),
                }),
            };
        }

        debug!(address, "opened named pipe");
        Ok(NamedPipeStream { handle })
    }

    fn wait_available(&self, address: &str, timeout: Duration) -> std::io::Result<bool> {
        let wide = to_wide(address);
        // 0 means "server default" and u32::MAX means "forever"; keep to a real bound.
        let millis = u32::try_from(timeout.as_millis())
            .unwrap_or(u32::MAX - 1)
            .clamp(1, u32::MAX - 1);

        // SAFETY: `wide` is a NUL-terminated UTF-16 buffer that outlives the call.
        let ok = unsafe { WaitNamedPipeW(wide.as_ptr(), millis) };
        if ok != 0 {
            return Ok(true);
        }
        match last_error() {
            ERROR_SEM_TIMEOUT => Ok(false),
            code => Err(os_error(code)),
        }
    }

    fn transport_name(&self) -> &'static str {
        "windows-named-pipe"
    }
}

/// An open client handle to a named pipe.
pub struct NamedPipeStream {
    handle: HANDLE,
}

// SAFETY: the handle is exclusively owned by this value and pipe handles may
// be used from any thread.
unsafe impl Send for NamedPipeStream {}

impl Read for NamedPipeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let mut read = 0u32;

        // SAFETY: `buf` is writable for `len` bytes and `read` is a valid out pointer;
        // the handle is open for the lifetime of `self`.
        let ok = unsafe {
            ReadFile(
                self.handle,
                buf.as_mut_ptr(),
                len,
                &mut read,
                std::ptr::null_mut(),
            )
        };
        if ok != 0 {
            return Ok(read as usize);
        }

        match last_error() {
            ERROR_MORE_DATA => Ok(read as usize),
            ERROR_BROKEN_PIPE => Ok(0),
            code => Err(os_error(code)),
        }
    }
}

impl Write for NamedPipeStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let mut written = 0u32;

        // SAFETY: `buf` is readable for `len` bytes and `written` is a valid out pointer;
        // the handle is open for the lifetime of `self`.
        let ok = unsafe {
            WriteFile(
                self.handle,
                buf.as_ptr(),
                len,
                &mut written,
                std::ptr::null_mut(),
            )
        };
        if ok != 0 {
            Ok(written as usize)
        } else {
            Err(os_error(last_error()))
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // FlushFileBuffers would block until the server drains the pipe.
        Ok(())
    }
}

impl PipeStream for NamedPipeStream {
    fn set_read_mode(&mut self, mode: PipeMode) -> std::io::Result<()> {
        let pipe_mode = match mode {
            PipeMode::Byte => PIPE_READMODE_BYTE,
            PipeMode::Message => PIPE_READMODE_MESSAGE,
        };

        // SAFETY: `pipe_mode` lives across the call; null collection parameters are permitted.
        let ok = unsafe {
            SetNamedPipeHandleState(
                self.handle,
                &pipe_mode,
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        if ok != 0 {
            Ok(())
        } else {
            Err(os_error(last_error()))
        }
    }
}

impl Drop for NamedPipeStream {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by CreateFileW and is closed exactly once.
        unsafe {
            CloseHandle(self.handle);
        }
        debug!("closed named pipe handle");
    }
}

impl std::fmt::Debug for NamedPipeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedPipeStream")
            .field("type", &"named-pipe")
            .finish()
    }
}
