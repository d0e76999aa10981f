//! # libsmbclient
//!
//! Engine implementation on top of samba's libsmbclient context API

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

use libc::{mode_t, size_t, ssize_t};

use super::{AuthReply, DirEntry, DirEntryType, EngineResult, Errno, OpenOptions, SmbEngine};
use crate::client::{Authenticator, SmbOptions};

// -- ffi

#[repr(C)]
pub struct SMBCCTX {
    _private: [u8; 0],
}

#[repr(C)]
pub struct SMBCFILE {
    _private: [u8; 0],
}

#[repr(C)]
#[allow(dead_code)]
struct smbc_dirent {
    smbc_type: c_uint,
    dirlen: c_uint,
    commentlen: c_uint,
    comment: *mut c_char,
    namelen: c_uint,
    name: [c_char; 1],
}

type smbc_get_auth_data_with_context_fn = unsafe extern "C" fn(
    c: *mut SMBCCTX,
    srv: *const c_char,
    shr: *const c_char,
    wg: *mut c_char,
    wglen: c_int,
    un: *mut c_char,
    unlen: c_int,
    pw: *mut c_char,
    pwlen: c_int,
);
type smbc_purge_cached_fn = unsafe extern "C" fn(c: *mut SMBCCTX) -> c_int;
type smbc_opendir_fn = unsafe extern "C" fn(c: *mut SMBCCTX, fname: *const c_char) -> *mut SMBCFILE;
type smbc_readdir_fn = unsafe extern "C" fn(c: *mut SMBCCTX, dir: *mut SMBCFILE) -> *mut smbc_dirent;
type smbc_closedir_fn = unsafe extern "C" fn(c: *mut SMBCCTX, dir: *mut SMBCFILE) -> c_int;
type smbc_open_fn = unsafe extern "C" fn(
    c: *mut SMBCCTX,
    fname: *const c_char,
    flags: c_int,
    mode: mode_t,
) -> *mut SMBCFILE;
type smbc_read_fn = unsafe extern "C" fn(
    c: *mut SMBCCTX,
    file: *mut SMBCFILE,
    buf: *mut c_void,
    count: size_t,
) -> ssize_t;
type smbc_write_fn = unsafe extern "C" fn(
    c: *mut SMBCCTX,
    file: *mut SMBCFILE,
    buf: *const c_void,
    count: size_t,
) -> ssize_t;
type smbc_close_fn = unsafe extern "C" fn(c: *mut SMBCCTX, file: *mut SMBCFILE) -> c_int;
type talloc_stackframe_fn = unsafe extern "C" fn(location: *const c_char) -> *mut c_void;
type talloc_free_fn = unsafe extern "C" fn(ptr: *mut c_void, location: *const c_char) -> c_int;

#[link(name = "smbclient")]
extern "C" {
    fn smbc_new_context() -> *mut SMBCCTX;
    fn smbc_init_context(context: *mut SMBCCTX) -> *mut SMBCCTX;
    fn smbc_free_context(context: *mut SMBCCTX, shutdown_ctx: c_int) -> c_int;

    fn smbc_setFunctionAuthDataWithContext(
        c: *mut SMBCCTX,
        f: Option<smbc_get_auth_data_with_context_fn>,
    );
    fn smbc_setOptionUserData(c: *mut SMBCCTX, user_data: *mut c_void);
    fn smbc_getOptionUserData(c: *mut SMBCCTX) -> *mut c_void;

    fn smbc_setDebug(c: *mut SMBCCTX, debug: c_int);
    fn smbc_setOptionOneSharePerServer(c: *mut SMBCCTX, b: c_int);
    fn smbc_setOptionCaseSensitive(c: *mut SMBCCTX, b: c_int);
    fn smbc_setOptionUseKerberos(c: *mut SMBCCTX, b: c_int);
    fn smbc_setOptionFallbackAfterKerberos(c: *mut SMBCCTX, b: c_int);
    fn smbc_setOptionNoAutoAnonymousLogin(c: *mut SMBCCTX, b: c_int);

    fn smbc_getFunctionPurgeCachedServers(c: *mut SMBCCTX) -> Option<smbc_purge_cached_fn>;
    fn smbc_getFunctionOpendir(c: *mut SMBCCTX) -> Option<smbc_opendir_fn>;
    fn smbc_getFunctionReaddir(c: *mut SMBCCTX) -> Option<smbc_readdir_fn>;
    fn smbc_getFunctionClosedir(c: *mut SMBCCTX) -> Option<smbc_closedir_fn>;
    fn smbc_getFunctionOpen(c: *mut SMBCCTX) -> Option<smbc_open_fn>;
    fn smbc_getFunctionRead(c: *mut SMBCCTX) -> Option<smbc_read_fn>;
    fn smbc_getFunctionWrite(c: *mut SMBCCTX) -> Option<smbc_write_fn>;
    fn smbc_getFunctionClose(c: *mut SMBCCTX) -> Option<smbc_close_fn>;
}

// -- talloc

const TALLOC_STACKFRAME: &[u8] = b"_talloc_stackframe\0";
const TALLOC_FREE: &[u8] = b"_talloc_free\0";
const FRAME_LOCATION: &[u8] = b"cifs_client::engine::libsmbclient\0";

/// talloc stack frame, freed on drop.
///
/// Samba's connection teardown allocates on `talloc_tos()` and needs a frame
/// to release into. Both symbols live in samba libraries libsmbclient loads,
/// so they are resolved at runtime.
struct TallocFrame {
    frame: *mut c_void,
    free: Option<talloc_free_fn>,
}

impl TallocFrame {
    fn new() -> Self {
        unsafe {
            let stackframe = libc::dlsym(libc::RTLD_DEFAULT, TALLOC_STACKFRAME.as_ptr().cast());
            let free = libc::dlsym(libc::RTLD_DEFAULT, TALLOC_FREE.as_ptr().cast());
            if stackframe.is_null() || free.is_null() {
                debug!("talloc symbols not found; running without a stack frame");
                return Self {
                    frame: ptr::null_mut(),
                    free: None,
                };
            }
            let stackframe = std::mem::transmute::<*mut c_void, talloc_stackframe_fn>(stackframe);
            let free = std::mem::transmute::<*mut c_void, talloc_free_fn>(free);
            let frame = stackframe(FRAME_LOCATION.as_ptr().cast());
            Self {
                frame,
                free: (!frame.is_null()).then_some(free),
            }
        }
    }
}

impl Drop for TallocFrame {
    fn drop(&mut self) {
        if let Some(free) = self.free.take() {
            if unsafe { free(self.frame, FRAME_LOCATION.as_ptr().cast()) } != 0 {
                warn!("failed to free talloc stack frame");
            }
            self.frame = ptr::null_mut();
        }
    }
}

// -- engine

/// libsmbclient engine
#[derive(Debug, Default, Clone, Copy)]
pub struct LibSmbClient;

/// libsmbclient context handle
pub struct SmbContext(*mut SMBCCTX);

/// libsmbclient handle for an open directory or file
pub struct SmbHandle(*mut SMBCFILE);

impl LibSmbClient {
    pub fn new() -> Self {
        Self
    }
}

/// errno of the last failed call
fn last_errno() -> Errno {
    Errno(io::Error::last_os_error().raw_os_error().unwrap_or(0))
}

fn c_url(url: &str) -> EngineResult<CString> {
    CString::new(url).map_err(|_| Errno(libc::EINVAL))
}

fn c_bool(b: bool) -> c_int {
    c_int::from(b)
}

/// Turn a libsmbclient function getter result into a callable, or ENOSYS
fn function<F>(f: Option<F>) -> EngineResult<F> {
    f.ok_or(Errno(libc::ENOSYS))
}

fn open_flags(options: OpenOptions) -> c_int {
    let mut flags = match (options.read, options.write) {
        (true, true) => libc::O_RDWR,
        (false, true) => libc::O_WRONLY,
        _ => libc::O_RDONLY,
    };
    if options.create {
        flags |= libc::O_CREAT;
    }
    if options.truncate {
        flags |= libc::O_TRUNC;
    }
    if options.exclusive {
        flags |= libc::O_EXCL;
    }
    flags
}

/// Borrow an engine supplied string buffer
///
/// # Safety
///
/// `ptr` must be null or valid for `len` bytes for the lifetime `'a`
unsafe fn buffer<'a>(ptr: *mut c_char, len: c_int) -> &'a mut [u8] {
    if ptr.is_null() || len <= 0 {
        Default::default()
    } else {
        std::slice::from_raw_parts_mut(ptr.cast::<u8>(), len as usize)
    }
}

unsafe fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Authentication callback registered on every context.
///
/// Looks the authenticator up through the context's user data.
unsafe extern "C" fn auth_data_with_context(
    c: *mut SMBCCTX,
    srv: *const c_char,
    shr: *const c_char,
    wg: *mut c_char,
    wglen: c_int,
    un: *mut c_char,
    unlen: c_int,
    pw: *mut c_char,
    pwlen: c_int,
) {
    let authenticator = smbc_getOptionUserData(c) as *const Authenticator;
    let Some(authenticator) = authenticator.as_ref() else {
        warn!("authentication requested on a context without credentials");
        return;
    };
    let server = lossy(srv);
    let share = lossy(shr);
    let mut reply = AuthReply {
        workgroup: buffer(wg, wglen),
        username: buffer(un, unlen),
        password: buffer(pw, pwlen),
    };
    if panic::catch_unwind(AssertUnwindSafe(|| {
        authenticator.supply(&server, &share, &mut reply)
    }))
    .is_err()
    {
        error!("authentication callback panicked for smb://{}/{}", server, share);
    }
}

impl SmbEngine for LibSmbClient {
    type Context = SmbContext;
    type Dir = SmbHandle;
    type File = SmbHandle;

    fn new_context(&self) -> EngineResult<SmbContext> {
        let ctx = unsafe { smbc_new_context() };
        if ctx.is_null() {
            Err(last_errno())
        } else {
            Ok(SmbContext(ctx))
        }
    }

    fn set_authenticator(&self, ctx: &mut SmbContext, authenticator: Arc<Authenticator>) {
        drop(self.take_authenticator(ctx));
        unsafe {
            smbc_setFunctionAuthDataWithContext(ctx.0, Some(auth_data_with_context));
            smbc_setOptionUserData(ctx.0, Arc::into_raw(authenticator) as *mut c_void);
        }
    }

    fn take_authenticator(&self, ctx: &mut SmbContext) -> Option<Arc<Authenticator>> {
        if ctx.0.is_null() {
            return None;
        }
        unsafe {
            let data = smbc_getOptionUserData(ctx.0) as *const Authenticator;
            if data.is_null() {
                return None;
            }
            smbc_setOptionUserData(ctx.0, ptr::null_mut());
            Some(Arc::from_raw(data))
        }
    }

    fn configure(&self, ctx: &mut SmbContext, options: &SmbOptions) {
        unsafe {
            if let Some(level) = options.debug_level {
                smbc_setDebug(ctx.0, c_int::from(level));
            }
            if let Some(b) = options.one_share_per_server {
                smbc_setOptionOneSharePerServer(ctx.0, c_bool(b));
            }
            if let Some(b) = options.case_sensitive {
                smbc_setOptionCaseSensitive(ctx.0, c_bool(b));
            }
            if let Some(b) = options.use_kerberos {
                smbc_setOptionUseKerberos(ctx.0, c_bool(b));
            }
            if let Some(b) = options.fallback_after_kerberos {
                smbc_setOptionFallbackAfterKerberos(ctx.0, c_bool(b));
            }
            if let Some(b) = options.no_auto_anonymous_login {
                smbc_setOptionNoAutoAnonymousLogin(ctx.0, c_bool(b));
            }
        }
    }

    fn init_context(&self, ctx: &mut SmbContext) -> EngineResult<()> {
        if unsafe { smbc_init_context(ctx.0) }.is_null() {
            Err(last_errno())
        } else {
            Ok(())
        }
    }

    fn purge_cached_servers(&self, ctx: &mut SmbContext) {
        if ctx.0.is_null() {
            return;
        }
        let Some(purge) = (unsafe { smbc_getFunctionPurgeCachedServers(ctx.0) }) else {
            return;
        };
        let _frame = TallocFrame::new();
        unsafe {
            purge(ctx.0);
        }
    }

    fn free_context(&self, ctx: &mut SmbContext) {
        if ctx.0.is_null() {
            return;
        }
        if unsafe { smbc_free_context(ctx.0, 1) } != 0 {
            warn!("failed to free smb context: {:?}", last_errno());
        }
        ctx.0 = ptr::null_mut();
    }

    fn opendir(&self, ctx: &SmbContext, url: &str) -> EngineResult<SmbHandle> {
        let url = c_url(url)?;
        let opendir = function(unsafe { smbc_getFunctionOpendir(ctx.0) })?;
        let dir = unsafe { opendir(ctx.0, url.as_ptr()) };
        if dir.is_null() {
            Err(last_errno())
        } else {
            Ok(SmbHandle(dir))
        }
    }

    fn readdir(&self, ctx: &SmbContext, dir: &mut SmbHandle) -> EngineResult<Option<DirEntry>> {
        let readdir = function(unsafe { smbc_getFunctionReaddir(ctx.0) })?;
        // libsmbclient reports the end of a listing with NULL
        let dirent = unsafe { readdir(ctx.0, dir.0) };
        if dirent.is_null() {
            return Ok(None);
        }
        let (entry_type, name) = unsafe {
            let name = ptr::addr_of!((*dirent).name).cast::<c_char>();
            ((*dirent).smbc_type, lossy(name))
        };
        Ok(Some(DirEntry::new(DirEntryType::from_raw(entry_type), name)))
    }

    fn closedir(&self, ctx: &SmbContext, dir: &mut SmbHandle) -> EngineResult<()> {
        if dir.0.is_null() {
            return Ok(());
        }
        let closedir = function(unsafe { smbc_getFunctionClosedir(ctx.0) })?;
        let rc = unsafe { closedir(ctx.0, dir.0) };
        dir.0 = ptr::null_mut();
        if rc < 0 {
            Err(last_errno())
        } else {
            Ok(())
        }
    }

    fn open(
        &self,
        ctx: &SmbContext,
        url: &str,
        options: OpenOptions,
        mode: u32,
    ) -> EngineResult<SmbHandle> {
        let url = c_url(url)?;
        let open = function(unsafe { smbc_getFunctionOpen(ctx.0) })?;
        let file = unsafe { open(ctx.0, url.as_ptr(), open_flags(options), mode as mode_t) };
        if file.is_null() {
            Err(last_errno())
        } else {
            Ok(SmbHandle(file))
        }
    }

    fn read(&self, ctx: &SmbContext, file: &mut SmbHandle, buf: &mut [u8]) -> EngineResult<usize> {
        let read = function(unsafe { smbc_getFunctionRead(ctx.0) })?;
        let n = unsafe { read(ctx.0, file.0, buf.as_mut_ptr().cast::<c_void>(), buf.len()) };
        if n < 0 {
            Err(last_errno())
        } else {
            Ok(n as usize)
        }
    }

    fn write(&self, ctx: &SmbContext, file: &mut SmbHandle, buf: &[u8]) -> EngineResult<usize> {
        let write = function(unsafe { smbc_getFunctionWrite(ctx.0) })?;
        let n = unsafe { write(ctx.0, file.0, buf.as_ptr().cast::<c_void>(), buf.len()) };
        if n < 0 {
            Err(last_errno())
        } else {
            Ok(n as usize)
        }
    }

    fn close(&self, ctx: &SmbContext, file: &mut SmbHandle) -> EngineResult<()> {
        if file.0.is_null() {
            return Ok(());
        }
        let close = function(unsafe { smbc_getFunctionClose(ctx.0) })?;
        let rc = unsafe { close(ctx.0, file.0) };
        file.0 = ptr::null_mut();
        if rc < 0 {
            Err(last_errno())
        } else {
            Ok(())
        }
    }
}
