//! In-memory SMB engine: directory trees, files, credential checks through the
//! registered authenticator, failure injection and handle accounting.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{Authenticator, SmbOptions};
use crate::engine::{AuthReply, DirEntry, EngineResult, Errno, OpenOptions, SmbEngine};

/// Engine primitive a failure can be injected at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    NewContext,
    InitContext,
    OpenDir,
    ReadDir,
    CloseDir,
    Open,
    Read,
    Write,
    Close,
}

#[derive(Default)]
struct State {
    dirs: HashMap<String, Vec<DirEntry>>,
    files: HashMap<String, Vec<u8>>,
    required: Option<(String, String)>,
    failures: HashMap<Step, i32>,
    write_limit: Option<usize>,
    write_budget: Option<usize>,
    // accounting
    live_contexts: HashSet<usize>,
    live_authenticators: usize,
    live_dirs: usize,
    live_files: usize,
    purged: usize,
    next_id: usize,
    reads: usize,
    writes: usize,
    last_options: Option<SmbOptions>,
}

impl State {
    fn fail(&self, step: Step) -> EngineResult<()> {
        match self.failures.get(&step) {
            Some(errno) => Err(Errno(*errno)),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MockEngine {
    state: Mutex<State>,
}

pub struct MockContext {
    id: usize,
    authenticator: Option<Arc<Authenticator>>,
    freed: bool,
}

pub struct MockDir {
    entries: std::vec::IntoIter<DirEntry>,
    closed: bool,
}

pub struct MockFile {
    url: String,
    pos: usize,
    closed: bool,
}

impl MockEngine {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Serve `entries` when listing `url`
    pub fn add_dir(&self, url: &str, entries: Vec<DirEntry>) {
        self.state().dirs.insert(url.to_string(), entries);
    }

    pub fn add_file(&self, url: &str, data: &[u8]) {
        self.state().files.insert(url.to_string(), data.to_vec());
    }

    pub fn file(&self, url: &str) -> Option<Vec<u8>> {
        self.state().files.get(url).cloned()
    }

    /// Reject any request whose authenticator doesn't supply these
    pub fn require_credentials(&self, username: &str, password: &str) {
        self.state().required = Some((username.to_string(), password.to_string()));
    }

    /// Make every call to `step` fail with `errno`
    pub fn fail_at(&self, step: Step, errno: i32) {
        self.state().failures.insert(step, errno);
    }

    /// Accept at most `limit` bytes per write call
    pub fn write_limit(&self, limit: usize) {
        self.state().write_limit = Some(limit);
    }

    /// Accept `budget` bytes overall, then return 0 on writes
    pub fn write_budget(&self, budget: usize) {
        self.state().write_budget = Some(budget);
    }

    pub fn live_contexts(&self) -> usize {
        self.state().live_contexts.len()
    }

    pub fn live_authenticators(&self) -> usize {
        self.state().live_authenticators
    }

    pub fn live_dirs(&self) -> usize {
        self.state().live_dirs
    }

    pub fn live_files(&self) -> usize {
        self.state().live_files
    }

    pub fn purged(&self) -> usize {
        self.state().purged
    }

    pub fn reads(&self) -> usize {
        self.state().reads
    }

    pub fn writes(&self) -> usize {
        self.state().writes
    }

    pub fn last_options(&self) -> Option<SmbOptions> {
        self.state().last_options.clone()
    }

    /// Run the authenticator the way libsmbclient does when connecting to a share
    fn authenticate(&self, ctx: &MockContext, url: &str) -> EngineResult<()> {
        let Some((username, password)) = self.state().required.clone() else {
            return Ok(());
        };
        let Some(authenticator) = ctx.authenticator.as_ref() else {
            return Err(Errno(libc::EACCES));
        };
        let mut parts = url.trim_start_matches("smb://").split('/');
        let server = parts.next().unwrap_or_default();
        let share = parts.next().unwrap_or_default();
        let mut workgroup = [0u8; 64];
        let mut user = [0u8; 64];
        let mut pass = [0u8; 64];
        authenticator.supply(
            server,
            share,
            &mut AuthReply {
                workgroup: &mut workgroup,
                username: &mut user,
                password: &mut pass,
            },
        );
        if c_str(&user) == username && c_str(&pass) == password {
            Ok(())
        } else {
            Err(Errno(libc::EACCES))
        }
    }
}

fn c_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

impl SmbEngine for MockEngine {
    type Context = MockContext;
    type Dir = MockDir;
    type File = MockFile;

    fn new_context(&self) -> EngineResult<MockContext> {
        let mut state = self.state();
        state.fail(Step::NewContext)?;
        state.next_id += 1;
        let id = state.next_id;
        state.live_contexts.insert(id);
        Ok(MockContext {
            id,
            authenticator: None,
            freed: false,
        })
    }

    fn set_authenticator(&self, ctx: &mut MockContext, authenticator: Arc<Authenticator>) {
        drop(self.take_authenticator(ctx));
        ctx.authenticator = Some(authenticator);
        self.state().live_authenticators += 1;
    }

    fn take_authenticator(&self, ctx: &mut MockContext) -> Option<Arc<Authenticator>> {
        let authenticator = ctx.authenticator.take();
        if authenticator.is_some() {
            self.state().live_authenticators -= 1;
        }
        authenticator
    }

    fn configure(&self, _ctx: &mut MockContext, options: &SmbOptions) {
        self.state().last_options = Some(options.clone());
    }

    fn init_context(&self, _ctx: &mut MockContext) -> EngineResult<()> {
        self.state().fail(Step::InitContext)
    }

    fn purge_cached_servers(&self, _ctx: &mut MockContext) {
        self.state().purged += 1;
    }

    fn free_context(&self, ctx: &mut MockContext) {
        assert!(!ctx.freed, "context freed twice");
        ctx.freed = true;
        self.state().live_contexts.remove(&ctx.id);
    }

    fn opendir(&self, ctx: &MockContext, url: &str) -> EngineResult<MockDir> {
        self.state().fail(Step::OpenDir)?;
        self.authenticate(ctx, url)?;
        let mut state = self.state();
        match state.dirs.get(url) {
            Some(entries) => {
                let entries = entries.clone().into_iter();
                state.live_dirs += 1;
                Ok(MockDir {
                    entries,
                    closed: false,
                })
            }
            None if state.files.contains_key(url) => Err(Errno(libc::ENOTDIR)),
            None => Err(Errno(libc::ENOENT)),
        }
    }

    fn readdir(&self, _ctx: &MockContext, dir: &mut MockDir) -> EngineResult<Option<DirEntry>> {
        self.state().fail(Step::ReadDir)?;
        Ok(dir.entries.next())
    }

    fn closedir(&self, _ctx: &MockContext, dir: &mut MockDir) -> EngineResult<()> {
        assert!(!dir.closed, "directory closed twice");
        dir.closed = true;
        let mut state = self.state();
        state.live_dirs -= 1;
        state.fail(Step::CloseDir)
    }

    fn open(
        &self,
        ctx: &MockContext,
        url: &str,
        options: OpenOptions,
        _mode: u32,
    ) -> EngineResult<MockFile> {
        self.state().fail(Step::Open)?;
        self.authenticate(ctx, url)?;
        let mut state = self.state();
        if state.dirs.contains_key(url) {
            return Err(Errno(libc::EISDIR));
        }
        if state.files.contains_key(url) {
            if options.create && options.exclusive {
                return Err(Errno(libc::EEXIST));
            }
            if options.truncate {
                state.files.insert(url.to_string(), Vec::new());
            }
        } else if options.create {
            state.files.insert(url.to_string(), Vec::new());
        } else {
            return Err(Errno(libc::ENOENT));
        }
        state.live_files += 1;
        Ok(MockFile {
            url: url.to_string(),
            pos: 0,
            closed: false,
        })
    }

    fn read(&self, _ctx: &MockContext, file: &mut MockFile, buf: &mut [u8]) -> EngineResult<usize> {
        let mut state = self.state();
        state.fail(Step::Read)?;
        state.reads += 1;
        let data = state.files.get(&file.url).ok_or(Errno(libc::EBADF))?;
        let remaining = data.len().saturating_sub(file.pos);
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&data[file.pos..file.pos + n]);
        file.pos += n;
        Ok(n)
    }

    fn write(&self, _ctx: &MockContext, file: &mut MockFile, buf: &[u8]) -> EngineResult<usize> {
        let mut state = self.state();
        state.fail(Step::Write)?;
        state.writes += 1;
        let mut n = buf.len();
        if let Some(limit) = state.write_limit {
            n = n.min(limit);
        }
        if let Some(budget) = state.write_budget.as_mut() {
            n = n.min(*budget);
            *budget -= n;
        }
        let data = state.files.get_mut(&file.url).ok_or(Errno(libc::EBADF))?;
        let end = file.pos + n;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos..end].copy_from_slice(&buf[..n]);
        file.pos = end;
        Ok(n)
    }

    fn close(&self, _ctx: &MockContext, file: &mut MockFile) -> EngineResult<()> {
        assert!(!file.closed, "file closed twice");
        file.closed = true;
        let mut state = self.state();
        state.live_files -= 1;
        state.fail(Step::Close)
    }
}
