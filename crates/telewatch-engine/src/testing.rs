// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted in-memory remote account client for engine tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use telewatch_core::{
    AccountStream, CodeRequest, InboundEvent, LoginOutcome, RemoteAccountClient, TelewatchError,
};
use telewatch_storage::{Database, SessionStore};
use telewatch_vault::CredentialVault;
use telewatch_vault::crypto::generate_random_key;
use tokio::sync::mpsc;

/// Scripted outcome for the next call to one remote method.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Script {
    Ok,
    InvalidPhone,
    InvalidCode,
    CodeExpired,
    RateLimited(u64),
    PasswordRequired,
    RemoteFail,
}

fn script_err(script: Script) -> Option<TelewatchError> {
    match script {
        Script::Ok | Script::PasswordRequired => None,
        Script::InvalidPhone => Some(TelewatchError::InvalidPhoneFormat),
        Script::InvalidCode => Some(TelewatchError::InvalidCode),
        Script::CodeExpired => Some(TelewatchError::CodeExpired),
        Script::RateLimited(secs) => Some(TelewatchError::RateLimited {
            retry_after: Duration::from_secs(secs),
        }),
        Script::RemoteFail => Some(TelewatchError::remote("mock transport failure")),
    }
}

type EventItem = Result<InboundEvent, TelewatchError>;

pub(crate) struct MockRemote {
    pub request_script: Mutex<Script>,
    pub resend_script: Mutex<Script>,
    pub confirm_script: Mutex<Script>,
    pub password_script: Mutex<Script>,
    /// Sleep inserted before `confirm_code` returns, so another login step
    /// can interleave in race tests.
    pub confirm_delay: Mutex<Option<Duration>>,
    pub open_should_fail: AtomicBool,
    /// Shared with every opened stream; lets tests break saved-messages
    /// delivery mid-run.
    pub fail_sends: Arc<AtomicBool>,
    pub open_count: AtomicUsize,
    pub resend_count: AtomicUsize,
    pub request_count: AtomicUsize,
    hash_counter: AtomicUsize,
    saved: Arc<Mutex<Vec<String>>>,
    event_senders: Mutex<Vec<mpsc::UnboundedSender<EventItem>>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            request_script: Mutex::new(Script::Ok),
            resend_script: Mutex::new(Script::Ok),
            confirm_script: Mutex::new(Script::Ok),
            password_script: Mutex::new(Script::Ok),
            confirm_delay: Mutex::new(None),
            open_should_fail: AtomicBool::new(false),
            fail_sends: Arc::new(AtomicBool::new(false)),
            open_count: AtomicUsize::new(0),
            resend_count: AtomicUsize::new(0),
            request_count: AtomicUsize::new(0),
            hash_counter: AtomicUsize::new(0),
            saved: Arc::new(Mutex::new(Vec::new())),
            event_senders: Mutex::new(Vec::new()),
        })
    }

    fn next_code(&self) -> CodeRequest {
        let n = self.hash_counter.fetch_add(1, Ordering::SeqCst) + 1;
        CodeRequest {
            tmp_session: format!("tmp-{n}").into_bytes(),
            code_hash: format!("hash-{n}"),
        }
    }

    /// Sender feeding the most recently opened stream.
    pub fn latest_sender(&self) -> mpsc::UnboundedSender<EventItem> {
        self.event_senders
            .lock()
            .unwrap()
            .last()
            .expect("no stream opened yet")
            .clone()
    }

    /// Everything sent to saved messages, across all streams.
    pub fn sent(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteAccountClient for MockRemote {
    async fn request_code(&self, _phone: &str) -> Result<CodeRequest, TelewatchError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = script_err(*self.request_script.lock().unwrap()) {
            return Err(e);
        }
        Ok(self.next_code())
    }

    async fn resend_code(
        &self,
        _tmp_session: &[u8],
        _phone: &str,
        _code_hash: &str,
    ) -> Result<CodeRequest, TelewatchError> {
        self.resend_count.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = script_err(*self.resend_script.lock().unwrap()) {
            return Err(e);
        }
        Ok(self.next_code())
    }

    async fn confirm_code(
        &self,
        _tmp_session: &[u8],
        _phone: &str,
        code: &str,
        _code_hash: &str,
    ) -> Result<LoginOutcome, TelewatchError> {
        let delay = *self.confirm_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match *self.confirm_script.lock().unwrap() {
            Script::Ok => Ok(LoginOutcome::Authorized {
                session: format!("session-for-{code}").into_bytes(),
            }),
            Script::PasswordRequired => Ok(LoginOutcome::PasswordRequired),
            other => Err(script_err(other).unwrap()),
        }
    }

    async fn confirm_password(
        &self,
        _tmp_session: &[u8],
        password: &str,
    ) -> Result<LoginOutcome, TelewatchError> {
        match *self.password_script.lock().unwrap() {
            Script::Ok => Ok(LoginOutcome::Authorized {
                session: format!("session-pw-{password}").into_bytes(),
            }),
            Script::PasswordRequired => Ok(LoginOutcome::PasswordRequired),
            other => Err(script_err(other).unwrap()),
        }
    }

    async fn open_monitor(
        &self,
        _session: &[u8],
    ) -> Result<Box<dyn AccountStream>, TelewatchError> {
        if self.open_should_fail.load(Ordering::SeqCst) {
            return Err(TelewatchError::remote("mock connect failure"));
        }
        self.open_count.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_senders.lock().unwrap().push(tx);
        Ok(Box::new(MockStream {
            events: rx,
            saved: Arc::clone(&self.saved),
            fail_send: Arc::clone(&self.fail_sends),
        }))
    }
}

pub(crate) struct MockStream {
    events: mpsc::UnboundedReceiver<EventItem>,
    saved: Arc<Mutex<Vec<String>>>,
    pub fail_send: Arc<AtomicBool>,
}

impl MockStream {
    /// Standalone stream plus its event sender, for sink tests.
    pub fn pair() -> (Self, mpsc::UnboundedSender<EventItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Self {
            events: rx,
            saved: Arc::new(Mutex::new(Vec::new())),
            fail_send: Arc::new(AtomicBool::new(false)),
        };
        (stream, tx)
    }

    pub fn sent(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountStream for MockStream {
    async fn next_event(&mut self) -> Result<Option<InboundEvent>, TelewatchError> {
        match self.events.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn send_to_saved(&self, text: &str) -> Result<(), TelewatchError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TelewatchError::remote("mock send failure"));
        }
        self.saved.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Fresh store over a temp-dir database with a random vault key.
pub(crate) async fn test_store() -> (Arc<SessionStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();
    let vault = CredentialVault::from_key(generate_random_key().unwrap());
    (Arc::new(SessionStore::new(db, vault)), dir)
}

pub(crate) fn event(text: &str) -> InboundEvent {
    InboundEvent {
        chat_title: Some("Rust Jobs".into()),
        public_handle: Some("rustjobs".into()),
        message_id: 7,
        text: text.into(),
    }
}

pub(crate) fn private_event(text: &str) -> InboundEvent {
    InboundEvent {
        chat_title: Some("Private Group".into()),
        public_handle: None,
        message_id: 8,
        text: text.into(),
    }
}
