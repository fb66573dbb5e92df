//! Scripted collaborators shared by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::capture::{AcquireRequest, CaptureResult, MediaAcquirer, ResourceHandle};
use crate::notification::Notifier;
use crate::storage::{ResolutionError, ResolutionResult, ResourceOpener};

/// Replays queued dialog results; an exhausted script behaves like a
/// dismissed dialog.
#[derive(Default)]
pub(crate) struct ScriptedAcquirer {
    responses: RefCell<VecDeque<CaptureResult<Option<ResourceHandle>>>>,
    requests: RefCell<Vec<AcquireRequest>>,
}

impl ScriptedAcquirer {
    pub(crate) fn push(&self, response: CaptureResult<Option<ResourceHandle>>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<AcquireRequest> {
        self.requests.borrow().clone()
    }
}

impl MediaAcquirer for ScriptedAcquirer {
    async fn acquire(&self, request: &AcquireRequest) -> CaptureResult<Option<ResourceHandle>> {
        self.requests.borrow_mut().push(request.clone());
        self.responses.borrow_mut().pop_front().unwrap_or(Ok(None))
    }
}

/// In-memory resources keyed by locator.
#[derive(Default)]
pub(crate) struct FakeResources {
    files: RefCell<HashMap<String, Vec<u8>>>,
    denied: RefCell<Vec<String>>,
    opened: RefCell<Vec<String>>,
}

impl FakeResources {
    pub(crate) fn put(&self, locator: &str, bytes: Vec<u8>) {
        self.files.borrow_mut().insert(locator.to_string(), bytes);
    }

    pub(crate) fn delete(&self, locator: &str) {
        self.files.borrow_mut().remove(locator);
    }

    pub(crate) fn deny(&self, locator: &str) {
        self.denied.borrow_mut().push(locator.to_string());
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl ResourceOpener for FakeResources {
    async fn open(&self, locator: &str) -> ResolutionResult<Vec<u8>> {
        self.opened.borrow_mut().push(locator.to_string());
        if self.denied.borrow().iter().any(|denied| denied == locator) {
            return Err(ResolutionError::AccessDenied {
                locator: locator.to_string(),
            });
        }
        self.files
            .borrow()
            .get(locator)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                locator: locator.to_string(),
            })
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_user(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
