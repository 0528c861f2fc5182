//! Request host abstraction
//!
//! The host is the UI context that shows runtime prompts and opens settings
//! pages. The engine only drives it; it never renders anything itself.

use async_trait::async_trait;
use permflow_api::{RequestCode, SettingsDestination};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::HostError;
use crate::platform::{MemoryPlatform, SpecialAccess};

/// UI context able to prompt and navigate
///
/// One host serves one request cycle at a time. Implementations resolve the
/// futures once the user is back: after answering a prompt, or after leaving
/// a settings page that was opened with a request code.
#[async_trait]
pub trait RequestHost: Send + Sync {
    /// Whether the host can still show UI (not detached or destroyed)
    fn is_usable(&self) -> bool;

    /// Show the runtime prompt for the given names
    async fn request_runtime_prompt(
        &self,
        names: &[String],
        request_code: RequestCode,
    ) -> Result<(), HostError>;

    /// Open a settings page
    ///
    /// Without a request code the navigation is fire-and-forget.
    async fn navigate_to(
        &self,
        destination: &SettingsDestination,
        request_code: Option<RequestCode>,
    ) -> Result<(), HostError>;

    /// Show rationale text before prompting
    async fn show_description(&self, _text: &str) {}
}

// ============================================================================
// Recording Host (for testing)
// ============================================================================

/// How the scripted user answers a runtime prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptAnswer {
    Grant,
    /// Deny, the system will ask again
    #[default]
    Deny,
    /// Deny and tick "don't ask again"
    DenyPermanently,
}

/// Scripted user behavior for [`RecordingHost`]
#[derive(Debug, Clone, Default)]
pub struct HostScript {
    answers: HashMap<String, PromptAnswer>,
    default_answer: PromptAnswer,
    enable_on_settings: Vec<SpecialAccess>,
    grant_on_settings: Vec<String>,
    unavailable: HashSet<String>,
    detach_on_prompt: bool,
}

/// Something the host was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Prompt {
        names: Vec<String>,
        request_code: RequestCode,
    },
    Navigate {
        destination: SettingsDestination,
        request_code: Option<RequestCode>,
    },
    Description(String),
}

/// Host that records every interaction and answers from a [`HostScript`]
///
/// Answers are written into a shared [`MemoryPlatform`], so the engine
/// observes them exactly as it would observe a real user.
#[derive(Debug)]
pub struct RecordingHost {
    platform: Arc<MemoryPlatform>,
    script: HostScript,
    events: Mutex<Vec<HostEvent>>,
    usable: AtomicBool,
}

impl RecordingHost {
    /// Host that denies every prompt and changes nothing in settings
    pub fn new(platform: Arc<MemoryPlatform>) -> Self {
        Self {
            platform,
            script: HostScript::default(),
            events: Mutex::new(Vec::new()),
            usable: AtomicBool::new(true),
        }
    }

    /// Answer prompts for `name` with `answer`
    pub fn answer(mut self, name: impl Into<String>, answer: PromptAnswer) -> Self {
        self.script.answers.insert(name.into(), answer);
        self
    }

    /// Answer for names without an explicit answer
    pub fn default_answer(mut self, answer: PromptAnswer) -> Self {
        self.script.default_answer = answer;
        self
    }

    /// Turn a special access switch on whenever a settings page is visited
    pub fn enable_on_settings(mut self, access: SpecialAccess) -> Self {
        self.script.enable_on_settings.push(access);
        self
    }

    /// Grant a right whenever a settings page is visited
    pub fn grant_on_settings(mut self, name: impl Into<String>) -> Self {
        self.script.grant_on_settings.push(name.into());
        self
    }

    /// Make navigation to `action` fail
    pub fn unavailable_destination(mut self, action: impl Into<String>) -> Self {
        self.script.unavailable.insert(action.into());
        self
    }

    /// Detach while the first prompt is showing
    pub fn detach_on_prompt(mut self) -> Self {
        self.script.detach_on_prompt = true;
        self
    }

    /// Mark the host as destroyed
    pub fn detach(&self) {
        self.usable.store(false, Ordering::SeqCst);
    }

    /// All recorded events
    pub fn events(&self) -> Vec<HostEvent> {
        self.lock().clone()
    }

    /// Name lists of every prompt shown
    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Prompt { names, .. } => Some(names.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every destination navigated to
    pub fn navigations(&self) -> Vec<SettingsDestination> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Navigate { destination, .. } => Some(destination.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    fn record(&self, event: HostEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HostEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_answer(&self, name: &str) {
        let answer = self
            .script
            .answers
            .get(name)
            .copied()
            .unwrap_or(self.script.default_answer);
        match answer {
            PromptAnswer::Grant => self.platform.grant(name),
            PromptAnswer::Deny => {
                self.platform.revoke(name);
                self.platform.set_rationale(name, true);
            }
            PromptAnswer::DenyPermanently => {
                self.platform.revoke(name);
                self.platform.set_rationale(name, false);
            }
        }
    }
}

#[async_trait]
impl RequestHost for RecordingHost {
    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    async fn request_runtime_prompt(
        &self,
        names: &[String],
        request_code: RequestCode,
    ) -> Result<(), HostError> {
        self.record(HostEvent::Prompt {
            names: names.to_vec(),
            request_code,
        });
        if self.script.detach_on_prompt {
            self.detach();
            return Err(HostError::Detached);
        }
        for name in names {
            self.apply_answer(name);
        }
        Ok(())
    }

    async fn navigate_to(
        &self,
        destination: &SettingsDestination,
        request_code: Option<RequestCode>,
    ) -> Result<(), HostError> {
        if !self.is_usable() {
            return Err(HostError::Detached);
        }
        if self.script.unavailable.contains(&destination.action) {
            return Err(HostError::DestinationUnavailable(destination.to_string()));
        }
        self.record(HostEvent::Navigate {
            destination: destination.clone(),
            request_code,
        });
        for access in &self.script.enable_on_settings {
            self.platform.set_special_access(*access, true);
        }
        for name in &self.script.grant_on_settings {
            self.platform.grant(name.clone());
        }
        Ok(())
    }

    async fn show_description(&self, text: &str) {
        self.record(HostEvent::Description(text.to_string()));
    }
}
