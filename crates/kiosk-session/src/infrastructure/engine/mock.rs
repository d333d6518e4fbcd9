//! Recording engine for tests.
//!
//! Records every call the session makes, in order, so tests can assert on
//! startup and teardown sequencing without a display server.  A shared
//! [`RecordingHandle`] configures failures and scripted events before the
//! session runs and inspects the recording afterwards.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use kiosk_core::{Command, CommandSink, EngineEvent, EventKind};

use super::{Engine, EngineError, Listener, ListenerSet, Primitive};
use crate::application::event_loop::{EventSender, SessionEvent};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreatePrimitive(Primitive),
    Listen(EventKind),
    AddSocket,
    Start,
    Command(Command),
    DestroyClients,
    Destroy,
}

#[derive(Debug, Default)]
pub struct RecordingState {
    /// Every call in the order it was made.
    pub calls: Vec<EngineCall>,
    /// Make creation of this primitive fail.
    pub fail_primitive: Option<Primitive>,
    /// Make `add_socket_auto` fail.
    pub fail_socket: bool,
    /// Make `start` fail.
    pub fail_start: bool,
    /// Events posted (subject to listeners) when `start` succeeds.
    pub events_on_start: Vec<EngineEvent>,
    /// Display name returned by `add_socket_auto`.
    pub display_name: String,
}

/// Shared view of a [`RecordingEngine`]'s state.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    state: Rc<RefCell<RecordingState>>,
    listeners: ListenerSet,
}

impl Default for RecordingHandle {
    fn default() -> Self {
        Self {
            state: Rc::new(RefCell::new(RecordingState {
                display_name: "wayland-test".into(),
                ..RecordingState::default()
            })),
            listeners: ListenerSet::new(),
        }
    }
}

impl RecordingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates the recording state (e.g. to inject failures).
    pub fn configure(&self, f: impl FnOnce(&mut RecordingState)) {
        f(&mut self.state.borrow_mut());
    }

    pub fn state(&self) -> Ref<'_, RecordingState> {
        self.state.borrow()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.borrow().calls.clone()
    }

    /// Commands only, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Command(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    /// Live listener registrations.
    pub fn active_listeners(&self) -> usize {
        self.listeners.active_count()
    }

    fn record(&self, call: EngineCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// An [`Engine`] that records instead of doing anything.
pub struct RecordingEngine {
    handle: RecordingHandle,
    events: EventSender,
}

impl RecordingEngine {
    /// Creates an engine sharing state with `handle`.
    pub fn attach(events: EventSender, handle: &RecordingHandle) -> Self {
        Self {
            handle: handle.clone(),
            events,
        }
    }
}

impl CommandSink for RecordingEngine {
    fn submit(&mut self, command: Command) {
        self.handle.record(EngineCall::Command(command));
    }
}

impl Engine for RecordingEngine {
    fn create_primitive(&mut self, primitive: Primitive) -> Result<(), EngineError> {
        self.handle.record(EngineCall::CreatePrimitive(primitive));
        if self.handle.state().fail_primitive == Some(primitive) {
            return Err(EngineError::Primitive(primitive));
        }
        Ok(())
    }

    fn listen(&mut self, kind: EventKind) -> Listener {
        self.handle.record(EngineCall::Listen(kind));
        self.handle.listeners.register(kind)
    }

    fn add_socket_auto(&mut self) -> Result<String, EngineError> {
        self.handle.record(EngineCall::AddSocket);
        let state = self.handle.state();
        if state.fail_socket {
            return Err(EngineError::NoFreeSocket("recording".into()));
        }
        Ok(state.display_name.clone())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.handle.record(EngineCall::Start);
        if self.handle.state().fail_start {
            return Err(EngineError::Start("injected failure".into()));
        }
        let events = self.handle.state().events_on_start.clone();
        for event in events {
            let allowed = event
                .listener_kind()
                .map_or(true, |kind| self.handle.listeners.is_active(kind));
            if allowed {
                let _ = self.events.send(SessionEvent::Engine(event));
            }
        }
        Ok(())
    }

    fn destroy_clients(&mut self) {
        self.handle.record(EngineCall::DestroyClients);
    }

    fn destroy(&mut self) {
        self.handle.record(EngineCall::Destroy);
    }
}
