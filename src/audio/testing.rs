//! Recording backend for tests

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::backend::{AudioBackend, BackendError, BackendVersion, ListenerAttributes, Settings3d};
use crate::core::{EventBus, EventKind};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Version,
    DriverCount,
    Init(u32),
    Settings3d(Settings3d),
    Update,
    ListenerAttributes(usize, ListenerAttributes),
    Close,
    Release,
}

/// Checkpoints that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailAt {
    Version,
    DriverCount,
    Init,
    Settings3d,
    Update,
    ListenerAttributes,
    Close,
    Release,
}

pub struct MockState {
    pub calls: Vec<Call>,
    pub fail: HashSet<FailAt>,
    pub version: BackendVersion,
    pub drivers: usize,
    /// When set, `close()` records how many unload subscribers remain
    pub watched_bus: Option<EventBus>,
    pub unload_subscribers_at_close: Option<usize>,
}

/// Shared view of a mock's state, kept by the test after the backend
/// itself has moved into the subsystem.
#[derive(Clone)]
pub struct MockHandle(Rc<RefCell<MockState>>);

impl MockHandle {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(MockState {
            calls: Vec::new(),
            fail: HashSet::new(),
            version: MockBackend::COMPILED_VERSION,
            drivers: 1,
            watched_bus: None,
            unload_subscribers_at_close: None,
        })))
    }

    pub fn fail_at(&self, point: FailAt) -> &Self {
        self.0.borrow_mut().fail.insert(point);
        self
    }

    pub fn recover(&self, point: FailAt) -> &Self {
        self.0.borrow_mut().fail.remove(&point);
        self
    }

    pub fn set_version(&self, version: BackendVersion) -> &Self {
        self.0.borrow_mut().version = version;
        self
    }

    pub fn set_drivers(&self, drivers: usize) -> &Self {
        self.0.borrow_mut().drivers = drivers;
        self
    }

    pub fn watch_bus(&self, bus: &EventBus) -> &Self {
        self.0.borrow_mut().watched_bus = Some(bus.clone());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn updates(&self) -> usize {
        self.count(|c| matches!(c, Call::Update))
    }

    pub fn listener_pushes(&self) -> Vec<(usize, ListenerAttributes)> {
        self.0
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::ListenerAttributes(index, attrs) => Some((*index, *attrs)),
                _ => None,
            })
            .collect()
    }

    pub fn unload_subscribers_at_close(&self) -> Option<usize> {
        self.0.borrow().unload_subscribers_at_close
    }

    /// Factory producing a backend bound to this handle
    pub fn factory(&self) -> impl FnOnce() -> Result<MockBackend, BackendError> + use<> {
        let state = Rc::clone(&self.0);
        move || Ok(MockBackend { state })
    }
}

/// Factory that fails before any instance exists
pub fn failing_factory() -> Result<MockBackend, BackendError> {
    Err(BackendError::new(1, "Out of memory."))
}

pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    fn call(&self, call: Call, point: FailAt) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.fail.contains(&point) {
            Err(BackendError::new(99, format!("{point:?} failed")))
        } else {
            Ok(())
        }
    }
}

impl AudioBackend for MockBackend {
    const NAME: &'static str = "Mock";
    const COMPILED_VERSION: BackendVersion = BackendVersion(0x0002_0108);

    fn version(&self) -> Result<BackendVersion, BackendError> {
        self.call(Call::Version, FailAt::Version)?;
        Ok(self.state.borrow().version)
    }

    fn driver_count(&self) -> Result<usize, BackendError> {
        self.call(Call::DriverCount, FailAt::DriverCount)?;
        Ok(self.state.borrow().drivers)
    }

    fn init(&mut self, max_channels: u32) -> Result<(), BackendError> {
        self.call(Call::Init(max_channels), FailAt::Init)
    }

    fn set_3d_settings(&mut self, settings: Settings3d) -> Result<(), BackendError> {
        self.call(Call::Settings3d(settings), FailAt::Settings3d)
    }

    fn update(&mut self) -> Result<(), BackendError> {
        self.call(Call::Update, FailAt::Update)
    }

    fn set_listener_attributes(
        &mut self,
        index: usize,
        attributes: &ListenerAttributes,
    ) -> Result<(), BackendError> {
        self.call(
            Call::ListenerAttributes(index, *attributes),
            FailAt::ListenerAttributes,
        )
    }

    fn close(&mut self) -> Result<(), BackendError> {
        let watched = self.state.borrow().watched_bus.clone();
        if let Some(bus) = watched {
            self.state.borrow_mut().unload_subscribers_at_close =
                Some(bus.subscriber_count(EventKind::WorldUnloaded));
        }
        self.call(Call::Close, FailAt::Close)
    }

    fn release(self) -> Result<(), BackendError> {
        self.call(Call::Release, FailAt::Release)
    }
}
