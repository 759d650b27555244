//! Audio subsystem: owns one backend instance and drives it once per tick

use std::cell::Cell;
use std::rc::Rc;

use hecs::Entity;

use super::backend::{AudioBackend, BackendError, BackendVersion, ListenerAttributes, Settings3d};
use super::error::AudioError;
use crate::core::{AudioConfig, EngineMode, EventBus, EventKind, Profiler, Subscription};
use crate::ecs::World;
use glam::Vec3;

/// Lifecycle state of the subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// No backend; also the state after shutdown
    Uninitialized,
    /// Startup checks in progress
    Initializing,
    /// Backend is up and ticking
    Initialized,
    /// Startup failed; the subsystem stays inert until restart
    Failed,
}

/// What a call to [`AudioSubsystem::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not in game mode, or no initialized backend
    Skipped,
    /// Backend advanced, no listener to push
    Updated,
    /// Backend advanced and listener 0 received the listener transform
    ListenerPushed,
    /// A backend call failed; the rest of the tick was skipped
    Aborted,
}

/// Wraps an [`AudioBackend`] with startup validation, per-tick update and
/// listener sync.
///
/// The listener is stored as an entity id and resolved against the world on
/// every tick. It is cleared automatically when the world is unloaded.
pub struct AudioSubsystem<B: AudioBackend> {
    backend: Option<B>,
    state: AudioState,
    max_channels: u32,
    settings_3d: Settings3d,
    version: Option<BackendVersion>,
    listener: Rc<Cell<Option<Entity>>>,
    unload_subscription: Option<Subscription>,
    last_error: Option<AudioError>,
}

impl<B: AudioBackend> AudioSubsystem<B> {
    /// Profiler scope name for the per-tick work
    pub const PROFILE_SCOPE: &'static str = "Audio";

    /// Create the backend through `create` and run every startup check.
    ///
    /// Failure at any step is logged and leaves the subsystem in
    /// [`AudioState::Failed`]; anything already created is closed and
    /// released before returning.
    pub fn new<F>(config: &AudioConfig, events: &EventBus, create: F) -> Self
    where
        F: FnOnce() -> Result<B, BackendError>,
    {
        let mut subsystem = Self::disabled(config, events);
        subsystem.start(create);
        subsystem
    }

    /// A subsystem that never creates a backend.
    ///
    /// Listener tracking still works, ticks are no-ops.
    pub fn disabled(config: &AudioConfig, events: &EventBus) -> Self {
        let listener = Rc::new(Cell::new(None));
        let slot = Rc::clone(&listener);
        let unload_subscription = events.subscribe(EventKind::WorldUnloaded, move |_| {
            slot.set(None);
        });

        Self {
            backend: None,
            state: AudioState::Uninitialized,
            max_channels: config.max_channels,
            settings_3d: Settings3d {
                doppler_scale: config.doppler_scale,
                distance_factor: config.distance_factor,
                rolloff_scale: config.rolloff_scale,
            },
            version: None,
            listener,
            unload_subscription: Some(unload_subscription),
            last_error: None,
        }
    }

    fn start<F>(&mut self, create: F)
    where
        F: FnOnce() -> Result<B, BackendError>,
    {
        self.state = AudioState::Initializing;

        let mut backend = match create() {
            Ok(backend) => backend,
            Err(e) => {
                self.record(AudioError::Create(e));
                self.state = AudioState::Failed;
                return;
            }
        };

        let mut initialized = false;
        match Self::configure(&mut backend, self.max_channels, self.settings_3d, &mut initialized) {
            Ok(version) => {
                log::info!(
                    "Audio::{}: version {version}, {} channels",
                    B::NAME,
                    self.max_channels
                );
                self.version = Some(version);
                self.backend = Some(backend);
                self.state = AudioState::Initialized;
            }
            Err(error) => {
                self.record(error);
                Self::discard(backend, initialized);
                self.state = AudioState::Failed;
            }
        }
    }

    fn configure(
        backend: &mut B,
        max_channels: u32,
        settings_3d: Settings3d,
        initialized: &mut bool,
    ) -> Result<BackendVersion, AudioError> {
        let version = backend.version().map_err(AudioError::VersionQuery)?;
        if version < B::COMPILED_VERSION {
            return Err(AudioError::VersionMismatch {
                found: version,
                required: B::COMPILED_VERSION,
            });
        }

        let drivers = backend.driver_count().map_err(AudioError::DriverQuery)?;
        if drivers == 0 {
            return Err(AudioError::NoOutputDevice);
        }

        backend.init(max_channels).map_err(AudioError::Init)?;
        *initialized = true;

        backend
            .set_3d_settings(settings_3d)
            .map_err(AudioError::Settings3d)?;

        Ok(version)
    }

    /// Tear down a backend that failed startup
    fn discard(mut backend: B, initialized: bool) {
        if initialized {
            if let Err(e) = backend.close() {
                Self::log_error(&AudioError::Close(e));
            }
        }
        if let Err(e) = backend.release() {
            Self::log_error(&AudioError::Release(e));
        }
    }

    /// Advance the backend one step and sync the listener.
    ///
    /// Does nothing unless `mode` is [`EngineMode::Game`] and startup
    /// succeeded. Backend errors are logged and end the tick early without
    /// changing state.
    pub fn update(&mut self, mode: EngineMode, world: &World, profiler: &mut Profiler) -> TickOutcome {
        if !mode.is_game() || self.state != AudioState::Initialized {
            return TickOutcome::Skipped;
        }
        let Some(backend) = self.backend.as_mut() else {
            return TickOutcome::Skipped;
        };

        let _block = profiler.scope(Self::PROFILE_SCOPE);

        if let Err(e) = backend.update() {
            self.record(AudioError::Update(e));
            return TickOutcome::Aborted;
        }

        let Some(attributes) = self.listener_attributes(world) else {
            return TickOutcome::Updated;
        };

        let Some(backend) = self.backend.as_mut() else {
            return TickOutcome::Updated;
        };
        if let Err(e) = backend.set_listener_attributes(0, &attributes) {
            self.record(AudioError::ListenerAttributes(e));
            return TickOutcome::Aborted;
        }

        TickOutcome::ListenerPushed
    }

    /// Resolve the listener entity to attributes, dropping a stale id
    fn listener_attributes(&self, world: &World) -> Option<ListenerAttributes> {
        let entity = self.listener.get()?;
        let Some(transform) = world.transform(entity) else {
            log::warn!("Audio listener {entity:?} has no transform, clearing");
            self.listener.set(None);
            return None;
        };

        Some(ListenerAttributes {
            position: transform.position,
            velocity: Vec3::ZERO,
            forward: transform.forward(),
            up: transform.up(),
        })
    }

    /// Replace the listener. `None` stops listener updates.
    pub fn set_listener_transform(&mut self, entity: Option<Entity>) {
        self.listener.set(entity);
    }

    /// The current listener entity
    #[must_use]
    pub fn listener(&self) -> Option<Entity> {
        self.listener.get()
    }

    /// Unsubscribe from world events, then close and release the backend.
    ///
    /// Release is attempted even if close fails. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.unload_subscription.take() {
            subscription.cancel();
        }

        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.close() {
                self.record(AudioError::Close(e));
            }
            if let Err(e) = backend.release() {
                self.record(AudioError::Release(e));
            }
            log::info!("Audio::{}: shut down", B::NAME);
        }

        self.state = AudioState::Uninitialized;
    }

    fn record(&mut self, error: AudioError) {
        Self::log_error(&error);
        self.last_error = Some(error);
    }

    fn log_error(error: &AudioError) {
        log::error!("Audio::{}: {error}", B::NAME);
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> AudioState {
        self.state
    }

    /// Whether startup succeeded and the backend is live
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state == AudioState::Initialized
    }

    /// Runtime version resolved during startup
    #[must_use]
    pub fn backend_version(&self) -> Option<BackendVersion> {
        self.version
    }

    /// Most recent error, startup or tick
    #[must_use]
    pub fn last_error(&self) -> Option<&AudioError> {
        self.last_error.as_ref()
    }

    /// Voice limit passed to the backend
    #[must_use]
    pub fn max_channels(&self) -> u32 {
        self.max_channels
    }

    /// 3D settings passed to the backend
    #[must_use]
    pub fn settings_3d(&self) -> Settings3d {
        self.settings_3d
    }

    /// The live backend, if initialized
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// The live backend, if initialized
    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }
}

impl<B: AudioBackend> Drop for AudioSubsystem<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: AudioBackend> std::fmt::Debug for AudioSubsystem<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSubsystem")
            .field("backend", &B::NAME)
            .field("state", &self.state)
            .field("version", &self.version)
            .field("max_channels", &self.max_channels)
            .field("listener", &self.listener.get())
            .finish()
    }
}
