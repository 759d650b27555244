//! Core Engine struct and frame loop

use std::time::{Duration, Instant};

use hecs::Entity;

use crate::audio::{AudioBackend, AudioSubsystem, BackendError};
use crate::core::debug::{DebugInfo, Profiler};
use crate::core::events::{EngineEvent, EventBus};
use crate::core::settings::Settings;
use crate::ecs::World;

/// What the engine is currently doing.
///
/// Only [`EngineMode::Game`] runs the simulation; the other modes keep the
/// frame loop alive without advancing gameplay or audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    /// Editing: world is loaded but not simulated
    #[default]
    Editor,
    /// Running the game
    Game,
    /// Game is paused
    Paused,
}

impl EngineMode {
    /// Whether the simulation is running
    #[must_use]
    pub const fn is_game(self) -> bool {
        matches!(self, Self::Game)
    }
}

/// A system advanced once per frame
pub trait Subsystem {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Advance one frame
    fn tick(&mut self, ctx: &mut EngineContext);
}

impl<B: AudioBackend> Subsystem for AudioSubsystem<B> {
    fn name(&self) -> &'static str {
        B::NAME
    }

    fn tick(&mut self, ctx: &mut EngineContext) {
        self.update(ctx.mode, &ctx.world, &mut ctx.profiler);
    }
}

/// State shared by every subsystem
pub struct EngineContext {
    /// Current engine mode
    pub mode: EngineMode,
    /// ECS world
    pub world: World,
    /// Event bus
    pub events: EventBus,
    /// CPU profiler
    pub profiler: Profiler,
    /// Debug information and stats
    pub debug: DebugInfo,
    /// Settings and runtime diagnostics
    pub settings: Settings,
    /// Frames ticked so far
    frame: u64,
    /// Should the engine quit
    should_quit: bool,
}

impl EngineContext {
    fn new(settings: Settings, events: EventBus) -> Self {
        Self {
            mode: EngineMode::default(),
            world: World::new(),
            events,
            profiler: Profiler::new(),
            debug: DebugInfo::new(),
            settings,
            frame: 0,
            should_quit: false,
        }
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<B: AudioBackend> {
    context: EngineContext,
    audio: AudioSubsystem<B>,
    last_frame: Option<Instant>,
}

impl<B: AudioBackend> Engine<B> {
    /// Create the engine and bring up audio through `create_audio`.
    ///
    /// An audio startup failure is logged and leaves audio inert; the engine
    /// itself always comes up.
    pub fn new<F>(settings: Settings, create_audio: F) -> Self
    where
        F: FnOnce() -> Result<B, BackendError>,
    {
        let events = EventBus::new();
        let audio = if settings.audio.enabled {
            AudioSubsystem::new(&settings.audio, &events, create_audio)
        } else {
            log::info!("Audio disabled in settings");
            AudioSubsystem::disabled(&settings.audio, &events)
        };

        let mut context = EngineContext::new(settings, events);
        if let Some(version) = audio.backend_version() {
            let diagnostics = &mut context.settings.diagnostics;
            diagnostics.audio_backend_version = Some(version.to_string());
            diagnostics.audio_backend_name = Some(B::NAME);
            context.debug.add_line(format!("Audio: {} {version}", B::NAME));
        }

        log::info!("Engine initialized");

        Self {
            context,
            audio,
            last_frame: None,
        }
    }

    /// Run one frame.
    ///
    /// Delivers events queued last frame, records frame timing, then ticks
    /// the subsystems.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let delta = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_frame = Some(now);

        self.context.events.flush();
        self.context.debug.record_frame(delta);

        self.audio.tick(&mut self.context);

        self.context.frame += 1;
    }

    /// Tick until `frames` have run or a quit is requested.
    ///
    /// Returns the number of frames actually run.
    pub fn run_frames(&mut self, frames: u64) -> u64 {
        let mut ran = 0;
        while ran < frames && !self.context.should_quit() {
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Switch engine mode, announcing the change on the event bus
    pub fn set_mode(&mut self, mode: EngineMode) {
        let from = self.context.mode;
        if from == mode {
            return;
        }
        self.context.mode = mode;
        log::debug!("Engine mode {from:?} -> {mode:?}");
        self.context
            .events
            .emit(EngineEvent::ModeChanged { from, to: mode });
    }

    /// Current engine mode
    pub fn mode(&self) -> EngineMode {
        self.context.mode
    }

    /// Start a fresh world, unloading the current one first
    pub fn load_world(&mut self, name: impl Into<String>) {
        if self.context.world.name().is_some() || !self.context.world.is_empty() {
            self.unload_world();
        }
        let name = name.into();
        self.context.world.set_name(name.clone());
        log::info!("World '{name}' loaded");
        self.context.events.emit(EngineEvent::WorldLoaded { name });
    }

    /// Despawn everything and announce the unload immediately, so no
    /// subsystem holds a stale entity into the next frame.
    pub fn unload_world(&mut self) {
        if let Some(name) = self.context.world.name() {
            log::info!("World '{name}' unloaded");
        }
        self.context.world.clear();
        self.context.events.emit(EngineEvent::WorldUnloaded);
    }

    /// Make `entity` the audio listener, or clear it with `None`
    pub fn activate_listener(&mut self, entity: Option<Entity>) {
        self.audio.set_listener_transform(entity);
    }

    /// Make the first entity tagged with `AudioListener` the listener
    pub fn activate_tagged_listener(&mut self) -> Option<Entity> {
        let entity = self.context.world.find_listener();
        self.audio.set_listener_transform(entity);
        entity
    }

    /// Shut audio down. Also happens on drop.
    pub fn shutdown(&mut self) {
        log::info!("Shutting down");
        self.audio.shutdown();
    }

    /// Shared engine state
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Shared engine state
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    /// The audio subsystem
    pub fn audio(&self) -> &AudioSubsystem<B> {
        &self.audio
    }

    /// The audio subsystem
    pub fn audio_mut(&mut self) -> &mut AudioSubsystem<B> {
        &mut self.audio
    }
}
