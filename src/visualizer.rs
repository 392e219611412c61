//! Animation driver: advances the scanline once per display frame.
//!
//! Provides [`Visualizer`] which owns one protocol configuration, its
//! waveform and its animation clock, and pushes [`FrameUpdate`]s to a
//! [`WaveformView`]. Also defines the [`WaveformView`] trait for renderer
//! abstraction.

use log::{debug, trace};

use crate::clock::AnimationClock;
use crate::command::VisualizerAction;
use crate::config::{AnimationSettings, Layout, ProtocolConfig};
use crate::input::ConfigEdit;
use crate::phase::{Indicator, PhaseDescriptor, classify};
use crate::render::Scale;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::Waveform;

/// Trait for abstracting whatever draws the waveform.
///
/// Implement this for your display surface (SVG document, canvas, terminal)
/// to let the visualizer drive it.
pub trait WaveformView {
    /// Draws the static waveform. Called once per configuration change.
    fn draw(&mut self, config: &ProtocolConfig, waveform: &Waveform, layout: &Layout);

    /// Moves the scanline overlay and applies highlight state. Called once per frame.
    fn update(&mut self, frame: &FrameUpdate);

    /// Removes everything drawn. Called when the configuration is cleared.
    fn clear(&mut self) {}
}

/// The current state of a visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VisualizerState {
    /// Nothing configured, nothing drawn.
    Idle,
    /// Waveform drawn, scanline not moving.
    Stopped,
    /// Scanline animating.
    Playing,
}

/// Highlight state handed to the view every frame.
///
/// At most one indicator is active; each frame replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HighlightState {
    pub active: Option<Indicator>,
    /// SPI shift register cells filled so far.
    pub latched: u8,
}

impl HighlightState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn apply(&mut self, descriptor: &PhaseDescriptor) {
        self.active = descriptor.indicator;
        self.latched = descriptor.latched;
    }

    /// Whether `indicator` should be drawn highlighted.
    pub fn is_active(&self, indicator: Indicator) -> bool {
        self.active == Some(indicator)
    }
}

/// Everything a view needs to redraw the overlay for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Abstract protocol time under the scanline.
    pub t: f32,
    /// Scanline x position in pixels, relative to the plot origin.
    pub x: f32,
    pub descriptor: PhaseDescriptor,
    pub highlight: HighlightState,
    /// The loop restarted on this frame.
    pub wrapped: bool,
}

/// Token for the next scheduled frame.
///
/// Pausing cancels every outstanding handle; ticking with a cancelled
/// handle does nothing and reports [`VisualizerError::Cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHandle {
    generation: u32,
}

/// Errors that can occur during visualizer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VisualizerError {
    /// Operation called from an invalid state.
    #[error("invalid state: expected {expected}, but visualizer is in {actual:?}")]
    InvalidState {
        /// Human-readable description of expected state(s)
        expected: &'static str,
        /// The actual current state
        actual: VisualizerState,
    },
    /// No protocol is configured.
    #[error("no protocol configured")]
    NotConfigured,
    /// The frame handle was cancelled by pause or clear.
    #[error("frame handle was cancelled")]
    Cancelled,
}

struct Loaded {
    config: ProtocolConfig,
    waveform: Waveform,
    layout: Layout,
    scale: Scale,
}

/// Drives one protocol waveform view through its animation loop.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `V` - View implementation type
/// * `T` - Time source implementation type
pub struct Visualizer<'t, I: TimeInstant, V: WaveformView, T: TimeSource<I>> {
    view: V,
    time_source: &'t T,
    state: VisualizerState,
    loaded: Option<Loaded>,
    clock: AnimationClock<I>,
    settings: Option<AnimationSettings>,
    layout: Option<Layout>,
    highlight: HighlightState,
    generation: u32,
}

impl<'t, I: TimeInstant, V: WaveformView, T: TimeSource<I>> Visualizer<'t, I, V, T> {
    /// Creates an idle visualizer.
    pub fn new(view: V, time_source: &'t T) -> Self {
        Self {
            view,
            time_source,
            state: VisualizerState::Idle,
            loaded: None,
            clock: AnimationClock::new(I::Duration::ZERO),
            settings: None,
            layout: None,
            highlight: HighlightState::default(),
            generation: 0,
        }
    }

    /// Overrides the per-protocol loop duration.
    pub fn with_settings(mut self, settings: AnimationSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Overrides the per-protocol layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Handles an action by dispatching to the matching method.
    ///
    /// # Returns
    /// * `Ok(Some(handle))` - Playback started; tick with this handle every frame
    /// * `Ok(None)` - Action applied, nothing to schedule
    /// * `Err` - Operation failed (invalid state, etc.)
    pub fn handle_action(
        &mut self,
        action: VisualizerAction<'_>,
    ) -> Result<Option<FrameHandle>, VisualizerError> {
        match action {
            VisualizerAction::Configure(config) => {
                self.configure(config);
                Ok(None)
            }
            VisualizerAction::Edit(edit) => {
                self.edit(&edit)?;
                Ok(None)
            }
            VisualizerAction::Play => self.play().map(Some),
            VisualizerAction::Pause => {
                self.pause()?;
                Ok(None)
            }
            VisualizerAction::Reset => {
                self.reset()?;
                Ok(None)
            }
            VisualizerAction::Clear => {
                self.clear();
                Ok(None)
            }
        }
    }

    /// Loads a configuration. Can be called from any state.
    ///
    /// Regenerates and redraws the waveform and restarts the loop from zero.
    /// A playing visualizer keeps playing; outstanding frame handles stay valid.
    pub fn configure(&mut self, config: ProtocolConfig) {
        let kind = config.kind();
        let waveform = config.waveform();
        let layout = self.layout.unwrap_or_else(|| Layout::for_protocol(kind));
        let scale = Scale::new(&layout, waveform.total_time);
        let settings = self
            .settings
            .unwrap_or_else(|| AnimationSettings::for_protocol(kind));

        debug!("configured {:?}", config);

        self.view.draw(&config, &waveform, &layout);
        self.loaded = Some(Loaded {
            config,
            waveform,
            layout,
            scale,
        });

        self.clock
            .set_duration(I::Duration::from_millis(settings.duration_ms));
        self.clock.reset();
        self.highlight.clear();

        if self.state == VisualizerState::Idle {
            self.state = VisualizerState::Stopped;
        }
    }

    /// Applies a user edit to the current configuration.
    ///
    /// Invalid input is ignored and the previous configuration stays in
    /// effect.
    ///
    /// # Returns
    /// * `Ok(true)` - The edit was valid and the waveform was regenerated
    /// * `Ok(false)` - The edit was rejected
    /// * `Err(NotConfigured)` - There is nothing to edit
    pub fn edit(&mut self, edit: &ConfigEdit<'_>) -> Result<bool, VisualizerError> {
        let current = self
            .loaded
            .as_ref()
            .map(|l| l.config)
            .ok_or(VisualizerError::NotConfigured)?;

        match current.apply(edit) {
            Ok(updated) => {
                self.configure(updated);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Starts the scanline from t = 0.
    ///
    /// Must be called from `Stopped` state. Playback never resumes from
    /// where it was paused.
    ///
    /// # Returns
    /// * `Ok(handle)` - Tick with this handle on every display frame
    /// * `Err` - Invalid state or nothing configured
    pub fn play(&mut self) -> Result<FrameHandle, VisualizerError> {
        match self.state {
            VisualizerState::Stopped => {}
            VisualizerState::Idle => return Err(VisualizerError::NotConfigured),
            VisualizerState::Playing => {
                return Err(VisualizerError::InvalidState {
                    expected: "Stopped",
                    actual: self.state,
                });
            }
        }

        self.clock.reset();
        self.generation = self.generation.wrapping_add(1);
        self.state = VisualizerState::Playing;
        debug!("playing (frame generation {})", self.generation);

        Ok(FrameHandle {
            generation: self.generation,
        })
    }

    /// Stops the scanline and cancels every outstanding frame handle.
    ///
    /// Must be called from `Playing` state.
    pub fn pause(&mut self) -> Result<(), VisualizerError> {
        if self.state != VisualizerState::Playing {
            return Err(VisualizerError::InvalidState {
                expected: "Playing",
                actual: self.state,
            });
        }

        self.generation = self.generation.wrapping_add(1);
        self.clock.reset();
        self.state = VisualizerState::Stopped;
        debug!("paused");
        Ok(())
    }

    /// Plays when stopped, pauses when playing.
    pub fn toggle(&mut self) -> Result<Option<FrameHandle>, VisualizerError> {
        match self.state {
            VisualizerState::Playing => self.pause().map(|_| None),
            _ => self.play().map(Some),
        }
    }

    /// Rewinds the scanline to t = 0 and clears highlights.
    ///
    /// Can be called from `Stopped` or `Playing`; playback continues.
    pub fn reset(&mut self) -> Result<(), VisualizerError> {
        if self.loaded.is_none() {
            return Err(VisualizerError::NotConfigured);
        }

        self.clock.reset();
        self.highlight.clear();
        let frame = self.frame_at(0.0, false)?;
        self.view.update(&frame);
        Ok(())
    }

    /// Advances one display frame.
    ///
    /// # Returns
    /// * `Ok(update)` - The update that was pushed to the view
    /// * `Err(Cancelled)` - The handle was cancelled; nothing was done
    pub fn tick(&mut self, handle: &FrameHandle) -> Result<FrameUpdate, VisualizerError> {
        if handle.generation != self.generation || self.state != VisualizerState::Playing {
            return Err(VisualizerError::Cancelled);
        }

        let now = self.time_source.now();
        let tick = self.clock.tick(now);
        if tick.wrapped {
            trace!("animation loop wrapped");
            self.highlight.clear();
        }

        let total = self
            .loaded
            .as_ref()
            .map(|l| l.waveform.total_time)
            .ok_or(VisualizerError::NotConfigured)?;
        let t = self.clock.abstract_time(total);

        let frame = self.frame_at(t, tick.wrapped)?;
        self.view.update(&frame);
        Ok(frame)
    }

    /// Clears the configuration and cancels playback. Can be called from any state.
    pub fn clear(&mut self) {
        self.loaded = None;
        self.generation = self.generation.wrapping_add(1);
        self.clock.reset();
        self.highlight.clear();
        self.state = VisualizerState::Idle;
        self.view.clear();
    }

    fn frame_at(&mut self, t: f32, wrapped: bool) -> Result<FrameUpdate, VisualizerError> {
        let loaded = self.loaded.as_ref().ok_or(VisualizerError::NotConfigured)?;
        let descriptor = classify(&loaded.config, t);
        self.highlight.apply(&descriptor);

        Ok(FrameUpdate {
            t,
            x: loaded.scale.x(t),
            descriptor,
            highlight: self.highlight,
            wrapped,
        })
    }

    /// Returns the current state of the visualizer.
    pub fn state(&self) -> VisualizerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == VisualizerState::Playing
    }

    /// Returns the loaded configuration, if any.
    pub fn config(&self) -> Option<&ProtocolConfig> {
        self.loaded.as_ref().map(|l| &l.config)
    }

    /// Returns the waveform currently drawn, if any.
    pub fn waveform(&self) -> Option<&Waveform> {
        self.loaded.as_ref().map(|l| &l.waveform)
    }

    /// Returns the layout in use, if configured.
    pub fn layout(&self) -> Option<&Layout> {
        self.loaded.as_ref().map(|l| &l.layout)
    }

    pub fn highlight(&self) -> HighlightState {
        self.highlight
    }

    /// Elapsed time within the current loop as of the last tick.
    pub fn elapsed_time(&self) -> I::Duration {
        self.clock.elapsed()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpiConfig, UartConfig};
    use crate::phase::Phase;
    use core::cell::Cell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Ms(u64);

    impl TimeDuration for Ms {
        const ZERO: Self = Ms(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            Ms(millis)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct At(u64);

    impl TimeInstant for At {
        type Duration = Ms;

        fn duration_since(&self, earlier: Self) -> Ms {
            Ms(self.0.saturating_sub(earlier.0))
        }
    }

    struct Timer(Cell<u64>);

    impl Timer {
        fn advance(&self, ms: u64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl TimeSource<At> for Timer {
        fn now(&self) -> At {
            At(self.0.get())
        }
    }

    #[derive(Default)]
    struct CountingView {
        draws: usize,
        updates: usize,
    }

    impl WaveformView for CountingView {
        fn draw(&mut self, _config: &ProtocolConfig, _waveform: &Waveform, _layout: &Layout) {
            self.draws += 1;
        }

        fn update(&mut self, _frame: &FrameUpdate) {
            self.updates += 1;
        }
    }

    #[test]
    fn play_requires_configuration() {
        let timer = Timer(Cell::new(0));
        let mut vis = Visualizer::<At, _, _>::new(CountingView::default(), &timer);
        assert_eq!(vis.play(), Err(VisualizerError::NotConfigured));
    }

    #[test]
    fn tick_maps_elapsed_to_protocol_time() {
        let timer = Timer(Cell::new(0));
        let mut vis = Visualizer::<At, _, _>::new(CountingView::default(), &timer);
        vis.configure(ProtocolConfig::Uart(UartConfig::default()));
        let handle = vis.play().unwrap();

        vis.tick(&handle).unwrap();
        timer.advance(1500); // 1500 / 6000 * 12 = 3.0
        let frame = vis.tick(&handle).unwrap();

        assert_eq!(frame.t, 3.0);
        assert_eq!(frame.descriptor.phase, Phase::DataBit(1));
        assert_eq!(vis.view().updates, 2);
    }

    #[test]
    fn pause_cancels_handle_without_touching_view() {
        let timer = Timer(Cell::new(0));
        let mut vis = Visualizer::<At, _, _>::new(CountingView::default(), &timer);
        vis.configure(ProtocolConfig::Spi(SpiConfig::default()));
        let handle = vis.play().unwrap();
        vis.tick(&handle).unwrap();

        vis.pause().unwrap();
        assert_eq!(vis.tick(&handle), Err(VisualizerError::Cancelled));
        assert_eq!(vis.view().updates, 1);
    }

    #[test]
    fn configure_redraws_every_time() {
        let timer = Timer(Cell::new(0));
        let mut vis = Visualizer::<At, _, _>::new(CountingView::default(), &timer);
        vis.configure(ProtocolConfig::Spi(SpiConfig::default()));
        vis.configure(ProtocolConfig::Uart(UartConfig::default()));
        assert_eq!(vis.view().draws, 2);
        assert_eq!(vis.state(), VisualizerState::Stopped);
    }

    #[test]
    fn layout_and_settings_override_protocol_defaults() {
        let timer = Timer(Cell::new(0));
        let layout = Layout::default().with_width(400.0);
        let mut vis = Visualizer::<At, _, _>::new(CountingView::default(), &timer)
            .with_layout(layout)
            .with_settings(AnimationSettings { duration_ms: 1000 });
        vis.configure(ProtocolConfig::Spi(SpiConfig::default()));
        assert_eq!(vis.layout(), Some(&layout));

        let handle = vis.play().unwrap();
        vis.tick(&handle).unwrap();
        timer.advance(500);
        let frame = vis.tick(&handle).unwrap();
        assert_eq!(vis.elapsed_time(), Ms(500));
        assert_eq!(frame.t, 10.0);
        assert_eq!(frame.x, layout.inner_width() / 2.0);

        vis.view_mut().updates = 0;
        vis.reset().unwrap();
        assert_eq!(vis.elapsed_time(), Ms(0));
        assert_eq!(vis.view().updates, 1);
    }
}
