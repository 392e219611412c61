//! Signal data model shared by the protocol builders and renderers.

use heapless::Vec;
use palette::Srgb;

/// Maximum number of points a single line's timeline can hold.
///
/// The busiest line is I2C SCL: one rise and one fall per bit slot, two
/// points each, across 18 slots plus START/STOP framing.
pub const TIMELINE_CAPACITY: usize = 96;

/// Maximum number of signal lines in a waveform (SPI draws CS, SCLK, MOSI).
pub const MAX_LINES: usize = 3;

/// Maximum number of static annotations drawn over a waveform.
pub const MAX_ANNOTATIONS: usize = 24;

/// Logic level of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Level for the least significant bit of `bit`.
    #[inline]
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 { Level::High } else { Level::Low }
    }

    #[inline]
    pub fn as_bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// A single point on a line: the level the line has at `time`.
///
/// Two consecutive points sharing a `time` with different levels encode an
/// instantaneous edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionPoint {
    pub time: f32,
    pub level: Level,
}

impl TransitionPoint {
    #[inline]
    pub const fn new(time: f32, level: Level) -> Self {
        Self { time, level }
    }
}

/// An edge found in a timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub time: f32,
    pub from: Level,
    pub to: Level,
}

impl Edge {
    pub fn is_rising(&self) -> bool {
        self.from == Level::Low && self.to == Level::High
    }

    pub fn is_falling(&self) -> bool {
        self.from == Level::High && self.to == Level::Low
    }
}

/// Timeline construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimelineError {
    /// The timeline is full.
    #[error("timeline capacity exceeded")]
    CapacityExceeded,

    /// A point was added before the last point in time.
    #[error("transition points must be in non-decreasing time order")]
    NonMonotonic,
}

/// Ordered transition points for one logical signal line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    points: Vec<TransitionPoint, TIMELINE_CAPACITY>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a timeline that starts at `level` at time zero.
    pub fn starting_at(level: Level) -> Self {
        let mut timeline = Self::new();
        // An empty timeline always accepts its first point.
        let _ = timeline.points.push(TransitionPoint::new(0.0, level));
        timeline
    }

    /// Appends a raw point.
    ///
    /// # Errors
    /// * `NonMonotonic` - `point.time` is earlier than the last point
    /// * `CapacityExceeded` - the timeline is full
    pub fn push(&mut self, point: TransitionPoint) -> Result<(), TimelineError> {
        if let Some(last) = self.points.last() {
            if point.time < last.time {
                return Err(TimelineError::NonMonotonic);
            }
        }
        self.points
            .push(point)
            .map_err(|_| TimelineError::CapacityExceeded)
    }

    /// Drives the line to `level` at `time`.
    ///
    /// Appends a point holding the previous level at `time` followed by the
    /// new level, so the segment before `time` stays flat and the change is
    /// a vertical edge. Setting the level the line already has is a no-op.
    pub fn set_level(&mut self, time: f32, level: Level) -> Result<(), TimelineError> {
        let Some(last) = self.points.last().copied() else {
            return self.push(TransitionPoint::new(time, level));
        };

        if last.level == level {
            return Ok(());
        }

        if last.time != time {
            self.push(TransitionPoint::new(time, last.level))?;
        }
        self.push(TransitionPoint::new(time, level))
    }

    /// Extends the last level flat until `time`.
    pub fn hold_until(&mut self, time: f32) -> Result<(), TimelineError> {
        match self.points.last().copied() {
            Some(last) if last.time < time => self.push(TransitionPoint::new(time, last.level)),
            Some(_) => Ok(()),
            None => Err(TimelineError::NonMonotonic),
        }
    }

    /// Level of the line at `time` using step-after semantics.
    ///
    /// When several points share `time`, the last one wins, so an edge at
    /// `time` is already visible at `time`. Before the first point the
    /// first point's level is reported.
    pub fn level_at(&self, time: f32) -> Level {
        self.points
            .iter()
            .rev()
            .find(|p| p.time <= time)
            .or_else(|| self.points.first())
            .map(|p| p.level)
            .unwrap_or(Level::Low)
    }

    /// Iterates over every level change, in time order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.points.windows(2).filter_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            (a.level != b.level).then_some(Edge {
                time: b.time,
                from: a.level,
                to: b.level,
            })
        })
    }

    pub fn points(&self) -> &[TransitionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the last point, or zero for an empty timeline.
    pub fn end_time(&self) -> f32 {
        self.points.last().map(|p| p.time).unwrap_or(0.0)
    }
}

/// A named line and its timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalLine {
    pub name: &'static str,
    pub color: Srgb<u8>,
    pub timeline: Timeline,
}

/// What a static annotation marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnnotationKind {
    /// I2C START condition (SDA falls while SCL is high).
    StartCondition,
    /// I2C STOP condition (SDA rises while SCL is high).
    StopCondition,
    /// Receiver acknowledge slot.
    Ack,
    /// SPI capture edge `k` (k = 0 samples the MSB).
    SampleEdge(u8),
    /// Bit value printed at the centre of a bit cell.
    BitValue { index: u8, value: u8 },
    /// UART start bit label.
    StartBit,
    /// UART stop bit label.
    StopBit,
    /// Vertical bit boundary.
    Divider,
}

/// An annotation drawn at `time` on lane `lane`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub time: f32,
    pub lane: usize,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub const fn new(time: f32, lane: usize, kind: AnnotationKind) -> Self {
        Self { time, lane, kind }
    }
}

/// Everything needed to draw one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// End of the abstract time window, starting at zero.
    pub total_time: f32,
    pub lines: Vec<SignalLine, MAX_LINES>,
    pub annotations: Vec<Annotation, MAX_ANNOTATIONS>,
}

impl Waveform {
    pub fn new(total_time: f32) -> Self {
        Self {
            total_time,
            lines: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Looks up a line by name.
    pub fn line(&self, name: &str) -> Option<&SignalLine> {
        self.lines.iter().find(|l| l.name == name)
    }

    /// Timeline of the named line.
    pub fn timeline(&self, name: &str) -> Option<&Timeline> {
        self.line(name).map(|l| &l.timeline)
    }

    pub fn annotations_of(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.iter().filter(move |a| a.kind == kind)
    }

    pub(crate) fn add_line(&mut self, name: &'static str, color: Srgb<u8>, timeline: Timeline) {
        if self.lines.push(SignalLine { name, color, timeline }).is_err() {
            panic!("waveform line capacity exceeded");
        }
    }

    pub(crate) fn annotate(&mut self, time: f32, lane: usize, kind: AnnotationKind) {
        if self.annotations.push(Annotation::new(time, lane, kind)).is_err() {
            panic!("waveform annotation capacity exceeded");
        }
    }
}

/// Builder-side wrapper that turns timeline capacity errors into panics.
///
/// Protocol builders are sized so that neither error can happen; a panic
/// here is a bug in a builder, not a runtime condition.
pub(crate) struct LineWriter {
    timeline: Timeline,
}

impl LineWriter {
    pub(crate) fn new(idle: Level) -> Self {
        Self {
            timeline: Timeline::starting_at(idle),
        }
    }

    pub(crate) fn set(&mut self, time: f32, level: Level) -> &mut Self {
        if let Err(e) = self.timeline.set_level(time, level) {
            panic!("{}", e);
        }
        self
    }

    pub(crate) fn finish(mut self, end: f32) -> Timeline {
        if let Err(e) = self.timeline.hold_until(end) {
            panic!("{}", e);
        }
        self.timeline
    }
}
