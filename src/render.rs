//! SVG rendering of waveforms, annotations and the scanline overlay.
//!
//! Everything is written into a [`core::fmt::Write`] sink so rendering works
//! with a `heapless::String` on targets without an allocator. The `std`
//! feature adds [`SvgView`], a [`WaveformView`](crate::WaveformView) that
//! keeps the latest documents in `String`s.

use core::fmt::{self, Write};

use palette::Srgb;

use crate::colors::{self, write_hex};
use crate::config::Layout;
use crate::phase::{Indicator, IndicatorCell};
use crate::types::{AnnotationKind, Level, SignalLine, Waveform};
use crate::visualizer::FrameUpdate;

/// Maps abstract time and logic levels to plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    total_time: f32,
    inner_width: f32,
    lane_height: f32,
    lane_gap: f32,
    level_padding: f32,
}

impl Scale {
    pub fn new(layout: &Layout, total_time: f32) -> Self {
        Self {
            total_time,
            inner_width: layout.inner_width(),
            lane_height: layout.lane_height,
            lane_gap: layout.lane_gap,
            level_padding: layout.level_padding,
        }
    }

    /// X position of abstract time `t`.
    pub fn x(&self, t: f32) -> f32 {
        if self.total_time <= 0.0 {
            return 0.0;
        }
        t / self.total_time * self.inner_width
    }

    /// Y position of the low level of `lane`.
    pub fn baseline(&self, lane: usize) -> f32 {
        lane as f32 * (self.lane_height + self.lane_gap) + self.lane_height
    }

    /// Y position of a fractional level (0.0 low, 1.0 high) on `lane`.
    pub fn y_at(&self, lane: usize, value: f32) -> f32 {
        self.baseline(lane) - value * (self.lane_height - self.level_padding)
    }

    pub fn y(&self, lane: usize, level: Level) -> f32 {
        self.y_at(lane, level.as_bit() as f32)
    }
}

const CELL_WIDTH: f32 = 28.0;
const CELL_HEIGHT: f32 = 36.0;
const CELL_GAP: f32 = 4.0;
const CELL_IDLE: &str = "#f1f5f9";

/// Writes waveforms and overlays as SVG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgRenderer {
    layout: Layout,
    scale: Scale,
}

impl SvgRenderer {
    pub fn new(layout: Layout, total_time: f32) -> Self {
        Self {
            scale: Scale::new(&layout, total_time),
            layout,
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Writes a complete SVG document for `waveform` with the overlay at t = 0.
    pub fn render_waveform<W: Write>(&self, w: &mut W, waveform: &Waveform) -> fmt::Result {
        let l = &self.layout;
        write!(
            w,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w_}" height="{h}" viewBox="0 0 {w_} {h}">"#,
            w_ = l.width,
            h = l.height
        )?;
        write!(
            w,
            r#"<g transform="translate({},{})">"#,
            l.margin_left, l.margin_top
        )?;

        // Condition shading goes under the traces.
        for a in &waveform.annotations {
            match a.kind {
                AnnotationKind::StartCondition => self.condition_region(w, a.time, colors::AMBER)?,
                AnnotationKind::StopCondition => {
                    self.condition_region(w, a.time, colors::SCAN_RED)?
                }
                _ => {}
            }
        }

        for (lane, line) in waveform.lines.iter().enumerate() {
            self.line(w, lane, line)?;
        }

        for a in &waveform.annotations {
            match a.kind {
                AnnotationKind::StartCondition => {
                    self.condition_marker(w, a.time, a.lane, "START", colors::AMBER)?
                }
                AnnotationKind::StopCondition => {
                    self.condition_marker(w, a.time, a.lane, "STOP", colors::SCAN_RED)?
                }
                AnnotationKind::Ack => self.ack(w, a.time)?,
                AnnotationKind::SampleEdge(k) => {
                    let level = waveform
                        .lines
                        .get(a.lane)
                        .map(|line| line.timeline.level_at(a.time))
                        .unwrap_or(Level::High);
                    self.sample_edge(w, a.time, a.lane, k, level, false)?;
                }
                AnnotationKind::BitValue { index, value } => {
                    self.bit_value(w, a.time, a.lane, index, value)?
                }
                AnnotationKind::StartBit => self.caption(w, a.time, "Start", colors::AMBER)?,
                AnnotationKind::StopBit => self.caption(w, a.time, "Stop", colors::SCAN_RED)?,
                AnnotationKind::Divider => self.divider(w, a.time)?,
            }
        }

        // Scanline parked at t = 0 until the first frame replaces the group.
        w.write_str(r#"<g id="scan-overlay"><g id="scan-group" transform="translate(0,0)">"#)?;
        self.scan_line(w, colors::SCAN_RED)?;
        w.write_str("</g></g></g></svg>")
    }

    /// Writes the scanline group for one frame.
    ///
    /// The group is positioned in plot coordinates; hosts place it inside
    /// the `scan-overlay` group of the document.
    pub fn render_overlay<W: Write>(
        &self,
        w: &mut W,
        waveform: &Waveform,
        frame: &FrameUpdate,
    ) -> fmt::Result {
        let d = &frame.descriptor;
        write!(w, r#"<g id="scan-group" transform="translate({:.2},0)""#, frame.x)?;
        if let Some(active) = frame.highlight.active {
            write!(w, r#" data-active="{}""#, active.dom_id())?;
        }
        write!(w, r#" data-latched="{}">"#, frame.highlight.latched)?;

        self.scan_line(w, if d.sampling { colors::INK } else { colors::SCAN_RED })?;

        let label_width = self.layout.label_width(d.label.len());
        write!(
            w,
            r#"<rect class="scan-label-bg" x="{:.1}" y="-30" width="{:.1}" height="22" rx="4" fill=""#,
            -label_width / 2.0,
            label_width
        )?;
        write_hex(w, d.color)?;
        w.write_str(r#""/>"#)?;
        write!(
            w,
            r#"<text class="scan-label-text" y="-15" text-anchor="middle" fill="white" font-size="11px" font-family="monospace" font-weight="bold">{}</text>"#,
            d.label
        )?;
        w.write_str("</g>")?;

        // The flashing capture circle sits at the edge, not under the scanline.
        if let Some(Indicator::ShiftCell(k)) = frame.highlight.active {
            let edge = waveform
                .annotations
                .iter()
                .find(|a| a.kind == AnnotationKind::SampleEdge(k));
            if let Some(a) = edge {
                let level = waveform
                    .lines
                    .get(a.lane)
                    .map(|line| line.timeline.level_at(a.time))
                    .unwrap_or(Level::High);
                self.sample_edge(w, a.time, a.lane, k, level, true)?;
            }
        }
        Ok(())
    }

    /// Writes the indicator strip as its own SVG document.
    ///
    /// Highlighted cells are filled with their color. SPI shift register
    /// cells fill in as they latch and show their value only once latched.
    pub fn render_indicators<W: Write>(
        &self,
        w: &mut W,
        cells: &[IndicatorCell],
        frame: Option<&FrameUpdate>,
    ) -> fmt::Result {
        let width = cells.len() as f32 * (CELL_WIDTH + CELL_GAP);
        write!(
            w,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}">"#,
            width,
            CELL_HEIGHT + 8.0
        )?;

        let latched = frame.map(|f| f.highlight.latched).unwrap_or(0);
        for (i, cell) in cells.iter().enumerate() {
            let active = frame.is_some_and(|f| f.highlight.is_active(cell.indicator));
            let shift_cell = match cell.indicator {
                Indicator::ShiftCell(k) => Some(k),
                _ => None,
            };
            let filled = active || shift_cell.is_some_and(|k| k < latched);
            let show_value = shift_cell.is_none_or(|k| k < latched);

            let x = i as f32 * (CELL_WIDTH + CELL_GAP);
            write!(
                w,
                r#"<g id="{}" class="bit-indicator{}" transform="translate({:.1},4)">"#,
                cell.indicator.dom_id(),
                if active { " active" } else { "" },
                x
            )?;
            write!(
                w,
                r#"<rect width="{}" height="{}" rx="4" fill=""#,
                CELL_WIDTH, CELL_HEIGHT
            )?;
            if filled {
                write_hex(w, cell.color)?;
            } else {
                w.write_str(CELL_IDLE)?;
            }
            w.write_str(r#"" stroke=""#)?;
            write_hex(w, colors::GRID)?;
            w.write_str(r#""/>"#)?;

            let text_fill = if filled { "white" } else { "#94a3b8" };
            write!(
                w,
                r#"<text x="{:.1}" y="11" text-anchor="middle" font-size="9px" fill="{}">{}</text>"#,
                CELL_WIDTH / 2.0,
                text_fill,
                cell.caption
            )?;
            if let (Some(value), true) = (cell.value, show_value) {
                write!(
                    w,
                    r#"<text x="{:.1}" y="28" text-anchor="middle" font-size="12px" font-family="monospace" font-weight="bold" fill="{}">{}</text>"#,
                    CELL_WIDTH / 2.0,
                    text_fill,
                    value
                )?;
            }
            w.write_str("</g>")?;
        }
        w.write_str("</svg>")
    }

    fn scan_line<W: Write>(&self, w: &mut W, color: Srgb<u8>) -> fmt::Result {
        write!(
            w,
            r#"<line class="scan-line" x1="0" x2="0" y1="-20" y2="{}" stroke=""#,
            self.layout.height
        )?;
        write_hex(w, color)?;
        w.write_str(r#"" stroke-width="2" stroke-dasharray="5,2"/>"#)
    }

    fn line<W: Write>(&self, w: &mut W, lane: usize, line: &SignalLine) -> fmt::Result {
        let s = &self.scale;
        write!(
            w,
            r#"<text x="-10" y="{:.1}" text-anchor="end" dominant-baseline="middle" font-family="monospace" font-weight="bold">{}</text>"#,
            s.y_at(lane, 0.5),
            line.name
        )?;

        for level in [Level::Low, Level::High] {
            write!(
                w,
                r#"<line x1="0" x2="{:.1}" y1="{y:.1}" y2="{y:.1}" stroke=""#,
                self.layout.inner_width(),
                y = s.y(lane, level)
            )?;
            write_hex(w, colors::GRID)?;
            w.write_str(r#"" stroke-dasharray="4"/>"#)?;
        }

        write!(w, r#"<path class="trace" data-line="{}" d=""#, line.name)?;
        for (i, p) in line.timeline.points().iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            write!(w, "{}{:.2},{:.2}", cmd, s.x(p.time), s.y(lane, p.level))?;
        }
        w.write_str(r#"" fill="none" stroke=""#)?;
        write_hex(w, line.color)?;
        w.write_str(r#"" stroke-width="2.5"/>"#)
    }

    fn condition_region<W: Write>(&self, w: &mut W, t: f32, color: Srgb<u8>) -> fmt::Result {
        let s = &self.scale;
        write!(
            w,
            r#"<rect class="condition-region" x="{:.1}" y="-30" width="{:.1}" height="{:.1}" rx="6" fill=""#,
            s.x(t - 0.6),
            s.x(1.2) - s.x(0.0),
            self.layout.height + 30.0
        )?;
        write_hex(w, color)?;
        w.write_str(r#"" fill-opacity="0.1"/>"#)
    }

    fn condition_marker<W: Write>(
        &self,
        w: &mut W,
        t: f32,
        lane: usize,
        text: &str,
        color: Srgb<u8>,
    ) -> fmt::Result {
        let s = &self.scale;
        let x = s.x(t);

        write!(
            w,
            r#"<line x1="{x:.1}" x2="{x:.1}" y1="-20" y2="{:.1}" stroke-dasharray="4,3" stroke-width="1.5" opacity="0.7" stroke=""#,
            self.layout.height
        )?;
        write_hex(w, color)?;
        w.write_str(r#""/>"#)?;

        write!(
            w,
            r#"<rect x="{:.1}" y="-35" width="56" height="20" rx="10" stroke="white" stroke-width="2" fill=""#,
            x - 28.0
        )?;
        write_hex(w, color)?;
        w.write_str(r#""/>"#)?;
        write!(
            w,
            r#"<text x="{x:.1}" y="-21" text-anchor="middle" fill="white" font-size="11px" font-weight="bold">{}</text>"#,
            text
        )?;

        write!(
            w,
            r#"<circle cx="{x:.1}" cy="{:.1}" r="7" fill="white" stroke-width="2" stroke=""#,
            s.y_at(lane, 0.5)
        )?;
        write_hex(w, color)?;
        w.write_str(r#""/>"#)?;

        // The clock lane is always lane 0 for conditions.
        let y = s.y(0, Level::High) - 8.0;
        write!(
            w,
            r#"<line x1="{:.1}" x2="{:.1}" y1="{y:.1}" y2="{y:.1}" stroke-width="2" stroke=""#,
            s.x(t - 0.4),
            s.x(t + 0.4)
        )?;
        write_hex(w, color)?;
        w.write_str(r#""/>"#)?;
        write!(
            w,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="9px" font-weight="bold" fill=""#,
            y - 4.0
        )?;
        write_hex(w, color)?;
        w.write_str(r#"">SCL HIGH</text>"#)
    }

    fn ack<W: Write>(&self, w: &mut W, t: f32) -> fmt::Result {
        let x = self.scale.x(t);
        write!(
            w,
            r#"<text class="ack" x="{x:.1}" y="-10" text-anchor="middle" font-size="10px" font-weight="bold" fill=""#
        )?;
        write_hex(w, colors::EMERALD)?;
        w.write_str(r#"">ACK</text>"#)?;
        write!(
            w,
            r#"<line x1="{x:.1}" x2="{x:.1}" y1="0" y2="{:.1}" stroke-dasharray="2" stroke-opacity="0.2" stroke=""#,
            self.layout.height
        )?;
        write_hex(w, colors::EMERALD)?;
        w.write_str(r#""/>"#)
    }

    fn sample_edge<W: Write>(
        &self,
        w: &mut W,
        t: f32,
        lane: usize,
        k: u8,
        level: Level,
        flash: bool,
    ) -> fmt::Result {
        let s = &self.scale;
        let x = s.x(t);
        if flash {
            write!(
                w,
                r#"<line class="sample-guide sample-guide-{k} active" x1="{x:.1}" x2="{x:.1}" y1="-20" y2="{:.1}" stroke="rgba(220,38,38,0.4)" stroke-width="2"/>"#,
                self.layout.height
            )?;
            write!(
                w,
                r#"<circle class="sclk-circle-{k} active" cx="{x:.1}" cy="{:.1}" r="8" stroke="white" stroke-width="3" fill=""#,
                s.y(lane, level)
            )?;
        } else {
            write!(
                w,
                r#"<line class="sample-guide sample-guide-{k}" x1="{x:.1}" x2="{x:.1}" y1="-20" y2="{:.1}" stroke="rgba(0,0,0,0.05)" stroke-dasharray="2"/>"#,
                self.layout.height
            )?;
            write!(
                w,
                r#"<circle class="sclk-circle-{k}" cx="{x:.1}" cy="{:.1}" r="4" fill=""#,
                s.y(lane, level)
            )?;
        }
        write_hex(w, colors::BLUE)?;
        w.write_str(r#""/>"#)
    }

    fn bit_value<W: Write>(
        &self,
        w: &mut W,
        t: f32,
        lane: usize,
        index: u8,
        value: u8,
    ) -> fmt::Result {
        let s = &self.scale;
        let x = s.x(t);
        write!(
            w,
            r#"<text class="bit-value" x="{x:.1}" y="{:.1}" text-anchor="middle" dominant-baseline="middle" font-size="10px" font-family="monospace" font-weight="bold">{}</text>"#,
            s.y_at(lane, 0.5),
            value
        )?;
        write!(
            w,
            r#"<text class="bit-caption" x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="10px" font-weight="bold">D{}</text>"#,
            s.baseline(lane) + 14.0,
            index
        )
    }

    fn caption<W: Write>(&self, w: &mut W, t: f32, text: &str, color: Srgb<u8>) -> fmt::Result {
        write!(
            w,
            r#"<text class="bit-caption" x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10px" font-weight="bold" fill=""#,
            self.scale.x(t),
            self.scale.baseline(0) + 14.0
        )?;
        write_hex(w, color)?;
        write!(w, r#"">{}</text>"#, text)
    }

    fn divider<W: Write>(&self, w: &mut W, t: f32) -> fmt::Result {
        let x = self.scale.x(t);
        write!(
            w,
            r#"<line class="divider" x1="{x:.1}" x2="{x:.1}" y1="-10" y2="{:.1}" stroke-dasharray="2" opacity="0.5" stroke=""#,
            self.scale.baseline(0) + 10.0
        )?;
        write_hex(w, colors::DIVIDER)?;
        w.write_str(r#""/>"#)
    }
}

#[cfg(feature = "std")]
mod view {
    use std::string::String;
    use std::vec::Vec;

    use log::warn;

    use super::SvgRenderer;
    use crate::config::{Layout, ProtocolConfig};
    use crate::phase::IndicatorCell;
    use crate::types::Waveform;
    use crate::visualizer::{FrameUpdate, WaveformView};

    /// A [`WaveformView`] that keeps the latest SVG output in memory.
    #[derive(Debug, Default)]
    pub struct SvgView {
        renderer: Option<SvgRenderer>,
        waveform: Option<Waveform>,
        cells: Vec<IndicatorCell>,
        document: String,
        overlay: String,
        indicators: String,
        frames: u64,
    }

    impl SvgView {
        pub fn new() -> Self {
            Self::default()
        }

        /// Static waveform document from the last configuration.
        pub fn document(&self) -> &str {
            &self.document
        }

        /// Scanline group from the last frame.
        pub fn overlay(&self) -> &str {
            &self.overlay
        }

        /// Indicator strip from the last frame.
        pub fn indicators(&self) -> &str {
            &self.indicators
        }

        /// Frames rendered since the last configuration.
        pub fn frames(&self) -> u64 {
            self.frames
        }
    }

    impl WaveformView for SvgView {
        fn draw(&mut self, config: &ProtocolConfig, waveform: &Waveform, layout: &Layout) {
            let renderer = SvgRenderer::new(*layout, waveform.total_time);
            self.cells = config.indicator_cells().into_iter().collect();

            self.document.clear();
            if let Err(e) = renderer.render_waveform(&mut self.document, waveform) {
                warn!("failed to render waveform: {}", e);
            }
            self.indicators.clear();
            if let Err(e) = renderer.render_indicators(&mut self.indicators, &self.cells, None) {
                warn!("failed to render indicators: {}", e);
            }
            self.overlay.clear();

            self.renderer = Some(renderer);
            self.waveform = Some(waveform.clone());
            self.frames = 0;
        }

        fn update(&mut self, frame: &FrameUpdate) {
            let (Some(renderer), Some(waveform)) = (self.renderer.as_ref(), self.waveform.as_ref())
            else {
                return;
            };

            self.overlay.clear();
            if let Err(e) = renderer.render_overlay(&mut self.overlay, waveform, frame) {
                warn!("failed to render overlay: {}", e);
            }
            self.indicators.clear();
            if let Err(e) =
                renderer.render_indicators(&mut self.indicators, &self.cells, Some(frame))
            {
                warn!("failed to render indicators: {}", e);
            }
            self.frames += 1;
        }

        fn clear(&mut self) {
            *self = Self::default();
        }
    }
}

#[cfg(feature = "std")]
pub use view::SvgView;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProtocolKind, SpiConfig};
    use crate::protocol::spi;

    extern crate std;
    use std::string::String;

    #[test]
    fn scale_maps_window_to_inner_width() {
        let layout = Layout::for_protocol(ProtocolKind::Spi);
        let scale = Scale::new(&layout, 20.0);
        assert_eq!(scale.x(0.0), 0.0);
        assert_eq!(scale.x(20.0), layout.inner_width());
        assert_eq!(scale.x(10.0), layout.inner_width() / 2.0);
    }

    #[test]
    fn high_level_sits_above_low_level() {
        let scale = Scale::new(&Layout::default(), 10.0);
        assert!(scale.y(0, Level::High) < scale.y(0, Level::Low));
        assert!(scale.y(1, Level::Low) > scale.y(0, Level::Low));
    }

    #[test]
    fn waveform_document_contains_every_line() {
        let waveform = spi::waveform(&SpiConfig::default());
        let renderer =
            SvgRenderer::new(Layout::for_protocol(ProtocolKind::Spi), waveform.total_time);
        let mut out = String::new();
        renderer.render_waveform(&mut out, &waveform).unwrap();

        assert!(out.starts_with("<svg"));
        assert!(out.ends_with("</svg>"));
        for name in [spi::LINE_CS, spi::LINE_SCLK, spi::LINE_MOSI] {
            assert!(out.contains(&std::format!(r#"data-line="{}""#, name)));
        }
        assert_eq!(out.matches("sclk-circle-").count(), 8);
    }

    #[test]
    fn render_into_small_buffer_reports_error() {
        let waveform = spi::waveform(&SpiConfig::default());
        let renderer = SvgRenderer::new(Layout::default(), waveform.total_time);
        let mut out: heapless::String<64> = heapless::String::new();
        assert!(renderer.render_waveform(&mut out, &waveform).is_err());
    }
}
