//! Command-based control for visualizers.
//!
//! Lets UI event handlers queue actions and have a single place apply them
//! with [`Visualizer::handle_action`](crate::Visualizer::handle_action).

use crate::config::ProtocolConfig;
use crate::input::ConfigEdit;

/// Actions for controlling a visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerAction<'a> {
    /// Replace the configuration.
    Configure(ProtocolConfig),
    /// Apply a raw field edit; invalid input is ignored.
    Edit(ConfigEdit<'a>),
    /// Start the scanline from zero.
    Play,
    /// Stop the scanline and cancel pending frames.
    Pause,
    /// Rewind to zero and clear highlights.
    Reset,
    /// Drop the configuration.
    Clear,
}

impl From<ProtocolConfig> for VisualizerAction<'_> {
    fn from(config: ProtocolConfig) -> Self {
        VisualizerAction::Configure(config)
    }
}

impl<'a> From<ConfigEdit<'a>> for VisualizerAction<'a> {
    fn from(edit: ConfigEdit<'a>) -> Self {
        VisualizerAction::Edit(edit)
    }
}
