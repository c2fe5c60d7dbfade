//! # orbit-core
//!
//! Engine library for the orbit generative sequencer. Provides Euclidean
//! rhythm generation, scale mapping, step sequencers with ten stepping modes,
//! a shared transport, LFO and envelope modulation routing, and per-sequencer
//! arpeggiators. Independent of any UI or audio framework.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orbit_core::config::Config;
//! use orbit_core::engine::Engine;
//! use orbit_core::output::LogSink;
//! use orbit_types::{EngineCommand, SequencerAction};
//!
//! // 1. Create an engine with defaults from config
//! let config = Config::load();
//! let mut engine = Engine::from_config(&config);
//! let mut sink = LogSink;
//!
//! // 2. Add sequencers and edit them through commands
//! let id = engine.add_sequencer()?;
//! engine.apply(EngineCommand::Sequencer(id, SequencerAction::SetPulseCount(5)), 0.0, &mut sink)?;
//!
//! // 3. Start the transport and call tick once per frame
//! engine.start(now);
//! let feedback = engine.tick(now, &mut sink);
//! ```
//!
//! ## Module Overview
//!
//! - [`rhythm`] - Euclidean pulse distribution and rotation
//! - [`scale`] - Per-slot pitch tables
//! - [`sequencer`] - `StepSequencer` and the stepping modes
//! - [`transport`] - Master clock and the per-beat advance
//! - [`modulation`] - LFOs, envelopes and the router that binds them to parameters
//! - [`arpeggiator`] - Per-sequencer arpeggiator
//! - [`scheduler`] - Pending note-offs
//! - [`output`] - `NoteSink` and the MIDI backend
//! - [`engine`] - `Engine`, the context that ties everything together
//! - [`config`] - TOML configuration
//! - [`snapshot`] - JSON session files

pub mod arpeggiator;
pub mod config;
pub mod engine;
pub mod error;
pub mod modulation;
pub mod output;
pub mod rhythm;
pub mod rng;
pub mod scale;
pub mod scheduler;
pub mod sequencer;
pub mod snapshot;
pub mod transport;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use output::NoteSink;

// Re-export the shared types so callers need one dependency
pub use orbit_types;
