//! Aircraft track engine.
//!
//! Per-aircraft state built from polled telemetry samples: freshness
//! classification, derived velocity, map- and sky-frame positions, and
//! dead-reckoning extrapolation between polls.
//!
//! # Design
//!
//! - [`StateVector`] is one parsed telemetry sample; parsing from the
//!   provider's fixed-index array lives in [`sample`].
//! - [`AircraftTrack`] holds everything known about one aircraft and is
//!   only ever mutated by the event dispatcher.
//! - [`TrackTable`] is the address-keyed collection with batch apply
//!   and per-tick extrapolation.
//! - [`Observer`] and [`Landmark`] are the fixed reference points both
//!   coordinate frames hang off.

mod aircraft;
mod observer;
mod sample;
mod table;

pub use aircraft::{AircraftTrack, Freshness};
pub use observer::{Landmark, Observer};
pub use sample::{parse_state_batch, AircraftState, AltitudeSource, StateVector};
pub use table::{TrackCounts, TrackTable};
