//! SkyLens - live aircraft over your head and on your map
//!
//! This library ingests aircraft state vectors from a polling telemetry
//! source, projects them into a 2-D map frame and a 3-D observer-centric
//! sky frame, dead-reckons between polls, assembles tiled basemap
//! mosaics, and solves the rigid alignment between observed sightlines
//! and known landmarks.
//!
//! The pieces, leaves first:
//!
//! - [`coord`] - pure geospatial projections (Web Mercator, slippy
//!   tiles, sky-frame transform)
//! - [`map`] - per-map planar frames and the map registry
//! - [`mosaic`] - tile-grid mosaic assembly
//! - [`track`] - per-aircraft freshness and dead reckoning
//! - [`align`] - simulated-annealing frame alignment
//! - [`fetch`] - the blocking HTTP seam all workers share
//! - [`config`] - configuration documents
//! - [`pipeline`] - background workers and the single-consumer
//!   event dispatcher that owns all domain state

pub mod align;
pub mod config;
pub mod coord;
pub mod fetch;
pub mod map;
pub mod mosaic;
pub mod pipeline;
pub mod track;
