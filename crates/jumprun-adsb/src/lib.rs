//! ADS-B Exchange telemetry source
//!
//! Fetches single-aircraft records from the ADS-B Exchange RapidAPI endpoint
//! and normalizes them into telemetry snapshots.

pub mod client;
pub mod record;

pub use client::{AdsbClient, DEFAULT_BASE_URL, DEFAULT_RAPIDAPI_HOST};
pub use record::{parse_aircraft, AdsbAircraft};
