//! UI components.

pub mod station_overview;
