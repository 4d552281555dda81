//! Station name resolution.
//!
//! Provides iRail id → display name mapping, seeded from the persisted
//! cache and refreshed from the iRail station list, plus the fixed name
//! table older firmware relies on.

mod directory;
mod legacy;

pub use directory::StationDirectory;
pub use legacy::legacy_station_id;
