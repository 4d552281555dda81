//! Companion relay for a commuter train watch app.
//!
//! Fetches departures from the iRail API and delivers them to a
//! constrained device over a message transport that carries one small
//! message at a time: a count first, then one record per message, each
//! tagged with the id of the request it answers.

pub mod cache;
pub mod config;
pub mod correlation;
pub mod debounce;
pub mod domain;
pub mod format;
pub mod gateway;
pub mod irail;
pub mod protocol;
pub mod relay;
pub mod schedule;
pub mod stations;
pub mod storage;
