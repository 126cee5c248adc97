//! Random portfolio generation for load testing and scenario replay.

pub mod portfolio;
