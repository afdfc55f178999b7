//! Whole-document checks and corpus runs.
