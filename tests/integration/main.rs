//! Integration tests for the hierarchical ordering and move engine

mod concurrency;
mod moves;
mod ordering;
mod persistence;
mod resolution;
mod support;
