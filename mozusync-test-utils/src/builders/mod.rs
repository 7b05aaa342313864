//! Builders for on-disk test fixtures

mod project;

pub use project::TestProjectBuilder;
