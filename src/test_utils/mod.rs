//! Test support utilities, compiled for tests or with the `test-utils`
//! feature.

pub mod mocks;
