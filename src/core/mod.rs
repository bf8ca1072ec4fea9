//! Core types shared across the pipeline and the CLI.

pub mod domain;

pub use domain::{DomainName, FilterMap, FilterValue, Row, Scalar};
