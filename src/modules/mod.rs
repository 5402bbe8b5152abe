//! Modules layer - Infrastructure components behind the feature repositories
//!
//! Contains the storage backends the features persist through.

pub mod storage;
