//! `geokit` is a modular toolkit of readers, writers and grid algorithms for
//! geoscience data
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use geokit_core as core;

#[doc(inline)]
pub use geokit_utils as utils;

#[cfg(feature = "filters")]
#[cfg_attr(docsrs, doc(cfg(feature = "filters")))]
#[doc(inline)]
pub use geokit_filters as filters;

#[cfg(feature = "grids")]
#[cfg_attr(docsrs, doc(cfg(feature = "grids")))]
#[doc(inline)]
pub use geokit_grids as grids;

#[cfg(feature = "readers")]
#[cfg_attr(docsrs, doc(cfg(feature = "readers")))]
#[doc(inline)]
pub use geokit_readers as readers;

#[cfg(feature = "ubc")]
#[cfg_attr(docsrs, doc(cfg(feature = "ubc")))]
#[doc(inline)]
pub use geokit_ubc as ubc;
