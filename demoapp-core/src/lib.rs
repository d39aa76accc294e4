#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! demoapp core - summation kernels behind the `doOps` native call
//!
//! This crate holds the pure arithmetic: the loop the host calls, the
//! accumulator widths it can run in, and a few variants that report
//! overflow instead of wrapping. It has no I/O and the summation kernels
//! do not allocate.
//!
//! With the `std` feature it also provides fuzzy connectedness
//! segmentation, used to estimate a segmented volume from image slices.

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

pub mod error;
#[cfg(any(feature = "std", test))]
pub mod fuzzy;
pub mod parsing;
pub mod sum;
pub mod traits;

pub use error::*;
#[cfg(any(feature = "std", test))]
pub use fuzzy::{
    alpha_cut_volume, AffinityStats, ConnectednessMap, FuzzyConnectedness, GrayImage, Roi,
};
pub use parsing::{parse_ops, parse_range};
pub use sum::*;
pub use traits::*;
