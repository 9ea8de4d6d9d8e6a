//! Core type definitions for phantom quality control
//!
//! This module provides the fundamental types used throughout the phantomqc library:
//! - [`RawImage`] / [`CalibratedImage`]: stored and physical-unit pixel arrays
//! - [`Modality`], [`Material`], [`Workflow`]: what is being evaluated and how
//! - [`PhantomGeometry`], [`Point`], [`RadiusScale`]: phantom position and refinement
//! - [`RoiLabel`], [`MetricKind`], [`Unit`]: naming of regions and quality indices
//! - [`MetricStatus`], [`OverallStatus`]: classification outcomes

mod enums;
mod geometry;
mod image;

pub use enums::{
    Material, MetricKind, MetricStatus, Modality, OverallStatus, RoiLabel, Unit, Workflow,
};
pub use geometry::{PhantomGeometry, Point, RadiusScale};
pub use image::{CalibratedImage, RawImage};
