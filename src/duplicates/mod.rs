//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file bucketing (phase 1)
//! - Content-hash bucketing inside each size bucket (phase 2)
//! - Duplicate group management

pub mod finder;
pub mod groups;

pub use finder::{DuplicateGrouper, GrouperConfig, GrouperStats, UnreadablePolicy};
pub use groups::{
    bucket_by_hash, bucket_by_size, bucket_ordered, group_by_size, DuplicateGroup, GroupingStats,
    SizeGroup,
};
