//! Limits and constraints for binding
//!
//! This module defines limits that bound the resources a single parse may
//! consume, and the chunk size the streaming binder reads input with.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_depth: usize,

    /// Maximum number of bytes consumed by one parse
    pub max_document_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,

    /// Capacity of the buffered reader used when streaming
    pub stream_chunk_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_document_size: 100 * 1024 * 1024, // 100 MB
            max_attributes: 1000,
            stream_chunk_size: 16 * 1024,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_document_size: 10 * 1024 * 1024, // 10 MB
            max_attributes: 100,
            stream_chunk_size: 4 * 1024,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 10000,
            max_document_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 10000,
            stream_chunk_size: 64 * 1024,
        }
    }

    /// Set the streaming chunk size
    pub fn with_stream_chunk_size(mut self, size: usize) -> Self {
        self.stream_chunk_size = size.max(1);
        self
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        within("element depth", depth, self.max_depth)
    }

    /// Check if the number of consumed bytes is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        within("document size in bytes", size, self.max_document_size)
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        within("attribute count", count, self.max_attributes)
    }
}

fn within(what: &str, value: usize, max: usize) -> Result<()> {
    if value > max {
        return Err(Error::LimitExceeded(format!("{} {} exceeds maximum {}", what, value, max)));
    }
    Ok(())
}
