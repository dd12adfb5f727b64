//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

/// Contig ID - assigned by the assembly pipeline, never reused.
///
/// A contig id may become *stale* when the contig is merged into or
/// superseded by another; the assembly subsystem tracks that via the
/// currency flag, not by retiring the id.
pub type ContigId = i64;

/// Project ID - globally unique identifier for a curation project.
pub type ProjectId = i64;

/// Transfer request ID - assigned by the store on insert.
pub type RequestId = i64;

/// Username - primary key of a person in the curation directory.
pub type Username = String;
