// crates/hos-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite HOS Store
// Description: Durable HOS store backend using SQLite WAL.
// Purpose: Provide production-grade persistence for duty logs and violations.
// Dependencies: hos-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed implementation of every HOS collaborator
//! interface: [`hos_core::DutyLogStore`], [`hos_core::DriverProfileStore`], and
//! [`hos_core::ViolationRecorder`]. Status changes run inside immediate
//! transactions so concurrent writers never both close the same open interval.
//! Database contents are untrusted and fail closed on unknown labels.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteHosStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
