//! # MedConnect Core
//!
//! Core business logic for the MedConnect code-resolution and access system.
//!
//! Two disjoint identity spaces (durably registered patients and ad-hoc
//! emergency intake records) are addressed by short prefix-typed codes,
//! resolved to full records, and exposed to hospital staff under role-gated,
//! audited access. This crate owns:
//!
//! - Code allocation with store-checked uniqueness and bounded retry
//! - Resolution of raw codes (including ambiguous, unprefixed input)
//! - The Access Gate: audited, fail-closed read/write authorization
//! - One-time promotion of emergency records into permanent patients
//! - The append-only scan ledger
//! - Registration, emergency intake, and visit scheduling/completion
//!
//! **No API concerns**: HTTP servers, OpenAPI schemas, or credential
//! validation belong in `api-rest` and the external authentication
//! collaborator. Staff identity arrives here as a ready-made value.
//!
//! **No storage concerns**: all persistence goes through the [`RecordStore`]
//! trait; exclusivity (unique codes, single promotion, single visit
//! completion) is enforced by the store's conditional-write primitives, never
//! by in-process locks, because multiple service instances may run against
//! the same store.

pub mod access;
pub mod codegen;
pub mod config;
pub mod constants;
pub mod emergency;
pub mod error;
pub mod ledger;
pub mod patient;
pub mod promotion;
pub mod registration;
pub mod resolver;
pub mod staff;
pub mod store;
pub mod visit;

#[cfg(test)]
pub(crate) mod testutil;

pub use access::{AccessGate, AuthorizedView, Intent};
pub use codegen::CodeIssuer;
pub use config::CoreConfig;
pub use emergency::{EmergencyIntake, EmergencyIntakeService, EmergencyPatient, EmergencyStatus};
pub use error::{CoreError, CoreResult};
pub use ledger::{ScanEvent, ScanLedger, ScanType};
pub use patient::{NewPatient, Patient};
pub use promotion::PromotionEngine;
pub use registration::RegistrationService;
pub use resolver::{Resolved, Resolver};
pub use staff::{StaffIdentity, StaffRole};
pub use store::{MemoryStore, RecordStore};
pub use visit::{Visit, VisitService, VisitStatus};

// Code formats are part of this crate's public vocabulary.
pub use medconnect_codes::{CodeKind, EmergencyCode, PatientCode, VisitCode};
pub use medconnect_types::NonEmptyText;

/// Opaque clinical free text, length-capped at intake.
pub type ClinicalText = medconnect_types::BoundedText<2000>;
