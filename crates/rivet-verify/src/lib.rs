//! Verification and diagnostics for rivet containers.
//!
//! A verification pass freezes the container, prepares every construction
//! strategy, builds every producer once, then runs the container analyzers:
//! - W001 Lifestyle Mismatch: a component depends on a shorter-lived one
//! - W002 Torn Lifestyle: one implementation cached separately per registration
//! - W003 Short Circuited Dependency: a consumer bypasses a registered abstraction
//! - W004 Disposable Transient Component: a transient owns a disposable resource
//! - W005 Ambiguous Lifestyles: one implementation under several lifestyles
//! - I001 Container-registered Collection: collection items registered by the container
//!
//! See [`diagnostics`] for what each finding means and how to silence it.

pub mod analyzers;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod report;
pub mod suppress;
pub mod types;

pub use analyzers::{default_analyzers, ContainerAnalyzer};
pub use engine::{Verifier, VerifyExt};
pub use error::{DiagnosticVerificationError, VerificationError};
pub use report::{DiagnosticGroup, DiagnosticReport, DiagnosticSection};
pub use suppress::SuppressionManager;
pub use types::{DiagnosticDetail, DiagnosticResult, ProducerInfo, VerificationOutcome};
