//! Reference for the diagnostic findings.
//!
//! Failed `VerifyAndDiagnose` passes link here. Every kind can be silenced
//! container-wide (`diagnostics.suppress` in `rivet.json`, or
//! [`Verifier::suppress`](crate::engine::Verifier::suppress)) or for one
//! registration with
//! [`Registration::suppress_diagnostic`](rivet_core::Registration::suppress_diagnostic).
//!
//! # W001 Lifestyle Mismatch
//!
//! A component holds on to a dependency registered with a shorter lifestyle,
//! so the dependency lives as long as its consumer. Give the dependency a
//! lifestyle at least as long as the consumer's, or take it as a lazy
//! dependency and resolve it per use.
//!
//! # W002 Torn Lifestyle
//!
//! The same implementation is registered several times with the same
//! non-transient lifestyle, and each registration keeps its own cache. Register
//! it once under all its services with `Container::register_for_all`.
//!
//! # W003 Short Circuited Dependency
//!
//! A component depends on a concrete type the container built on the fly,
//! while that implementation is registered under an abstraction (or itself
//! pulls in more unregistered types). Depend on the abstraction instead.
//!
//! # W004 Disposable Transient Component
//!
//! Transient instances are never tracked, so the resources they own are not
//! released by the container. Use a scoped or singleton lifestyle, or release
//! the resource yourself and suppress the finding on that registration.
//!
//! # W005 Ambiguous Lifestyles
//!
//! One implementation is registered under different lifestyles. Pick one.
//!
//! # I001 Container-registered Collection
//!
//! A collection was given a bare concrete type and the container registered it
//! as transient. Informational only; add an explicit registration to choose the
//! lifestyle.
