//! # sigscout-signature
//!
//! Structural signature model and normalizer.
//!
//! A [`Signature`] describes the entity to locate (name or pattern, kind,
//! required methods/fields, inheritance, annotations, namespace, generics).
//! [`Signature::canonical`] produces a deterministic canonical form whose
//! compact JSON rendering ([`Signature::cache_key`]) is the cache key:
//! two signatures that are semantically identical up to construction order
//! always yield byte-identical keys.

mod error;
mod normalize;
mod signature;

pub use error::{Result, SignatureError};
pub use normalize::{CanonicalName, CanonicalSignature};
pub use signature::{NamePattern, NameQuery, Signature, TargetKind};
