//! Marker trait for record types mapped into a [`crate::Storage`] catalog.

/// A record type that can be registered with a [`crate::Storage`]'s
/// catalog and round-tripped through its CRUD methods.
///
/// This is a blanket alias over the bounds [`sqlorm_core::Table`] itself
/// requires (`Default + Send + Sync + 'static`), kept as a named trait
/// purely so the facade's method signatures read as "any mapped record
/// type" rather than repeating the bound everywhere.
pub trait Entity: Default + Send + Sync + 'static {}

impl<R: Default + Send + Sync + 'static> Entity for R {}
