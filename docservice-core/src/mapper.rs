//! Response-shape mapping.
//!
//! A [`Mapper`] turns the documents fetched by a listing into the objects returned to
//! callers. Mapping is infallible from the service's point of view; conversions that
//! can fail must handle the failure themselves.

use std::marker::PhantomData;

/// Maps a list of source values into a list of target values.
pub trait Mapper<S, T>: Send + Sync {
    fn map(&self, source: Vec<S>) -> Vec<T>;
}

/// Mapper applying a conversion function to each element.
///
/// Created with [`map_with`].
#[derive(Clone, Copy)]
pub struct FnMapper<F> {
    f: F,
}

/// Builds a [`Mapper`] from a per-element conversion function.
///
/// ```ignore
/// let mapper = map_with(|ticket: Ticket| TicketSummary { number: ticket.ticket_no });
/// ```
pub fn map_with<S, T, F>(f: F) -> FnMapper<F>
where
    F: Fn(S) -> T + Send + Sync,
{
    FnMapper { f }
}

impl<S, T, F> Mapper<S, T> for FnMapper<F>
where
    F: Fn(S) -> T + Send + Sync,
{
    fn map(&self, source: Vec<S>) -> Vec<T> {
        source.into_iter().map(&self.f).collect()
    }
}

/// Mapper using the target type's `From<S>` implementation.
pub struct IntoMapper<T>(PhantomData<fn() -> T>);

impl<T> IntoMapper<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for IntoMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Mapper<S, T> for IntoMapper<T>
where
    T: From<S>,
{
    fn map(&self, source: Vec<S>) -> Vec<T> {
        source.into_iter().map(T::from).collect()
    }
}
