//! Bounded worker pool.
//!
//! [`WorkerPool`] owns a fixed set of worker threads that pull
//! [`WorkRequest`]s from one shared, bounded MPMC queue. Callers submit a whole
//! batch through [`WorkerPool::run`] and block until every item has an
//! outcome; outcomes come back aligned to the input order even though workers
//! finish out of order.

mod gauge;
mod manager;
mod request;
mod worker;

pub use manager::*;
pub(crate) use request::*;
