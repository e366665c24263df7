//! Building blocks shared by the integration functions: the event model, the
//! event type router, the gzip store pipeline and the publish/store seams
//! backed by SNS and S3.

pub mod compress;
pub mod config;
mod error;
pub mod event;
pub mod publish;
pub mod router;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::Error;
pub use event::{Event, EventType};
pub use publish::{Publisher, SnsPublisher};
pub use router::{Router, Topics};
pub use store::{ObjectStore, S3ObjectStore};
