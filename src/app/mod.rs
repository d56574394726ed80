//! Demo application served behind the capture pipeline.
//!
//! A small in-memory users resource plus the root hello route. The pipeline
//! places no constraints on this code beyond producing ordinary HTTP
//! responses; it exists to generate traffic worth recording.

pub mod router;
pub mod store;

pub use router::AppService;
pub use store::{NewUser, User, UserStore};
