//! Client for the Too Good To Go discovery API.
//!
//! [`TgtgClient`] speaks HTTP; [`Session`] carries auth state explicitly;
//! [`Discovery`] ties them to a location and decides between reusing,
//! refreshing, or re-establishing the session before each fetch.

pub mod client;
pub mod error;
pub mod session;
pub mod source;

mod retry;

pub use client::{Location, TgtgClient};
pub use error::ClientError;
pub use session::{decide, Session, SessionAction, TokenGrant};
pub use source::Discovery;
