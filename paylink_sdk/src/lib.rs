pub mod client;
pub mod error;
pub mod types;

pub use client::PaylinkClient;
pub use error::{Result, SdkError};
pub use types::{CreateLinkRequest, CreatedLink, Currency, MarkPaidRequest, PaymentLink};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::PaylinkClient;
    pub use crate::error::{Result, SdkError};
    pub use crate::types::*;
}
