//! Outbound service clients.

pub mod identity {
    pub use crate::identity::*;
}

pub mod scoring_client {
    pub use crate::scoring_client::*;
}
