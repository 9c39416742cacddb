// Domain-layer modules and shared errors/models
pub mod batch {
    pub use crate::batch::*;
}

pub mod features {
    pub use crate::features::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod errors {
    pub use crate::errors::*;
}
