//! Image generation providers.

mod replicate;

pub use replicate::{
    ReplicateProvider, ReplicateProviderBuilder, API_BASE_ENV, API_TOKEN_ENV, DEFAULT_BASE_URL,
    DEFAULT_MODEL,
};
