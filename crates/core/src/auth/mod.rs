//! Credential lifecycle: classification, caching, refresh and bounded retry

pub mod classifier;
pub mod coordinator;
pub mod invoker;
pub mod store;

pub use classifier::{classify, classify_kind, ClassifiedError, ErrorKind};
pub use coordinator::RefreshCoordinator;
pub use invoker::RetryingInvoker;
pub use store::CredentialStore;
