pub mod detection;
pub mod maintenance;
pub mod moderation;
pub mod pipeline;
pub mod registration;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
