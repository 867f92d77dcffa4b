pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;


// Re-export commonly used types
pub use errors::{GatewayError, GatewayResult};
pub use models::{DispatchSuccess, NotificationEnvelope, NotificationRequest};
pub use services::{DispatchError, MessagingProvider, NotificationDispatcher};
