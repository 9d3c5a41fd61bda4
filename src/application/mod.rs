// Application layer: use cases, authorization policy and their collaborators
pub mod access_policy;
pub mod account_service;
pub mod commands;
pub mod complaint_service;
pub mod errors;
pub mod events;
pub mod notifications;
pub mod queries;
pub mod services;
pub mod validators;

pub use access_policy::AccessPolicy;
pub use account_service::{AccountService, AuthSession};
pub use complaint_service::{ComplaintService, ComplaintStats, DispatchMode, NotificationPolicy};
pub use errors::ServiceError;
pub use services::{Claims, PasswordService, TokenService};
