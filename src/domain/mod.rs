// Domain layer: aggregates, value objects and pure rules
pub mod account;
pub mod actor;
pub mod complaint;
pub mod department;
pub mod token;
