//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: MessagingService (send, read, aggregate)
//! - Sync: interval polling, epoch-guarded snapshots, live views
//! - Errors: Domain-specific errors

pub mod errors;
pub mod services;
pub mod sync;
