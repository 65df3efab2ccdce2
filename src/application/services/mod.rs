//! Application services - Business logic orchestration

pub mod messaging_service;

#[cfg(test)]
mod tests;

pub use messaging_service::MessagingService;
