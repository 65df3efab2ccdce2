//! Domain layer - Core messaging rules with no storage dependencies
//! 
//! This layer contains:
//! - Entities: Identity, Message, Conversation
//! - Traits: Abstractions for infrastructure (MessageStore)
//! - Rules: ordering, counterpart resolution, action-link classification

pub mod entities;
pub mod traits;
