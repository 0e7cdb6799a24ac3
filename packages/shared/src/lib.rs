//! Game lobby core: game and user models, the game store and user directory
//! abstractions, and the service that enforces the game lifecycle and
//! membership rules.

pub mod models;
pub mod repositories;
pub mod services;
