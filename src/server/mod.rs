//! Subscription session server

pub mod listener;

pub use listener::SubscriptionServer;
