//! BDD step definitions for the redis notifier

pub mod construction_steps;
pub mod notification_steps;
