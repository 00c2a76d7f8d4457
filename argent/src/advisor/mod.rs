//! Rule-based "advisor" features: intent classification of free-text
//! questions and allocation suggestions.

pub mod intent;
pub mod strategy;

pub use intent::IntentClassifier;
pub use strategy::{StrategyAdvisor, StrategyRequest};
