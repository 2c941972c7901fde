//! Dialogue — the security-gated function-calling engine.
//!
//! `catalog` declares the legitimate and decoy action families advertised to
//! the model on every turn. `dispatch` decodes the model's chosen action into
//! a closed enum and executes it. `orchestrator` owns the per-turn flow:
//! prompt build → one model call → interpret → session update. `handlers`
//! is the axum surface over the engine.

pub mod catalog;
pub mod dispatch;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
