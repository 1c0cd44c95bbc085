//! Multi-agent workflow orchestration engine.
//!
//! A workflow is a directed graph of nodes, each optionally bound to an
//! agent (a configured LLM persona). The engine plans the graph into an
//! ordered sequence of steps, drives one provider call per step with output
//! chaining, optionally runs node-configured tasks under a sandbox
//! strategy, and keeps an append-only execution log plus a registry of
//! in-flight executions.
//!
//! The crate is the execution core only: CRUD persistence and HTTP routing
//! for agent/workflow records live in the embedding service, which hands
//! validated records in and reads logs and status snapshots back out.

pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod models;
pub mod sandbox;

pub use engine::{ExecutionReport, WorkflowEngine};
pub use errors::TroupeError;
