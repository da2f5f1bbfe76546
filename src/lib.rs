//! # bugscope
//!
//! AI-assisted GitHub bug analysis: fetch an issue, classify it, ground a
//! language model in semantically relevant source snippets, and produce a
//! root-cause analysis with a proposed patch.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   ┌─────────┐   ┌───────────┐   ┌─────────────┐
//! │ Loader │──▶│ Chunker │──▶│ Embedding │──▶│ VectorIndex │
//! └────────┘   └─────────┘   └───────────┘   └──────┬──────┘
//!   build phase (once per repository snapshot)      │
//!                                                   ▼
//!                       ┌──────────┐   ┌───────────────┐
//!   query phase         │ Context  │◀──│   Retriever   │
//!   (once per issue)    │ Assembly │   │ (top-k by     │
//!                       └────┬─────┘   │  distance)    │
//!                            ▼         └───────────────┘
//!                      LLM analysis prompt
//! ```
//!
//! The retrieval pipeline is a sequence of pure transformations connected by
//! explicit data handoffs; the index is read-only after construction.
//!
//! ## Quick Start
//!
//! ```bash
//! bugscope analyze https://github.com/gothinkster/realworld 1647
//! bugscope index build ./some-checkout        # build the index directly
//! bugscope index query "panic on empty input" # inspect retrieval
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Core error taxonomy |
//! | [`loader`] | Source document loading |
//! | [`chunk`] | Recursive text chunking with overlap |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Vector index build, persistence, and k-NN search |
//! | [`retriever`] | Query-by-text retrieval |
//! | [`context`] | Per-file context assembly |
//! | [`github`] | GitHub issue client |
//! | [`llm`] | Ollama classification and analysis |
//! | [`workspace`] | Clone and cleanup |
//! | [`analyze`] | End-to-end pipeline |

pub mod analyze;
pub mod chunk;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod github;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod retriever;
pub mod workspace;
