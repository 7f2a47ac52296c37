//! # rstf codegen
//!
//! Turns an rstf project (Go route handlers next to TSX components) into the
//! typed glue both sides need, and keeps that glue current while files change.
//!
//! ## Architecture
//!
//! ```text
//! Go sources            TSX components
//!     │                       │
//!     ▼                       ▼
//! ┌──────────────┐     ┌──────────────┐
//! │   Frontend   │     │     Deps     │  Import graph walk over a
//! │  (Go → IR)   │     │ (TSX → dirs) │  shared read cache
//! └──────┬───────┘     └──────┬───────┘
//!        │                    │
//!        ▼                    ▼
//! ┌─────────────────────────────────┐
//! │             Codegen             │  .d.ts, runtime modules,
//! │    (IR + dependency map → text) │  hydration entries, server_gen.go
//! └────────────────┬────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────┐
//! │            Pipeline             │  Phased full builds and
//! │      (text → .rstf/ on disk)    │  incremental regeneration
//! └─────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rstf_codegen::{ChangeEvent, Generator, GeneratorConfig};
//!
//! let mut generator = Generator::new(GeneratorConfig::new("."))?;
//! let result = generator.generate().await?;
//! println!("{} routes", result.route_count);
//!
//! let update = generator
//!     .regenerate(&[ChangeEvent::classify("routes/dashboard/index.go")])
//!     .await?;
//! if update.server_changed {
//!     // restart the server process
//! }
//! ```

pub mod codegen;
pub mod config;
pub mod conventions;
pub mod deps;
pub mod diagnostic;
pub mod frontend;
pub mod ir;
pub mod pipeline;

pub use config::GeneratorConfig;
pub use diagnostic::CodegenError;
pub use ir::{DependencyMap, RouteFile};
pub use pipeline::{generate, ChangeEvent, ChangeKind, GenerateResult, Generator, RegenerateResult};
