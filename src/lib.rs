#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fabric Core
//!
//! Domain assembly and deployment pipeline for a distributed component
//! runtime.
//!
//! ## Overview
//!
//! Deployable composites are expanded into a logical model of components,
//! channels, resources and wires, placed in zones, turned into ordered
//! physical commands and applied to the live runtime of every zone. A failed
//! deployment compensates what it already applied and leaves the logical
//! model as it was.
//!
//! ## Pipeline
//!
//! ```text
//! Composite ─► Instantiator ─► Allocator ─► Generator ─► Deployer ─► executors
//!                  │                            │            │
//!             logical model              ExtensionTracker   zone transport
//!                  ▲
//!              Collector (mark / collect / prune)
//! ```
//!
//! ## Module Organization
//!
//! - [`definition`] - Parsed composite definitions and qualified names
//! - [`model`] - Logical model of the domain
//! - [`instantiator`] - Composite to logical model expansion and wiring
//! - [`collector`] - Provisioning state transitions and garbage collection
//! - [`extension_tracker`] - Per-zone extension reference counts
//! - [`command`] - Physical commands and their inverses
//! - [`generator`] - Logical model to ordered per-zone command batches
//! - [`executor`] - Command executors and their registry
//! - [`deployer`] - Transactional, zone-aware command execution
//! - [`domain`] - Include, undeploy and recovery façade
//! - [`runtime`] - Live runtime interfaces and bootstrap
//! - [`config`] - Environment-aware configuration
//! - [`logging`] - Structured logging
//! - [`error`] - Top-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fabric_core::config::FabricConfig;
//! use fabric_core::definition::{Composite, ComponentDefinition, QName};
//! use fabric_core::domain::Contribution;
//! use fabric_core::runtime::RuntimeBootstrap;
//!
//! # async fn example() -> fabric_core::Result<()> {
//! let handle = RuntimeBootstrap::from_config(FabricConfig::default())?
//!     .with_logging()
//!     .bootstrap()?;
//!
//! let name = QName::new("urn:example", "orders");
//! handle.contributions.install(
//!     Contribution::new("orders-contribution").with_deployable(
//!         Composite::new(name.clone(), "orders-contribution")
//!             .with_component(ComponentDefinition::atomic("OrderService", "rust")),
//!     ),
//! )?;
//! handle.domain.include(&name).await?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod command;
pub mod config;
pub mod constants;
pub mod definition;
pub mod deployer;
pub mod domain;
pub mod error;
pub mod executor;
pub mod extension_tracker;
pub mod generator;
pub mod instantiator;
pub mod logging;
pub mod model;
pub mod runtime;

pub use command::{Command, CommandType};
pub use config::{ConfigManager, FabricConfig};
pub use definition::{Composite, QName};
pub use deployer::{Deployer, DeploymentError, DeploymentPackage};
pub use domain::Domain;
pub use error::{FabricError, Result};
pub use generator::{Deployment, Generator};
pub use model::{LogicalCompositeComponent, LogicalState};
pub use runtime::{RuntimeBootstrap, RuntimeHandle};
