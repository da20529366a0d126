#![warn(unused_extern_crates)]
//! Build-time generation of HTTP to RPC gateway switchers.
//!
//! Given a service configuration (route table and field mapping) and the
//! stubs emitted by an RPC stub compiler, generates the switcher a server
//! runtime (`rpcgate` crate) calls for every inbound request: it constructs
//! the method's request value or positional arguments with every nested
//! composite field pre-allocated, has the server decode the HTTP request
//! into them, then calls the RPC client.
//!
//! Two calling conventions are supported:
//! - `grpc`: one request value per method, named `{Method}Request`;
//! - `thrift`: positional arguments, described by `{Service}{Method}Args`.
//!
//! # Example
//!
//! ```no_run
//! use rpcgate_build::{Convention, Generator};
//!
//! let generator = Generator::new(Convention::Thrift, "services/calculator");
//! let switcher = generator.generate().unwrap();
//! println!("switcher written to {}", switcher.display());
//! ```

pub mod command;
pub mod config;
pub mod convention;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod introspect;
pub mod method;
pub mod resolve;
mod utils;

pub use config::{Config, FieldDecl, FieldMapping, MethodRoute, RouteTable, ServiceConfig};
pub use convention::Convention;
pub use dispatch::Switcher;
pub use error::{Error, ErrorKind, Result};
pub use generator::Generator;
pub use introspect::{Introspector, SourceTypes, TypeSource};
pub use resolve::{ParameterTree, Resolver};
