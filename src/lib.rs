//! Go interface stub generator.
//!
//! Given a receiver such as `f *File` and an interface reference such as
//! `io.ReadCloser`, finds the interface's package, flattens its method set and
//! renders one compilable stub per method.
//!
//! - `locate` + `resolver` map import paths to parsed packages.
//! - `lookup` + `lower` find and resolve interface declarations.
//! - `flatten` expands embeddings into one method set.
//! - `render` prints the stubs and their import block.

pub mod config;
pub mod error;
pub mod flatten;
pub mod imports;
pub mod locate;
pub mod lookup;
pub mod lower;
pub mod model;
pub mod naming;
pub mod prelude;
pub mod reference;
pub mod render;
pub mod resolver;

use std::path::PathBuf;

use tracing::{debug, info_span};

pub use crate::config::{Config, GoEnv, StubBody};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::locate::BuildTags;
pub use crate::lookup::Workspace;
pub use crate::model::{MethodSet, PkgPath, Receiver, TypeName};
pub use crate::reference::InterfaceRef;
pub use crate::render::Generated;
pub use crate::resolver::{GoEnvResolver, Resolver, StaticResolver};

/// Generates stubs for `iface` on `recv`, resolving packages the way the go
/// tool would from `config`.
pub fn generate(recv: &str, iface: &str, config: &Config) -> Result<Generated> {
    let src_dir = source_dir(config);
    let resolver = GoEnvResolver::new(&config.env, src_dir.as_deref());
    generate_with(&resolver, recv, iface, config)
}

/// [`generate`] with an explicit package resolver.
pub fn generate_with(
    resolver: &dyn Resolver,
    recv: &str,
    iface: &str,
    config: &Config,
) -> Result<Generated> {
    let _span = info_span!("generate", recv, iface).entered();

    let src_dir = source_dir(config);
    let mut ws = Workspace::new(resolver, BuildTags::from_env(&config.env), src_dir.as_deref());
    let receiver = Receiver::parse(recv, ws.dest_path().clone())?;
    let target = InterfaceRef::parse(iface, ws.dest_path(), &receiver.type_params)?;

    let set = flatten::flatten(&mut ws, &target.name, &target.args)?;
    debug!(interface = %set.iface, methods = set.len(), "flattened");
    render::render(&set, &receiver, config.body)
}

fn source_dir(config: &Config) -> Option<PathBuf> {
    config
        .src_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
}
