use std::{fmt, str::FromStr};

use heck::ToSnakeCase;

use crate::{ErrorKind, Error, Result};
use crate::config::Config;


/// RPC calling convention of the backend service.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Convention {
    /// One composite request value per method (protobuf/tonic stubs).
    Grpc,
    /// Ordered argument list per method (thrift stubs).
    Thrift,
}

impl Convention {
    pub fn name(&self) -> &'static str {
        match self {
            Convention::Grpc => "grpc",
            Convention::Thrift => "thrift",
        }
    }

    /// Directory of the stub compiler's output, relative to `gen/`.
    pub fn stub_dir(&self) -> &'static str {
        match self {
            Convention::Grpc => "proto",
            Convention::Thrift => "thrift",
        }
    }

    /// File name of the generated switcher.
    pub fn switcher_file(&self) -> String {
        format!("{}switcher.rs", self.name())
    }

    /// File name of the regenerated field-mapping document.
    pub fn fields_file(&self) -> String {
        format!("{}fields.yaml", self.name())
    }

    /// Name of the generated switcher function.
    pub fn switcher_fn(&self) -> String {
        format!("{}_switcher", self.name())
    }

    /// Module path of the stubs in the generated code.
    pub fn stub_path(&self, config: &Config) -> String {
        match config.service.stub_path {
            Some(ref path) => path.clone(),
            None => format!("super::{}", self.stub_dir()),
        }
    }

    /// Client type handed out by the server runtime.
    pub fn client_type(&self, config: &Config) -> String {
        if let Some(ref client_type) = config.service.client_type {
            return client_type.clone();
        }

        let service = config.service_name();
        match self {
            Convention::Grpc => format!(
                "{}::{}_client::{}Client<tonic::transport::Channel>",
                self.stub_path(config), service.to_snake_case(), service),
            Convention::Thrift => format!(
                "Box<dyn {}::T{}SyncClient + Send>", self.stub_path(config), service),
        }
    }

    /// Path of the runtime crate in the generated code.
    pub fn runtime_path(&self, config: &Config) -> String {
        config.service.runtime_path.clone().unwrap_or_else(|| String::from("::rpcgate"))
    }
}

impl FromStr for Convention {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grpc" => Ok(Convention::Grpc),
            "thrift" => Ok(Convention::Thrift),
            _ => ErrorKind::InvalidConvention.err(
                format!("invalid rpc type `{}`, should be (grpc|thrift)", s)),
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
