use std::any::Any;

use bytes::Bytes;

use crate::Result;
use super::params::{ArgDescriptor, ArgsDescriptor, Param, Params};


/// Inbound HTTP request handed to a switcher.
pub type HttpRequest = http::Request<Bytes>;
/// Response being prepared by the server runtime.
pub type HttpResponse = http::Response<Bytes>;
/// Stub response returned by a switcher; the server runtime encodes it.
pub type Response = Box<dyn Any + Send>;

/// Callback building a composite argument value from its type name. Generated
/// positional switchers pass their `build_struct_arg` function through it.
pub type StructArgBuilder<'a> = &'a dyn Fn(&str, &HttpRequest) -> Result<Param>;


/// Server context passed down to generated switchers, once per inbound call.
///
/// It is implemented by the HTTP server runtime, which owns the RPC client and
/// the generic request decoder.
pub trait Server {
    /// RPC client the switcher invokes.
    type Client;

    /// Return a client ready for one call.
    fn client(&self) -> Self::Client;

    /// Fill scalar leaves of an already-constructed, possibly nested, value
    /// from the inbound request.
    fn decode_into(&self, target: &mut dyn Any, req: &HttpRequest) -> Result<()>;

    /// Decode one scalar positional argument from the inbound request.
    fn decode_arg(&self, arg: &ArgDescriptor, req: &HttpRequest) -> Result<Param>;

    /// Build positional arguments for `args`, in declared order. Composite
    /// arguments are routed by type name through `build_struct_arg`.
    fn build_args(&self, args: &ArgsDescriptor, req: &HttpRequest,
                  build_struct_arg: StructArgBuilder<'_>)
        -> Result<Params>
    {
        let mut params = Params::default();
        for arg in args.args.iter() {
            let value = match arg.composite {
                true => build_struct_arg(arg.type_name, req)?,
                false => self.decode_arg(arg, req)?,
            };
            params.push(value);
        }
        Ok(params)
    }
}
