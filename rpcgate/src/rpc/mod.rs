pub mod params;
pub mod server;


pub use params::{ArgDescriptor, ArgsDescriptor, Param, Params};
pub use server::{HttpRequest, HttpResponse, Response, Server, StructArgBuilder};
