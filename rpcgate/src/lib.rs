#![warn(unused_extern_crates)]

pub mod error;
pub mod rpc;

pub use error::{Error, ErrorKind, Result};
pub use rpc::{
    ArgDescriptor, ArgsDescriptor, HttpRequest, HttpResponse, Param, Params, Response, Server,
    StructArgBuilder,
};


pub mod tests {
    #[macro_export]
    macro_rules! expect {
        ($test: expr, $result: pat) => {
            let r = $test;
            match r {
                $result => (),
                _ => panic!("expected {:?}, got {:?}", stringify!($result), r),
            }
        }
    }
}
