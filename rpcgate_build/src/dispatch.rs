//! Generation of the switcher: the function a server runtime calls once per
//! inbound request, after it resolved the method name from the route table.
use std::collections::BTreeMap;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn;
use tracing::debug;

use crate::{ErrorKind, Result};
use crate::config::Config;
use crate::convention::Convention;
use crate::method::{Arguments, Method};
use crate::resolve::Resolver;
use crate::utils::*;


const HEADER: &str = "// this is a generated file, DO NOT EDIT!\n";


/// Switcher of a service, one case per distinct routed method.
pub struct Switcher<'a> {
    convention: Convention,
    config: &'a Config,
    methods: Vec<Method>,
}

impl<'a> Switcher<'a> {
    /// Switcher over struct-style stubs.
    pub fn grpc(config: &'a Config) -> Result<Self> {
        let methods = config.routes.method_names().iter()
            .map(|name| Method::request(name, &config.field_mapping))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { convention: Convention::Grpc, config, methods })
    }

    /// Switcher over positional-style stubs, `arguments` holding the
    /// introspected arguments of every routed method.
    pub fn thrift(config: &'a Config, mut arguments: BTreeMap<String, Arguments>) -> Result<Self> {
        let methods = config.routes.method_names().iter()
            .map(|name| match arguments.remove(name) {
                Some(args) => Method::positional(name, args, &config.field_mapping),
                None => ErrorKind::Introspection.err(format!("no arguments for method `{}`", name)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { convention: Convention::Thrift, config, methods })
    }

    /// Return the switcher's source.
    pub fn generate(&self) -> Result<String> {
        let stub = self.path(&self.convention.stub_path(self.config), "stub path")?;
        let switcher = self.switcher()?;
        let builder = match self.convention {
            Convention::Grpc => quote! {},
            Convention::Thrift => self.struct_arg_builder()?,
        };

        let tokens = quote! {
            #[allow(unused_imports)]
            use #stub::*;

            #switcher
            #builder
        };
        Ok(format!("{}{}\n", HEADER, tokens))
    }

    fn path(&self, path: &str, what: &str) -> Result<syn::Path> {
        syn::parse_str::<syn::Path>(path)
            .or_else(|err| ErrorKind::Template.err(format!("{}: `{}`: {}", what, path, err)))
    }

    fn switcher(&self) -> Result<TokenStream2> {
        let rt = self.path(&self.convention.runtime_path(self.config), "runtime path")?;
        let client_type = parse_type(&self.convention.client_type(self.config), "client type")?;
        let ident = to_ident(&self.convention.switcher_fn())?;
        let asyncness = match self.convention {
            Convention::Grpc => quote! { async },
            Convention::Thrift => quote! {},
        };

        let cases = self.methods.iter()
            .map(|method| {
                debug!(method = %method.name, "switcher case");
                method.get_case(&rt)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            /// Runtime switcher a server starts with.
            #[allow(unused_variables)]
            pub #asyncness fn #ident<S>(s: &S, method_name: &str, resp: &mut #rt::HttpResponse,
                                        req: &#rt::HttpRequest)
                -> #rt::Result<#rt::Response>
                where S: #rt::Server<Client = #client_type>
            {
                match method_name {
                    #(#cases)*
                    _ => #rt::ErrorKind::UnknownMethod.err(format!("No such method[{}]", method_name)),
                }
            }
        })
    }

    /// Return the function building composite arguments by type name.
    fn struct_arg_builder(&self) -> Result<TokenStream2> {
        let rt = self.path(&self.convention.runtime_path(self.config), "runtime path")?;
        let resolver = Resolver::new(&self.config.field_mapping);

        let cases = self.config.field_mapping.type_names()
            .map(|type_name| {
                let constructor = resolver.tree(type_name).constructor_text();
                let constructor = parse_tokens(&constructor, type_name)?;
                Ok(quote! {
                    #type_name => {
                        let mut request = #constructor;
                        s.decode_into(&mut request, req)?;
                        Ok(Box::new(request))
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            #[allow(dead_code, unused_variables)]
            fn build_struct_arg<S: #rt::Server>(s: &S, type_name: &str, req: &#rt::HttpRequest)
                -> #rt::Result<#rt::Param>
            {
                match type_name {
                    #(#cases)*
                    _ => #rt::ErrorKind::UnknownType.err(format!("unknown typeName[{}]", type_name)),
                }
            }
        })
    }
}
