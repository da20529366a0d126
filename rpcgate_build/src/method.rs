use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn;

use crate::Result;
use crate::config::FieldMapping;
use crate::introspect::MethodArgument;
use crate::resolve::Resolver;
use crate::utils::*;


/// Positional arguments of a method, as introspected from its stubs.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Arguments {
    /// Name of the `{Service}{Method}Args` structure
    pub args_struct: String,
    pub args: Vec<MethodArgument>,
    /// Call expressions, one per argument
    pub expressions: Vec<String>,
}


/// How the stub method receives its input.
enum Input {
    /// Constructor of the single request value.
    Request(TokenStream2),
    /// Positional arguments, with the composite flag of each one.
    Positional(Arguments, Vec<bool>),
}


/// One case of the switcher.
pub struct Method {
    /// Method name, as routed
    pub name: String,
    /// Client method identifier
    pub ident: syn::Ident,
    input: Input,
}

impl Method {
    /// Method taking a single `{Method}Request` value.
    pub fn request(name: &str, mapping: &FieldMapping) -> Result<Self> {
        let ident_cap = to_camel_ident(name)?;
        let request_type = format!("{}Request", ident_cap);
        let constructor = Resolver::new(mapping).tree(&request_type).constructor_text();

        Ok(Self {
            name: name.to_string(),
            ident: to_snake_ident(name)?,
            input: Input::Request(parse_tokens(&constructor, &request_type)?),
        })
    }

    /// Method taking positional arguments.
    pub fn positional(name: &str, arguments: Arguments, mapping: &FieldMapping) -> Result<Self> {
        let composite = arguments.args.iter().map(|a| mapping.contains(&a.ty.name)).collect();

        Ok(Self {
            name: name.to_string(),
            ident: to_snake_ident(name)?,
            input: Input::Positional(arguments, composite),
        })
    }

    /// Return the match arm calling this method.
    pub fn get_case(&self, rt: &syn::Path) -> Result<TokenStream2> {
        let name = &self.name;
        let call = self.get_call(rt)?;
        Ok(quote! { #name => { #call } })
    }

    fn get_call(&self, rt: &syn::Path) -> Result<TokenStream2> {
        let ident = &self.ident;
        let rpc_error = quote! { .map_err(|e| #rt::ErrorKind::Rpc.error(e.to_string()))? };

        match &self.input {
            Input::Request(constructor) => Ok(quote! {
                let mut request = #constructor;
                s.decode_into(&mut request, req)?;
                let mut client = s.client();
                let response = client.#ident(request).await #rpc_error;
                Ok(Box::new(response.into_inner()))
            }),
            Input::Positional(arguments, _) if arguments.args.is_empty() => Ok(quote! {
                let mut client = s.client();
                let response = client.#ident() #rpc_error;
                Ok(Box::new(response))
            }),
            Input::Positional(arguments, composite) => {
                let args_struct = &arguments.args_struct;
                let descriptors = arguments.args.iter().zip(composite.iter())
                    .map(|(arg, &composite)| {
                        let name = &arg.name;
                        let type_name = match composite {
                            true => &arg.ty.name,
                            false => &arg.ty.full,
                        };
                        quote! { #rt::ArgDescriptor { name: #name, type_name: #type_name, composite: #composite } }
                    });
                let expressions = arguments.expressions.iter()
                    .map(|e| parse_tokens(e, &arguments.args_struct))
                    .collect::<Result<Vec<_>>>()?;

                Ok(quote! {
                    const ARGS: #rt::ArgsDescriptor = #rt::ArgsDescriptor {
                        name: #args_struct,
                        args: &[#(#descriptors),*],
                    };
                    let mut params = s.build_args(&ARGS, req,
                        &|type_name: &str, req: &#rt::HttpRequest| build_struct_arg(s, type_name, req))?;
                    let mut client = s.client();
                    let response = client.#ident(#(#expressions),*) #rpc_error;
                    Ok(Box::new(response))
                })
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeRef;

    fn rt() -> syn::Path {
        syn::parse_str("::rpcgate").unwrap()
    }

    fn argument(name: &str, type_name: &str) -> MethodArgument {
        MethodArgument {
            name: name.to_string(),
            ty: TypeRef { name: type_name.to_string(), full: type_name.to_string() },
        }
    }

    /// Return tokens as text without whitespace.
    fn compact(tokens: TokenStream2) -> String {
        tokens.to_string().chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_request_case() {
        let mapping = FieldMapping::from_lines(vec!["SayHelloRequest[Option<CommonValues> values]", "CommonValues[]"]);
        let method = Method::request("SayHello", &mapping).unwrap();
        assert_eq!(method.ident.to_string(), "say_hello");

        let case = compact(method.get_case(&rt()).unwrap());
        assert!(case.starts_with("\"SayHello\"=>"), "{}", case);
        assert!(case.contains("SayHelloRequest{values:Some(CommonValues{..Default::default()}),"), "{}", case);
        assert!(case.contains("client.say_hello(request).await"), "{}", case);
    }

    #[test]
    fn test_positional_case() {
        let mapping = FieldMapping::from_lines(vec!["Work[]"]);
        let arguments = Arguments {
            args_struct: String::from("CalculatorCalculateArgs"),
            args: vec![argument("logid", "i32"), argument("w", "Work")],
            expressions: vec![String::from("params.take::<i32>(0)?"), String::from("params.take::<Work>(1)?")],
        };
        let method = Method::positional("calculate", arguments, &mapping).unwrap();
        let case = compact(method.get_case(&rt()).unwrap());
        assert!(case.contains("name:\"logid\",type_name:\"i32\",composite:false"), "{}", case);
        assert!(case.contains("name:\"w\",type_name:\"Work\",composite:true"), "{}", case);
        assert!(case.contains("client.calculate(params.take::<i32>(0)?,params.take::<Work>(1)?)"), "{}", case);
        assert!(!case.contains("await"));
    }

    #[test]
    fn test_positional_without_arguments() {
        let arguments = Arguments { args_struct: String::from("CalculatorPingArgs"), args: vec![], expressions: vec![] };
        let method = Method::positional("ping", arguments, &FieldMapping::new()).unwrap();
        let case = compact(method.get_case(&rt()).unwrap());
        assert!(!case.contains("build_args"));
        assert!(case.contains("client.ping()"), "{}", case);
    }

    #[test]
    fn test_malformed_expression() {
        let arguments = Arguments {
            args_struct: String::from("CalculatorAddArgs"),
            args: vec![argument("num1", "i32")],
            expressions: vec![String::from("params.take::<i32>(0")],
        };
        let method = Method::positional("add", arguments, &FieldMapping::new()).unwrap();
        assert_eq!(method.get_case(&rt()).unwrap_err().kind, crate::ErrorKind::Template);
    }
}
