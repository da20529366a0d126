use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Span, TokenStream};
use syn;

use crate::{ErrorKind, Result};


/// Return camel-cased identifier of provided name (`say_hello` -> `SayHello`).
pub fn to_camel_ident(name: &str) -> Result<syn::Ident> {
    to_ident(&name.to_upper_camel_case())
}

/// Return snake-cased identifier of provided name (`SayHello` -> `say_hello`).
pub fn to_snake_ident(name: &str) -> Result<syn::Ident> {
    to_ident(&name.to_snake_case())
}

/// Return identifier, as raw identifier when `name` is a keyword.
pub fn to_ident(name: &str) -> Result<syn::Ident> {
    if let Ok(ident) = syn::parse_str::<syn::Ident>(name) {
        return Ok(ident);
    }

    // path keywords can't be raw identifiers
    match name {
        "self" | "Self" | "super" | "crate" => Ok(syn::Ident::new(&format!("{}_", name), Span::call_site())),
        _ => match syn::parse_str::<syn::Ident>(&format!("r#{}", name)) {
            Ok(ident) => Ok(ident),
            Err(_) => ErrorKind::Template.err(format!("`{}` is not a valid identifier", name)),
        }
    }
}

/// Parse text as tokens, `what` naming the fragment in the error.
pub fn parse_tokens(text: &str, what: &str) -> Result<TokenStream> {
    text.parse::<TokenStream>()
        .or_else(|err| ErrorKind::Template.err(format!("{}: `{}`: {}", what, text, err)))
}

/// Parse text as a type, `what` naming the fragment in the error.
pub fn parse_type(text: &str, what: &str) -> Result<syn::Type> {
    syn::parse_str::<syn::Type>(text)
        .or_else(|err| ErrorKind::Template.err(format!("{}: `{}`: {}", what, text, err)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idents() {
        assert_eq!(to_camel_ident("say_hello").unwrap().to_string(), "SayHello");
        assert_eq!(to_camel_ident("add").unwrap().to_string(), "Add");
        assert_eq!(to_snake_ident("SayHello").unwrap().to_string(), "say_hello");
        assert_eq!(to_snake_ident("type").unwrap().to_string(), "r#type");
        assert_eq!(to_snake_ident("self").unwrap().to_string(), "self_");
        assert_eq!(to_ident("1st").unwrap_err().kind, ErrorKind::Template);
    }

    #[test]
    fn test_parse_tokens() {
        assert!(parse_tokens("a: Some(B { ..Default::default() }),", "fields").is_ok());
        assert_eq!(parse_tokens("a: Some(B {", "fields").unwrap_err().kind, ErrorKind::Template);
        assert!(parse_type("Box<dyn T + Send>", "client").is_ok());
    }
}
