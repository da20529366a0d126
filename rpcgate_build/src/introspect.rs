//! Discovery of composite argument types from the stub compiler's output.
//!
//! Stubs are Rust sources, so their types are read in-process with `syn`:
//! structs with named fields are composite types, traits provide the service
//! methods. `TypeSource` is the seam: any other provider of type descriptors
//! (descriptor sets, plugins) can back an `Introspector`.
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};

use heck::ToUpperCamelCase;
use quote::ToTokens;
use syn;
use tracing::{debug, info, warn};

use crate::{ErrorKind, Result};
use crate::config::{FieldDecl, FieldMapping};


/// Reference to a type by a field or an argument.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct TypeRef {
    /// Type name once references, `Option`, `Box` and paths are peeled off.
    pub name: String,
    /// Type as declared.
    pub full: String,
}

impl TypeRef {
    pub fn from_type(ty: &syn::Type) -> Self {
        Self { name: peel(ty), full: type_text(ty) }
    }
}

/// Return the name of the type `ty` stands for.
fn peel(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Reference(r) => peel(&r.elem),
        syn::Type::Paren(p) => peel(&p.elem),
        syn::Type::Group(g) => peel(&g.elem),
        syn::Type::Path(p) => match p.path.segments.last() {
            Some(segment) => match (segment.ident.to_string().as_str(), first_type_arg(segment)) {
                ("Option", Some(inner)) | ("Box", Some(inner))
                    | ("Rc", Some(inner)) | ("Arc", Some(inner)) => peel(inner),
                (name, _) => name.to_string(),
            },
            None => type_text(ty),
        },
        // `impl IntoRequest<T>`
        syn::Type::ImplTrait(t) => t.bounds.iter()
            .filter_map(|bound| match bound {
                syn::TypeParamBound::Trait(t) => t.path.segments.last().and_then(first_type_arg),
                _ => None,
            })
            .next()
            .map(peel)
            .unwrap_or_else(|| type_text(ty)),
        _ => type_text(ty),
    }
}

fn first_type_arg(segment: &syn::PathSegment) -> Option<&syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            }).next(),
        _ => None,
    }
}

/// Render a type as compact source text (`Option<Box<Work>>`).
fn type_text(ty: &syn::Type) -> String {
    ty.to_token_stream().to_string()
      .replace(" :: ", "::")
      .replace(":: ", "::")
      .replace(" <", "<")
      .replace("< ", "<")
      .replace(" >", ">")
      .replace(" ,", ",")
      .replace("& ", "&")
}


/// Type as seen by the introspection.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<(String, TypeRef)>,
    /// True for structures with named fields
    pub composite: bool,
}

/// Method of a service client, in declaration order of its arguments.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub args: Vec<(String, TypeRef)>,
}


/// Access to the types and service methods emitted by a stub compiler.
pub trait TypeSource {
    /// Return the type declared as `name`.
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor>;

    /// Return the methods of trait `name`, in declaration order.
    fn methods(&self, name: &str) -> Option<&[MethodDescriptor]>;

    /// Return true when `name` is a composite type.
    fn is_composite(&self, name: &str) -> bool {
        self.lookup(name).map(|t| t.composite).unwrap_or(false)
    }
}


/// Types read from Rust stub sources.
#[derive(Clone,Debug,Default)]
pub struct SourceTypes {
    types: BTreeMap<String, TypeDescriptor>,
    traits: BTreeMap<String, Vec<MethodDescriptor>>,
}

impl SourceTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read types of a single source.
    pub fn parse(source: &str) -> Result<Self> {
        let mut this = Self::new();
        this.add_source(source)?;
        Ok(this)
    }

    /// Read types of every `.rs` file of `dir`, in file name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).or_else(|err| ErrorKind::Introspection.err(
            format!("can't read stubs directory {}: {}", dir.display(), err)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map(|x| x == "rs").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut this = Self::new();
        for path in paths.iter() {
            debug!(path = %path.display(), "reading stub source");
            this.add_source(&fs::read_to_string(path)?)
                .or_else(|err| ErrorKind::Introspection.err(format!("{}: {}", path.display(), err)))?;
        }
        info!(dir = %dir.display(), files = paths.len(), types = this.types.len(), "stubs read");
        Ok(this)
    }

    /// Read types of a source and add them.
    pub fn add_source(&mut self, source: &str) -> Result<()> {
        let file = syn::parse_file(source)?;
        self.add_items(&file.items);
        Ok(())
    }

    fn add_items(&mut self, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Struct(item) => self.add_struct(item),
                syn::Item::Trait(item) => self.add_trait(item),
                syn::Item::Mod(syn::ItemMod { content: Some((_, items)), .. }) => self.add_items(items),
                _ => (),
            }
        }
    }

    fn add_struct(&mut self, item: &syn::ItemStruct) {
        let name = item.ident.to_string();
        let (fields, composite) = match &item.fields {
            syn::Fields::Named(fields) => (
                fields.named.iter()
                    .filter_map(|f| f.ident.as_ref().map(|ident| (unraw(ident), TypeRef::from_type(&f.ty))))
                    .collect(),
                true
            ),
            _ => (Vec::new(), false),
        };
        if self.types.insert(name.clone(), TypeDescriptor { name: name.clone(), fields, composite }).is_some() {
            warn!(type_name = %name, "stub type declared twice, keeping the last one");
        }
    }

    fn add_trait(&mut self, item: &syn::ItemTrait) {
        let methods = item.items.iter().filter_map(|item| match item {
            syn::TraitItem::Fn(method) => Some(method_descriptor(&method.sig)),
            _ => None,
        }).collect();
        let name = item.ident.to_string();
        if self.traits.insert(name.clone(), methods).is_some() {
            warn!(trait_name = %name, "stub trait declared twice, keeping the last one");
        }
    }
}

impl TypeSource for SourceTypes {
    fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    fn methods(&self, name: &str) -> Option<&[MethodDescriptor]> {
        self.traits.get(name).map(Vec::as_slice)
    }
}

fn method_descriptor(sig: &syn::Signature) -> MethodDescriptor {
    let args = sig.inputs.iter().enumerate().filter_map(|(index, arg)| match arg {
        syn::FnArg::Typed(arg) => {
            let name = match &*arg.pat {
                syn::Pat::Ident(pat) => unraw(&pat.ident),
                _ => format!("arg{}", index),
            };
            Some((name, TypeRef::from_type(&arg.ty)))
        },
        syn::FnArg::Receiver(_) => None,
    }).collect();
    MethodDescriptor { name: unraw(&sig.ident), args }
}

fn unraw(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(name) => name.to_string(),
        None => name,
    }
}


/// Composite type reachable from the service methods, with its own composite
/// fields.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct DiscoveredType {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// Build the field mapping of discovered types.
pub fn field_mapping(discovered: &[DiscoveredType]) -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for t in discovered {
        mapping.insert(t.name.clone(), t.fields.clone());
    }
    mapping
}


/// Positional argument of a method, as declared by its arguments structure.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct MethodArgument {
    pub name: String,
    pub ty: TypeRef,
}


/// Walks a service's types from its method signatures.
pub struct Introspector<'a, S: TypeSource> {
    source: &'a S,
    service: String,
}

impl<'a, S: TypeSource> Introspector<'a, S> {
    pub fn new<N: Into<String>>(source: &'a S, service: N) -> Self {
        Self { source, service: service.into() }
    }

    /// Name of the client trait of positional-style stubs.
    pub fn client_trait(&self) -> String {
        format!("T{}SyncClient", self.service)
    }

    /// Name of a method's arguments structure.
    pub fn args_struct(&self, method: &str) -> String {
        format!("{}{}Args", self.service, method.to_upper_camel_case())
    }

    /// Discover every composite type reachable from the client trait's
    /// method arguments, sorted by name.
    pub fn discover(&self) -> Result<Vec<DiscoveredType>> {
        let client_trait = self.client_trait();
        let methods = match self.source.methods(&client_trait) {
            Some(methods) => methods,
            None => return ErrorKind::Introspection.err(
                format!("service client trait `{}` not found", client_trait)),
        };

        let roots = methods.iter()
            .flat_map(|m| m.args.iter().map(|(_, ty)| ty.name.as_str()));
        let discovered = self.discover_from(roots);
        info!(service = %self.service, methods = methods.len(), types = discovered.len(),
              "composite types discovered");
        Ok(discovered)
    }

    /// Discover every composite type reachable from `roots`, sorted by name.
    /// Roots that are not composite types are ignored.
    pub fn discover_from<'r, I>(&self, roots: I) -> Vec<DiscoveredType>
        where I: IntoIterator<Item=&'r str>
    {
        let mut found = BTreeMap::new();
        for root in roots {
            self.find_item(root, &mut Vec::new(), &mut found);
        }
        found.into_iter().map(|(_, t)| t).collect()
    }

    fn find_item(&self, name: &str, path: &mut Vec<String>,
                 found: &mut BTreeMap<String, DiscoveredType>)
    {
        if found.contains_key(name) || !self.source.is_composite(name) {
            return;
        }
        if path.iter().any(|p| p == name) {
            debug!(type_name = name, "recursive type, discovery stops");
            return;
        }
        let descriptor = match self.source.lookup(name) {
            Some(descriptor) => descriptor,
            None => return,
        };

        path.push(name.to_string());
        let mut fields = Vec::new();
        for (field_name, ty) in descriptor.fields.iter() {
            if self.source.is_composite(&ty.name) {
                // keep wrappers as declared, they shape the constructor
                let field = FieldDecl { type_name: ty.name.clone(), ..FieldDecl::new(&ty.full, field_name.clone()) };
                fields.push(field);
                self.find_item(&ty.name, path, found);
            }
        }
        path.pop();

        found.insert(name.to_string(), DiscoveredType { name: name.to_string(), fields });
    }

    /// Return the declared fields of `method`'s arguments structure.
    pub fn method_arguments(&self, method: &str) -> Result<Vec<MethodArgument>> {
        let args_struct = self.args_struct(method);
        match self.source.lookup(&args_struct) {
            Some(t) if t.composite => Ok(t.fields.iter()
                .map(|(name, ty)| MethodArgument { name: name.clone(), ty: ty.clone() })
                .collect()),
            _ => ErrorKind::Introspection.err(
                format!("arguments structure `{}` of method `{}` not found", args_struct, method)),
        }
    }

    /// Return the positional call expressions of `method`, one per argument,
    /// each taking the decoded value as the argument's full type.
    pub fn argument_expressions(&self, method: &str) -> Result<Vec<String>> {
        Ok(self.method_arguments(method)?.iter().enumerate()
            .map(|(index, arg)| format!("params.take::<{}>({})?", arg.ty.full, index))
            .collect())
    }
}
