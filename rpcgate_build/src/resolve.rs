//! Expansion of composite types into nested constructor text.
use tracing::debug;

use crate::config::{FieldDecl, FieldMapping};
use crate::utils::to_snake_ident;


/// Nested composite value to construct: internal nodes are composite types
/// with named slots, scalar leaves are left to the request decoder.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct ParameterTree {
    pub type_name: String,
    /// Composite fields, in declaration order
    pub children: Vec<(FieldDecl, ParameterTree)>,
}

impl ParameterTree {
    pub fn leaf<S: Into<String>>(type_name: S) -> Self {
        Self { type_name: type_name.into(), children: Vec::new() }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Constructor fields, e.g. `x: Some(Box::new(A { ..Default::default() })),`
    /// for a field declared as `x: Option<Box<A>>`.
    pub fn fields_text(&self) -> String {
        let mut text = String::new();
        for (field, child) in self.children.iter() {
            text += &format!("{}: {},", field_ident(&field.field_name), field.wrap(&child.constructor_text()));
        }
        text
    }

    /// Full constructor of the value, e.g. `T { x: ..., ..Default::default() }`.
    pub fn constructor_text(&self) -> String {
        format!("{} {{ {}..Default::default() }}", self.type_name, self.fields_text())
    }
}

/// Field name as it is declared by stubs. Names that aren't identifiers are
/// kept as is and rejected when the fragment is parsed.
fn field_ident(field_name: &str) -> String {
    match to_snake_ident(field_name) {
        Ok(ident) => ident.to_string(),
        Err(_) => field_name.to_string(),
    }
}


/// Resolve composite types against a field mapping.
pub struct Resolver<'a> {
    mapping: &'a FieldMapping,
}

impl<'a> Resolver<'a> {
    pub fn new(mapping: &'a FieldMapping) -> Self {
        Self { mapping }
    }

    /// Return nested constructor fields of `type_name`; empty for types that
    /// are not in the mapping.
    pub fn resolve(&self, type_name: &str) -> String {
        self.tree(type_name).fields_text()
    }

    /// Return the parameter tree of `type_name`.
    pub fn tree(&self, type_name: &str) -> ParameterTree {
        self.expand(type_name, &mut Vec::new())
    }

    /// Return one tree per positional argument type, in order.
    pub fn argument_trees<'t, I>(&self, type_names: I) -> Vec<ParameterTree>
        where I: IntoIterator<Item=&'t str>
    {
        type_names.into_iter().map(|type_name| self.tree(type_name)).collect()
    }

    /// Expand `type_name`; `path` holds the types being expanded above it, a
    /// type already on it is returned as a leaf.
    fn expand<'s>(&'s self, type_name: &'s str, path: &mut Vec<&'s str>) -> ParameterTree {
        let mut tree = ParameterTree::leaf(type_name);
        let fields = match self.mapping.get(type_name) {
            Some(fields) => fields,
            None => return tree,
        };
        if path.contains(&type_name) {
            debug!(type_name, path = ?path, "recursive type, expansion stops");
            return tree;
        }

        path.push(type_name);
        for field in fields.iter().filter(|f| self.mapping.contains(&f.type_name)) {
            let child = self.expand(&field.type_name, path);
            tree.children.push((field.clone(), child));
        }
        path.pop();
        tree
    }
}
