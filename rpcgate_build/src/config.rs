//! Service configuration: route table and field mapping.
//!
//! ```yaml
//! config:
//!   service_name: Calculator
//! urlmapping:
//!   - route: GET /add
//!     service: Calculator
//!     method: add
//! fieldmapping:
//!   - Work[Option<Box<Operand>> left,Option<Operand> right]
//!   - Operand[]
//! ```
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::ErrorKind as IoErrorKind,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{ErrorKind, Result};


/// Smart pointer or option a composite field is declared in, e.g. `Option`
/// and `Box` for `Option<Box<T>>`.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Wrapper {
    Option,
    Box,
    Rc,
    Arc,
}

impl Wrapper {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Option" => Some(Wrapper::Option),
            "Box" => Some(Wrapper::Box),
            "Rc" => Some(Wrapper::Rc),
            "Arc" => Some(Wrapper::Arc),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Wrapper::Option => "Option",
            Wrapper::Box => "Box",
            Wrapper::Rc => "Rc",
            Wrapper::Arc => "Arc",
        }
    }

    /// Return the expression wrapping `value`.
    pub fn wrap(&self, value: &str) -> String {
        match self {
            Wrapper::Option => format!("Some({})", value),
            Wrapper::Box => format!("Box::new({})", value),
            Wrapper::Rc => format!("::std::rc::Rc::new({})", value),
            Wrapper::Arc => format!("::std::sync::Arc::new({})", value),
        }
    }
}

/// Strip the module path of a type, keeping its generic arguments.
fn last_segment(path: &str) -> &str {
    let head = match path.find('<') {
        Some(index) => &path[..index],
        None => path,
    };
    match head.rfind("::") {
        Some(index) => path[index+2..].trim(),
        None => path.trim(),
    }
}


/// One field of a composite type.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct FieldDecl {
    /// Field type once wrappers and path are peeled off
    pub type_name: String,
    pub field_name: String,
    /// Wrappers around the type, outermost first
    pub wrappers: Vec<Wrapper>,
}

impl FieldDecl {
    /// Field declared as `field_type`, e.g. `Operand` for a required field or
    /// `Option<Box<Operand>>` for an optional boxed one.
    pub fn new<T: AsRef<str>, F: Into<String>>(field_type: T, field_name: F) -> Self {
        let mut wrappers = Vec::new();
        let mut rest = field_type.as_ref().trim();
        while let (Some(index), true) = (rest.find('<'), rest.ends_with('>')) {
            match Wrapper::from_name(last_segment(&rest[..index])) {
                Some(wrapper) => wrappers.push(wrapper),
                None => break,
            }
            rest = rest[index+1..rest.len()-1].trim();
        }
        Self { type_name: last_segment(rest).to_string(), field_name: field_name.into(), wrappers }
    }

    /// Field type as written in the field-mapping document.
    pub fn field_type(&self) -> String {
        self.wrappers.iter().rev().fold(self.type_name.clone(), |inner, wrapper| {
            format!("{}<{}>", wrapper.name(), inner)
        })
    }

    /// Return the expression of this field holding `value`.
    pub fn wrap(&self, value: &str) -> String {
        self.wrappers.iter().rev().fold(value.to_string(), |inner, wrapper| wrapper.wrap(&inner))
    }
}


/// Composite type name to its ordered fields.
///
/// Only composite fields matter for construction; a field whose type is not a
/// key of the mapping is a scalar leaf.
#[derive(Clone,Debug,Default,PartialEq,Eq)]
pub struct FieldMapping {
    types: BTreeMap<String, Vec<FieldDecl>>,
}

/// On-disk field-mapping document, as written by the stub introspection.
#[derive(Default,Deserialize,Serialize)]
struct FieldMappingDocument {
    #[serde(default)]
    fieldmapping: Vec<Option<String>>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the fields of a type, returning the previous ones.
    pub fn insert<S: Into<String>>(&mut self, type_name: S, fields: Vec<FieldDecl>)
        -> Option<Vec<FieldDecl>>
    {
        self.types.insert(type_name.into(), fields)
    }

    pub fn get(&self, type_name: &str) -> Option<&[FieldDecl]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Composite type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item=&str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Read mapping from lines formatted as `TypeName[FieldType field,...]`,
    /// field types being declared ones (`Operand`, `Option<Box<Operand>>`).
    ///
    /// Blank lines are skipped. Malformed lines or field slots are skipped
    /// with a warning, and a repeated type replaces the earlier entry.
    pub fn from_lines<I, S>(lines: I) -> Self
        where I: IntoIterator<Item=S>, S: AsRef<str>
    {
        let mut this = Self::new();
        for line in lines {
            if let Some((type_name, fields)) = parse_line(line.as_ref()) {
                if this.insert(type_name.clone(), fields).is_some() {
                    warn!(type_name = %type_name, "duplicate field mapping entry, keeping the last one");
                }
            }
        }
        this
    }

    /// Render one line per type, sorted by type name.
    pub fn to_lines(&self) -> Vec<String> {
        self.types.iter().map(|(type_name, fields)| {
            let fields = fields.iter()
                .map(|f| format!("{} {}", f.field_type(), f.field_name))
                .collect::<Vec<_>>();
            format!("{}[{}]", type_name, fields.join(","))
        }).collect()
    }

    /// Parse a field-mapping document.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: FieldMappingDocument = serde_yaml::from_str(text)?;
        Ok(Self::from_lines(doc.fieldmapping.iter().flatten()))
    }

    /// Render the field-mapping document.
    pub fn to_document(&self) -> Result<String> {
        let doc = FieldMappingDocument {
            fieldmapping: self.to_lines().into_iter().map(Some).collect(),
        };
        Ok(serde_yaml::to_string(&doc)?)
    }

    /// Load a field-mapping document from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let this = Self::parse(&read_file(path)?)?;
        debug!(path = %path.display(), types = this.len(), "field mapping loaded");
        Ok(this)
    }
}

/// Parse one field mapping line; `None` for blank or malformed lines.
fn parse_line(line: &str) -> Option<(String, Vec<FieldDecl>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (type_name, rest) = match line.find('[') {
        Some(index) if line.ends_with(']') => (line[..index].trim(), &line[index+1..line.len()-1]),
        _ => {
            warn!(line, "malformed field mapping line, expected `TypeName[FieldType field,...]`");
            return None;
        }
    };
    if type_name.is_empty() || type_name.contains(char::is_whitespace) {
        warn!(line, "malformed field mapping type name");
        return None;
    }

    let mut fields = Vec::new();
    for slot in rest.split(',') {
        let tokens = slot.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => (),
            [type_name, field_name] => fields.push(FieldDecl::new(*type_name, *field_name)),
            _ => warn!(line, slot, "malformed field mapping slot, expected `FieldType field`"),
        }
    }
    Some((type_name.to_string(), fields))
}

fn read_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == IoErrorKind::NotFound
            => ErrorKind::Config.err(format!("{} not found", path.display())),
        Err(err) => ErrorKind::Config.err(format!("{}: {}", path.display(), err)),
    }
}


/// Route to a service's method.
#[derive(Clone,Debug,PartialEq,Eq,Deserialize,Serialize)]
pub struct MethodRoute {
    /// HTTP route pattern, e.g. `GET /hello`
    pub route: String,
    pub service: String,
    pub method: String,
}

impl MethodRoute {
    pub fn new<R, S, M>(route: R, service: S, method: M) -> Self
        where R: Into<String>, S: Into<String>, M: Into<String>
    {
        Self { route: route.into(), service: service.into(), method: method.into() }
    }
}


/// Ordered list of routes.
#[derive(Clone,Debug,Default,PartialEq,Eq)]
pub struct RouteTable {
    pub routes: Vec<MethodRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<MethodRoute>) -> Self {
        Self { routes }
    }

    /// Distinct method names across all routes, sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.routes.iter()
            .map(|r| r.method.clone())
            .collect::<BTreeSet<_>>()
            .into_iter().collect()
    }
}


/// `config` section of the service configuration.
#[derive(Clone,Debug,Default,PartialEq,Eq,Deserialize,Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, as known by the stub compiler
    pub service_name: String,
    /// Module path of the generated stubs, relative to the switcher
    pub stub_path: Option<String>,
    /// Type of the RPC client handed out by the server runtime
    pub client_type: Option<String>,
    /// Path of the runtime crate in the generated code
    pub runtime_path: Option<String>,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    config: ServiceConfig,
    #[serde(default)]
    urlmapping: Vec<MethodRoute>,
    #[serde(default)]
    fieldmapping: Vec<Option<String>>,
}


/// Configuration of one generation run. It is never mutated: the field
/// mapping bootstrap builds a new value with `with_field_mapping`.
#[derive(Clone,Debug,Default,PartialEq,Eq)]
pub struct Config {
    pub service: ServiceConfig,
    pub routes: RouteTable,
    pub field_mapping: FieldMapping,
}

impl Config {
    /// Parse configuration document.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: ConfigDocument = serde_yaml::from_str(text)?;
        if doc.config.service_name.trim().is_empty() {
            return ErrorKind::Parse.err("missing `config.service_name`");
        }

        Ok(Self {
            service: doc.config,
            routes: RouteTable::new(doc.urlmapping),
            field_mapping: FieldMapping::from_lines(doc.fieldmapping.iter().flatten()),
        })
    }

    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let this = Self::parse(&read_file(path)?)?;
        info!(path = %path.display(), service = %this.service.service_name,
              routes = this.routes.routes.len(), types = this.field_mapping.len(),
              "configuration loaded");
        Ok(this)
    }

    /// Return a copy using provided field mapping.
    pub fn with_field_mapping(&self, field_mapping: FieldMapping) -> Self {
        Self { field_mapping, ..self.clone() }
    }

    pub fn service_name(&self) -> &str {
        &self.service.service_name
    }
}


#[cfg(test)]
pub mod tests {
    use super::*;

    pub const CONFIG: &str = "
config:
  service_name: Calculator
urlmapping:
  - route: GET /add
    service: Calculator
    method: add
  - route: POST /calculate
    service: Calculator
    method: calculate
  - route: GET /add/{num1}
    service: Calculator
    method: add
fieldmapping:
  - Work[Option<Box<Operand>> left,Option<Operand> right,i32 logid]
  -
  - '   '
  - Operand[]
";

    #[test]
    fn test_parse_config() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.service_name(), "Calculator");
        assert_eq!(config.routes.routes.len(), 3);
        assert_eq!(config.routes.routes[1], MethodRoute::new("POST /calculate", "Calculator", "calculate"));
        assert_eq!(config.field_mapping.len(), 2);
        assert_eq!(config.field_mapping.get("Work").unwrap(), &[
            FieldDecl::new("Option<Box<Operand>>", "left"),
            FieldDecl::new("Option<Operand>", "right"),
            FieldDecl::new("i32", "logid"),
        ][..]);
        assert!(config.field_mapping.get("Operand").unwrap().is_empty());
    }

    #[test]
    fn test_missing_service_name() {
        let err = Config::parse("urlmapping: []").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_malformed_document() {
        let err = Config::parse("config: [unclosed").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("service.yaml")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn test_method_names() {
        let routes = RouteTable::new(vec![
            MethodRoute::new("r1", "S", "Get"),
            MethodRoute::new("r2", "S", "Get"),
            MethodRoute::new("r3", "S", "List"),
        ]);
        assert_eq!(routes.method_names(), vec!["Get", "List"]);

        let mut reversed = routes.clone();
        reversed.routes.reverse();
        assert_eq!(reversed.method_names(), routes.method_names());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mapping = FieldMapping::from_lines(vec!["", "   ", "\t", "A[B b]"]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("A").unwrap(), &[FieldDecl::new("B", "b")][..]);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mapping = FieldMapping::from_lines(vec![
            "NoBrackets", "[B b]", "A[B b, , C, D d extra,E e,]",
        ]);
        assert_eq!(mapping.type_names().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(mapping.get("A").unwrap(), &[FieldDecl::new("B", "b"), FieldDecl::new("E", "e")][..]);
    }

    #[test]
    fn test_duplicate_last_wins() {
        let mapping = FieldMapping::from_lines(vec!["A[B b]", "A[C c]"]);
        assert_eq!(mapping.get("A").unwrap(), &[FieldDecl::new("C", "c")][..]);
    }

    #[test]
    fn test_field_types() {
        let field = FieldDecl::new("Option<Box<super::Operand>>", "left");
        assert_eq!(field.type_name, "Operand");
        assert_eq!(field.wrappers, vec![Wrapper::Option, Wrapper::Box]);
        assert_eq!(field.field_type(), "Option<Box<Operand>>");
        assert_eq!(field.wrap("v"), "Some(Box::new(v))");

        let field = FieldDecl::new("Operand", "right");
        assert!(field.wrappers.is_empty());
        assert_eq!(field.wrap("v"), "v");

        let field = FieldDecl::new("std::sync::Arc<Node>", "next");
        assert_eq!(field.wrap("v"), "::std::sync::Arc::new(v)");

        let field = FieldDecl::new("Option<Vec<Operand>>", "all");
        assert_eq!(field.wrappers, vec![Wrapper::Option]);
        assert_eq!(field.type_name, "Vec<Operand>");
    }

    #[test]
    fn test_document() {
        let mapping = FieldMapping::from_lines(vec![
            "Work[Option<Box<Operand>> left,Option<Operand> right,Operand base]", "Operand[]",
        ]);
        assert_eq!(mapping.to_lines()[1], "Work[Option<Box<Operand>> left,Option<Operand> right,Operand base]");
        let doc = mapping.to_document().unwrap();
        assert_eq!(FieldMapping::parse(&doc).unwrap(), mapping);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.yaml");
        fs::write(&path, &doc).unwrap();
        assert_eq!(FieldMapping::load(&path).unwrap(), mapping);
    }

    #[test]
    fn test_with_field_mapping() {
        let config = Config::parse(CONFIG).unwrap();
        let other = config.with_field_mapping(FieldMapping::from_lines(vec!["A[]"]));
        assert_eq!(other.routes, config.routes);
        assert!(other.field_mapping.contains("A"));
        assert!(!config.field_mapping.contains("A"));
    }
}
