//! Generation run: stub compilation, field mapping bootstrap and switcher.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{ErrorKind, Result};
use crate::command;
use crate::config::{Config, FieldMapping};
use crate::convention::Convention;
use crate::dispatch::Switcher;
use crate::introspect::{self, DiscoveredType, Introspector, SourceTypes};
use crate::method::Arguments;
use crate::utils::to_camel_ident;


/// Generates the gateway sources of a service under `{service_root}/gen`.
#[derive(Clone,Debug)]
pub struct Generator {
    pub convention: Convention,
    /// Directory holding the configuration and the IDL files
    pub service_root: PathBuf,
    /// Configuration file name, without `.yaml` extension
    pub config_name: String,
    /// Extra arguments passed to the stub compiler
    pub options: String,
    /// Run the stub compiler; when false, stubs must already be in place
    pub run_stub_compiler: bool,
    /// Run `rustfmt` on the generated switcher
    pub format: bool,
}

impl Generator {
    pub fn new<P: Into<PathBuf>>(convention: Convention, service_root: P) -> Self {
        Self {
            convention,
            service_root: service_root.into(),
            config_name: String::from("service"),
            options: String::new(),
            run_stub_compiler: true,
            format: false,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.service_root.join(format!("{}.yaml", self.config_name))
    }

    pub fn gen_dir(&self) -> PathBuf {
        self.service_root.join("gen")
    }

    /// Output directory of the stub compiler.
    pub fn stub_dir(&self) -> PathBuf {
        self.gen_dir().join(self.convention.stub_dir())
    }

    /// Run the whole generation, returning the switcher's path.
    pub fn generate(&self) -> Result<PathBuf> {
        let config = Config::load(self.config_path())?;
        ensure_dir(&self.stub_dir())?;

        let source = match self.convention {
            Convention::Grpc => self.generate_grpc(&config)?,
            Convention::Thrift => self.generate_thrift(&config)?,
        };

        let path = self.gen_dir().join(self.convention.switcher_file());
        write_file(&path, &source)?;
        if self.format {
            command::rustfmt(&path)?;
        }
        info!(path = %path.display(), "switcher written");
        Ok(path)
    }

    fn generate_grpc(&self, config: &Config) -> Result<String> {
        if self.run_stub_compiler {
            let stub_dir = self.stub_dir();
            let mut args = command::split_options(&self.options);
            args.push(format!("--prost_out={}", stub_dir.display()));
            args.push(format!("--tonic_out={}", stub_dir.display()));
            command::run("protoc", &args)?;
        }

        if !config.field_mapping.is_empty() {
            debug!(types = config.field_mapping.len(), "using configured field mapping");
            return Switcher::grpc(config)?.generate();
        }

        let source = SourceTypes::load_dir(self.stub_dir())?;
        let introspector = Introspector::new(&source, config.service_name());
        let requests = config.routes.method_names().iter()
            .map(|name| Ok(format!("{}Request", to_camel_ident(name)?)))
            .collect::<Result<Vec<_>>>()?;
        let discovered = introspector.discover_from(requests.iter().map(String::as_str));

        let config = self.bootstrap(config, &discovered)?;
        Switcher::grpc(&config)?.generate()
    }

    fn generate_thrift(&self, config: &Config) -> Result<String> {
        if self.run_stub_compiler {
            let idl = self.service_root.join(format!("{}.thrift", config.service_name().to_lowercase()));
            let mut args = command::split_options(&self.options);
            args.extend(["-r", "--gen", "rs", "-out"].iter().map(|s| s.to_string()));
            args.push(self.stub_dir().display().to_string());
            args.push(idl.display().to_string());
            command::run("thrift", &args)?;
        }

        let source = SourceTypes::load_dir(self.stub_dir())?;
        let introspector = Introspector::new(&source, config.service_name());
        let config = self.bootstrap(config, &introspector.discover()?)?;

        let mut arguments = BTreeMap::new();
        for name in config.routes.method_names() {
            let args = Arguments {
                args_struct: introspector.args_struct(&name),
                args: introspector.method_arguments(&name)?,
                expressions: introspector.argument_expressions(&name)?,
            };
            debug!(method = %name, args = args.args.len(), "method arguments");
            arguments.insert(name, args);
        }
        Switcher::thrift(&config, arguments)?.generate()
    }

    /// Write the field mapping of discovered types to `gen/`, and return the
    /// configuration using it as read back from disk.
    fn bootstrap(&self, config: &Config, discovered: &[DiscoveredType]) -> Result<Config> {
        let path = self.gen_dir().join(self.convention.fields_file());
        write_file(&path, &introspect::field_mapping(discovered).to_document()?)?;
        info!(path = %path.display(), types = discovered.len(), "field mapping written");

        Ok(config.with_field_mapping(FieldMapping::load(&path)?))
    }
}


/// Create directory and its parents when missing.
fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .or_else(|err| ErrorKind::Io.err(format!("can't create {}: {}", path.display(), err)))
}

/// Create or truncate file with content.
fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .or_else(|err| ErrorKind::Io.err(format!("can't write {}: {}", path.display(), err)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::tests::STUBS;

    const THRIFT_CONFIG: &str = "
config:
  service_name: Calculator
urlmapping:
  - route: GET /add
    service: Calculator
    method: add
  - route: POST /calculate
    service: Calculator
    method: calculate
";

    const GRPC_CONFIG: &str = "
config:
  service_name: YourService
urlmapping:
  - route: GET /hello
    service: YourService
    method: SayHello
";

    const PROST_STUBS: &str = "
        pub struct SayHelloRequest {
            pub your_name: String,
            pub values: Option<CommonValues>,
        }
        pub struct CommonValues {
            pub some_id: i64,
        }
        pub struct SayHelloResponse {
            pub message: String,
        }
    ";

    fn service_root(config: &str, stubs: Option<(&str, &str)>) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("service.yaml"), config).unwrap();
        if let Some((dir, source)) = stubs {
            let dir = root.path().join("gen").join(dir);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("stubs.rs"), source).unwrap();
        }
        root
    }

    fn generator(convention: Convention, root: &Path) -> Generator {
        Generator { run_stub_compiler: false, ..Generator::new(convention, root) }
    }

    #[test]
    fn test_thrift_pipeline() {
        let root = service_root(THRIFT_CONFIG, Some(("thrift", STUBS)));
        let generator = generator(Convention::Thrift, root.path());
        let path = generator.generate().unwrap();
        assert_eq!(path, root.path().join("gen/thriftswitcher.rs"));

        let fields = FieldMapping::load(root.path().join("gen/thriftfields.yaml")).unwrap();
        assert_eq!(fields.type_names().collect::<Vec<_>>(), vec!["Operand", "Work"]);

        let source = fs::read_to_string(&path).unwrap();
        assert!(syn::parse_file(&source).is_ok());
        let compact = source.replace(' ', "");
        assert!(compact.contains("fnthrift_switcher"));
        assert!(compact.contains("\"Work\"=>"));
        assert!(compact.contains("client.add(params.take::<i32>(0)?,params.take::<i32>(1)?)"));

        generator.generate().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn test_thrift_missing_stubs() {
        let root = service_root(THRIFT_CONFIG, None);
        let err = generator(Convention::Thrift, root.path()).generate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Introspection);
        assert!(root.path().join("gen/thrift").is_dir());
    }

    #[test]
    fn test_thrift_unknown_method() {
        let config = format!("{}  - route: GET /divide\n    service: Calculator\n    method: divide\n",
                             THRIFT_CONFIG);
        let root = service_root(&config, Some(("thrift", STUBS)));
        let err = generator(Convention::Thrift, root.path()).generate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Introspection);
        assert!(!root.path().join("gen/thriftswitcher.rs").exists());
    }

    #[test]
    fn test_grpc_configured_mapping() {
        let config = format!("{}fieldmapping:\n  - SayHelloRequest[Option<CommonValues> values]\n  - CommonValues[]\n",
                             GRPC_CONFIG);
        let root = service_root(&config, None);
        let path = generator(Convention::Grpc, root.path()).generate().unwrap();

        let source = fs::read_to_string(&path).unwrap();
        assert!(source.replace(' ', "").contains("values:Some(CommonValues{"));
        assert!(!root.path().join("gen/grpcfields.yaml").exists());
    }

    #[test]
    fn test_grpc_bootstrap() {
        let root = service_root(GRPC_CONFIG, Some(("proto", PROST_STUBS)));
        let path = generator(Convention::Grpc, root.path()).generate().unwrap();

        let fields = FieldMapping::load(root.path().join("gen/grpcfields.yaml")).unwrap();
        assert_eq!(fields.to_lines(), vec!["CommonValues[]", "SayHelloRequest[Option<CommonValues> values]"]);

        let source = fs::read_to_string(&path).unwrap();
        assert!(syn::parse_file(&source).is_ok());
        assert!(source.replace(' ', "").contains(
            "SayHelloRequest{values:Some(CommonValues{..Default::default()}),..Default::default()}"));
    }

    #[test]
    fn test_missing_config() {
        let root = tempfile::tempdir().unwrap();
        let err = generator(Convention::Grpc, root.path()).generate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(!root.path().join("gen").exists());
    }

    #[test]
    fn test_stub_compiler_failure() {
        let root = service_root(THRIFT_CONFIG, Some(("thrift", STUBS)));
        let generator = Generator {
            options: String::from("--rpcgate-no-such-option"),
            ..Generator::new(Convention::Thrift, root.path())
        };
        assert_eq!(generator.generate().unwrap_err().kind, ErrorKind::Command);
    }

    #[test]
    fn test_ensure_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("gen/proto");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
