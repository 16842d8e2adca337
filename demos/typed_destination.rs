//! Resolving straight into a typed configuration struct.
//!
//! The struct implements [`Destination`], mapping field paths to its own
//! fields, so resolved values land in plain Rust types.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p flagset-demos --example typed_destination -- serve --port 9000 --host a,b
//! SERVE_TIMEOUT=2.5 cargo run -p flagset-demos --example typed_destination -- serve
//! cargo run -p flagset-demos --example typed_destination -- serve --port 70000
//! ```

use flagset_core::{
    Destination, FieldDescriptor, FieldPath, FieldsBuilder, FlagSet, Scalar, SetError, Value,
};
use flagset_demos::report_errors;

#[derive(Debug, Default)]
struct ServeConfig {
    port: u16,
    hosts: Vec<String>,
    timeout: f64,
}

#[derive(Debug, Default)]
struct Config {
    verbose: bool,
    serve: ServeConfig,
}

fn fields() -> Vec<FieldDescriptor> {
    FieldsBuilder::new()
        .value("Verbose", "bool", &[("short", "v")])
        .group("Serve", &[], |g| {
            g.value("Port", "uint", &[("short", "p"), ("long", "port"), ("default", "8080")])
                .value("Hosts", "[]string", &[("long", "host"), ("delimiter", ",")])
                .value("Timeout", "float64", &[("long", "timeout"), ("env", "SERVE_TIMEOUT"), ("default", "30")])
        })
        .build()
}

fn mismatch(expected: &str, value: &Value) -> SetError {
    SetError::TypeMismatch {
        expected: expected.to_string(),
        actual: value.to_string(),
    }
}

impl Destination for Config {
    fn set(&mut self, path: &FieldPath, value: &Value) -> Result<(), SetError> {
        match path.0.as_slice() {
            [0] => self.verbose = value.as_bool().ok_or_else(|| mismatch("bool", value))?,
            [1, 0] => {
                let port = value.as_u64().ok_or_else(|| mismatch("uint", value))?;
                self.serve.port = u16::try_from(port)
                    .map_err(|_| SetError::Other(format!("port {port} is out of range")))?;
            }
            [1, 1] => {
                let list = value.as_list().ok_or_else(|| mismatch("[]string", value))?;
                self.serve.hosts = list
                    .iter()
                    .map(|item| match item {
                        Scalar::Str(s) => Ok(s.clone()),
                        other => Err(mismatch("string", &Value::Scalar(other.clone()))),
                    })
                    .collect::<Result<_, _>>()?;
            }
            [1, 2] => self.serve.timeout = value.as_f64().ok_or_else(|| mismatch("float64", value))?,
            _ => return Err(SetError::UnknownPath(path.to_string())),
        }
        Ok(())
    }

    fn clear(&mut self, path: &FieldPath) -> Result<(), SetError> {
        match path.0.as_slice() {
            [0] => self.verbose = false,
            [1, 0] => self.serve.port = 0,
            [1, 1] => self.serve.hosts.clear(),
            [1, 2] => self.serve.timeout = 0.0,
            _ => return Err(SetError::UnknownPath(path.to_string())),
        }
        Ok(())
    }
}

fn main() {
    let fields = fields();
    let mut config = Config::default();

    let flags = match FlagSet::from_process(&fields, &mut config) {
        Ok(flags) => flags,
        Err(err) => {
            eprintln!("invalid declaration: {err}");
            std::process::exit(2);
        }
    };

    println!("{config:#?}");
    if report_errors(&flags) {
        std::process::exit(1);
    }
}
