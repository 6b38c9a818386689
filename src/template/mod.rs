//! HTML templates
//!
//! A `Template` is one file compiled into its own minijinja environment.
//! Files named `*.html`/`*.htm` are auto-escaped. Undefined variables are an
//! error at render time rather than silently empty output.

mod registrar;

pub use registrar::RegistrationReport;

use crate::error::RenderError;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub struct Template {
    env: Environment<'static>,
    name: String,
}

impl Template {
    /// Read and compile a template file. Syntax errors surface here.
    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let source = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_source(name, source)
    }

    pub fn from_source(name: String, source: String) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(name.clone(), source)?;
        Ok(Self { env, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<S: Serialize>(&self, data: S) -> Result<String, RenderError> {
        Ok(self.env.get_template(&self.name)?.render(data)?)
    }
}
