//! Interpolation context
//!
//! Holds the values template expressions may reference while a configuration
//! is resolved. Constructed once per build invocation and never mutated
//! afterwards, so it can be shared between parallel resolutions.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tera::Context;
use uuid::{NoContext, Timestamp, Uuid};

use super::{Render, TeraRenderer};
use crate::error::InterpolationError;

/// Values available to template expressions
#[derive(Clone)]
pub struct InterpolationContext {
    /// Logical name of the build (`packer_build_name` in templates)
    pub build_name: String,
    /// Builder type the configuration belongs to, e.g. `amazon-ebs`
    pub builder_type: String,
    /// Start of the build invocation; every timestamp-derived default uses it
    pub init_time: DateTime<Utc>,
    /// User variables, exposed as `user.<name>`
    pub user_variables: BTreeMap<String, String>,
    /// Directory of the template being built, if it came from a file
    pub template_dir: Option<Utf8PathBuf>,
    renderer: Arc<dyn Render>,
}

impl InterpolationContext {
    /// Create a context stamped with the current time
    pub fn new(build_name: impl Into<String>, builder_type: impl Into<String>) -> Self {
        Self::at(build_name, builder_type, Utc::now())
    }

    /// Create a context with an explicit start time
    pub fn at(
        build_name: impl Into<String>,
        builder_type: impl Into<String>,
        init_time: DateTime<Utc>,
    ) -> Self {
        Self {
            build_name: build_name.into(),
            builder_type: builder_type.into(),
            init_time,
            user_variables: BTreeMap::new(),
            template_dir: None,
            renderer: Arc::new(TeraRenderer),
        }
    }

    pub fn with_user_variables(mut self, vars: BTreeMap<String, String>) -> Self {
        self.user_variables = vars;
        self
    }

    pub fn with_user_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_variables.insert(key.into(), value.into());
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Swap the template engine
    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Same context for a different builder type
    pub fn for_builder(&self, builder_type: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.builder_type = builder_type.into();
        ctx
    }

    /// Unix timestamp of the build start
    pub fn timestamp(&self) -> i64 {
        self.init_time.timestamp()
    }

    /// Render a template string against this context
    pub fn render(&self, template: &str) -> Result<String, InterpolationError> {
        self.renderer.render(template, self)
    }

    /// A UUID whose leading bits come from the build start time.
    ///
    /// Names built from it sort by build and stay unique across parallel
    /// builds started in the same millisecond.
    pub fn time_ordered_uuid(&self) -> Uuid {
        let secs = u64::try_from(self.init_time.timestamp()).unwrap_or(0);
        let ts = Timestamp::from_unix(NoContext, secs, self.init_time.timestamp_subsec_nanos());
        Uuid::new_v7(ts)
    }

    /// Convert to Tera context for template rendering
    pub fn to_tera_context(&self) -> Context {
        let template_dir = self
            .template_dir
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();

        let mut context = Context::new();
        context.insert("build_name", &self.build_name);
        context.insert("builder_type", &self.builder_type);
        context.insert("timestamp", &self.timestamp());
        context.insert("isotime", &self.init_time.to_rfc3339());
        context.insert("user", &self.user_variables);
        context.insert("template_dir", &template_dir);
        context
    }
}

impl fmt::Debug for InterpolationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolationContext")
            .field("build_name", &self.build_name)
            .field("builder_type", &self.builder_type)
            .field("init_time", &self.init_time)
            .field("user_variables", &self.user_variables)
            .field("template_dir", &self.template_dir)
            .finish_non_exhaustive()
    }
}
