//! Template interpolation for configuration values
//!
//! String values in fragments may contain template expressions such as
//! `{{ build_name }}` or `{{ user.region }}`. They are rendered once, while
//! decoding, against an [`InterpolationContext`]. The engine sits behind the
//! [`Render`] trait; [`TeraRenderer`] is the default.

mod context;

pub use context::InterpolationContext;

use serde_json::{Map, Value};
use tera::Tera;
use tracing::trace;

use crate::decode::Schema;
use crate::error::{ConfigError, InterpolationError};

/// Renders a template string against an interpolation context
pub trait Render: Send + Sync {
    fn render(&self, template: &str, ctx: &InterpolationContext) -> Result<String, InterpolationError>;
}

/// [`Render`] implementation backed by Tera
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl Render for TeraRenderer {
    fn render(&self, template: &str, ctx: &InterpolationContext) -> Result<String, InterpolationError> {
        if !has_template(template) {
            return Ok(template.to_string());
        }

        Tera::one_off(template, &ctx.to_tera_context(), false)
            .map_err(|e| InterpolationError::new(error_chain(&e)))
    }
}

/// Whether a string contains template markup
pub fn has_template(s: &str) -> bool {
    s.contains("{{") || s.contains("{%")
}

/// Tera reports the useful detail in the source chain, not the top-level error
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Render every string in `values`, skipping keys the schema excludes.
///
/// A string that fails to render is left as it was and reported under its
/// dotted path (`run_tags.Name`, `security_group_ids[1]`).
pub(crate) fn render_tree(
    values: &mut Map<String, Value>,
    schema: &Schema,
    ctx: &InterpolationContext,
) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    for (key, value) in values.iter_mut() {
        if !schema.is_interpolated(key) {
            trace!("Skipping interpolation for {}", key);
            continue;
        }
        render_value(key.clone(), value, ctx, &mut errors);
    }
    errors
}

fn render_value(path: String, value: &mut Value, ctx: &InterpolationContext, errors: &mut Vec<ConfigError>) {
    match value {
        Value::String(s) if has_template(s) => match ctx.render(s) {
            Ok(rendered) => *s = rendered,
            Err(e) => errors.push(ConfigError::interpolation(path, e.message)),
        },
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                render_value(format!("{}[{}]", path, i), item, ctx, errors);
            }
        }
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                render_value(format!("{}.{}", path, k), v, ctx, errors);
            }
        }
        _ => {}
    }
}
