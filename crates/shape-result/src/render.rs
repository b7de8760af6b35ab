//! Rendering seam.
//!
//! Plotting backends implement [`Renderer`] for the shapes they can draw.
//! Nothing here draws anything itself.

use polars::prelude::DataFrame;

use crate::error::{Result, ShapeError};
use crate::registry::PASSTHROUGH;
use crate::result::{RenderHints, ShapeResult};

/// Everything a renderer gets for one shape binding.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub shape: &'a str,
    pub data: &'a DataFrame,
    pub hints: &'a RenderHints,
}

/// A plotting backend.
pub trait Renderer {
    type Output;

    fn name(&self) -> &str;

    /// Whether this renderer can draw `shape`.
    fn supports(&self, shape: &str) -> bool;

    fn render(&self, request: RenderRequest<'_>) -> Result<Self::Output>;
}

/// Output for one binding.
#[derive(Debug)]
pub enum Rendered<T> {
    Output(T),
    /// Passthrough data, handed back as is.
    Data(DataFrame),
}

/// One request per non-passthrough binding, in binding order.
pub fn render_requests(result: &ShapeResult) -> Vec<RenderRequest<'_>> {
    result
        .bindings()
        .iter()
        .filter(|b| b.shape != PASSTHROUGH)
        .map(|b| RenderRequest {
            shape: &b.shape,
            data: &b.data,
            hints: result.hints(),
        })
        .collect()
}

/// Render every binding of `result`.
///
/// Support is checked for all bindings before any rendering starts.
/// Passthrough bindings are never sent to the renderer.
pub fn render_all<R: Renderer>(renderer: &R, result: &ShapeResult) -> Result<Vec<(String, Rendered<R::Output>)>> {
    if let Some(request) = render_requests(result)
        .into_iter()
        .find(|r| !renderer.supports(r.shape))
    {
        return Err(ShapeError::UnsupportedShape {
            shape: request.shape.to_string(),
            renderer: renderer.name().to_string(),
        });
    }

    let mut rendered = Vec::with_capacity(result.bindings().len());
    for binding in result.bindings() {
        let output = if binding.shape == PASSTHROUGH {
            Rendered::Data(binding.data.clone())
        } else {
            Rendered::Output(renderer.render(RenderRequest {
                shape: &binding.shape,
                data: &binding.data,
                hints: result.hints(),
            })?)
        };
        rendered.push((binding.shape.clone(), output));
    }
    Ok(rendered)
}
