//! # Composition
//!
//! Meta-manipulator that runs a list of other manipulators through the
//! registry, one after the other.
//!
//! ## Step Parameters
//!
//! Each step only sees the keys prefixed with its own name, prefix stripped:
//! `crater.depth=9` reaches `crater` as `depth=9`. Top-level keys are never
//! passed down.
//!
//! ## Failure Handling
//!
//! A failing step is logged and counted; later steps still run. The call
//! itself only fails when no step list can be resolved.

use flatland_core::{FlatError, FlatResult};

use crate::params::Params;
use crate::registry::{Manipulator, ManipulatorContext};

const COMPOSITION: &str = "composition";

/// Built-in presets, in execution order.
pub const PRESETS: &[(&str, &[&str])] = &[
    ("volcanic-island", &["islands", "crater", "sharp-peak", "water-soften"]),
    ("mountain-range", &["hilly", "mountain", "soften", "border-smooth"]),
    ("archipelago", &["islands", "roughen", "water-soften"]),
    ("lake-land", &["normal", "lakes", "soften-raster", "border-smooth"]),
];

/// Resolves the step list from `preset` or `steps`.
///
/// A named preset ignores `steps`. Without a preset, or with
/// `preset=custom`, `steps` is a comma separated list; blank entries are
/// dropped.
///
/// # Errors
///
/// Returns [`FlatError::InvalidArgument`] for an unknown preset or an empty
/// custom list.
pub fn resolve_steps(params: &Params) -> FlatResult<Vec<String>> {
    let preset = params.choice_or("preset", "custom");
    if preset != "custom" {
        return PRESETS
            .iter()
            .find(|(name, _)| *name == preset)
            .map(|(_, steps)| steps.iter().map(|s| (*s).to_string()).collect())
            .ok_or_else(|| {
                let known: Vec<_> = PRESETS.iter().map(|(name, _)| *name).collect();
                FlatError::invalid(format!(
                    "unknown preset '{preset}', known presets: custom, {}",
                    known.join(", ")
                ))
            });
    }

    let steps: Vec<String> = params
        .get("steps")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if steps.is_empty() {
        return Err(FlatError::invalid("custom composition requires a non-empty 'steps' list"));
    }
    Ok(steps)
}

/// `composition`
///
/// | Param | Default | Meaning |
/// |-------|---------|---------|
/// | `preset` | `custom` | preset name, see [`PRESETS`] |
/// | `steps` | none | comma separated names, required for `custom` |
/// | `<step>.<key>` | none | `key` passed to `step` |
pub struct Composition;

impl Manipulator for Composition {
    fn name(&self) -> &str {
        COMPOSITION
    }

    fn apply(&self, ctx: &mut ManipulatorContext<'_>, params: &Params) -> FlatResult<String> {
        let steps = resolve_steps(params)?;
        let registry = ctx.registry();
        let region = ctx.region;

        let mut succeeded = 0;
        let mut failed = 0;
        for step in &steps {
            if step == COMPOSITION {
                tracing::warn!("nested composition step skipped");
                failed += 1;
                continue;
            }
            let scoped = params.scoped(step);
            match registry.execute(step, &mut *ctx.flat, region, &scoped) {
                Ok(summary) => {
                    tracing::debug!(step = %step, %summary, "composition step done");
                    succeeded += 1;
                }
                Err(err) => {
                    tracing::warn!(step = %step, error = %err, "composition step failed, continuing");
                    failed += 1;
                }
            }
        }
        Ok(format!(
            "{} steps: {succeeded} succeeded, {failed} failed",
            steps.len()
        ))
    }
}
