//! SWC plugin that inlines `graphql-tag` documents at build time.
//!
//! Every `` gql`...` `` template is parsed, signed and replaced by the object
//! literal `graphql-tag` would have produced at runtime, plus a `__signature__`
//! content hash. The `graphql-tag` import is dropped once it has no use left.

pub mod ast;
pub mod canonical;
pub mod collect;
pub mod config;
pub mod error;
pub mod literal;
pub mod transform;

pub use canonical::{canonical_form, canonicalize, canonicalize_template, signature, SignedDocument};
pub use collect::{collect_template, Interpolation, Slot, TemplateSource};
pub use config::{Config, PluginOptions};
pub use error::{ConfigError, TemplateError, TransformError};
pub use literal::{literalize, SIGNATURE_KEY};
pub use transform::{inline_template, GraphqlTagTransform, Rewrite};

use swc_core::{
    common::{errors::HANDLER, SourceMapper, DUMMY_SP},
    ecma::ast::Program,
    plugin::{plugin_transform, proxies::TransformPluginProgramMetadata},
};

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let config = match Config::from_json(
        &metadata
            .get_transform_plugin_config()
            .unwrap_or_else(|| "{}".to_string()),
    ) {
        Ok(config) => config,
        Err(err) => {
            report(DUMMY_SP, &err.to_string());
            return program;
        }
    };

    let source_map: Option<std::sync::Arc<dyn SourceMapper>> =
        Some(std::sync::Arc::new(metadata.source_map));

    let mut transform = GraphqlTagTransform::new(config, source_map);

    // Failures leave the module untouched; the reported error fails the build.
    let original = program.clone();
    match transform.apply(program) {
        Ok(program) => program,
        Err(err) => {
            tracing::error!("graphql-tag transform failed: {err}");
            report(err.span, &err.to_string());
            original
        }
    }
}

fn report(span: swc_core::common::Span, msg: &str) {
    HANDLER.with(|handler| handler.struct_span_err(span, msg).emit());
}
