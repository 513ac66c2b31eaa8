use crate::canonical::canonicalize_template;
use crate::collect::collect_template;
use crate::config::Config;
use crate::error::{TemplateError, TransformError};
use crate::literal::literalize;
use std::collections::HashSet;
use std::sync::Arc;
use swc_core::{
    common::{SourceMapper, Span},
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};

// -----------------------------------------------------------------------------
// Rewrite actions
// -----------------------------------------------------------------------------

/// What the walker does with a node it has looked at.
#[derive(Debug)]
pub enum Rewrite<T> {
    Keep,
    Delete,
    Replace(T),
}

// -----------------------------------------------------------------------------
// Transform state
// -----------------------------------------------------------------------------

pub struct GraphqlTagTransform {
    config: Config,
    source_map: Option<Arc<dyn SourceMapper>>,

    // Local names bound to the tag in the current module, plus the configured identifiers.
    tags: HashSet<String>,

    error: Option<TemplateError>,
    inlined: usize,
}

impl GraphqlTagTransform {
    pub fn new(config: Config, source_map: Option<Arc<dyn SourceMapper>>) -> Self {
        let tags = config.tag_identifiers.iter().cloned().collect();
        Self {
            config,
            source_map,
            tags,
            error: None,
            inlined: 0,
        }
    }

    /// Rewrite `program`, or return the first error without any rewritten output.
    pub fn apply(&mut self, mut program: Program) -> Result<Program, TemplateError> {
        program.visit_mut_with(self);
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(program),
        }
    }

    /// Number of templates inlined so far.
    pub fn inlined(&self) -> usize {
        self.inlined
    }

    // ---------- helpers ----------

    fn span_file_lines(&self, s: Span) -> String {
        if s.is_dummy() {
            return "unknown:0-0".to_string();
        }
        if let Some(ref cm) = self.source_map {
            let lo = cm.lookup_char_pos(s.lo());
            let hi = cm.lookup_char_pos(s.hi());
            return format!(
                "{}:{}-{}",
                lo.file.name,
                lo.line,
                hi.line
            );
        }
        "unknown:0-0".to_string()
    }

    fn is_helper_import(&self, import: &ImportDecl) -> bool {
        !import.type_only && self.config.is_import_source(&import.src.value)
    }

    fn is_tag_specifier(&self, spec: &ImportSpecifier) -> bool {
        match spec {
            ImportSpecifier::Default(_) => true,
            ImportSpecifier::Named(named) => {
                if named.is_type_only {
                    return false;
                }
                let imported = match &named.imported {
                    Some(ModuleExportName::Ident(i)) => i.sym.to_string(),
                    Some(ModuleExportName::Str(s)) => s.value.to_string(),
                    None => named.local.sym.to_string(),
                };
                imported == "default" || self.config.is_tag_identifier(&imported)
            }
            ImportSpecifier::Namespace(_) => false,
        }
    }

    fn collect_tag_bindings(&mut self, items: &[ModuleItem]) {
        for item in items {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            if !self.is_helper_import(import) {
                continue;
            }
            for spec in &import.specifiers {
                if self.is_tag_specifier(spec) {
                    self.tags.insert(specifier_local(spec).to_string());
                }
            }
        }
    }

    fn is_tag(&self, tag: &Expr) -> bool {
        matches!(tag, Expr::Ident(i) if self.tags.contains(&*i.sym))
    }

    // ---------- rewrite decisions ----------

    fn rewrite_item(&self, item: &ModuleItem) -> Rewrite<ModuleItem> {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            return Rewrite::Keep;
        };
        if !self.is_helper_import(import) {
            return Rewrite::Keep;
        }

        let remaining: Vec<ImportSpecifier> = import
            .specifiers
            .iter()
            .filter(|spec| !self.is_tag_specifier(spec))
            .cloned()
            .collect();

        if remaining.is_empty() {
            tracing::debug!(
                source = %import.src.value,
                location = %self.span_file_lines(import.span),
                "removing graphql-tag import"
            );
            return Rewrite::Delete;
        }
        if remaining.len() == import.specifiers.len() {
            return Rewrite::Keep;
        }

        let mut trimmed = import.clone();
        trimmed.specifiers = remaining;
        Rewrite::Replace(ModuleItem::ModuleDecl(ModuleDecl::Import(trimmed)))
    }

    fn rewrite_expr(&self, expr: &Expr) -> Result<Rewrite<Expr>, TemplateError> {
        let Expr::TaggedTpl(tagged) = expr else {
            return Ok(Rewrite::Keep);
        };
        if !self.is_tag(&tagged.tag) {
            return Ok(Rewrite::Keep);
        }

        let literal =
            inline_template(&tagged.tpl).map_err(|err| TemplateError::new(tagged.span, err))?;
        tracing::debug!(
            location = %self.span_file_lines(tagged.span),
            interpolations = tagged.tpl.exprs.len(),
            "inlined gql template"
        );
        Ok(Rewrite::Replace(*literal))
    }
}

fn specifier_local(spec: &ImportSpecifier) -> &str {
    match spec {
        ImportSpecifier::Named(named) => named.local.sym.as_ref(),
        ImportSpecifier::Default(def) => def.local.sym.as_ref(),
        ImportSpecifier::Namespace(ns) => ns.local.sym.as_ref(),
    }
}

/// Collect, canonicalize and literalize one template.
pub fn inline_template(tpl: &Tpl) -> Result<Box<Expr>, TransformError> {
    let source = collect_template(tpl)?;
    let signed = canonicalize_template(&source)?;
    tracing::trace!(signature = %signed.signature, "canonicalized gql document");
    literalize(signed, source.interpolations)
}

// -----------------------------------------------------------------------------
// Tree walk
// -----------------------------------------------------------------------------

impl VisitMut for GraphqlTagTransform {
    fn visit_mut_module(&mut self, m: &mut Module) {
        self.collect_tag_bindings(&m.body);
        m.visit_mut_children_with(self);
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        if self.error.is_some() {
            return;
        }
        let mut out = Vec::with_capacity(items.len());
        for mut item in items.drain(..) {
            match self.rewrite_item(&item) {
                Rewrite::Keep => {
                    item.visit_mut_with(self);
                    out.push(item);
                }
                Rewrite::Delete => {}
                Rewrite::Replace(trimmed) => out.push(trimmed),
            }
        }
        *items = out;
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if self.error.is_some() {
            return;
        }
        match self.rewrite_expr(expr) {
            Ok(Rewrite::Replace(literal)) => {
                *expr = literal;
                self.inlined += 1;
            }
            // Expressions are replaced, never deleted.
            Ok(Rewrite::Keep | Rewrite::Delete) => expr.visit_mut_children_with(self),
            Err(err) => self.error = Some(err),
        }
    }
}
