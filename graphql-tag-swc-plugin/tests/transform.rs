use graphql_tag_swc_plugin::{
    ast, canonical_form, signature, Config, GraphqlTagTransform, PluginOptions, TemplateError,
    TransformError, SIGNATURE_KEY,
};
use swc_core::common::{sync::Lrc, FileName, SourceMap};
use swc_core::ecma::ast::*;
use swc_core::ecma::parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_module(source: &str) -> Module {
    let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let fm = cm.new_source_file(
        FileName::Custom("input.js".into()).into(),
        source.to_string(),
    );
    let lexer = Lexer::new(
        Syntax::Es(EsSyntax::default()),
        EsVersion::latest(),
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    parser
        .parse_module()
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e:?}"))
}

fn run_with(config: Config, source: &str) -> Result<Module, TemplateError> {
    let program = Program::Module(parse_module(source));
    let mut transform = GraphqlTagTransform::new(config, None);
    match transform.apply(program)? {
        Program::Module(m) => Ok(m),
        Program::Script(_) => panic!("module turned into a script"),
    }
}

fn run(source: &str) -> Result<Module, TemplateError> {
    run_with(Config::from_options(PluginOptions::default()).unwrap(), source)
}

fn imports(module: &Module) -> Vec<&ImportDecl> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(import),
            _ => None,
        })
        .collect()
}

fn default_export(module: &Module) -> &Expr {
    module
        .body
        .iter()
        .find_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(e)) => Some(&*e.expr),
            _ => None,
        })
        .expect("no default export")
}

fn const_init<'a>(module: &'a Module, name: &str) -> &'a Expr {
    module
        .body
        .iter()
        .find_map(|item| {
            let decl = match item {
                ModuleItem::Stmt(Stmt::Decl(Decl::Var(v))) => v,
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                    decl: Decl::Var(v),
                    ..
                })) => v,
                _ => return None,
            };
            decl.decls.iter().find_map(|d| match &d.name {
                Pat::Ident(id) if &*id.id.sym == name => d.init.as_deref(),
                _ => None,
            })
        })
        .unwrap_or_else(|| panic!("no const `{name}`"))
}

fn get<'a>(expr: &'a Expr, key: &str) -> &'a Expr {
    let Expr::Object(obj) = expr else {
        panic!("expected object literal, got {expr:?}");
    };
    obj.props
        .iter()
        .find_map(|p| match p {
            PropOrSpread::Prop(p) => match &**p {
                Prop::KeyValue(kv) => match &kv.key {
                    PropName::Ident(k) if &*k.sym == key => Some(&*kv.value),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .unwrap_or_else(|| panic!("missing property `{key}`"))
}

fn elems(expr: &Expr) -> &[Option<ExprOrSpread>] {
    match expr {
        Expr::Array(arr) => &arr.elems,
        other => panic!("expected array literal, got {other:?}"),
    }
}

fn items(expr: &Expr) -> Vec<&Expr> {
    elems(expr).iter().flatten().map(|e| &*e.expr).collect()
}

fn lit_str(expr: &Expr) -> String {
    match expr {
        Expr::Lit(Lit::Str(s)) => s.value.to_string(),
        other => panic!("expected string literal, got {other:?}"),
    }
}

fn contains_tagged_template(module: &Module) -> bool {
    use swc_core::ecma::visit::{Visit, VisitWith};

    struct Finder(bool);
    impl Visit for Finder {
        fn visit_tagged_tpl(&mut self, _: &TaggedTpl) {
            self.0 = true;
        }
    }

    let mut finder = Finder(false);
    module.visit_with(&mut finder);
    finder.0
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn inlines_hello_query_and_drops_import() {
    let module = run(r#"
        import gql from "graphql-tag";
        export default gql`query Hello {hello}`;
    "#)
    .unwrap();

    assert!(imports(&module).is_empty());
    assert!(!contains_tagged_template(&module));

    let doc = default_export(&module);
    assert_eq!(lit_str(get(doc, "kind")), "Document");

    let defs = items(get(doc, "definitions"));
    assert_eq!(defs.len(), 1);
    assert_eq!(lit_str(get(defs[0], "operation")), "query");
    assert_eq!(lit_str(get(get(defs[0], "name"), "value")), "Hello");

    let selections = items(get(get(defs[0], "selectionSet"), "selections"));
    assert_eq!(selections.len(), 1);
    assert_eq!(lit_str(get(get(selections[0], "name"), "value")), "hello");

    let expected = signature(&canonical_form(&ast::parse("query Hello {hello}").unwrap()));
    assert_eq!(lit_str(get(doc, SIGNATURE_KEY)), expected);
}

#[test]
fn signature_is_reproducible() {
    let source = r#"import gql from "graphql-tag"; export default gql`query Hello {hello}`;"#;
    let first = lit_str(get(default_export(&run(source).unwrap()), SIGNATURE_KEY));
    let second = lit_str(get(default_export(&run(source).unwrap()), SIGNATURE_KEY));
    assert_eq!(first, second);
}

#[test]
fn literal_values_change_arguments_but_not_signature() {
    let one = run("export default gql`{ a(x: 1) }`;").unwrap();
    let two = run("export default gql`{ a(x: 2) }`;").unwrap();

    let arg_value = |module: &Module| -> String {
        let doc = default_export(module);
        let defs = items(get(doc, "definitions"));
        let selections = items(get(get(defs[0], "selectionSet"), "selections"));
        let args = items(get(selections[0], "arguments"));
        lit_str(get(get(args[0], "value"), "value"))
    };
    assert_eq!(arg_value(&one), "1");
    assert_eq!(arg_value(&two), "2");

    assert_eq!(
        lit_str(get(default_export(&one), SIGNATURE_KEY)),
        lit_str(get(default_export(&two), SIGNATURE_KEY)),
    );
}

#[test]
fn values_are_inlined_exactly_as_written() {
    let module = run(
        "export default gql`{ a(f: 1e3, i: 99999999999999999999, s: \"\"\"\n  hi\n\"\"\", o: {b: 1, a: 2}) }`;",
    )
    .unwrap();

    let doc = default_export(&module);
    let defs = items(get(doc, "definitions"));
    let selections = items(get(get(defs[0], "selectionSet"), "selections"));
    let args = items(get(selections[0], "arguments"));
    let arg = |idx: usize| get(args[idx], "value");

    assert_eq!(lit_str(get(arg(0), "value")), "1e3");
    assert_eq!(lit_str(get(arg(1), "value")), "99999999999999999999");
    assert_eq!(lit_str(get(arg(2), "value")), "hi");
    assert!(matches!(get(arg(2), "block"), Expr::Lit(Lit::Bool(b)) if b.value));

    let fields: Vec<String> = items(get(arg(3), "fields"))
        .iter()
        .map(|f| lit_str(get(get(f, "name"), "value")))
        .collect();
    assert_eq!(fields, vec!["b", "a"]);
}

#[test]
fn field_order_does_not_change_signature() {
    let module = run(r#"
        const A = gql`query Q { a b { c d } }`;
        const B = gql`
            query Q {
              b { d, c }
              a
            }
        `;
    "#)
    .unwrap();
    assert_eq!(
        lit_str(get(const_init(&module, "A"), SIGNATURE_KEY)),
        lit_str(get(const_init(&module, "B"), SIGNATURE_KEY)),
    );
}

#[test]
fn interpolated_fragments_are_reattached_in_order() {
    let module = run(r#"
        import gql from "graphql-tag";
        const Query = gql`
          query Profile { me { ...UserFields ...Avatar } }
          ${UserFields}
          ${fragments.media.Avatar}
        `;
    "#)
    .unwrap();

    let doc = const_init(&module, "Query");
    let elems = elems(get(doc, "definitions"));
    assert_eq!(elems.len(), 3);

    let spreads: Vec<&Expr> = elems
        .iter()
        .flatten()
        .filter(|e| e.spread.is_some())
        .map(|e| &*e.expr)
        .collect();
    assert_eq!(spreads.len(), 2);

    let Expr::Member(first) = spreads[0] else {
        panic!("expected `UserFields.definitions`");
    };
    assert!(matches!(&*first.obj, Expr::Ident(i) if &*i.sym == "UserFields"));

    let Expr::Member(second) = spreads[1] else {
        panic!("expected `fragments.media.Avatar.definitions`");
    };
    let Expr::Member(chain) = &*second.obj else {
        panic!("expected the original member chain");
    };
    assert!(matches!(&chain.prop, MemberProp::Ident(p) if &*p.sym == "Avatar"));
}

#[test]
fn interpolation_before_own_definitions() {
    let module = run("const Q = gql`${Base} query Q { ...B }`;").unwrap();
    let elems = elems(get(const_init(&module, "Q"), "definitions"));
    assert_eq!(elems.len(), 2);
    assert!(elems[0].as_ref().is_some_and(|e| e.spread.is_some()));
    assert!(elems[1].as_ref().is_some_and(|e| e.spread.is_none()));
}

#[test]
fn template_of_only_interpolations() {
    let module = run("const All = gql`${A}\n${B}`;").unwrap();
    let elems = elems(get(const_init(&module, "All"), "definitions"));
    assert_eq!(elems.len(), 2);
    assert!(elems.iter().flatten().all(|e| e.spread.is_some()));
}

#[test]
fn rewrites_nested_templates() {
    let module = run(r#"
        import gql from "graphql-tag";
        export function useThing() {
          return useQuery(gql`query Thing { thing { id } }`, { variables: {} });
        }
    "#)
    .unwrap();
    assert!(!contains_tagged_template(&module));
}

// =============================================================================
// Imports and tags
// =============================================================================

#[test]
fn keeps_unrelated_specifiers() {
    let module = run(r#"
        import gql, { disableFragmentWarnings } from "graphql-tag";
        import React from "react";
        disableFragmentWarnings();
        export default gql`{ a }`;
    "#)
    .unwrap();

    let imports = imports(&module);
    assert_eq!(imports.len(), 2);
    let tag_import = imports
        .iter()
        .find(|i| &*i.src.value == "graphql-tag")
        .unwrap();
    assert_eq!(tag_import.specifiers.len(), 1);
    assert!(matches!(
        &tag_import.specifiers[0],
        ImportSpecifier::Named(n) if &*n.local.sym == "disableFragmentWarnings"
    ));
}

#[test]
fn removes_bare_import() {
    let module = run(r#"import "graphql-tag"; export const x = 1;"#).unwrap();
    assert!(imports(&module).is_empty());
}

#[test]
fn follows_renamed_default_import() {
    let module = run(r#"
        import graphql from "graphql-tag";
        export default graphql`{ a }`;
    "#)
    .unwrap();
    assert_eq!(lit_str(get(default_export(&module), "kind")), "Document");
    assert!(imports(&module).is_empty());
}

#[test]
fn other_tags_are_left_alone() {
    let module = run(r#"
        import gql from "graphql-tag";
        const page = html`<p>${title}</p>`;
        const css = styled.div`color: red;`;
    "#)
    .unwrap();
    assert!(contains_tagged_template(&module));
}

#[test]
fn configured_import_sources() {
    let config = Config::from_json(r#"{"importSources": ["@apollo/client"]}"#).unwrap();
    let module = run_with(
        config,
        r#"
        import { gql as g, useQuery } from "@apollo/client";
        import gqlTag from "graphql-tag";
        export default g`{ a }`;
    "#,
    )
    .unwrap();

    assert_eq!(lit_str(get(default_export(&module), "kind")), "Document");
    let imports = imports(&module);
    assert_eq!(imports.len(), 2);
    let apollo = imports
        .iter()
        .find(|i| &*i.src.value == "@apollo/client")
        .unwrap();
    assert_eq!(apollo.specifiers.len(), 1);
    assert!(imports.iter().any(|i| &*i.src.value == "graphql-tag"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn call_interpolation_is_rejected() {
    let err = run(r#"
        import gql from "graphql-tag";
        export default gql`query { ${getFragment()} }`;
    "#)
    .unwrap_err();
    assert!(matches!(
        err.error,
        TransformError::UnsupportedInterpolation { .. }
    ));
    assert!(!err.span.is_dummy());
}

#[test]
fn unnamed_operation_in_multi_definition_document() {
    let err = run("export default gql`query A { a } { b }`;").unwrap_err();
    assert!(matches!(err.error, TransformError::UnnamedOperation { .. }));
}

#[test]
fn syntax_error_is_reported() {
    let err = run("export default gql`query A { a `;").unwrap_err();
    assert!(matches!(err.error, TransformError::QuerySyntax { .. }));
}

#[test]
fn empty_template_is_a_syntax_error() {
    for source in ["export default gql``;", "export default gql`\n  # nothing\n`;"] {
        let err = run(source).unwrap_err();
        assert!(
            matches!(err.error, TransformError::QuerySyntax { .. }),
            "{source:?} gave {err:?}"
        );
    }
}

#[test]
fn interpolation_inside_selection_set_is_a_mismatch() {
    let err = run("export default gql`query A { a ${F} }`;").unwrap_err();
    assert_eq!(
        err.error,
        TransformError::InterpolationMismatch {
            expected: 1,
            consumed: 0
        }
    );
}

#[test]
fn first_error_wins_and_nothing_is_emitted() {
    let result = run(r#"
        const ok = gql`{ a }`;
        const bad = gql`{ ${make()} }`;
        const alsoBad = gql`query A { a } { b }`;
    "#);
    let err = result.unwrap_err();
    assert!(matches!(
        err.error,
        TransformError::UnsupportedInterpolation { .. }
    ));
}
