//! Owned executable-document AST, lowered from the lossless `apollo-parser` CST.
//!
//! Int and Float values keep their source lexeme, strings remember whether they
//! were block strings and object fields stay in source order, so a document can
//! be rebuilt value for value.

use apollo_parser::cst::{self, CstNode};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }
}

/// An operation; the `{ ... }` shorthand lowers to an unnamed query.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationDefinition {
    pub operation: OperationType,
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub var_type: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Named(String),
    List(Box<Type>),
    NonNull(Box<Type>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSet {
    pub items: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSet>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread {
    pub fragment_name: String,
    pub directives: Vec<Directive>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Variable(String),
    /// Source lexeme, e.g. `-12` or `99999999999999999999`.
    Int(String),
    /// Source lexeme, e.g. `1e3`.
    Float(String),
    String {
        value: String,
        block: bool,
    },
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<ObjectField>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub value: Value,
}

// -----------------------------------------------------------------------------
// Parsing
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("{message} (at byte {index})")]
    Syntax { message: String, index: usize },

    #[error("document has no definitions")]
    Empty,

    #[error("expected {0}")]
    Missing(&'static str),

    #[error("type system definitions are not supported in executable documents")]
    TypeSystemDefinition,
}

type Lowered<T> = std::result::Result<T, ParseError>;

pub fn parse(query_src: &str) -> Lowered<Document> {
    let tree = apollo_parser::Parser::new(query_src).parse();
    if let Some(err) = tree.errors().next() {
        return Err(ParseError::Syntax {
            message: err.message().to_string(),
            index: err.index(),
        });
    }

    let definitions = tree
        .document()
        .definitions()
        .map(definition)
        .collect::<Lowered<Vec<_>>>()?;
    if definitions.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(Document { definitions })
}

fn required<T>(node: Option<T>, what: &'static str) -> Lowered<T> {
    node.ok_or(ParseError::Missing(what))
}

fn name(node: Option<cst::Name>) -> Lowered<String> {
    Ok(required(node, "a name")?.text().to_string())
}

fn definition(def: cst::Definition) -> Lowered<Definition> {
    match def {
        cst::Definition::OperationDefinition(op) => {
            operation_definition(op).map(Definition::Operation)
        }
        cst::Definition::FragmentDefinition(frag) => {
            fragment_definition(frag).map(Definition::Fragment)
        }
        _ => Err(ParseError::TypeSystemDefinition),
    }
}

fn operation_definition(op: cst::OperationDefinition) -> Lowered<OperationDefinition> {
    let operation = match op.operation_type() {
        Some(ty) if ty.mutation_token().is_some() => OperationType::Mutation,
        Some(ty) if ty.subscription_token().is_some() => OperationType::Subscription,
        _ => OperationType::Query,
    };
    let name = op.name().map(|n| n.text().to_string());
    let variable_definitions = op
        .variable_definitions()
        .into_iter()
        .flat_map(|vars| vars.variable_definitions())
        .map(variable_definition)
        .collect::<Lowered<_>>()?;

    Ok(OperationDefinition {
        operation,
        name,
        variable_definitions,
        directives: directives(op.directives())?,
        selection_set: selection_set(required(op.selection_set(), "a selection set")?)?,
    })
}

fn fragment_definition(frag: cst::FragmentDefinition) -> Lowered<FragmentDefinition> {
    let fragment_name = required(frag.fragment_name(), "a fragment name")?;
    let condition = required(frag.type_condition(), "a type condition")?;
    Ok(FragmentDefinition {
        name: name(fragment_name.name())?,
        type_condition: type_condition(condition)?,
        directives: directives(frag.directives())?,
        selection_set: selection_set(required(frag.selection_set(), "a selection set")?)?,
    })
}

fn variable_definition(var: cst::VariableDefinition) -> Lowered<VariableDefinition> {
    let variable = required(var.variable(), "a variable")?;
    let default_value = match var.default_value() {
        Some(default) => Some(value(required(default.value(), "a default value")?)?),
        None => None,
    };
    Ok(VariableDefinition {
        name: name(variable.name())?,
        var_type: type_ref(required(var.ty(), "a variable type")?)?,
        default_value,
        directives: directives(var.directives())?,
    })
}

fn type_ref(ty: cst::Type) -> Lowered<Type> {
    match ty {
        cst::Type::NamedType(named) => Ok(Type::Named(name(named.name())?)),
        cst::Type::ListType(list) => list_type(list),
        cst::Type::NonNullType(non_null) => {
            let inner = match (non_null.named_type(), non_null.list_type()) {
                (Some(named), _) => Type::Named(name(named.name())?),
                (None, Some(list)) => list_type(list)?,
                (None, None) => return Err(ParseError::Missing("a type")),
            };
            Ok(Type::NonNull(Box::new(inner)))
        }
    }
}

fn list_type(list: cst::ListType) -> Lowered<Type> {
    let inner = type_ref(required(list.ty(), "a list item type")?)?;
    Ok(Type::List(Box::new(inner)))
}

fn type_condition(cond: cst::TypeCondition) -> Lowered<String> {
    let named = required(cond.named_type(), "a type name")?;
    name(named.name())
}

fn selection_set(set: cst::SelectionSet) -> Lowered<SelectionSet> {
    let items = set.selections().map(selection).collect::<Lowered<_>>()?;
    Ok(SelectionSet { items })
}

fn selection(sel: cst::Selection) -> Lowered<Selection> {
    match sel {
        cst::Selection::Field(field) => {
            let alias = match field.alias() {
                Some(alias) => Some(name(alias.name())?),
                None => None,
            };
            Ok(Selection::Field(Field {
                alias,
                name: name(field.name())?,
                arguments: arguments(field.arguments())?,
                directives: directives(field.directives())?,
                selection_set: field.selection_set().map(selection_set).transpose()?,
            }))
        }
        cst::Selection::FragmentSpread(spread) => {
            let fragment_name = required(spread.fragment_name(), "a fragment name")?;
            Ok(Selection::FragmentSpread(FragmentSpread {
                fragment_name: name(fragment_name.name())?,
                directives: directives(spread.directives())?,
            }))
        }
        cst::Selection::InlineFragment(inline) => {
            Ok(Selection::InlineFragment(InlineFragment {
                type_condition: inline.type_condition().map(type_condition).transpose()?,
                directives: directives(inline.directives())?,
                selection_set: selection_set(required(inline.selection_set(), "a selection set")?)?,
            }))
        }
    }
}

fn arguments(args: Option<cst::Arguments>) -> Lowered<Vec<Argument>> {
    args.into_iter()
        .flat_map(|args| args.arguments())
        .map(|arg| -> Lowered<Argument> {
            Ok(Argument {
                name: name(arg.name())?,
                value: value(required(arg.value(), "an argument value")?)?,
            })
        })
        .collect()
}

fn directives(dirs: Option<cst::Directives>) -> Lowered<Vec<Directive>> {
    dirs.into_iter()
        .flat_map(|dirs| dirs.directives())
        .map(|dir| -> Lowered<Directive> {
            Ok(Directive {
                name: name(dir.name())?,
                arguments: arguments(dir.arguments())?,
            })
        })
        .collect()
}

fn value(v: cst::Value) -> Lowered<Value> {
    Ok(match v {
        cst::Value::Variable(var) => Value::Variable(name(var.name())?),
        cst::Value::StringValue(s) => Value::String {
            block: is_block_string(&s),
            value: String::from(&s),
        },
        cst::Value::FloatValue(f) => {
            Value::Float(required(f.float_token(), "a float")?.text().to_string())
        }
        cst::Value::IntValue(i) => Value::Int(required(i.int_token(), "an int")?.text().to_string()),
        cst::Value::BooleanValue(b) => Value::Boolean(b.true_token().is_some()),
        cst::Value::NullValue(_) => Value::Null,
        cst::Value::EnumValue(e) => Value::Enum(name(e.name())?),
        cst::Value::ListValue(list) => {
            Value::List(list.values().map(value).collect::<Lowered<_>>()?)
        }
        cst::Value::ObjectValue(obj) => Value::Object(
            obj.object_fields()
                .map(|field| -> Lowered<ObjectField> {
                    Ok(ObjectField {
                        name: name(field.name())?,
                        value: value(required(field.value(), "an object field value")?)?,
                    })
                })
                .collect::<Lowered<_>>()?,
        ),
    })
}

fn is_block_string(s: &cst::StringValue) -> bool {
    s.syntax()
        .text()
        .to_string()
        .trim_start()
        .starts_with(r#"""""#)
}
