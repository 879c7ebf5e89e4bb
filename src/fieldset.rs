use std::fmt;

use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use apollo_compiler::Node;
use itertools::Itertools;

/// The parsed value of a `fields: "..."` argument on `@key`, `@requires` or
/// `@provides`.
///
/// The string is a GraphQL selection set without the outer braces. Parsing is
/// purely syntactic: whether the selected fields exist on the relevant type is
/// the business of the post-composition rules, not of this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSet {
    selections: Vec<Selection>,
}

impl FieldSet {
    /// Parses the argument string by wrapping it in braces and reading it as
    /// an anonymous operation. Fails on malformed or empty selections.
    pub(crate) fn parse(source: &str) -> Result<Self, String> {
        let document = ast::Document::parse(format!("{{ {source} }}"), "fields.graphql")
            .map_err(|with_errors| {
                with_errors
                    .errors
                    .iter()
                    .map(|diagnostic| diagnostic.error.to_string())
                    .join("; ")
            })?;
        let selections = document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => {
                    Some(operation.selection_set.clone())
                }
                _ => None,
            });
        match selections {
            Some(selections) if !selections.is_empty() => Ok(Self { selections }),
            _ => Err(format!("\"{source}\" is not a valid selection set")),
        }
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// The field selections at the top level, skipping fragments.
    pub(crate) fn top_level_fields(&self) -> impl Iterator<Item = &Node<ast::Field>> {
        self.selections.iter().filter_map(|selection| match selection {
            Selection::Field(field) => Some(field),
            _ => None,
        })
    }
}

/// Renders the canonical single-line form, e.g. `upc` or `id organization { id }`.
/// Two field sets selecting the same fields in the same order display
/// identically regardless of the whitespace in their sources.
impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_selections(f, &self.selections)
    }
}

fn write_selections(f: &mut fmt::Formatter<'_>, selections: &[Selection]) -> fmt::Result {
    let mut first = true;
    for selection in selections {
        if !first {
            f.write_str(" ")?;
        }
        first = false;
        match selection {
            Selection::Field(field) => {
                write!(f, "{}", field.name)?;
                if !field.selection_set.is_empty() {
                    f.write_str(" { ")?;
                    write_selections(f, &field.selection_set)?;
                    f.write_str(" }")?;
                }
            }
            Selection::InlineFragment(fragment) => {
                match &fragment.type_condition {
                    Some(condition) => write!(f, "... on {condition}")?,
                    None => f.write_str("...")?,
                }
                f.write_str(" { ")?;
                write_selections(f, &fragment.selection_set)?;
                f.write_str(" }")?;
            }
            Selection::FragmentSpread(spread) => write!(f, "...{}", spread.fragment_name)?,
        }
    }
    Ok(())
}
