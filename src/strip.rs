use apollo_compiler::ast;
use apollo_compiler::Name;
use apollo_compiler::Node;

use crate::directives::is_kept_type_system_directive;
use crate::metadata::ExternalFieldRecord;

pub(crate) struct StrippedDocument {
    pub(crate) document: ast::Document,
    pub(crate) external_fields: Vec<ExternalFieldRecord>,
}

/// Returns a copy of `document` with every `@external` field removed from
/// object and interface definitions and extensions, recording each removed
/// field. The input document is never mutated.
pub(crate) fn strip_external_fields(
    document: &ast::Document,
    service_name: &str,
) -> StrippedDocument {
    let mut external_fields = Vec::new();
    let mut stripped = ast::Document::new();
    for definition in &document.definitions {
        let definition = match definition {
            ast::Definition::ObjectTypeDefinition(object) => {
                let mut object = object.as_ref().clone();
                object.fields =
                    split_external(&object.name, service_name, &object.fields, &mut external_fields);
                ast::Definition::ObjectTypeDefinition(Node::new(object))
            }
            ast::Definition::ObjectTypeExtension(object) => {
                let mut object = object.as_ref().clone();
                object.fields =
                    split_external(&object.name, service_name, &object.fields, &mut external_fields);
                ast::Definition::ObjectTypeExtension(Node::new(object))
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                let mut interface = interface.as_ref().clone();
                interface.fields = split_external(
                    &interface.name,
                    service_name,
                    &interface.fields,
                    &mut external_fields,
                );
                ast::Definition::InterfaceTypeDefinition(Node::new(interface))
            }
            ast::Definition::InterfaceTypeExtension(interface) => {
                let mut interface = interface.as_ref().clone();
                interface.fields = split_external(
                    &interface.name,
                    service_name,
                    &interface.fields,
                    &mut external_fields,
                );
                ast::Definition::InterfaceTypeExtension(Node::new(interface))
            }
            other => other.clone(),
        };
        stripped.definitions.push(definition);
    }
    StrippedDocument {
        document: stripped,
        external_fields,
    }
}

fn split_external(
    parent_type_name: &Name,
    service_name: &str,
    fields: &[Node<ast::FieldDefinition>],
    external_fields: &mut Vec<ExternalFieldRecord>,
) -> Vec<Node<ast::FieldDefinition>> {
    let mut kept = Vec::with_capacity(fields.len());
    for field in fields {
        if field.directives.has("external") {
            external_fields.push(ExternalFieldRecord {
                parent_type_name: parent_type_name.clone(),
                service_name: service_name.to_owned(),
                field: field.clone(),
            });
        } else {
            kept.push(field.clone());
        }
    }
    kept
}

/// Returns a copy of `document` with unrecognized type-system directive
/// applications removed. Federation directives, `@tag`, `@deprecated` and
/// `@specifiedBy` survive; directive definitions are untouched so executable
/// directives can still be indexed.
pub(crate) fn strip_type_system_directives(document: &ast::Document) -> ast::Document {
    let mut stripped = ast::Document::new();
    for definition in &document.definitions {
        let definition = match definition {
            ast::Definition::ObjectTypeDefinition(object) => {
                let mut object = object.as_ref().clone();
                object.directives = filter_directives(&object.directives);
                object.fields = object.fields.iter().map(filter_field).collect();
                ast::Definition::ObjectTypeDefinition(Node::new(object))
            }
            ast::Definition::ObjectTypeExtension(object) => {
                let mut object = object.as_ref().clone();
                object.directives = filter_directives(&object.directives);
                object.fields = object.fields.iter().map(filter_field).collect();
                ast::Definition::ObjectTypeExtension(Node::new(object))
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                let mut interface = interface.as_ref().clone();
                interface.directives = filter_directives(&interface.directives);
                interface.fields = interface.fields.iter().map(filter_field).collect();
                ast::Definition::InterfaceTypeDefinition(Node::new(interface))
            }
            ast::Definition::InterfaceTypeExtension(interface) => {
                let mut interface = interface.as_ref().clone();
                interface.directives = filter_directives(&interface.directives);
                interface.fields = interface.fields.iter().map(filter_field).collect();
                ast::Definition::InterfaceTypeExtension(Node::new(interface))
            }
            ast::Definition::UnionTypeDefinition(union_) => {
                let mut union_ = union_.as_ref().clone();
                union_.directives = filter_directives(&union_.directives);
                ast::Definition::UnionTypeDefinition(Node::new(union_))
            }
            ast::Definition::UnionTypeExtension(union_) => {
                let mut union_ = union_.as_ref().clone();
                union_.directives = filter_directives(&union_.directives);
                ast::Definition::UnionTypeExtension(Node::new(union_))
            }
            ast::Definition::EnumTypeDefinition(enum_) => {
                let mut enum_ = enum_.as_ref().clone();
                enum_.directives = filter_directives(&enum_.directives);
                enum_.values = enum_.values.iter().map(filter_enum_value).collect();
                ast::Definition::EnumTypeDefinition(Node::new(enum_))
            }
            ast::Definition::EnumTypeExtension(enum_) => {
                let mut enum_ = enum_.as_ref().clone();
                enum_.directives = filter_directives(&enum_.directives);
                enum_.values = enum_.values.iter().map(filter_enum_value).collect();
                ast::Definition::EnumTypeExtension(Node::new(enum_))
            }
            ast::Definition::ScalarTypeDefinition(scalar) => {
                let mut scalar = scalar.as_ref().clone();
                scalar.directives = filter_directives(&scalar.directives);
                ast::Definition::ScalarTypeDefinition(Node::new(scalar))
            }
            ast::Definition::ScalarTypeExtension(scalar) => {
                let mut scalar = scalar.as_ref().clone();
                scalar.directives = filter_directives(&scalar.directives);
                ast::Definition::ScalarTypeExtension(Node::new(scalar))
            }
            ast::Definition::InputObjectTypeDefinition(input) => {
                let mut input = input.as_ref().clone();
                input.directives = filter_directives(&input.directives);
                input.fields = input.fields.iter().map(filter_input_value).collect();
                ast::Definition::InputObjectTypeDefinition(Node::new(input))
            }
            ast::Definition::InputObjectTypeExtension(input) => {
                let mut input = input.as_ref().clone();
                input.directives = filter_directives(&input.directives);
                input.fields = input.fields.iter().map(filter_input_value).collect();
                ast::Definition::InputObjectTypeExtension(Node::new(input))
            }
            other => other.clone(),
        };
        stripped.definitions.push(definition);
    }
    stripped
}

fn filter_directives(directives: &ast::DirectiveList) -> ast::DirectiveList {
    ast::DirectiveList(
        directives
            .iter()
            .filter(|directive| is_kept_type_system_directive(&directive.name))
            .cloned()
            .collect(),
    )
}

fn filter_field(field: &Node<ast::FieldDefinition>) -> Node<ast::FieldDefinition> {
    let mut field = field.as_ref().clone();
    field.directives = filter_directives(&field.directives);
    field.arguments = field.arguments.iter().map(filter_input_value).collect();
    Node::new(field)
}

fn filter_input_value(value: &Node<ast::InputValueDefinition>) -> Node<ast::InputValueDefinition> {
    let mut value = value.as_ref().clone();
    value.directives = filter_directives(&value.directives);
    Node::new(value)
}

fn filter_enum_value(value: &Node<ast::EnumValueDefinition>) -> Node<ast::EnumValueDefinition> {
    let mut value = value.as_ref().clone();
    value.directives = filter_directives(&value.directives);
    Node::new(value)
}
