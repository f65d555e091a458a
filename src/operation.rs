//! typed operations
//!
//! an [`Operation`] couples a graphql document with the type its `data`
//! decodes into. the introspection queries used by the client live here.

use crate::graphql::{QueryRequest, Variables};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// graphql operation contract for typed queries
pub trait Operation {
    /// graphql query string
    const QUERY: &'static str;
    /// response payload type
    type Response: DeserializeOwned;

    /// build a request for this operation
    fn request(variables: Variables) -> QueryRequest {
        QueryRequest::new(Self::QUERY).with_variables(variables)
    }
}

/// name of the schema's root query type; used as a connection check
pub struct SchemaQueryType;

impl Operation for SchemaQueryType {
    const QUERY: &'static str = "{ __schema { queryType { name } } }";
    type Response = SchemaQueryTypeData;
}

/// `data` of a [`SchemaQueryType`] response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaQueryTypeData {
    /// the `__schema` field
    #[serde(rename = "__schema")]
    pub schema: QueryTypeSchema,
}

/// `__schema` selection holding only the root query type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTypeSchema {
    /// root query type, usually `Query`
    #[serde(rename = "queryType")]
    pub query_type: NamedType,
}

/// a type reference reduced to its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedType {
    /// type name
    pub name: String,
}

/// object types a subgraph exposes, minus the root operation types
pub struct EntityTypes;

impl Operation for EntityTypes {
    const QUERY: &'static str = r#"{ __schema { types(filter: { kind: OBJECT, name_not_in: ["Query", "Subscription"] }) { name description } } }"#;
    type Response = EntityTypesData;
}

/// `data` of an [`EntityTypes`] response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypesData {
    /// the `__schema` field
    #[serde(rename = "__schema")]
    pub schema: EntityTypeList,
}

/// `__schema` selection holding the filtered type list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeList {
    /// object types in server order
    pub types: Vec<EntityType>,
}

/// entity type discovered through introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// type name, e.g. `Pool`
    pub name: String,
    /// schema description, if the subgraph author wrote one
    #[serde(default)]
    pub description: Option<String>,
}

/// full schema introspection: types, fields, arguments, enum values, directives
pub struct FullIntrospection;

impl Operation for FullIntrospection {
    const QUERY: &'static str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
      }
    }
  }
}"#;
    type Response = serde_json::Value;
}
