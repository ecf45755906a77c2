//! Construction graph
//!
//! Every resource of the stack is a named node. Edges are never declared by
//! hand: they are read back from the intrinsic references inside a node's
//! properties (`Ref`, `Fn::GetAtt`, `Fn::Sub` placeholders) plus its explicit
//! `DependsOn` list. Before a template is rendered the graph is checked for
//! dangling references and cycles, and the topological order produced by that
//! check is what the `graph` command prints.

use crate::error::GraphError;
use cfn::{Output, Parameter, Resource, Template, collect_references, is_pseudo_parameter};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, trace};

/// Longest logical ID CloudFormation accepts
const MAX_LOGICAL_ID_LEN: usize = 255;

/// Provisioner that declared a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Component {
    /// VPC, subnets, routing, endpoints
    Network,
    /// Security groups and ingress rules
    Security,
    /// File system, access point, bucket
    Storage,
    /// Batch pools, queues, job definitions, instance roles
    Compute,
    /// Lambda and REST API
    Api,
    /// Flow logs
    Observability,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Security => "security",
            Self::Storage => "storage",
            Self::Compute => "compute",
            Self::Api => "api",
            Self::Observability => "observability",
        };
        f.write_str(name)
    }
}

/// A declared resource
#[derive(Debug, Clone)]
pub struct Node {
    /// Type, properties and attributes
    pub resource: Resource,
    /// Declaring provisioner
    pub component: Component,
}

/// Entry of the topological listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    /// Logical ID
    pub logical_id: String,
    /// CloudFormation type
    pub type_name: &'static str,
    /// Declaring provisioner
    pub component: Component,
    /// Logical IDs this node waits for
    pub dependencies: BTreeSet<String>,
}

/// DAG of logical IDs
#[derive(Debug, Clone, Default)]
pub struct ConstructGraph {
    nodes: BTreeMap<String, Node>,
    parameters: BTreeMap<String, Parameter>,
}

impl ConstructGraph {
    /// Empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a template parameter; references to it are not graph edges
    pub fn add_parameter(&mut self, name: impl Into<String>, parameter: Parameter) -> Result<(), GraphError> {
        let name = name.into();
        check_logical_id(&name)?;
        if self.nodes.contains_key(&name) || self.parameters.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        debug!("Declared parameter {}", name);
        self.parameters.insert(name, parameter);
        Ok(())
    }

    /// Declare a resource node
    pub fn add(
        &mut self,
        component: Component,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> Result<(), GraphError> {
        let logical_id = logical_id.into();
        check_logical_id(&logical_id)?;
        if self.nodes.contains_key(&logical_id) || self.parameters.contains_key(&logical_id) {
            return Err(GraphError::DuplicateNode(logical_id));
        }
        trace!(
            component = %component,
            "Declared {} ({})",
            logical_id,
            resource.properties.type_name()
        );
        self.nodes.insert(logical_id, Node { resource, component });
        Ok(())
    }

    /// True when a resource or parameter with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name) || self.parameters.contains_key(name)
    }

    /// Look up a node
    #[must_use]
    pub fn get(&self, logical_id: &str) -> Option<&Node> {
        self.nodes.get(logical_id)
    }

    /// Number of resource nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True before anything was declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in logical ID order
    pub fn nodes(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.nodes.iter()
    }

    /// Logical IDs of the nodes of a given CloudFormation type
    pub fn ids_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.resource.properties.type_name() == type_name)
            .map(|(id, _)| id)
    }

    /// Resources a node waits for: property references plus `DependsOn`
    ///
    /// Pseudo parameters and template parameters are not resources and are
    /// left out. Unknown names are kept so `validate` can report them.
    pub fn dependencies(&self, logical_id: &str) -> Result<BTreeSet<String>, GraphError> {
        let Some(node) = self.nodes.get(logical_id) else {
            return Ok(BTreeSet::new());
        };
        let properties = serde_json::to_value(&node.resource.properties)?;
        let mut deps: BTreeSet<String> = collect_references(&properties)
            .into_iter()
            .filter(|name| !is_pseudo_parameter(name) && !self.parameters.contains_key(name))
            .collect();
        deps.extend(node.resource.depends_on.iter().cloned());
        Ok(deps)
    }

    /// Check references and acyclicity; returns the topological order
    pub fn validate(&self) -> Result<Vec<String>, GraphError> {
        let mut edges = BTreeMap::new();
        for id in self.nodes.keys() {
            let deps = self.dependencies(id)?;
            if let Some(missing) = deps.iter().find(|dep| !self.nodes.contains_key(*dep)) {
                return Err(GraphError::DanglingReference {
                    from: id.clone(),
                    to: missing.clone(),
                });
            }
            edges.insert(id.clone(), deps);
        }
        topological_order(&edges)
    }

    /// Nodes in topological order with their dependencies
    pub fn summary(&self) -> Result<Vec<NodeSummary>, GraphError> {
        let order = self.validate()?;
        let mut summary = Vec::with_capacity(order.len());
        for id in order {
            let dependencies = self.dependencies(&id)?;
            if let Some(node) = self.nodes.get(&id) {
                summary.push(NodeSummary {
                    type_name: node.resource.properties.type_name(),
                    component: node.component,
                    dependencies,
                    logical_id: id,
                });
            }
        }
        Ok(summary)
    }

    /// Validate and render
    ///
    /// Outputs are checked like nodes: every name they reference must be a
    /// declared resource, parameter or pseudo parameter.
    pub fn into_template(
        self,
        description: Option<String>,
        outputs: BTreeMap<String, Output>,
    ) -> Result<Template, GraphError> {
        let order = self.validate()?;
        debug!("Construction graph is acyclic ({} nodes)", order.len());

        for (name, output) in &outputs {
            let value = serde_json::to_value(&output.value)?;
            if let Some(missing) = collect_references(&value)
                .into_iter()
                .find(|target| !is_pseudo_parameter(target) && !self.contains(target))
            {
                return Err(GraphError::DanglingReference {
                    from: format!("output {name}"),
                    to: missing,
                });
            }
        }

        let mut template = Template::new(description);
        template.parameters = self.parameters;
        template.resources = self.nodes.into_iter().map(|(id, node)| (id, node.resource)).collect();
        template.outputs = outputs;
        Ok(template)
    }
}

/// Kahn's algorithm over `node -> dependencies`
///
/// Ready nodes are taken in logical ID order, so the result is stable.
fn topological_order(edges: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, GraphError> {
    let mut pending: BTreeMap<&str, usize> = edges.iter().map(|(id, deps)| (id.as_str(), deps.len())).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, deps) in edges {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(id.as_str());
        }
    }

    let mut ready: VecDeque<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(edges.len());

    while let Some(id) = ready.pop_front() {
        order.push(id.to_string());
        pending.remove(id);
        let mut unlocked = BTreeSet::new();
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    unlocked.insert(*dependent);
                }
            }
        }
        ready.extend(unlocked);
    }

    if pending.is_empty() {
        Ok(order)
    } else {
        Err(GraphError::Cycle(pending.keys().map(ToString::to_string).collect()))
    }
}

/// Logical IDs are 1-255 ASCII alphanumerics
fn check_logical_id(id: &str) -> Result<(), GraphError> {
    if id.is_empty() || id.len() > MAX_LOGICAL_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GraphError::InvalidLogicalId(id.to_string()));
    }
    Ok(())
}

/// Derive a logical ID from a resource name: `batch-vpc` becomes `BatchVpc`
#[must_use]
pub fn logical_id(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}
