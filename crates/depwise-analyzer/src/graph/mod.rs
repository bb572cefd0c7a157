//! Graph normalizer
//!
//! Merges the root manifest, the workspace members and the installed-tree
//! snapshot into one model: a flat `name -> versions` record in discovery
//! order, and a requirement graph (on petgraph) whose edges connect each
//! consumer to the installed copy its requirement resolves to.
//!
//! Resolution follows the node_modules lookup rule: a package's dependency is
//! looked up among its own children, then among each ancestor's children, up
//! to the top level. Root requirements resolve against the top level only.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use tracing::{debug, warn};

use depwise_core::types::{
    DependencyKind, InstalledNode, ProjectManifest, ProjectSnapshot, ResolvedVersionEvidence,
    VersionRequirement,
};
use depwise_registry::RegistryIndex;

/// One distinct resolved version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVersion {
    pub version: String,
    /// Every tree location holding this version, in discovery order
    pub locations: Vec<String>,
    /// Consumers whose requirement resolved to this version
    pub requested_by: Vec<String>,
    /// Shallowest tree depth (1 = top level)
    pub depth: usize,
}

/// All resolved versions of one package identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatDependencyRecord {
    pub name: String,
    pub versions: IndexMap<String, ResolvedVersion>,
}

impl FlatDependencyRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: IndexMap::new(),
        }
    }

    /// Number of distinct resolved versions
    pub fn multiplicity(&self) -> usize {
        self.versions.len()
    }

    /// Version strings in discovery order
    pub fn version_strings(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }

    /// Highest resolved version that parses
    pub fn highest(&self) -> Option<&str> {
        self.versions
            .keys()
            .filter_map(|v| v.parse::<depwise_core::Version>().ok().map(|parsed| (parsed, v)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, raw)| raw.as_str())
    }

    /// Every location across versions
    pub fn locations(&self) -> Vec<String> {
        self.versions
            .values()
            .flat_map(|resolved| resolved.locations.iter().cloned())
            .collect()
    }

    pub fn evidence(&self) -> Vec<ResolvedVersionEvidence> {
        self.versions
            .values()
            .map(|resolved| ResolvedVersionEvidence {
                version: resolved.version.clone(),
                locations: resolved.locations.clone(),
            })
            .collect()
    }
}

/// Installed copy of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub location: String,
    pub depth: usize,
    pub requirements: Vec<VersionRequirement>,
}

impl InstalledPackage {
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone)]
pub enum GraphNode {
    Root {
        name: String,
        requirements: Vec<VersionRequirement>,
    },
    Package(InstalledPackage),
    /// Target of requirements that resolve to nothing
    Missing { name: String },
}

impl GraphNode {
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Root { name, .. } => name,
            GraphNode::Package(package) => &package.name,
            GraphNode::Missing { name } => name,
        }
    }
}

/// Where a requirement landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub version: String,
    pub location: String,
}

/// A consumer's requirement and its resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEdge {
    /// Root manifest name or `name@version`
    pub consumer: String,
    pub consumer_location: String,
    pub requirement: VersionRequirement,
    pub from_root: bool,
    /// `None` when nothing installed satisfies the lookup
    pub resolved: Option<ResolvedTarget>,
}

#[derive(Debug, Clone)]
pub enum Link {
    /// Parent directory holds the child in its node_modules
    Contains,
    Requires(RequirementEdge),
}

/// A workspace member's declared requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRequirements {
    pub member: String,
    pub relative_path: String,
    pub requirements: Vec<VersionRequirement>,
}

impl MemberRequirements {
    fn from_manifest(member: &str, relative_path: &str, manifest: &ProjectManifest) -> Self {
        Self {
            member: member.to_string(),
            relative_path: relative_path.to_string(),
            requirements: manifest.requirements(),
        }
    }

    /// First non-peer requirement on `name`
    pub fn requirement_on(&self, name: &str) -> Option<&VersionRequirement> {
        self.requirements
            .iter()
            .find(|req| req.name == name && req.kind != DependencyKind::Peer)
    }
}

/// Normalized model of one snapshot
#[derive(Debug)]
pub struct RequirementGraph {
    graph: DiGraph<GraphNode, Link>,
    root: NodeIndex,
    /// Installed copies per package name, in discovery order
    node_map: HashMap<String, Vec<NodeIndex>>,
    missing: HashMap<String, NodeIndex>,
    flat: IndexMap<String, FlatDependencyRecord>,
    workspace: Vec<MemberRequirements>,
    skipped: Vec<String>,
}

type Scope = HashMap<String, NodeIndex>;

impl RequirementGraph {
    /// Normalize a snapshot.
    ///
    /// Registry metadata only fills in peer requirements for installed
    /// packages whose snapshot entry declares none.
    pub fn build(snapshot: &ProjectSnapshot, registry: &RegistryIndex) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::Root {
            name: snapshot.root.display_name().to_string(),
            requirements: snapshot.root.requirements(),
        });

        let mut model = Self {
            graph,
            root,
            node_map: HashMap::new(),
            missing: HashMap::new(),
            flat: IndexMap::new(),
            workspace: Vec::new(),
            skipped: Vec::new(),
        };

        let top_level = model.insert_level(&snapshot.installed, None, "", 1, registry);
        let top_scope = model.scope_of(&top_level);

        let mut pending = Vec::new();
        model.resolve_root(&top_scope, &mut pending);
        let mut scopes = vec![top_scope];
        model.resolve_level(&top_level, &mut scopes, &mut pending);
        model.apply(pending);

        for member in &snapshot.workspaces {
            match &member.manifest {
                Some(manifest) => model.workspace.push(MemberRequirements::from_manifest(
                    &member.name,
                    &member.relative_path,
                    manifest,
                )),
                None => {
                    warn!(member = %member.name, "Skipping workspace member without a readable manifest");
                    model.skipped.push(format!(
                        "workspace member {} ({}) has no readable manifest",
                        member.name, member.relative_path
                    ));
                }
            }
        }

        debug!(
            packages = model.package_count(),
            distinct = model.flat.len(),
            requirements = model.requirement_count(),
            members = model.workspace.len(),
            "Normalized dependency graph"
        );
        model
    }

    /// Add one directory level of the installed tree, depth first
    fn insert_level(
        &mut self,
        nodes: &[InstalledNode],
        parent: Option<NodeIndex>,
        parent_location: &str,
        depth: usize,
        registry: &RegistryIndex,
    ) -> Vec<NodeIndex> {
        let mut level = Vec::with_capacity(nodes.len());

        for node in nodes {
            if node.name.trim().is_empty() || node.version.trim().is_empty() {
                warn!(location = %node.location, "Skipping installed node without name or version");
                self.skipped.push(format!(
                    "installed node at '{}' has no name or version; its subtree was skipped",
                    node.location
                ));
                continue;
            }

            let location = if node.location.is_empty() {
                derive_location(parent_location, &node.name)
            } else {
                node.location.clone()
            };

            let mut requirements = node.requirements();
            if node.peer_dependencies.is_empty() {
                requirements.extend(registry_peers(registry, &node.name, &node.version));
            }

            let package = InstalledPackage {
                name: node.name.clone(),
                version: node.version.clone(),
                location: location.clone(),
                depth,
                requirements,
            };
            self.track(&package);

            let index = self.graph.add_node(GraphNode::Package(package));
            self.node_map.entry(node.name.clone()).or_default().push(index);
            if let Some(parent) = parent {
                self.graph.add_edge(parent, index, Link::Contains);
            }
            level.push(index);

            self.insert_level(&node.children, Some(index), &location, depth + 1, registry);
        }

        level
    }

    fn track(&mut self, package: &InstalledPackage) {
        let record = self
            .flat
            .entry(package.name.clone())
            .or_insert_with(|| FlatDependencyRecord::new(&package.name));
        let resolved = record
            .versions
            .entry(package.version.clone())
            .or_insert_with(|| ResolvedVersion {
                version: package.version.clone(),
                locations: Vec::new(),
                requested_by: Vec::new(),
                depth: package.depth,
            });
        resolved.locations.push(package.location.clone());
        resolved.depth = resolved.depth.min(package.depth);
    }

    /// Children of an installed node keyed by name (first copy wins)
    fn children_of(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .filter(|edge| matches!(edge.weight(), Link::Contains))
            .map(|edge| edge.target())
            .collect();
        children.sort();
        children
    }

    fn scope_of(&self, level: &[NodeIndex]) -> Scope {
        let mut scope = Scope::new();
        for &index in level {
            scope
                .entry(self.graph[index].name().to_string())
                .or_insert(index);
        }
        scope
    }

    fn resolve_root(&self, top_scope: &Scope, pending: &mut Vec<(NodeIndex, Option<NodeIndex>, RequirementEdge)>) {
        if let GraphNode::Root { name, requirements } = &self.graph[self.root] {
            for requirement in requirements {
                let target = top_scope.get(&requirement.name).copied();
                pending.push((
                    self.root,
                    target,
                    self.edge(name.clone(), String::new(), requirement, true, target),
                ));
            }
        }
    }

    fn resolve_level(
        &self,
        level: &[NodeIndex],
        scopes: &mut Vec<Scope>,
        pending: &mut Vec<(NodeIndex, Option<NodeIndex>, RequirementEdge)>,
    ) {
        for &index in level {
            let children = self.children_of(index);
            scopes.push(self.scope_of(&children));

            if let GraphNode::Package(package) = &self.graph[index] {
                for requirement in &package.requirements {
                    let target = scopes
                        .iter()
                        .rev()
                        .find_map(|scope| scope.get(&requirement.name).copied());
                    pending.push((
                        index,
                        target,
                        self.edge(package.id(), package.location.clone(), requirement, false, target),
                    ));
                }
            }

            self.resolve_level(&children, scopes, pending);
            scopes.pop();
        }
    }

    fn edge(
        &self,
        consumer: String,
        consumer_location: String,
        requirement: &VersionRequirement,
        from_root: bool,
        target: Option<NodeIndex>,
    ) -> RequirementEdge {
        let resolved = target.and_then(|index| match &self.graph[index] {
            GraphNode::Package(package) => Some(ResolvedTarget {
                version: package.version.clone(),
                location: package.location.clone(),
            }),
            _ => None,
        });
        RequirementEdge {
            consumer,
            consumer_location,
            requirement: requirement.clone(),
            from_root,
            resolved,
        }
    }

    fn apply(&mut self, pending: Vec<(NodeIndex, Option<NodeIndex>, RequirementEdge)>) {
        for (from, target, edge) in pending {
            if let Some(resolved) = &edge.resolved {
                if let Some(version) = self
                    .flat
                    .get_mut(&edge.requirement.name)
                    .and_then(|record| record.versions.get_mut(&resolved.version))
                {
                    if !version.requested_by.contains(&edge.consumer) {
                        version.requested_by.push(edge.consumer.clone());
                    }
                }
            }

            let to = match target {
                Some(index) => index,
                None => self.missing_node(&edge.requirement.name),
            };
            self.graph.add_edge(from, to, Link::Requires(edge));
        }
    }

    fn missing_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.missing.get(name) {
            return index;
        }
        let index = self.graph.add_node(GraphNode::Missing {
            name: name.to_string(),
        });
        self.missing.insert(name.to_string(), index);
        index
    }

    /// Flat records in discovery order
    pub fn flat(&self) -> &IndexMap<String, FlatDependencyRecord> {
        &self.flat
    }

    pub fn record(&self, name: &str) -> Option<&FlatDependencyRecord> {
        self.flat.get(name)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.flat.contains_key(name)
    }

    /// Every requirement edge, in resolution order
    pub fn requirements(&self) -> impl Iterator<Item = &RequirementEdge> {
        self.graph.edge_weights().filter_map(|link| match link {
            Link::Requires(edge) => Some(edge),
            Link::Contains => None,
        })
    }

    /// Requirement edges that target a package, installed or not
    pub fn requirements_on(&self, name: &str) -> Vec<&RequirementEdge> {
        let targets = self
            .node_map
            .get(name)
            .into_iter()
            .flatten()
            .chain(self.missing.get(name));

        let mut edges: Vec<(EdgeIndex, &RequirementEdge)> = targets
            .flat_map(|&index| self.graph.edges_directed(index, Direction::Incoming))
            .filter_map(|edge| match edge.weight() {
                Link::Requires(requirement) => Some((edge.id(), requirement)),
                Link::Contains => None,
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    /// Distinct consumers that require a package
    pub fn consumers_of(&self, name: &str) -> Vec<String> {
        let mut consumers: Vec<String> = Vec::new();
        for edge in self.requirements_on(name) {
            if !consumers.contains(&edge.consumer) {
                consumers.push(edge.consumer.clone());
            }
        }
        consumers
    }

    /// Installed copies in discovery order
    pub fn packages(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.graph.node_weights().filter_map(|node| match node {
            GraphNode::Package(package) => Some(package),
            _ => None,
        })
    }

    pub fn workspace(&self) -> &[MemberRequirements] {
        &self.workspace
    }

    /// Inputs that were inconsistent and left out
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn package_count(&self) -> usize {
        self.node_map.values().map(Vec::len).sum()
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements().count()
    }
}

fn derive_location(parent_location: &str, name: &str) -> String {
    if parent_location.is_empty() {
        format!("node_modules/{}", name)
    } else {
        format!("{}/node_modules/{}", parent_location, name)
    }
}

fn registry_peers(registry: &RegistryIndex, name: &str, version: &str) -> Vec<VersionRequirement> {
    let metadata = match registry.get(name).and_then(|m| m.versions.get(version)) {
        Some(metadata) => metadata,
        None => return Vec::new(),
    };
    let mut peers: Vec<VersionRequirement> = metadata
        .peer_dependencies
        .iter()
        .map(|(peer, range)| {
            let optional = metadata
                .peer_dependencies_meta
                .get(peer)
                .map(|meta| meta.optional)
                .unwrap_or(false);
            VersionRequirement::peer(peer, range, optional)
        })
        .collect();
    // Registry documents are unordered maps
    peers.sort_by(|a, b| a.name.cmp(&b.name));
    peers
}

/// Every package name worth a registry lookup: installed, declared or overridden
pub fn package_names(snapshot: &ProjectSnapshot) -> BTreeSet<String> {
    fn walk(nodes: &[InstalledNode], names: &mut BTreeSet<String>) {
        for node in nodes {
            if !node.name.trim().is_empty() {
                names.insert(node.name.clone());
            }
            walk(&node.children, names);
        }
    }

    let mut names = BTreeSet::new();
    walk(&snapshot.installed, &mut names);

    let manifests = std::iter::once(&snapshot.root)
        .chain(snapshot.workspaces.iter().filter_map(|m| m.manifest.as_ref()));
    for manifest in manifests {
        names.extend(manifest.requirements().into_iter().map(|req| req.name));
    }
    names.extend(
        snapshot
            .overrides
            .directives()
            .into_iter()
            .map(|directive| directive.package),
    );
    names
}

#[cfg(test)]
mod tests;
