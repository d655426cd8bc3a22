// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The merged view of several registries and dependency ordering over it.

use std::collections::HashMap;

use pluginmaster_core::ResolutionError;
use pluginmaster_manifest::descriptor::{is_url_reference, name_key};
use pluginmaster_manifest::PluginDescriptor;
use tracing::debug;

/// A descriptor together with the registry that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlugin {
    pub registry: String,
    pub descriptor: PluginDescriptor,
}

/// Plugins from every registry, first registry wins on a name clash.
#[derive(Debug, Default)]
pub struct RegistryIndex {
    plugins: Vec<ResolvedPlugin>,
    by_key: HashMap<String, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// How a walk treats a reference that matches no plugin in the index.
#[derive(Clone, Copy)]
enum Unresolved {
    Fail,
    Skip,
}

impl RegistryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registry's descriptors. Registries must be added in priority
    /// order; names already defined by an earlier registry are skipped.
    pub fn add_registry(&mut self, registry: &str, descriptors: Vec<PluginDescriptor>) {
        for descriptor in descriptors {
            let key = descriptor.key();
            if let Some(&existing) = self.by_key.get(&key) {
                debug!(
                    plugin = %descriptor.name,
                    shadowed_by = %self.plugins[existing].registry,
                    %registry,
                    "plugin already defined by an earlier registry"
                );
                continue;
            }
            self.by_key.insert(key, self.plugins.len());
            self.plugins.push(ResolvedPlugin {
                registry: registry.to_string(),
                descriptor,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Find the plugin a dependency reference points at.
    pub fn lookup(&self, reference: &str) -> Option<&ResolvedPlugin> {
        self.position(reference).map(|i| &self.plugins[i])
    }

    fn position(&self, reference: &str) -> Option<usize> {
        if is_url_reference(reference) {
            self.plugins
                .iter()
                .position(|p| p.descriptor.is_referenced_by(reference))
        } else {
            self.by_key.get(&name_key(reference)).copied()
        }
    }

    /// Install order for `name`: every dependency precedes its dependents
    /// and `name` itself comes last.
    pub fn install_order(&self, name: &str) -> Result<Vec<ResolvedPlugin>, ResolutionError> {
        let root = self
            .position(name)
            .ok_or_else(|| ResolutionError::UnknownPlugin {
                name: name.to_string(),
            })?;

        let mut marks = HashMap::new();
        let mut order = Vec::new();
        self.walk(root, &mut marks, &mut order, Unresolved::Fail)?;

        Ok(order.into_iter().map(|i| self.plugins[i].clone()).collect())
    }

    /// The first dependency cycle anywhere in the index, as a path that
    /// starts and ends with the same plugin. References to plugins outside
    /// the index are treated as leaves.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = HashMap::new();
        let mut order = Vec::new();
        for root in 0..self.plugins.len() {
            if let Err(ResolutionError::Cycle { path }) =
                self.walk(root, &mut marks, &mut order, Unresolved::Skip)
            {
                return Some(path);
            }
        }
        None
    }

    /// Depth-first walk from `root` with an explicit stack, so long
    /// dependency chains cannot exhaust the thread stack. Each frame is a
    /// plugin and the position of its next dependency to visit.
    fn walk(
        &self,
        root: usize,
        marks: &mut HashMap<usize, Mark>,
        order: &mut Vec<usize>,
        unresolved: Unresolved,
    ) -> Result<(), ResolutionError> {
        if marks.contains_key(&root) {
            return Ok(());
        }
        marks.insert(root, Mark::Visiting);
        let mut stack = vec![(root, 0usize)];

        while let Some((index, next)) = stack.pop() {
            let descriptor = &self.plugins[index].descriptor;
            let Some(dependency) = descriptor.dependencies.get(next) else {
                marks.insert(index, Mark::Done);
                order.push(index);
                continue;
            };
            stack.push((index, next + 1));

            let Some(target) = self.position(dependency) else {
                match unresolved {
                    Unresolved::Fail => {
                        return Err(ResolutionError::UnknownDependency {
                            plugin: descriptor.name.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                    Unresolved::Skip => continue,
                }
            };

            match marks.get(&target) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|&(i, _)| i == target).unwrap_or(0);
                    let path = stack[start..]
                        .iter()
                        .map(|&(i, _)| i)
                        .chain(std::iter::once(target))
                        .map(|i| self.plugins[i].descriptor.name.clone())
                        .collect();
                    return Err(ResolutionError::Cycle { path });
                }
                None => {
                    marks.insert(target, Mark::Visiting);
                    stack.push((target, 0));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(name: &str, deps: &[&str]) -> PluginDescriptor {
        PluginDescriptor {
            name: name.to_string(),
            author: vec!["WigglyMuffin".to_string()],
            description: format!("{name} plugin"),
            repository_url: format!("https://github.com/example/{name}"),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            download_url: format!("https://example.com/{name}/latest.zip"),
            ..Default::default()
        }
    }

    fn names(order: &[ResolvedPlugin]) -> Vec<&str> {
        order.iter().map(|p| p.descriptor.name.as_str()).collect()
    }

    fn questionable_index() -> RegistryIndex {
        let mut index = RegistryIndex::new();
        index.add_registry(
            "main",
            vec![
                plugin("Questionable", &["vnavmesh", "Lifestream", "TextAdvance"]),
                plugin("Lifestream", &["vnavmesh"]),
                plugin("TextAdvance", &[]),
            ],
        );
        index.add_registry("third-party", vec![plugin("vnavmesh", &[])]);
        index
    }

    #[test]
    fn dependencies_come_first() {
        let order = questionable_index().install_order("Questionable").unwrap();
        assert_eq!(
            names(&order),
            vec!["vnavmesh", "Lifestream", "TextAdvance", "Questionable"]
        );
        assert_eq!(order[0].registry, "third-party");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let index = questionable_index();
        assert_eq!(index.lookup("QUESTIONABLE").unwrap().descriptor.name, "Questionable");
        let order = index.install_order("textadvance").unwrap();
        assert_eq!(names(&order), vec!["TextAdvance"]);
    }

    #[test]
    fn first_registry_wins() {
        let mut index = RegistryIndex::new();
        index.add_registry("primary", vec![plugin("vnavmesh", &[])]);
        index.add_registry("mirror", vec![plugin("VNavmesh", &["Other"])]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("vnavmesh").unwrap().registry, "primary");
        assert!(index.install_order("vnavmesh").is_ok());
    }

    #[test]
    fn url_references_resolve() {
        let mut index = RegistryIndex::new();
        index.add_registry(
            "main",
            vec![plugin("Questionable", &["https://github.com/example/vnavmesh/"])],
        );
        index.add_registry("other", vec![plugin("vnavmesh", &[])]);
        let order = index.install_order("Questionable").unwrap();
        assert_eq!(names(&order), vec!["vnavmesh", "Questionable"]);
    }

    #[test]
    fn unknown_plugin() {
        let err = questionable_index().install_order("Unknown").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownPlugin {
                name: "Unknown".to_string()
            }
        );
    }

    #[test]
    fn unknown_dependency() {
        let mut index = RegistryIndex::new();
        index.add_registry("main", vec![plugin("Questionable", &["vnavmesh"])]);
        let err = index.install_order("Questionable").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownDependency {
                plugin: "Questionable".to_string(),
                dependency: "vnavmesh".to_string(),
            }
        );
    }

    #[test]
    fn cycle_across_registries_reports_path() {
        let mut index = RegistryIndex::new();
        index.add_registry("a", vec![plugin("Alpha", &["Beta"])]);
        index.add_registry("b", vec![plugin("Beta", &["Gamma"]), plugin("Gamma", &["alpha"])]);

        let err = index.install_order("Alpha").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::Cycle {
                path: vec![
                    "Alpha".to_string(),
                    "Beta".to_string(),
                    "Gamma".to_string(),
                    "Alpha".to_string()
                ]
            }
        );
    }

    #[test]
    fn cycle_not_involving_root_is_detected() {
        let mut index = RegistryIndex::new();
        index.add_registry(
            "main",
            vec![
                plugin("Root", &["Beta"]),
                plugin("Beta", &["Gamma"]),
                plugin("Gamma", &["Beta"]),
            ],
        );
        let err = index.install_order("Root").unwrap_err();
        let ResolutionError::Cycle { path } = err else {
            panic!("expected cycle");
        };
        assert_eq!(path, vec!["Beta", "Gamma", "Beta"]);
    }

    #[test]
    fn shared_dependency_listed_once() {
        let mut index = RegistryIndex::new();
        index.add_registry(
            "main",
            vec![
                plugin("Top", &["Left", "Right"]),
                plugin("Left", &["Base"]),
                plugin("Right", &["Base"]),
                plugin("Base", &[]),
            ],
        );
        let order = index.install_order("Top").unwrap();
        assert_eq!(names(&order), vec!["Base", "Left", "Right", "Top"]);
    }

    #[test]
    fn long_chain_resolves_without_recursion() {
        const LEN: usize = 100_000;
        let descriptors = (0..LEN)
            .map(|i| {
                let deps: Vec<String> = if i + 1 < LEN {
                    vec![format!("p{}", i + 1)]
                } else {
                    Vec::new()
                };
                let mut d = plugin(&format!("p{i}"), &[]);
                d.dependencies = deps;
                d
            })
            .collect();
        let mut index = RegistryIndex::new();
        index.add_registry("main", descriptors);

        let order = index.install_order("p0").unwrap();
        assert_eq!(order.len(), LEN);
        assert_eq!(order[0].descriptor.name, format!("p{}", LEN - 1));
        assert_eq!(order[LEN - 1].descriptor.name, "p0");
        assert_eq!(index.find_cycle(), None);
    }

    #[test]
    fn find_cycle_looks_past_unknown_references() {
        let mut index = RegistryIndex::new();
        index.add_registry(
            "main",
            vec![
                plugin("Beta", &["Missing", "Gamma"]),
                plugin("Gamma", &["Beta"]),
            ],
        );
        assert!(matches!(
            index.install_order("Beta"),
            Err(ResolutionError::UnknownDependency { .. })
        ));
        assert_eq!(
            index.find_cycle(),
            Some(vec!["Beta".to_string(), "Gamma".to_string(), "Beta".to_string()])
        );
    }

    #[test]
    fn find_cycle_none_for_acyclic_index() {
        assert_eq!(questionable_index().find_cycle(), None);
    }
}
