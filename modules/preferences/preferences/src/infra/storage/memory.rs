//! In-process graph store.
//!
//! Nodes and relationships live in ordered maps behind a single lock. A
//! write holds the lock for the whole subgraph, so readers never observe a
//! half-written preference.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use preferences_sdk::{Preference, PreferenceId};

use super::graph::{GraphStore, RelType, StoreError};
use super::mapper::{self, ColumnNode, EntryNode, FilterNode, Subgraph};
use crate::domain::repo::PreferenceView;

type NodeId = u64;

#[derive(Debug, Clone)]
enum Node {
    View { name: String },
    Entry(EntryNode),
    Column(ColumnNode),
    Filter(FilterNode),
}

#[derive(Debug, Default)]
struct Graph {
    last_id: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeSet<(RelType, NodeId, NodeId)>,
}

impl Graph {
    fn insert(&mut self, node: Node) -> NodeId {
        self.last_id += 1;
        self.nodes.insert(self.last_id, node);
        self.last_id
    }

    fn targets(&self, rel: RelType, from: NodeId) -> Vec<NodeId> {
        self.edges
            .range((rel, from, NodeId::MIN)..=(rel, from, NodeId::MAX))
            .map(|&(_, _, to)| to)
            .collect()
    }

    fn entry(&self, id: NodeId) -> Option<&EntryNode> {
        match self.nodes.get(&id) {
            Some(Node::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    fn entries(&self) -> impl Iterator<Item = (NodeId, &EntryNode)> {
        self.nodes.iter().filter_map(|(id, node)| match node {
            Node::Entry(entry) => Some((*id, entry)),
            _ => None,
        })
    }

    fn view_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find_map(|(id, node)| match node {
            Node::View { name: n } if n == name => Some(*id),
            _ => None,
        })
    }

    fn entry_by_key(&self, owner: &str, pref_name: &str, grid_name: &str) -> Option<NodeId> {
        self.entries()
            .find(|(_, e)| e.same_key(owner, pref_name, grid_name))
            .map(|(id, _)| id)
    }

    fn load(&self, id: NodeId) -> Result<Option<Preference>, StoreError> {
        let Some(entry) = self.entry(id) else {
            return Ok(None);
        };
        let columns = self
            .targets(RelType::HasColumn, id)
            .into_iter()
            .filter_map(|c| match self.nodes.get(&c) {
                Some(Node::Column(column)) => Some(column.clone()),
                _ => None,
            })
            .collect();
        let filters = self
            .targets(RelType::HasFilter, id)
            .into_iter()
            .filter_map(|f| match self.nodes.get(&f) {
                Some(Node::Filter(filter)) => Some(filter.clone()),
                _ => None,
            })
            .collect();
        let graph = Subgraph {
            entry: entry.clone(),
            columns,
            filters,
        };
        mapper::from_subgraph(id, graph).map(Some)
    }

    fn detach_children(&mut self, id: NodeId) {
        for rel in [RelType::HasColumn, RelType::HasFilter] {
            for child in self.targets(rel, id) {
                self.edges.remove(&(rel, id, child));
                self.nodes.remove(&child);
            }
        }
    }

    /// Drop the links from views to `id`; returns the views it was linked from.
    fn unlink_from_views(&mut self, id: NodeId) -> Vec<NodeId> {
        let views: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|&&(rel, _, to)| rel == RelType::HasPreference && to == id)
            .map(|&(_, view, _)| view)
            .collect();
        for &view in &views {
            self.edges.remove(&(RelType::HasPreference, view, id));
        }
        views
    }

    fn prune_views(&mut self, views: &[NodeId]) {
        for &view in views {
            if self.targets(RelType::HasPreference, view).is_empty() {
                self.nodes.remove(&view);
            }
        }
    }

    fn remove_entry(&mut self, id: NodeId) {
        self.detach_children(id);
        let views = self.unlink_from_views(id);
        self.nodes.remove(&id);
        self.prune_views(&views);
    }

    fn write(&mut self, id: NodeId, graph: Subgraph) {
        let Subgraph {
            entry,
            columns,
            filters,
        } = graph;

        self.detach_children(id);
        let former_views = self.unlink_from_views(id);

        if !entry.grid_name.is_empty() {
            let view = match self.view_id(&entry.grid_name) {
                Some(view) => view,
                None => self.insert(Node::View {
                    name: entry.grid_name.clone(),
                }),
            };
            self.edges.insert((RelType::HasPreference, view, id));
        }
        self.nodes.insert(id, Node::Entry(entry));

        for column in columns {
            let child = self.insert(Node::Column(column));
            self.edges.insert((RelType::HasColumn, id, child));
        }
        for filter in filters {
            let child = self.insert(Node::Filter(filter));
            self.edges.insert((RelType::HasFilter, id, child));
        }
        self.prune_views(&former_views);
    }
}

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: RwLock<Graph>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes of every label, for diagnostics and tests.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.read().nodes.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn save(&self, preference: &Preference) -> Result<PreferenceId, StoreError> {
        let subgraph = mapper::to_subgraph(preference);
        let mut graph = self.graph.write();

        let existing = graph.entry_by_key(&preference.owner, &preference.pref_name, &preference.grid_name);
        let id = if preference.is_persisted() {
            if graph.entry(preference.id).is_none() {
                return Err(StoreError::NotFound);
            }
            if let Some(other) = existing.filter(|&other| other != preference.id) {
                return Err(StoreError::Conflict(format!(
                    "'{}' in '{}' is already stored as preference {other}",
                    preference.pref_name, preference.grid_name
                )));
            }
            preference.id
        } else {
            match existing {
                Some(id) => id,
                None => {
                    graph.last_id += 1;
                    graph.last_id
                }
            }
        };

        graph.write(id, subgraph);
        Ok(id)
    }

    async fn find_by_id(&self, id: PreferenceId) -> Result<Option<Preference>, StoreError> {
        self.graph.read().load(id)
    }

    async fn find_all_by_owner_or_public(
        &self,
        username: &str,
    ) -> Result<Vec<Preference>, StoreError> {
        let graph = self.graph.read();
        let ids: Vec<NodeId> = graph
            .entries()
            .filter(|(_, e)| e.publica || e.owner == username)
            .map(|(id, _)| id)
            .collect();
        ids.into_iter()
            .filter_map(|id| graph.load(id).transpose())
            .collect()
    }

    async fn find_by_name_and_grid(
        &self,
        owner: &str,
        pref_name: &str,
        grid_name: &str,
    ) -> Result<Option<Preference>, StoreError> {
        let graph = self.graph.read();
        match graph.entry_by_key(owner, pref_name, grid_name) {
            Some(id) => graph.load(id),
            None => Ok(None),
        }
    }

    async fn find_view(&self, name: &str) -> Result<Option<PreferenceView>, StoreError> {
        let graph = self.graph.read();
        let Some(view) = graph.view_id(name) else {
            return Ok(None);
        };
        let entries = graph
            .targets(RelType::HasPreference, view)
            .into_iter()
            .filter_map(|id| graph.load(id).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(PreferenceView {
            id: view,
            name: name.to_owned(),
            entries,
        }))
    }

    async fn delete(&self, id: PreferenceId) -> Result<(), StoreError> {
        let mut graph = self.graph.write();
        if graph.entry(id).is_none() {
            return Err(StoreError::NotFound);
        }
        graph.remove_entry(id);
        Ok(())
    }

    async fn delete_all(&self, ids: &[PreferenceId]) -> Result<u64, StoreError> {
        let ids: BTreeSet<NodeId> = ids.iter().copied().collect();
        let mut graph = self.graph.write();
        if ids.iter().any(|&id| graph.entry(id).is_none()) {
            return Err(StoreError::NotFound);
        }
        for &id in &ids {
            graph.remove_entry(id);
        }
        Ok(ids.len() as u64)
    }

    async fn exists_with_other_owner(
        &self,
        view_name: &str,
        pref_name: &str,
        owner: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .graph
            .read()
            .entries()
            .any(|(_, e)| e.grid_name == view_name && e.pref_name == pref_name && e.owner != owner))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use preferences_sdk::{GridLayout, NamedPreference, PreferenceKind};

    fn grid_pref(owner: &str, pref_name: &str, columns: &[&str]) -> Preference {
        Preference {
            id: 0,
            owner: owner.to_owned(),
            publica: false,
            description: String::new(),
            pref_name: pref_name.to_owned(),
            grid_name: "Posicion_Directo".to_owned(),
            kind: PreferenceKind::Grid(GridLayout {
                order_columns: columns.iter().map(|c| (*c).to_owned()).collect(),
                ..GridLayout::default()
            }),
        }
    }

    #[tokio::test]
    async fn first_identity_is_positive() {
        let store = MemoryGraphStore::new();
        let id = store.save(&grid_pref("adminTEST", "Resumen", &[])).await.unwrap();
        assert!(id > 0);
    }

    #[tokio::test]
    async fn overwrite_replaces_column_subtree() {
        let store = MemoryGraphStore::new();
        let id = store
            .save(&grid_pref("adminTEST", "Resumen", &["a", "b", "c"]))
            .await
            .unwrap();
        let nodes_before = store.node_count();

        let again = store
            .save(&grid_pref("adminTEST", "Resumen", &["z"]))
            .await
            .unwrap();
        assert_eq!(again, id);
        // view + entry + one column
        assert_eq!(store.node_count(), 3);
        assert!(nodes_before > store.node_count());

        let stored = store.find_by_id(id).await.unwrap().unwrap();
        let PreferenceKind::Grid(layout) = stored.kind else {
            panic!("expected grid preference");
        };
        assert_eq!(layout.order_columns, vec!["z"]);
    }

    #[tokio::test]
    async fn save_by_unknown_id_is_not_found() {
        let store = MemoryGraphStore::new();
        let mut pref = grid_pref("adminTEST", "Resumen", &[]);
        pref.id = 42;
        assert!(matches!(store.save(&pref).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn save_by_id_cannot_steal_another_key() {
        let store = MemoryGraphStore::new();
        store.save(&grid_pref("adminTEST", "Resumen", &[])).await.unwrap();
        let other = store.save(&grid_pref("adminTEST", "Detalle", &[])).await.unwrap();

        let mut renamed = grid_pref("adminTEST", "Resumen", &[]);
        renamed.id = other;
        assert!(matches!(
            store.save(&renamed).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn view_lists_entries_and_goes_with_the_last_one() {
        let store = MemoryGraphStore::new();
        let a = store.save(&grid_pref("adminTEST", "Resumen", &["a"])).await.unwrap();
        let b = store.save(&grid_pref("userTEST", "Resumen", &["b"])).await.unwrap();
        let free = Preference::from(NamedPreference {
            pref_name: "tema".to_owned(),
            owner: "adminTEST".to_owned(),
            ..NamedPreference::default()
        });
        store.save(&free).await.unwrap();

        let view = store.find_view("Posicion_Directo").await.unwrap().unwrap();
        assert_eq!(view.entries.len(), 2);
        assert!(store.exists_with_other_owner("Posicion_Directo", "Resumen", "adminTEST").await.unwrap());

        let removed = store.delete_all(&[a, b, a]).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.find_view("Posicion_Directo").await.unwrap().is_none());
        // only the ungrouped free-form preference is left
        assert_eq!(store.node_count(), 1);
    }

    #[tokio::test]
    async fn batch_delete_with_an_unknown_id_removes_nothing() {
        let store = MemoryGraphStore::new();
        let a = store.save(&grid_pref("adminTEST", "Resumen", &["a"])).await.unwrap();
        let nodes = store.node_count();

        assert!(matches!(
            store.delete_all(&[a, 404]).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.node_count(), nodes);
        assert!(store.find_by_id(a).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn moving_the_last_entry_drops_the_old_view() {
        let store = MemoryGraphStore::new();
        let id = store.save(&grid_pref("adminTEST", "Resumen", &[])).await.unwrap();

        let mut moved = grid_pref("adminTEST", "Resumen", &[]);
        moved.id = id;
        moved.grid_name = "Posicion_Reporto".to_owned();
        store.save(&moved).await.unwrap();

        assert!(store.find_view("Posicion_Directo").await.unwrap().is_none());
        assert_eq!(
            store.find_view("Posicion_Reporto").await.unwrap().unwrap().entries.len(),
            1
        );
        // new view + entry
        assert_eq!(store.node_count(), 2);

        store.delete(id).await.unwrap();
        assert_eq!(store.node_count(), 0);
    }

    #[tokio::test]
    async fn overwrite_in_place_keeps_the_view_identity() {
        let store = MemoryGraphStore::new();
        store.save(&grid_pref("adminTEST", "Resumen", &["a"])).await.unwrap();
        let before = store.find_view("Posicion_Directo").await.unwrap().unwrap().id;

        store.save(&grid_pref("adminTEST", "Resumen", &["b"])).await.unwrap();
        let after = store.find_view("Posicion_Directo").await.unwrap().unwrap().id;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn owner_or_public_query_is_ordered_by_id() {
        let store = MemoryGraphStore::new();
        let mut public = grid_pref("userTEST", "Publica", &[]);
        public.publica = true;
        let a = store.save(&grid_pref("adminTEST", "Uno", &[])).await.unwrap();
        let b = store.save(&public).await.unwrap();
        store.save(&grid_pref("userTEST", "Privada", &[])).await.unwrap();
        let c = store.save(&grid_pref("adminTEST", "Dos", &[])).await.unwrap();

        let found: Vec<PreferenceId> = store
            .find_all_by_owner_or_public("adminTEST")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(found, vec![a, b, c]);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let store = MemoryGraphStore::new();
        assert!(matches!(store.delete(9).await, Err(StoreError::NotFound)));
    }
}
