//! # Collections
//!
//! Declares the six record collections of the registry, the references
//! between them, and the load order those references imply.
//!
//! Everything collection-specific lives in a [`CollectionSpec`]: the
//! directory name, the identifier field, the diagnostic label, the index
//! key, and the projection that turns an accepted record into an index
//! entry. The loader and index builder are generic over it.
//!
//! ## Load Order
//!
//! The declared references form a dependency graph (leagues → teams /
//! rights bundles → events). [`load_order`] resolves it once with a
//! topological sort, so every collection is loaded after all of the
//! collections it references.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::record::Record;

/// The record collections of the registry.
///
/// Variant order is the tie-break order for [`load_order`] and the order
/// in which index documents and tallies are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKind {
    Leagues,
    Teams,
    Venues,
    Broadcasters,
    RightsBundles,
    Events,
}

impl CollectionKind {
    /// Every collection, in declaration order.
    pub const ALL: [CollectionKind; 6] = [
        Self::Leagues,
        Self::Teams,
        Self::Venues,
        Self::Broadcasters,
        Self::RightsBundles,
        Self::Events,
    ];

    /// The static declaration for this collection.
    pub fn spec(self) -> &'static CollectionSpec {
        match self {
            Self::Leagues => &LEAGUES,
            Self::Teams => &TEAMS,
            Self::Venues => &VENUES,
            Self::Broadcasters => &BROADCASTERS,
            Self::RightsBundles => &RIGHTS_BUNDLES,
            Self::Events => &EVENTS,
        }
    }

    /// Directory name under the registry root.
    pub fn dir_name(self) -> &'static str {
        self.spec().dir_name
    }

    /// Name of the identifier field.
    pub fn id_field(self) -> &'static str {
        self.spec().id_field
    }

    /// Singular label used in diagnostics.
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Key used for the entry list in the index document and for metadata counts.
    pub fn index_key(self) -> &'static str {
        self.spec().index_key
    }

    /// References declared on records of this collection, in check order.
    pub fn references(self) -> &'static [Reference] {
        self.spec().references
    }

    /// Collections this one references, deduplicated.
    pub fn dependencies(self) -> Vec<CollectionKind> {
        let targets: BTreeSet<CollectionKind> =
            self.references().iter().map(|r| r.target).collect();
        targets.into_iter().collect()
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Whether a reference must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absence is an error.
    Required,
    /// Absence (missing, null, or empty) projects to `null`.
    Optional,
}

/// A field whose value must equal an identifier in another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: CollectionKind,
    pub requirement: Requirement,
}

impl Reference {
    const fn required(field: &'static str, target: CollectionKind) -> Self {
        Self {
            field,
            target,
            requirement: Requirement::Required,
        }
    }

    const fn optional(field: &'static str, target: CollectionKind) -> Self {
        Self {
            field,
            target,
            requirement: Requirement::Optional,
        }
    }
}

/// How records of a collection are screened beyond shape and uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    /// Loaded by the generic loader. References are cross-checked after
    /// loading; failures are counted but the record stays indexed.
    CrossChecked,
    /// Schema and references are checked during loading; any failure
    /// excludes the record.
    Strict,
}

/// Declaration of one collection.
pub struct CollectionSpec {
    pub kind: CollectionKind,
    pub dir_name: &'static str,
    pub id_field: &'static str,
    pub label: &'static str,
    pub index_key: &'static str,
    pub references: &'static [Reference],
    pub screening: Screening,
    /// Builds the index entry for an accepted record.
    pub project: fn(&Record) -> Map<String, Value>,
}

impl fmt::Debug for CollectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSpec")
            .field("kind", &self.kind)
            .field("dir_name", &self.dir_name)
            .field("id_field", &self.id_field)
            .field("screening", &self.screening)
            .finish_non_exhaustive()
    }
}

const TEAM_REFERENCES: &[Reference] = &[Reference::required("league_id", CollectionKind::Leagues)];

const RIGHTS_BUNDLE_REFERENCES: &[Reference] =
    &[Reference::required("league_id", CollectionKind::Leagues)];

// Check order is significant: the first failure is the one reported.
const EVENT_REFERENCES: &[Reference] = &[
    Reference::required("league_id", CollectionKind::Leagues),
    Reference::required("home_team_id", CollectionKind::Teams),
    Reference::required("away_team_id", CollectionKind::Teams),
    Reference::required("broadcaster_id", CollectionKind::Broadcasters),
    Reference::optional("venue_id", CollectionKind::Venues),
    Reference::optional("rights_bundle_id", CollectionKind::RightsBundles),
];

static LEAGUES: CollectionSpec = CollectionSpec {
    kind: CollectionKind::Leagues,
    dir_name: "leagues",
    id_field: "league_id",
    label: "league",
    index_key: "leagues",
    references: &[],
    screening: Screening::CrossChecked,
    project: project_league,
};

static TEAMS: CollectionSpec = CollectionSpec {
    kind: CollectionKind::Teams,
    dir_name: "teams",
    id_field: "team_id",
    label: "team",
    index_key: "teams",
    references: TEAM_REFERENCES,
    screening: Screening::CrossChecked,
    project: project_team,
};

static VENUES: CollectionSpec = CollectionSpec {
    kind: CollectionKind::Venues,
    dir_name: "venues",
    id_field: "venue_id",
    label: "venue",
    index_key: "venues",
    references: &[],
    screening: Screening::CrossChecked,
    project: project_venue,
};

static BROADCASTERS: CollectionSpec = CollectionSpec {
    kind: CollectionKind::Broadcasters,
    dir_name: "broadcasters",
    id_field: "broadcaster_id",
    label: "broadcaster",
    index_key: "broadcasters",
    references: &[],
    screening: Screening::CrossChecked,
    project: project_broadcaster,
};

static RIGHTS_BUNDLES: CollectionSpec = CollectionSpec {
    kind: CollectionKind::RightsBundles,
    dir_name: "rights-bundles",
    id_field: "rights_bundle_id",
    label: "rights-bundle",
    index_key: "rights_bundles",
    references: RIGHTS_BUNDLE_REFERENCES,
    screening: Screening::CrossChecked,
    project: project_rights_bundle,
};

static EVENTS: CollectionSpec = CollectionSpec {
    kind: CollectionKind::Events,
    dir_name: "events",
    id_field: "event_id",
    label: "event",
    index_key: "events",
    references: EVENT_REFERENCES,
    screening: Screening::Strict,
    project: project_event,
};

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

const DEFAULT_STATUS: &str = "active";

/// Starts an entry with the identifier and path fields.
fn entry_head(id_field: &str, record: &Record) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert(id_field.to_string(), Value::String(record.id().to_string()));
    entry.insert("path".to_string(), Value::String(record.path().to_string()));
    entry
}

/// Copies a display field through, or `null` when absent.
fn copy_or_null(entry: &mut Map<String, Value>, record: &Record, field: &str) {
    let value = record.get(field).cloned().unwrap_or(Value::Null);
    entry.insert(field.to_string(), value);
}

/// Copies a reference field as a string, or `null` when absent or empty.
fn reference_or_null(entry: &mut Map<String, Value>, record: &Record, field: &str) {
    let value = record
        .get_str(field)
        .map(|s| Value::String(s.to_string()))
        .unwrap_or(Value::Null);
    entry.insert(field.to_string(), value);
}

fn entry_tail(mut entry: Map<String, Value>, record: &Record) -> Map<String, Value> {
    let status = match record.get("status") {
        Some(Value::Null) | None => Value::String(DEFAULT_STATUS.to_string()),
        Some(Value::String(s)) if s.is_empty() => Value::String(DEFAULT_STATUS.to_string()),
        Some(other) => other.clone(),
    };
    entry.insert("status".to_string(), status);
    entry.insert(
        "hash_sha256".to_string(),
        Value::String(record.digest().to_string()),
    );
    entry
}

fn project_league(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("league_id", record);
    copy_or_null(&mut entry, record, "name");
    copy_or_null(&mut entry, record, "region");
    entry_tail(entry, record)
}

fn project_team(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("team_id", record);
    copy_or_null(&mut entry, record, "name");
    reference_or_null(&mut entry, record, "league_id");
    entry_tail(entry, record)
}

fn project_venue(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("venue_id", record);
    copy_or_null(&mut entry, record, "name");
    copy_or_null(&mut entry, record, "city");
    copy_or_null(&mut entry, record, "country");
    entry_tail(entry, record)
}

fn project_broadcaster(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("broadcaster_id", record);
    copy_or_null(&mut entry, record, "name");
    copy_or_null(&mut entry, record, "region");
    entry_tail(entry, record)
}

fn project_rights_bundle(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("rights_bundle_id", record);
    copy_or_null(&mut entry, record, "name");
    reference_or_null(&mut entry, record, "league_id");
    entry_tail(entry, record)
}

/// Event entries carry every reference and no status.
fn project_event(record: &Record) -> Map<String, Value> {
    let mut entry = entry_head("event_id", record);
    reference_or_null(&mut entry, record, "league_id");
    copy_or_null(&mut entry, record, "start_time");
    for field in [
        "home_team_id",
        "away_team_id",
        "broadcaster_id",
        "venue_id",
        "rights_bundle_id",
    ] {
        reference_or_null(&mut entry, record, field);
    }
    entry.insert(
        "hash_sha256".to_string(),
        Value::String(record.digest().to_string()),
    );
    entry
}

// ---------------------------------------------------------------------------
// Dependency graph
// ---------------------------------------------------------------------------

/// Order every collection after the collections it references.
///
/// # Errors
///
/// [`RegistryError::DependencyCycle`] if the reference declarations are cyclic.
pub fn load_order() -> Result<Vec<CollectionKind>, RegistryError> {
    topological_order(&CollectionKind::ALL, |kind| kind.dependencies())
        .map_err(RegistryError::DependencyCycle)
}

/// Kahn's algorithm over `nodes`, where `dependencies(n)` must precede `n`.
///
/// Among nodes that are ready at the same time, the smallest by `Ord`
/// goes first, so the result is fully deterministic. Dependencies outside
/// `nodes` are ignored. On a cycle, returns the nodes that could not be
/// ordered.
pub fn topological_order<N, F>(nodes: &[N], dependencies: F) -> Result<Vec<N>, Vec<N>>
where
    N: Copy + Ord,
    F: Fn(N) -> Vec<N>,
{
    let members: BTreeSet<N> = nodes.iter().copied().collect();
    let mut pending: BTreeMap<N, BTreeSet<N>> = members
        .iter()
        .map(|&n| {
            let deps = dependencies(n)
                .into_iter()
                .filter(|d| members.contains(d) && *d != n)
                .collect();
            (n, deps)
        })
        .collect();

    let mut order = Vec::with_capacity(members.len());
    loop {
        let ready = pending
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(&n, _)| n);
        let Some(next) = ready else { break };

        pending.remove(&next);
        for deps in pending.values_mut() {
            deps.remove(&next);
        }
        order.push(next);
    }

    if pending.is_empty() {
        Ok(order)
    } else {
        Err(pending.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(id: &str, fields: Value) -> Record {
        let Value::Object(fields) = fields else {
            panic!("fixture must be an object");
        };
        Record::new(id.to_string(), "x/y.json".to_string(), "ab".repeat(32), fields)
    }

    #[test]
    fn load_order_puts_dependencies_first() {
        let order = load_order().unwrap();
        assert_eq!(
            order,
            vec![
                CollectionKind::Leagues,
                CollectionKind::Teams,
                CollectionKind::Venues,
                CollectionKind::Broadcasters,
                CollectionKind::RightsBundles,
                CollectionKind::Events,
            ]
        );
        let pos = |k: CollectionKind| order.iter().position(|&o| o == k).unwrap();
        for kind in CollectionKind::ALL {
            for dep in kind.dependencies() {
                assert!(pos(dep) < pos(kind), "{dep} must load before {kind}");
            }
        }
    }

    #[test]
    fn events_depend_on_every_other_collection() {
        assert_eq!(
            CollectionKind::Events.dependencies(),
            vec![
                CollectionKind::Leagues,
                CollectionKind::Teams,
                CollectionKind::Venues,
                CollectionKind::Broadcasters,
                CollectionKind::RightsBundles,
            ]
        );
    }

    #[test]
    fn event_reference_check_order_is_fixed() {
        let fields: Vec<&str> = CollectionKind::Events
            .references()
            .iter()
            .map(|r| r.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "league_id",
                "home_team_id",
                "away_team_id",
                "broadcaster_id",
                "venue_id",
                "rights_bundle_id"
            ]
        );
    }

    #[test]
    fn only_events_are_strictly_screened() {
        for kind in CollectionKind::ALL {
            let strict = kind.spec().screening == Screening::Strict;
            assert_eq!(strict, kind == CollectionKind::Events);
            assert_eq!(kind.spec().kind, kind);
        }
    }

    #[test]
    fn topological_order_detects_cycle() {
        let deps = |n: u8| match n {
            1 => vec![2],
            2 => vec![3],
            3 => vec![1],
            _ => vec![],
        };
        assert_eq!(topological_order(&[0, 1, 2, 3], deps), Err(vec![1, 2, 3]));
    }

    #[test]
    fn topological_order_ignores_self_and_foreign_edges() {
        let deps = |n: u8| vec![n, 42];
        assert_eq!(topological_order(&[2, 1], deps), Ok(vec![1, 2]));
    }

    #[test]
    fn league_projection_defaults_status_and_nulls_region() {
        let entry = project_league(&record("L1", json!({ "league_id": "L1", "name": "Premier" })));
        assert_eq!(
            Value::Object(entry),
            json!({
                "league_id": "L1",
                "path": "x/y.json",
                "name": "Premier",
                "region": null,
                "status": "active",
                "hash_sha256": "ab".repeat(32),
            })
        );
    }

    #[test]
    fn projection_keeps_explicit_status() {
        let entry = project_venue(&record(
            "V1",
            json!({ "venue_id": "V1", "name": "Arena", "city": "Leeds", "status": "closed" }),
        ));
        assert_eq!(entry["status"], "closed");
        assert_eq!(entry["city"], "Leeds");
        assert_eq!(entry["country"], Value::Null);
    }

    #[test]
    fn projection_field_order_is_fixed() {
        let entry = project_team(&record(
            "T1",
            json!({ "status": "active", "league_id": "L1", "name": "Rovers", "team_id": "T1" }),
        ));
        let keys: Vec<&str> = entry.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["team_id", "path", "name", "league_id", "status", "hash_sha256"]
        );
    }

    #[test]
    fn event_projection_nulls_empty_optional_references() {
        let entry = project_event(&record(
            "E1",
            json!({
                "event_id": "E1",
                "league_id": "L1",
                "start_time": "2026-03-07T19:30:00Z",
                "home_team_id": "T1",
                "away_team_id": "T2",
                "broadcaster_id": "B1",
                "venue_id": ""
            }),
        ));
        assert_eq!(entry["venue_id"], Value::Null);
        assert_eq!(entry["rights_bundle_id"], Value::Null);
        assert_eq!(entry["broadcaster_id"], "B1");
        assert!(!entry.contains_key("status"));
    }

    proptest! {
        #[test]
        fn topological_order_respects_acyclic_edges(
            edges in proptest::collection::vec((0u8..12, 0u8..12), 0..40)
        ) {
            // Only keep edges from a larger node to a smaller one: always acyclic.
            let edges: Vec<(u8, u8)> = edges.into_iter().filter(|(a, b)| a > b).collect();
            let nodes: Vec<u8> = (0..12).collect();
            let deps = |n: u8| -> Vec<u8> {
                edges.iter().filter(|(a, _)| *a == n).map(|(_, b)| *b).collect()
            };
            let order = topological_order(&nodes, deps).unwrap();
            prop_assert_eq!(order.len(), nodes.len());
            let pos = |n: u8| order.iter().position(|&o| o == n).unwrap();
            for (a, b) in &edges {
                prop_assert!(pos(*b) < pos(*a));
            }
        }
    }
}
