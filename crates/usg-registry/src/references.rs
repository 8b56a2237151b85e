//! # Referential Integrity
//!
//! Resolves the declared [`Reference`]s of a record against the collections
//! already loaded into a [`RegistryContext`].
//!
//! ## Policy
//!
//! - A required reference must be a non-empty string naming an accepted
//!   identifier in its target collection.
//! - An optional reference that is absent, null, or empty resolves to
//!   `None`. When present it must resolve like a required one.
//! - A non-string reference value is always an error.
//! - References are checked in declaration order and the first failure
//!   stops the check. One record yields at most one reference error.
//!
//! Two callers apply this differently. Event loading uses
//! [`check_references`] as a screen, so a failure excludes the event.
//! [`cross_check`] runs over already-loaded non-event collections and only
//! flags and counts; flagged records remain in their collection.

use serde_json::Value;

use crate::collection::{CollectionKind, Reference, Requirement, Screening};
use crate::context::RegistryContext;
use crate::diagnostics::{report, DiagnosticSink};
use crate::error::{json_type_name, RecordError};
use crate::record::Record;

/// Resolve one reference on `record`.
///
/// Returns the referenced identifier, or `None` for an absent optional
/// reference.
pub fn resolve(
    record: &Record,
    reference: &Reference,
    ctx: &RegistryContext,
) -> Result<Option<String>, RecordError> {
    let value = match record.get(reference.field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            return Err(RecordError::InvalidReference {
                field: reference.field,
                target: reference.target,
                found: json_type_name(other),
            })
        }
    };

    let Some(value) = value else {
        return match reference.requirement {
            Requirement::Required => Err(RecordError::MissingReference {
                field: reference.field,
                target: reference.target,
            }),
            Requirement::Optional => Ok(None),
        };
    };

    if ctx.contains(reference.target, value) {
        Ok(Some(value.to_string()))
    } else {
        Err(RecordError::DanglingReference {
            field: reference.field,
            target: reference.target,
            value: value.to_string(),
        })
    }
}

/// Check `references` in order, stopping at the first failure.
pub fn check_references(
    record: &Record,
    references: &[Reference],
    ctx: &RegistryContext,
) -> Result<(), RecordError> {
    for reference in references {
        resolve(record, reference, ctx)?;
    }
    Ok(())
}

/// Check the references of every loaded cross-checked collection.
///
/// Each failing record is reported once, flagged in its collection, and
/// counted. Returns the number of reference errors.
pub fn cross_check(ctx: &mut RegistryContext, sink: &mut dyn DiagnosticSink) -> usize {
    let mut failures: Vec<(CollectionKind, String, RecordError)> = Vec::new();

    for kind in CollectionKind::ALL {
        let spec = kind.spec();
        if spec.screening != Screening::CrossChecked || spec.references.is_empty() {
            continue;
        }
        let Some(collection) = ctx.get(kind) else {
            continue;
        };
        for record in collection.records() {
            if let Err(e) = check_references(record, spec.references, ctx) {
                failures.push((kind, record.id().to_string(), e));
            }
        }
    }

    let count = failures.len();
    for (kind, id, error) in failures {
        if let Some(collection) = ctx.get_mut(kind) {
            collection.flag(&id);
        }
        report(sink, kind, id, error);
    }

    tracing::info!(reference_errors = count, "cross-collection references checked");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::loader::load_collection;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        let Value::Object(fields) = fields else {
            panic!("fixture must be an object");
        };
        Record::new("X".into(), "events/x.json".into(), "00".repeat(32), fields)
    }

    /// A context with one league `L1`, teams `T1`/`T2`, and broadcaster `B1`.
    fn context() -> (tempfile::TempDir, RegistryContext) {
        let root = tempfile::tempdir().unwrap();
        let write = |dir: &str, name: &str, body: &str| {
            let d = root.path().join(dir);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join(name), body).unwrap();
        };
        write("leagues", "L1.json", r#"{"league_id": "L1"}"#);
        write("teams", "T1.json", r#"{"team_id": "T1", "league_id": "L1"}"#);
        write("teams", "T2.json", r#"{"team_id": "T2", "league_id": "L_MISSING"}"#);
        write("broadcasters", "B1.json", r#"{"broadcaster_id": "B1"}"#);
        write("venues", ".keep", "");
        write("rights-bundles", ".keep", "");

        let mut ctx = RegistryContext::new();
        let mut sink = CollectingSink::new();
        for kind in [
            CollectionKind::Leagues,
            CollectionKind::Teams,
            CollectionKind::Venues,
            CollectionKind::Broadcasters,
            CollectionKind::RightsBundles,
        ] {
            let dir = root.path().join(kind.dir_name());
            ctx.insert(load_collection(kind, &dir, root.path(), &mut sink).unwrap());
        }
        (root, ctx)
    }

    fn event(overrides: Value) -> Record {
        let mut base = json!({
            "event_id": "E1",
            "league_id": "L1",
            "home_team_id": "T1",
            "away_team_id": "T2",
            "broadcaster_id": "B1"
        });
        if let (Value::Object(b), Value::Object(o)) = (&mut base, overrides) {
            for (k, v) in o {
                b.insert(k, v);
            }
        }
        record(base)
    }

    #[test]
    fn required_reference_resolves() {
        let (_root, ctx) = context();
        let reference = CollectionKind::Events.references()[0];
        assert_eq!(
            resolve(&event(json!({})), &reference, &ctx).unwrap(),
            Some("L1".to_string())
        );
    }

    #[test]
    fn absent_optional_reference_is_none() {
        let (_root, ctx) = context();
        let venue = CollectionKind::Events.references()[4];
        assert_eq!(venue.field, "venue_id");
        assert_eq!(resolve(&event(json!({})), &venue, &ctx).unwrap(), None);
        assert_eq!(
            resolve(&event(json!({ "venue_id": "" })), &venue, &ctx).unwrap(),
            None
        );
        assert_eq!(
            resolve(&event(json!({ "venue_id": null })), &venue, &ctx).unwrap(),
            None
        );
    }

    #[test]
    fn present_optional_reference_must_resolve() {
        let (_root, ctx) = context();
        let err = check_references(
            &event(json!({ "venue_id": "V404" })),
            CollectionKind::Events.references(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::DanglingReference { field: "venue_id", target: CollectionKind::Venues, ref value } if value == "V404"
        ));
    }

    #[test]
    fn missing_required_reference() {
        let (_root, ctx) = context();
        let err = check_references(
            &event(json!({ "broadcaster_id": "" })),
            CollectionKind::Events.references(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingReference { field: "broadcaster_id", .. }
        ));
    }

    #[test]
    fn non_string_reference_is_invalid() {
        let (_root, ctx) = context();
        let err = check_references(
            &event(json!({ "rights_bundle_id": 5 })),
            CollectionKind::Events.references(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidReference { found: "number", .. }));
    }

    #[test]
    fn first_failure_short_circuits() {
        let (_root, ctx) = context();
        // Both the league and the broadcaster dangle; only the league is reported.
        let err = check_references(
            &event(json!({ "league_id": "L9", "broadcaster_id": "B9" })),
            CollectionKind::Events.references(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::DanglingReference { field: "league_id", .. }));
    }

    #[test]
    fn cross_check_flags_but_retains() {
        let (_root, mut ctx) = context();
        let mut sink = CollectingSink::new();

        let errors = cross_check(&mut ctx, &mut sink);

        assert_eq!(errors, 1);
        let teams = ctx.get(CollectionKind::Teams).unwrap();
        assert!(teams.contains("T2"));
        assert!(teams.is_flagged("T2"));
        assert!(!teams.is_flagged("T1"));
        assert_eq!(teams.valid(), 1);
        assert_eq!(sink.diagnostics()[0].subject, "T2");
        assert!(sink.diagnostics()[0].error.is_reference_error());
    }

    #[test]
    fn reference_to_unloaded_collection_dangles() {
        let ctx = RegistryContext::new();
        let err = check_references(
            &record(json!({ "league_id": "L1" })),
            CollectionKind::Teams.references(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::DanglingReference { .. }));
    }
}
