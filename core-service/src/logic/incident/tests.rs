use std::sync::Arc;

use super::manager::IncidentStore;
use super::types::*;
use crate::logic::error::EngineError;
use crate::logic::threat::ThreatAnalysis;

fn phishing_report() -> NewIncident {
    NewIncident {
        title: "Suspicious invoice email".to_string(),
        category: IncidentCategory::Phishing,
        priority: Some(Priority::High),
        reported_by: "hr-desk".to_string(),
        evidence_refs: vec!["email.eml".to_string()],
        ..Default::default()
    }
}

fn sample_analysis(level: i64) -> ThreatAnalysis {
    ThreatAnalysis::build(
        level,
        70,
        vec!["Spoofed sender".to_string()],
        vec!["Block the sender domain".to_string()],
        "test",
        1,
    )
    .unwrap()
}

#[test]
fn test_create_defaults() {
    let store = IncidentStore::new(Priority::Low);
    let inc = store
        .create(NewIncident {
            title: "  Lost badge  ".to_string(),
            category: IncidentCategory::Opsec,
            reported_by: "guard".to_string(),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(inc.title, "Lost badge");
    assert_eq!(inc.status, IncidentStatus::Analyzing);
    assert_eq!(inc.priority, Priority::Low); // configured default
    assert!(inc.analysis.is_none());
    assert_eq!(inc.timeline.len(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_create_rejects_empty_title() {
    let store = IncidentStore::default();
    let result = store.create(NewIncident {
        title: "   ".to_string(),
        ..Default::default()
    });
    assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    assert!(store.is_empty());
}

#[test]
fn test_forward_transitions() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;

    for next in [
        IncidentStatus::Confirmed,
        IncidentStatus::Mitigated,
        IncidentStatus::Closed,
    ] {
        let inc = store.transition(id, next).unwrap();
        assert_eq!(inc.status, next);
    }
    assert!(store.get(id).unwrap().status.is_terminal());
}

#[test]
fn test_backward_and_skip_rejected_without_mutation() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;

    // Skip ahead
    let err = store.transition(id, IncidentStatus::Mitigated).unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition {
            from: IncidentStatus::Analyzing,
            to: IncidentStatus::Mitigated,
        }
    );

    store.transition(id, IncidentStatus::Confirmed).unwrap();
    let before = store.get(id).unwrap();

    // Backward
    assert!(store.transition(id, IncidentStatus::Analyzing).is_err());
    // Same status
    assert!(store.transition(id, IncidentStatus::Confirmed).is_err());

    let after = store.get(id).unwrap();
    assert_eq!(after.status, IncidentStatus::Confirmed);
    assert_eq!(after.timeline.len(), before.timeline.len());
    assert_eq!(after.updated_at, before.updated_at);
}

#[test]
fn test_closed_is_terminal() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;
    store.transition(id, IncidentStatus::Confirmed).unwrap();
    store.transition(id, IncidentStatus::Mitigated).unwrap();
    store.transition(id, IncidentStatus::Closed).unwrap();

    for target in [
        IncidentStatus::Analyzing,
        IncidentStatus::Confirmed,
        IncidentStatus::Mitigated,
        IncidentStatus::Closed,
    ] {
        assert!(store.transition(id, target).is_err());
    }
}

#[test]
fn test_unknown_id_not_found() {
    let store = IncidentStore::default();
    let id = uuid::Uuid::new_v4();
    assert_eq!(store.get(id).unwrap_err(), EngineError::NotFound(id));
    assert_eq!(
        store.attach_analysis(id, sample_analysis(10)).unwrap_err(),
        EngineError::NotFound(id)
    );
    assert!(matches!(
        store.transition(id, IncidentStatus::Confirmed),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_attach_analysis_keeps_status_and_replaces() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;

    let inc = store.attach_analysis(id, sample_analysis(40)).unwrap();
    assert_eq!(inc.status, IncidentStatus::Analyzing);
    assert_eq!(inc.analysis.as_ref().unwrap().threat_level, 40);

    let inc = store.attach_analysis(id, sample_analysis(90)).unwrap();
    assert_eq!(inc.analysis.as_ref().unwrap().threat_level, 90);
    assert_eq!(inc.status, IncidentStatus::Analyzing);
}

#[test]
fn test_evidence_is_append_only() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;

    let inc = store
        .append_evidence(id, vec!["headers.txt".into(), " ".into()], "analyst")
        .unwrap();
    assert_eq!(inc.evidence_refs, vec!["email.eml", "headers.txt"]);
}

#[test]
fn test_list_filter_and_order() {
    let store = IncidentStore::default();
    let first = store.create(phishing_report()).unwrap();
    let second = store
        .create(NewIncident {
            title: "Dropper on workstation".to_string(),
            category: IncidentCategory::Malware,
            priority: Some(Priority::Critical),
            reported_by: "edr".to_string(),
            ..Default::default()
        })
        .unwrap();
    let third = store
        .create(NewIncident {
            title: "Wire transfer request".to_string(),
            category: IncidentCategory::Fraud,
            priority: Some(Priority::High),
            reported_by: "finance".to_string(),
            ..Default::default()
        })
        .unwrap();

    let all = store.list(&IncidentFilter::default());
    let ids: Vec<_> = all.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let oldest = store.list(&IncidentFilter {
        order: ListOrder::OldestFirst,
        ..Default::default()
    });
    assert_eq!(oldest[0].id, first.id);

    let high = store.list(&IncidentFilter {
        priority: Some(Priority::High),
        ..Default::default()
    });
    assert_eq!(high.len(), 2);

    let malware = store.list(&IncidentFilter {
        category: Some(IncidentCategory::Malware),
        ..Default::default()
    });
    assert_eq!(malware.len(), 1);
    assert_eq!(malware[0].id, second.id);

    store.transition(first.id, IncidentStatus::Confirmed).unwrap();
    let confirmed = store.list(&IncidentFilter {
        status: Some(IncidentStatus::Confirmed),
        ..Default::default()
    });
    assert_eq!(confirmed.len(), 1);
}

#[test]
fn test_stats_and_assign() {
    let store = IncidentStore::default();
    let id = store.create(phishing_report()).unwrap().id;
    store.attach_analysis(id, sample_analysis(55)).unwrap();
    let inc = store.assign(id, "Lisa Wang").unwrap();
    assert_eq!(inc.assignee.as_deref(), Some("Lisa Wang"));
    assert!(store.assign(id, "").is_err());

    let stats = store.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.analyzing, 1);
    assert_eq!(stats.high, 1);
    assert_eq!(stats.analyzed, 1);
}

#[test]
fn test_concurrent_transitions_only_one_wins() {
    let store = Arc::new(IncidentStore::default());
    let id = store.create(phishing_report()).unwrap().id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.transition(id, IncidentStatus::Confirmed).is_ok())
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(wins, 1);
    assert_eq!(store.get(id).unwrap().status, IncidentStatus::Confirmed);
}

#[test]
fn test_status_ordering() {
    assert!(IncidentStatus::Analyzing < IncidentStatus::Confirmed);
    assert!(IncidentStatus::Mitigated < IncidentStatus::Closed);
    assert_eq!(IncidentStatus::Closed.next(), None);
    assert!(IncidentStatus::Analyzing.can_transition_to(IncidentStatus::Confirmed));
    assert!(!IncidentStatus::Analyzing.can_transition_to(IncidentStatus::Closed));
}
