// tests/collaborator_failures.rs
mod common;

use common::*;
use exposition_scout::collab::TextOrientationReport;
use exposition_scout::{CascadeState, ListingObservation, Orientation, SignalClass};

#[tokio::test]
async fn text_failure_degrades_to_keywords() {
    for failure in [Failure::Timeout, Failure::Malformed, Failure::Unavailable] {
        let text = StubText::failing(failure);
        let text_calls = text.calls.clone();
        let engine = engine(text, StubPhotos::nothing(), StubNeighborhoods::default_table());

        let j = engine.evaluate(&ListingObservation::new("Exposition sud, 5ème étage")).await;
        assert_eq!(calls(&text_calls), 1);
        assert_eq!(j.details.text_source, "keyword", "{failure:?}");
        assert_eq!(j.resolved_by, CascadeState::ExplicitText);
        assert_eq!(j.final_class, SignalClass::Lumineux);
    }
}

#[tokio::test]
async fn photo_failure_moves_on_to_neighborhoods() {
    let photos = StubPhotos::failing(Failure::Timeout);
    let hoods = StubNeighborhoods::default_table();
    let hood_calls = hoods.calls.clone();
    let engine = engine(
        StubText::answering(TextOrientationReport::unavailable()),
        photos,
        hoods,
    );
    let l = ListingObservation::new("Exposé sud-est")
        .with_location("Buttes-Chaumont")
        .with_photos(["a.jpg"]);

    let j = engine.evaluate(&l).await;
    assert_eq!(calls(&hood_calls), 1);
    assert_eq!(j.resolved_by, CascadeState::Contextual);
    // orientation Sud-Est + neighborhood Sud-Est: two bright votes
    assert_eq!(j.final_class, SignalClass::Lumineux);
    assert_eq!(j.confidence_percent, 80);
}

#[tokio::test]
async fn photos_without_a_usable_value_are_absent_evidence() {
    let engine = engine_with_photos(StubPhotos::nothing());
    let l = ListingObservation::new("Studio, 1er étage").with_photos(["a.jpg"]);
    let j = engine.evaluate(&l).await;
    assert_eq!(j.resolved_by, CascadeState::Unknown);
    assert!(j.details.image_brightness.is_none());
    assert_eq!(j.final_class, SignalClass::Moyen);
}

#[tokio::test]
async fn every_collaborator_failing_still_yields_a_judgement() {
    let engine = engine(
        StubText::failing(Failure::Malformed),
        StubPhotos::failing(Failure::Unavailable),
        StubNeighborhoods::failing(),
    );
    let l = ListingObservation::new("Orientation nord")
        .with_location("Belleville")
        .with_photos(["a.jpg"]);
    let j = engine.evaluate(&l).await;
    assert_eq!(j.resolved_by, CascadeState::Unknown);
    assert_eq!(j.details.orientation, Some(Orientation::Nord));
    assert_eq!(j.final_class, SignalClass::Moyen);
    assert!((50..=95).contains(&j.confidence_percent));
}

#[tokio::test]
async fn false_positive_orientation_is_dropped() {
    let text = StubText::answering(TextOrientationReport {
        available: true,
        orientation: Some(Orientation::Sud),
        is_false_positive: true,
        global_confidence: 0.4,
        ..Default::default()
    });
    let engine = engine(text, StubPhotos::nothing(), StubNeighborhoods::default_table());
    let j = engine.evaluate(&ListingObservation::new("Au sud de Paris, proche RER")).await;
    assert_eq!(j.details.orientation, None);
    assert!(j.contributing_signals.is_empty());
    assert_eq!(j.confidence_percent, 50);
}
