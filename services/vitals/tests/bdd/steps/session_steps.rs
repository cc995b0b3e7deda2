//! BDD step definitions for the collection session feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;
use vitals::{Sample, SessionOrchestrator, SessionPolicy, SessionSettings, VitalsError};

use crate::world::{RecordingRecommender, VitalsWorld};

const SAMPLE_SPACING: Duration = Duration::from_millis(20);

#[given(expr = "a collection interval of {int} milliseconds")]
fn collection_interval(world: &mut VitalsWorld, millis: u64) {
    world.collection_interval = Some(Duration::from_millis(millis));
}

#[given("a recommender that answers successfully")]
fn recommender_succeeds(world: &mut VitalsWorld) {
    world.recommender = Some(Arc::new(RecordingRecommender::new(false)));
}

#[given("a recommender that fails")]
fn recommender_fails(world: &mut VitalsWorld) {
    world.recommender = Some(Arc::new(RecordingRecommender::new(true)));
}

fn orchestrator(world: &mut VitalsWorld) -> Arc<SessionOrchestrator> {
    if let Some(orchestrator) = &world.orchestrator {
        return Arc::clone(orchestrator);
    }

    let settings = SessionSettings {
        collection_interval: world
            .collection_interval
            .unwrap_or(Duration::from_millis(300)),
        recommendation_timeout: Duration::from_secs(5),
        policy: SessionPolicy::Reject,
    };
    let recommender = world
        .recommender
        .get_or_insert_with(|| Arc::new(RecordingRecommender::new(false)))
        .clone();
    let orchestrator = Arc::new(SessionOrchestrator::new(
        world.buffer(),
        recommender,
        settings,
        CancellationToken::new(),
    ));
    world.orchestrator = Some(Arc::clone(&orchestrator));
    orchestrator
}

#[when(expr = "a live read starts for {string}")]
async fn live_read_starts(world: &mut VitalsWorld, patient: String) {
    let orchestrator = orchestrator(world);
    let buffer = world.buffer();

    // Marker sample so the session's reset is observable
    buffer.append(Sample::now(0.0, 0.0, 0.0, 0.0)).await;
    world.session = Some(tokio::spawn(async move { orchestrator.run(&patient).await }));

    while !buffer.is_empty().await {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[when(expr = "{int} samples with vitals {float}, {float}, {float}, {float} arrive during collection")]
async fn samples_arrive(
    world: &mut VitalsWorld,
    count: usize,
    spo2: f64,
    temperature: f64,
    ecg: f64,
    gsr: f64,
) {
    let buffer = world.buffer();
    for _ in 0..count {
        tokio::time::sleep(SAMPLE_SPACING).await;
        buffer.append(Sample::now(spo2, temperature, ecg, gsr)).await;
    }
}

#[when(expr = "another live read is requested for {string}")]
async fn overlapping_live_read(world: &mut VitalsWorld, patient: String) {
    let orchestrator = orchestrator(world);
    world.overlapping_result = Some(orchestrator.run(&patient).await);
}

#[when("the live read completes")]
async fn live_read_completes(world: &mut VitalsWorld) {
    let session = world.session.take().expect("no live read started");
    world.session_result = Some(session.await.unwrap());
}

#[then(expr = "the live read returns a recommendation for {string}")]
fn returns_recommendation_for(world: &mut VitalsWorld, patient: String) {
    match world.session_result.as_ref().expect("live read not completed") {
        Ok(record) => {
            assert_eq!(record.patient_name, patient);
            assert_eq!(record.doctor_category, "General Physician");
        }
        Err(e) => panic!("expected a recommendation, got error: {}", e),
    }
}

#[then(expr = "the reported {string} is {string}")]
fn reported_parameter(world: &mut VitalsWorld, name: String, value: String) {
    let record = match world.session_result.as_ref().expect("live read not completed") {
        Ok(record) => record,
        Err(e) => panic!("expected a recommendation, got error: {}", e),
    };
    let parameter = record
        .parameters
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("parameter {} missing", name));
    assert_eq!(parameter.value, value);
}

#[then(expr = "the recommender was asked once about {int} samples")]
async fn recommender_asked_once(world: &mut VitalsWorld, count: usize) {
    let recommender = world.recommender.as_ref().expect("no recommender");
    let seen = recommender.seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].sample_count, count);
}

#[then("the recommender was not asked")]
async fn recommender_not_asked(world: &mut VitalsWorld) {
    let recommender = world.recommender.as_ref().expect("no recommender");
    assert!(recommender.seen.lock().await.is_empty());
}

#[then("the live read fails with insufficient data")]
fn fails_with_insufficient_data(world: &mut VitalsWorld) {
    let result = world.session_result.as_ref().expect("live read not completed");
    assert!(
        matches!(result, Err(VitalsError::InsufficientData { .. })),
        "expected insufficient data, got {:?}",
        result
    );
}

#[then("the live read fails with a recommendation error")]
fn fails_with_recommendation_error(world: &mut VitalsWorld) {
    let result = world.session_result.as_ref().expect("live read not completed");
    assert!(
        matches!(result, Err(VitalsError::Recommendation(_))),
        "expected a recommendation error, got {:?}",
        result
    );
}

#[then("the overlapping live read is rejected as busy")]
fn overlapping_rejected(world: &mut VitalsWorld) {
    let result = world
        .overlapping_result
        .as_ref()
        .expect("no overlapping live read");
    assert!(
        matches!(result, Err(VitalsError::SessionBusy)),
        "expected busy, got {:?}",
        result
    );
}
