//! BDD step definitions for notifier construction

use cucumber::{given, then, when};
use redis_notifier::{ConnectionNotifier, LifecycleEvent, NotifierError};

use crate::world::NotifierWorld;

#[given("a connection handle")]
fn connection_handle(_world: &mut NotifierWorld) {}

#[given("a closed connection handle")]
fn closed_connection_handle(world: &mut NotifierWorld) {
    world.emitter.close();
}

#[when(expr = "a notifier is created with webhook URL {string}")]
fn create_with_url(world: &mut NotifierWorld, url: String) {
    match ConnectionNotifier::new(
        &world.emitter,
        Some(url.as_str()),
        "cache-1",
        world.webhook.clone(),
    ) {
        Ok(notifier) => world.notifier = Some(notifier),
        Err(e) => world.construction_error = Some(e),
    }
}

#[when("a notifier is created without a webhook URL")]
fn create_without_url(world: &mut NotifierWorld) {
    match ConnectionNotifier::new(&world.emitter, None, "cache-1", world.webhook.clone()) {
        Ok(notifier) => world.notifier = Some(notifier),
        Err(e) => world.construction_error = Some(e),
    }
}

#[then("construction should fail with a configuration error")]
fn construction_fails(world: &mut NotifierWorld) {
    assert!(world.notifier.is_none());
    let err = world
        .construction_error
        .as_ref()
        .expect("construction did not fail");
    assert!(matches!(err, NotifierError::Config(_)), "{err:?}");
}

#[then(expr = "the error message should contain {string}")]
fn error_message_contains(world: &mut NotifierWorld, text: String) {
    let err = world.construction_error.as_ref().expect("no error");
    assert!(err.to_string().contains(&text), "{err}");
}

#[then("construction should succeed")]
fn construction_succeeds(world: &mut NotifierWorld) {
    assert!(
        world.notifier.is_some(),
        "construction failed: {:?}",
        world.construction_error
    );
}

#[then(expr = "the connection should have {int} listener(s) for each lifecycle event")]
fn listeners_per_event(world: &mut NotifierWorld, count: usize) {
    for event in LifecycleEvent::ALL {
        assert_eq!(world.emitter.listener_count(event), count, "{event}");
    }
}

#[when("the notifier is detached")]
fn detach(world: &mut NotifierWorld) {
    let notifier = world.notifier.as_ref().expect("notifier not set");
    notifier.detach();
}
