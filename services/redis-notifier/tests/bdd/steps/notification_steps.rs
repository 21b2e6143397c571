//! BDD step definitions for outage and recovery alerts

use cucumber::{given, then, when};
use redis_notifier::{ConnectionHealth, ConnectionNotifier, LifecycleEvent};

use crate::world::NotifierWorld;

#[given(expr = "a connection notifier for host {string}")]
fn notifier_for_host(world: &mut NotifierWorld, host: String) {
    let notifier = ConnectionNotifier::new(
        &world.emitter,
        Some("https://hooks.example.com/services/T000/B000/XXXX"),
        host,
        world.webhook.clone(),
    )
    .expect("valid notifier");
    world.notifier = Some(notifier);
}

#[given("the webhook is unreachable")]
fn webhook_unreachable(world: &mut NotifierWorld) {
    world.webhook.set_unreachable(true);
}

#[given("the webhook is reachable")]
fn webhook_reachable(world: &mut NotifierWorld) {
    world.webhook.set_unreachable(false);
}

#[when(expr = "the connection emits {string}")]
async fn connection_emits(world: &mut NotifierWorld, event: String) {
    let event: LifecycleEvent = event.parse().expect("known lifecycle event");
    world.emitter.emit(event).await;
}

#[when(expr = "the connection emits {string} {int} times")]
async fn connection_emits_repeatedly(world: &mut NotifierWorld, event: String, times: usize) {
    let event: LifecycleEvent = event.parse().expect("known lifecycle event");
    for _ in 0..times {
        world.emitter.emit(event).await;
    }
}

#[then(expr = "{int} alert(s) should have been delivered")]
fn alerts_delivered(world: &mut NotifierWorld, count: usize) {
    assert_eq!(world.webhook.delivered.lock().unwrap().len(), count);
}

#[then(expr = "{int} alert(s) should have been attempted")]
fn alerts_attempted(world: &mut NotifierWorld, count: usize) {
    assert_eq!(world.webhook.attempts.lock().unwrap().len(), count);
}

#[then(expr = "delivered alert {int} should read {string}")]
fn delivered_alert_reads(world: &mut NotifierWorld, index: usize, text: String) {
    let delivered = world.webhook.delivered.lock().unwrap();
    assert_eq!(delivered[index - 1], text);
}

#[then(expr = "the connection should be {word}")]
async fn connection_health(world: &mut NotifierWorld, health: String) {
    let notifier = world.notifier.as_ref().expect("notifier not set");
    let expected = match health.as_str() {
        "healthy" => ConnectionHealth::Healthy,
        "degraded" => ConnectionHealth::Degraded,
        other => panic!("unknown health '{other}'"),
    };
    assert_eq!(notifier.health().await, expected);
}
