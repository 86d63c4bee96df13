// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use stockwatch_ingest::config::settings::ScraperSettings;
use stockwatch_ingest::domain::models::message::{Channel, DomainMessage, Payload, PublishEnvelope};
use stockwatch_ingest::utils::errors::{
    ConfigurationError, OrchestratorError, ProcessTerminationError,
};
use stockwatch_ingest::workers::{ControlChannel, ControlMessage, Scraper, ScraperOrchestrator};

use super::helpers::scrapers::{
    announcement, EchoScraper, MisconfiguredScraper, PanickingScraper, StubbornScraper,
};
use super::helpers::wait_until;

fn settings() -> ScraperSettings {
    ScraperSettings {
        stop_grace_period_secs: 1,
        relay_idle_timeout_ms: 20,
        ..Default::default()
    }
}

async fn recv_message(channel: &mut ControlChannel) -> ControlMessage {
    tokio::time::timeout(Duration::from_secs(5), channel.recv())
        .await
        .expect("timed out waiting for relayed message")
        .expect("relay closed the caller channel")
}

#[test]
fn test_add_scrapers_registers_processes() {
    let orchestrator = ScraperOrchestrator::new(&settings());
    let first: Arc<dyn Scraper> = Arc::new(EchoScraper::new("first", 0));
    let second: Arc<dyn Scraper> = Arc::new(EchoScraper::new("second", 0));

    orchestrator
        .add_scrapers(vec![first.clone(), second.clone()])
        .unwrap();

    assert!(orchestrator.has_scraper(&first));
    assert!(orchestrator.has_scraper(&second));
    assert_eq!(orchestrator.scraper_count(), 2);
    assert_eq!(orchestrator.process_count(), 2);
}

#[test]
fn test_adding_same_scraper_twice_creates_two_processes() {
    let orchestrator = ScraperOrchestrator::new(&settings());
    let scraper: Arc<dyn Scraper> = Arc::new(EchoScraper::new("dup", 0));

    orchestrator.add_scraper(scraper.clone()).unwrap();
    orchestrator.add_scraper(scraper.clone()).unwrap();

    assert!(orchestrator.has_scraper(&scraper));
    assert_eq!(orchestrator.process_count(), 2);
}

#[test]
fn test_has_scraper_uses_identity() {
    let orchestrator = ScraperOrchestrator::new(&settings());
    let registered: Arc<dyn Scraper> = Arc::new(EchoScraper::new("same-name", 0));
    let lookalike: Arc<dyn Scraper> = Arc::new(EchoScraper::new("same-name", 0));

    orchestrator.add_scraper(registered.clone()).unwrap();

    assert!(orchestrator.has_scraper(&registered));
    assert!(!orchestrator.has_scraper(&lookalike));
}

#[test]
fn test_misconfigured_scraper_is_rejected() {
    let orchestrator = ScraperOrchestrator::new(&settings());
    let scraper: Arc<dyn Scraper> = Arc::new(MisconfiguredScraper);

    let result = orchestrator.add_scraper(scraper.clone());

    assert_eq!(
        result,
        Err(ConfigurationError::MissingProfile("stock_watch_bot".to_string()))
    );
    assert!(!orchestrator.has_scraper(&scraper));
    assert_eq!(orchestrator.process_count(), 0);
}

#[test]
fn test_add_scrapers_stops_at_first_failure_without_rollback() {
    let orchestrator = ScraperOrchestrator::new(&settings());
    let before: Arc<dyn Scraper> = Arc::new(EchoScraper::new("before", 0));
    let broken: Arc<dyn Scraper> = Arc::new(MisconfiguredScraper);
    let after: Arc<dyn Scraper> = Arc::new(EchoScraper::new("after", 0));

    let result = orchestrator.add_scrapers(vec![before.clone(), broken, after.clone()]);

    assert!(result.is_err());
    assert!(orchestrator.has_scraper(&before));
    assert!(!orchestrator.has_scraper(&after));
    assert_eq!(orchestrator.process_count(), 1);
}

#[tokio::test]
async fn test_relay_forwards_worker_messages_until_stop() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let alpha = Arc::new(EchoScraper::new("alpha", 2));
    let beta = Arc::new(EchoScraper::new("beta", 1));
    orchestrator.add_scraper(alpha.clone()).unwrap();
    orchestrator.add_scraper(beta.clone()).unwrap();

    let (mut caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };

    let mut relayed = Vec::new();
    for _ in 0..3 {
        relayed.push(recv_message(&mut caller).await);
    }

    // Per-worker order is preserved even though workers interleave
    let alpha_messages: Vec<_> = relayed
        .iter()
        .filter(|m| matches!(m, ControlMessage::Publish(e) if e.message.header == "alpha"))
        .cloned()
        .collect();
    assert_eq!(alpha_messages, vec![announcement("alpha", 0), announcement("alpha", 1)]);
    assert!(relayed.contains(&announcement("beta", 0)));

    caller.send(ControlMessage::Stop).unwrap();
    tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .expect("relay did not end after Stop")
        .unwrap();

    // Ending the relay does not stop the workers
    assert!(alpha.is_running());
    assert!(beta.is_running());

    orchestrator.stop_scrapers().await.unwrap();
    assert!(!alpha.is_running());
    assert!(!beta.is_running());
}

#[tokio::test]
async fn test_caller_messages_are_forwarded_to_workers() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let worker = Arc::new(EchoScraper::new("listener", 0));
    orchestrator.add_scraper(worker.clone()).unwrap();

    let (caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };

    let note = ControlMessage::Publish(PublishEnvelope::new(
        Channel::Research,
        DomainMessage::new("note", Payload::new()),
    ));
    caller.send(note.clone()).unwrap();

    let watched = worker.clone();
    wait_until("worker to receive note", move || !watched.received().is_empty()).await;
    assert_eq!(worker.received(), vec![note]);

    caller.send(ControlMessage::Stop).unwrap();
    relay.await.unwrap();
    orchestrator.stop_scrapers().await.unwrap();
}

#[tokio::test]
async fn test_relay_ends_when_caller_drops() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    orchestrator
        .add_scraper(Arc::new(EchoScraper::new("orphan", 0)))
        .unwrap();

    let (caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };
    drop(caller);

    tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .expect("relay did not notice the closed caller")
        .unwrap();
    orchestrator.stop_scrapers().await.unwrap();
}

#[tokio::test]
async fn test_second_start_does_not_restart_running_workers() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let worker = Arc::new(EchoScraper::new("once", 0));
    orchestrator.add_scraper(worker.clone()).unwrap();

    for _ in 0..2 {
        let (caller, orchestrator_end) = ControlChannel::pair();
        let relay = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
        };
        let watched = worker.clone();
        wait_until("worker to run", move || watched.is_running()).await;
        caller.send(ControlMessage::Stop).unwrap();
        relay.await.unwrap();
    }

    assert_eq!(worker.starts(), 1);
    assert_eq!(orchestrator.running_count(), 1);
    orchestrator.stop_scrapers().await.unwrap();
}

#[tokio::test]
async fn test_start_after_stop_restarts_every_scraper() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let worker = Arc::new(EchoScraper::new("phoenix", 1));
    orchestrator.add_scraper(worker.clone()).unwrap();

    for round in 1..=2 {
        let (mut caller, orchestrator_end) = ControlChannel::pair();
        let relay = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
        };

        assert_eq!(recv_message(&mut caller).await, announcement("phoenix", 0));
        assert_eq!(worker.starts(), round);

        caller.send(ControlMessage::Stop).unwrap();
        relay.await.unwrap();
        orchestrator.stop_scrapers().await.unwrap();
        assert!(!worker.is_running());
    }

    assert_eq!(orchestrator.process_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_reports_worker_that_ignores_stop() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let stubborn = Arc::new(StubbornScraper::new());
    let polite = Arc::new(EchoScraper::new("polite", 0));
    orchestrator.add_scraper(stubborn.clone()).unwrap();
    orchestrator.add_scraper(polite.clone()).unwrap();

    let (caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };
    let (a, b) = (stubborn.clone(), polite.clone());
    wait_until("workers to run", move || a.is_running() && b.is_running()).await;
    caller.send(ControlMessage::Stop).unwrap();
    relay.await.unwrap();

    match orchestrator.stop_scrapers().await {
        Err(OrchestratorError::Termination(failures)) => {
            assert_eq!(
                failures,
                vec![ProcessTerminationError::TimedOut {
                    worker: "stubborn".to_string(),
                    grace: Duration::from_secs(1),
                }]
            );
        }
        other => panic!("expected termination failure, got {:?}", other),
    }

    // The well-behaved worker was still stopped
    assert!(!polite.is_running());
    assert_eq!(orchestrator.running_count(), 0);
}

#[tokio::test]
async fn test_worker_panic_is_contained_and_reported() {
    let orchestrator = Arc::new(ScraperOrchestrator::new(&settings()));
    let healthy = Arc::new(EchoScraper::new("healthy", 1));
    orchestrator.add_scraper(Arc::new(PanickingScraper)).unwrap();
    orchestrator.add_scraper(healthy.clone()).unwrap();

    let (mut caller, orchestrator_end) = ControlChannel::pair();
    let relay = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start_scrapers(orchestrator_end).await })
    };

    // The relay keeps serving the healthy worker after the panic
    assert_eq!(recv_message(&mut caller).await, announcement("healthy", 0));
    caller.send(ControlMessage::Stop).unwrap();
    relay.await.unwrap();

    match orchestrator.stop_scrapers().await {
        Err(OrchestratorError::Termination(failures)) => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                &failures[0],
                ProcessTerminationError::Panicked { worker, reason }
                    if worker == "panicking" && reason.contains("source exploded")
            ));
        }
        other => panic!("expected panic report, got {:?}", other),
    }
    assert!(!healthy.is_running());
}
