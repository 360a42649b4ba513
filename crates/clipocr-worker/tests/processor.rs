//! Batch processing against a scripted transport.

mod common;

use clipocr_models::{BatchResult, ClipId, ClipResult, ClipStatus, ProgressEvent};
use clipocr_queue::QueueError;
use clipocr_worker::{ClipOutcome, WorkerError};

use common::{clip_with, Harness};

fn id(s: &str) -> ClipId {
    ClipId::from_string(s)
}

#[tokio::test]
async fn test_pending_done_error_scenario() {
    let h = Harness::new();
    h.add("a", "text:alpha").await;
    h.add_clip(clip_with(
        "b",
        "text:never",
        ClipStatus::Done,
        Some(ClipResult::Text("beta".into())),
    ))
    .await;
    h.add_clip(clip_with(
        "c",
        "status:500",
        ClipStatus::Error,
        Some(ClipResult::Error("old".into())),
    ))
    .await;

    let result = h.processor.process_all().await.unwrap();

    assert_eq!(result, BatchResult::new(2, 1, false));
    assert_eq!(result.failed_count, 1);
    assert_eq!(h.transport.calls(), vec!["text:alpha", "status:500"]);

    assert_eq!(h.status("a").await, ClipStatus::Done);
    assert_eq!(h.result("a").await, Some(ClipResult::Text("alpha".into())));
    assert_eq!(h.status("b").await, ClipStatus::Done);
    assert_eq!(h.result("b").await, Some(ClipResult::Text("beta".into())));
    assert_eq!(h.status("c").await, ClipStatus::Error);
    assert_eq!(
        h.result("c").await,
        Some(ClipResult::Error("OCR service returned HTTP 500".into()))
    );
}

#[tokio::test]
async fn test_clips_submitted_serially_in_queue_order() {
    let h = Harness::new();
    h.add("a", "text:1").await;
    h.add("b", "status:503").await;
    h.add("c", "text:3").await;
    h.add("d", "status:404").await;
    h.queue
        .write()
        .await
        .reorder(&[id("d"), id("c"), id("b"), id("a")])
        .unwrap();

    let result = h.processor.process_all().await.unwrap();

    assert_eq!(
        h.transport.calls(),
        vec!["status:404", "text:3", "status:503", "text:1"]
    );
    assert_eq!(result.total, 4);
    assert_eq!(result.success_count, 2);
    assert_eq!(result.success_count + result.failed_count, result.total);
    assert!(!result.cancelled);
}

#[tokio::test]
async fn test_second_batch_only_retries_failures() {
    let h = Harness::new();
    h.add("a", "text:ok").await;
    h.add("b", "status:500").await;

    h.processor.process_all().await.unwrap();
    let second = h.processor.process_all().await.unwrap();

    assert_eq!(second, BatchResult::new(1, 0, false));
    assert_eq!(h.transport.calls(), vec!["text:ok", "status:500", "status:500"]);
}

#[tokio::test]
async fn test_empty_batch() {
    let h = Harness::new();
    let result = h.processor.process_all().await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result, BatchResult::new(0, 0, false));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_process_one_skips_done_clip() {
    let h = Harness::new();
    h.add_clip(clip_with(
        "a",
        "text:again",
        ClipStatus::Done,
        Some(ClipResult::Text("first".into())),
    ))
    .await;

    let outcome = h.processor.process_one(&id("a")).await.unwrap();

    assert_eq!(outcome, ClipOutcome::Skipped);
    assert!(h.transport.calls().is_empty());
    assert_eq!(h.result("a").await, Some(ClipResult::Text("first".into())));
}

#[tokio::test]
async fn test_process_one_records_outcome() {
    let h = Harness::new();
    h.add("a", "status:500").await;
    h.add("b", "text:bee").await;

    let failed = h.processor.process_one(&id("a")).await.unwrap();
    assert_eq!(
        failed,
        ClipOutcome::Failed("OCR service returned HTTP 500".into())
    );
    assert_eq!(h.status("a").await, ClipStatus::Error);

    let ok = h.processor.process_one(&id("b")).await.unwrap();
    assert_eq!(ok, ClipOutcome::Succeeded);
    assert_eq!(h.status("b").await, ClipStatus::Done);
    assert_eq!(h.transport.calls(), vec!["status:500", "text:bee"]);
}

#[tokio::test]
async fn test_process_one_unknown_clip() {
    let h = Harness::new();
    let err = h.processor.process_one(&id("missing")).await.unwrap_err();
    assert!(matches!(err, WorkerError::ClipNotFound(_)));
}

#[tokio::test]
async fn test_cancel_lets_in_flight_clip_finish() {
    let h = Harness::new();
    h.add("a", "hold:first").await;
    h.add("b", "text:second").await;
    h.add("c", "text:third").await;

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });

    h.transport.entered.notified().await;
    assert_eq!(h.status("a").await, ClipStatus::Processing);
    h.processor.cancel_handle().cancel();
    h.transport.release.notify_one();

    let result = batch.await.unwrap().unwrap();

    assert!(result.cancelled);
    assert_eq!(result.total, 3);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_count, 2);
    assert_eq!(h.status("a").await, ClipStatus::Done);
    assert_eq!(h.status("b").await, ClipStatus::Pending);
    assert_eq!(h.status("c").await, ClipStatus::Pending);
    assert!(h.result("b").await.is_none());
    assert_eq!(h.transport.calls(), vec!["hold:first"]);
}

#[tokio::test]
async fn test_cancel_while_idle_does_not_affect_next_batch() {
    let h = Harness::new();
    h.add("a", "text:ok").await;

    h.processor.cancel();
    let result = h.processor.process_all().await.unwrap();

    assert!(!result.cancelled);
    assert_eq!(result.success_count, 1);
}

#[tokio::test]
async fn test_concurrent_batch_rejected() {
    let h = Harness::new();
    h.add("a", "hold:x").await;

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });
    h.transport.entered.notified().await;

    assert!(h.processor.is_running());
    let err = h.processor.process_all().await.unwrap_err();
    assert!(matches!(err, WorkerError::BatchInProgress));
    let err = h.processor.process_one(&id("a")).await.unwrap_err();
    assert!(matches!(err, WorkerError::BatchInProgress));

    h.transport.release.notify_one();
    assert_eq!(batch.await.unwrap().unwrap().success_count, 1);
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn test_queue_changes_during_batch() {
    let h = Harness::new();
    h.add("a", "hold:first").await;
    h.add("b", "text:second").await;

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });
    h.transport.entered.notified().await;

    {
        let mut queue = h.queue.write().await;
        assert_eq!(
            queue.reorder(&[id("b"), id("a")]).unwrap_err(),
            QueueError::OrderFrozen
        );
        queue.add(common::clip("late", "text:late")).unwrap();
        queue.remove(&id("b")).unwrap();
    }
    h.transport.release.notify_one();

    let result = batch.await.unwrap().unwrap();

    // "b" was removed and "late" arrived after the batch started.
    assert_eq!(result, BatchResult::new(2, 1, false));
    assert_eq!(h.transport.calls(), vec!["hold:first"]);
    assert_eq!(h.status("late").await, ClipStatus::Pending);
    assert!(!h.queue.read().await.is_order_frozen());
}

#[tokio::test]
async fn test_clip_removed_in_flight_is_discarded() {
    let h = Harness::new();
    h.add("a", "hold:gone").await;

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });
    h.transport.entered.notified().await;

    h.queue.write().await.remove(&id("a")).unwrap();
    h.transport.release.notify_one();

    let result = batch.await.unwrap().unwrap();
    assert_eq!(result, BatchResult::new(1, 0, false));
    assert!(h.queue.read().await.is_empty());
}

#[tokio::test]
async fn test_aborted_batch_releases_in_flight_clip() {
    let h = Harness::new();
    h.add("a", "hold:never").await;
    h.add("b", "text:bee").await;

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });
    h.transport.entered.notified().await;

    batch.abort();
    assert!(batch.await.unwrap_err().is_cancelled());

    assert_eq!(h.status("a").await, ClipStatus::Error);
    assert_eq!(
        h.result("a").await,
        Some(ClipResult::Error("OCR request cancelled".into()))
    );
    assert_eq!(h.status("b").await, ClipStatus::Pending);
    assert!(!h.queue.read().await.is_order_frozen());
    assert!(!h.processor.is_running());

    // The abandoned clip is eligible again.
    h.transport.release.notify_one();
    let result = h.processor.process_all().await.unwrap();
    assert_eq!(result, BatchResult::new(2, 2, false));
    assert_eq!(h.status("a").await, ClipStatus::Done);
}

#[tokio::test]
async fn test_unrecordable_result_fails_only_that_clip() {
    let h = Harness::new();
    h.add("a", "hold:first").await;
    h.add("b", "text:second").await;
    let mut events = h.processor.subscribe();

    let processor = h.processor.clone();
    let batch = tokio::spawn(async move { processor.process_all().await });
    h.transport.entered.notified().await;

    h.queue
        .write()
        .await
        .update_status(&id("a"), ClipStatus::Error)
        .unwrap();
    h.transport.release.notify_one();

    let result = batch.await.unwrap().unwrap();

    assert_eq!(result, BatchResult::new(2, 1, false));
    assert_eq!(h.status("a").await, ClipStatus::Error);
    assert_eq!(h.status("b").await, ClipStatus::Done);
    assert_eq!(h.transport.calls(), vec!["hold:first", "text:second"]);

    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        if let ProgressEvent::BatchFinished { result } = event {
            finished = Some(result);
        }
    }
    assert_eq!(finished, Some(result));
}

#[tokio::test]
async fn test_progress_events() {
    let h = Harness::new();
    h.add("a", "text:ok").await;
    h.add("b", "status:500").await;
    let mut events = h.processor.subscribe();

    h.processor.process_all().await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert_eq!(received.len(), 8);
    assert!(matches!(received[0], ProgressEvent::BatchStarted { total: 2 }));
    assert!(matches!(
        &received[1],
        ProgressEvent::ClipStatusChanged { clip_id, status: ClipStatus::Processing, .. } if clip_id.as_str() == "a"
    ));
    assert!(matches!(
        &received[2],
        ProgressEvent::ClipStatusChanged { status: ClipStatus::Done, .. }
    ));
    assert_eq!(received[3].percent(), Some(50));
    assert!(matches!(
        &received[5],
        ProgressEvent::ClipStatusChanged { status: ClipStatus::Error, message: Some(_), .. }
    ));
    assert_eq!(received[6].percent(), Some(100));
    assert!(matches!(
        received[7],
        ProgressEvent::BatchFinished { result } if result == BatchResult::new(2, 1, false)
    ));
}

#[tokio::test]
async fn test_request_tag_forwarded() {
    let h = Harness::new();
    let processor = std::sync::Arc::try_unwrap(h.processor)
        .ok()
        .unwrap()
        .with_request_tag(Some("2column".into()));
    h.queue.write().await.add(common::clip("a", "text:x")).unwrap();

    processor.process_all().await.unwrap();

    assert_eq!(
        *h.transport.tags.lock().unwrap(),
        vec![Some("2column".to_string())]
    );
}
