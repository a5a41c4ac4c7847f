//! Integration tests for diagnostic channels
//!
//! These tests validate:
//! - Index assignment and delivery order
//! - Parent/child forwarding and shutdown ordering
//! - Misuse (send after close, children of a closed channel) and sink panic isolation
//! - All-or-nothing delivery along the ancestor chain

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{gated_channel, recording_channel};
use diagstream::{
    Channel, ChannelConfig, ChannelError, Diagnostic, Diagnostics, MemorySink, Severity, Sink,
};

fn batch(msg: &str) -> Diagnostics {
    Diagnostics::from(Diagnostic::info(msg.to_string()))
}

fn messages(sink: &MemorySink) -> Vec<String> {
    sink.diagnostics()
        .iter()
        .map(|d| d.message.to_string())
        .collect()
}

#[tokio::test]
async fn test_batches_delivered_in_order_with_indices() {
    let (ch, sink) = recording_channel();

    ch.send(batch("a")).await.unwrap();
    ch.send(Diagnostics::new().with(Diagnostic::warn("b1")).with(Diagnostic::error("b2")))
        .await
        .unwrap();
    ch.send(batch("c")).await.unwrap();
    ch.sender_wait_and_close().await;

    assert_eq!(sink.indices(), vec![0, 1, 2]);
    assert_eq!(messages(&sink), vec!["a", "b1", "b2", "c"]);

    let records = sink.records();
    assert_eq!(records[1].1.len(), 2, "batch must not be split");
    assert_eq!(records[1].1.max_severity(), Some(Severity::Error));
    assert_eq!(ch.delivered(), 3);
    assert!(ch.is_closed());
}

#[tokio::test]
async fn test_send_after_close_fails_loudly() {
    let (ch, sink) = recording_channel();
    ch.send(batch("before")).await.unwrap();
    ch.sender_wait_and_close().await;

    let err = ch.send(batch("after")).await.unwrap_err();
    assert!(matches!(err, ChannelError::Closed { .. }));
    assert_eq!(err.as_label(), "channel_closed");
    assert_eq!(messages(&sink), vec!["before"]);
}

#[tokio::test]
async fn test_close_twice_is_noop() {
    let (ch, sink) = recording_channel();
    ch.send(batch("x")).await.unwrap();
    ch.sender_wait_and_close().await;
    ch.sender_wait_and_close().await;
    ch.receiver_wait().await;
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_child_batches_reach_parent_with_parent_indices() {
    let (root, root_sink) = recording_channel();
    let child_sink = MemorySink::arc();
    let child = root.make_child_channel_with(ChannelConfig::named("child"), child_sink.clone());

    root.send(batch("root-0")).await.unwrap();
    child.send(batch("child-0")).await.unwrap();
    child.send(batch("child-1")).await.unwrap();

    child.sender_wait_and_close().await;
    root.sender_wait_and_close().await;

    assert_eq!(child_sink.indices(), vec![0, 1]);
    assert_eq!(messages(&child_sink), vec!["child-0", "child-1"]);

    assert_eq!(root_sink.indices(), vec![0, 1, 2]);
    assert_eq!(messages(&root_sink), vec!["root-0", "child-0", "child-1"]);
}

#[tokio::test]
async fn test_grandchild_forwards_to_every_ancestor() {
    let (root, root_sink) = recording_channel();
    let child = root.make_child_channel();
    let grandchild = child.make_child_channel();
    assert_eq!(child.name(), "test/0");
    assert_eq!(grandchild.name(), "test/0/0");

    grandchild.send(batch("deep")).await.unwrap();

    grandchild.sender_wait_and_close().await;
    child.sender_wait_and_close().await;
    root.sender_wait_and_close().await;

    assert_eq!(messages(&root_sink), vec!["deep"]);
    assert_eq!(child.delivered(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parent_close_waits_for_children() {
    let (root, root_sink) = recording_channel();
    let child = root.make_child_channel();
    assert_eq!(root.open_children(), 1);

    let closer = {
        let root = root.clone();
        tokio::spawn(async move { root.sender_wait_and_close().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!closer.is_finished(), "parent closed while a child was open");

    child.send(batch("late")).await.unwrap();
    child.sender_wait_and_close().await;

    tokio::time::timeout(Duration::from_secs(2), closer)
        .await
        .expect("parent close did not finish")
        .unwrap();
    assert_eq!(root.open_children(), 0);
    assert_eq!(messages(&root_sink), vec!["late"]);
}

#[tokio::test]
async fn test_dropped_child_releases_parent() {
    let (root, root_sink) = recording_channel();
    {
        let child = root.make_child_channel();
        child.send(batch("orphan")).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(2), root.sender_wait_and_close())
        .await
        .expect("parent close blocked on a dropped child");
    assert_eq!(messages(&root_sink), vec!["orphan"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_interleave_whole_batches() {
    let (ch, sink) = recording_channel();

    let mut producers = Vec::new();
    for p in 0..8u32 {
        let ch = ch.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..25u32 {
                let tag = format!("{p}:{i}");
                let b = Diagnostics::new()
                    .with(Diagnostic::info(format!("{tag}/a")))
                    .with(Diagnostic::info(format!("{tag}/b")));
                ch.send(b).await.unwrap();
            }
        }));
    }
    for p in producers {
        p.await.unwrap();
    }
    ch.sender_wait_and_close().await;

    let records = sink.records();
    assert_eq!(records.len(), 200);
    for (expected, (index, b)) in records.iter().enumerate() {
        assert_eq!(*index, expected as u64);
        let msgs: Vec<_> = b.iter().map(|d| d.message.to_string()).collect();
        let tag = msgs[0].trim_end_matches("/a");
        assert_eq!(msgs, vec![format!("{tag}/a"), format!("{tag}/b")]);
    }
}

/// Records like a `MemorySink` but panics on any batch mentioning "boom".
struct PanickySink {
    inner: MemorySink,
}

#[async_trait]
impl Sink for PanickySink {
    async fn accept(&self, index: u64, batch: &Diagnostics) {
        if batch.iter().any(|d| d.message.contains("boom")) {
            panic!("renderer exploded");
        }
        self.inner.accept(index, batch).await;
    }

    fn name(&self) -> &'static str {
        "panicky"
    }
}

#[tokio::test]
async fn test_sink_panic_replaced_by_fatal_batch() {
    let sink = Arc::new(PanickySink {
        inner: MemorySink::new(),
    });
    let ch = Channel::new(sink.clone());

    ch.send(batch("ok-0")).await.unwrap();
    ch.send(batch("boom")).await.unwrap();
    ch.send(batch("ok-2")).await.unwrap();
    ch.sender_wait_and_close().await;

    let records = sink.inner.records();
    assert_eq!(sink.inner.indices(), vec![0, 1, 2]);
    assert_eq!(ch.delivered(), 3);

    let replacement = &records[1].1;
    assert_eq!(replacement.len(), 1);
    let d = replacement.iter().next().unwrap();
    assert_eq!(d.severity, Severity::Fatal);
    assert_eq!(d.code, Some("sink_panicked"));
    assert!(d.message.contains("renderer exploded"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_receiver_wait_observes_full_drain() {
    let (ch, sink) = recording_channel();

    let producer = {
        let ch = ch.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                ch.send(batch(&format!("m{i}"))).await.unwrap();
            }
            ch.sender_wait_and_close().await;
        })
    };

    ch.receiver_wait().await;
    assert!(ch.is_closed());
    assert_eq!(sink.len(), 10);
    producer.await.unwrap();
}

#[tokio::test]
async fn test_closure_sink() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let out = Arc::clone(&seen);
    let ch = Channel::from_fn(move |index, b: &Diagnostics| {
        out.lock().unwrap().push((index, b.len()));
    });

    ch.send(batch("one")).await.unwrap();
    ch.send(Diagnostics::new().with(Diagnostic::debug("x")).with(Diagnostic::debug("y")))
        .await
        .unwrap();
    ch.sender_wait_and_close().await;

    assert_eq!(*seen.lock().unwrap(), vec![(0, 1), (1, 2)]);
}

#[tokio::test]
async fn test_small_queue_backpressures_without_loss() {
    let sink = MemorySink::arc();
    let ch = Channel::with_config(
        ChannelConfig {
            queue_capacity: 1,
            ..ChannelConfig::named("tiny")
        },
        sink.clone(),
    );
    for i in 0..50 {
        ch.send(batch(&format!("{i}"))).await.unwrap();
    }
    ch.sender_wait_and_close().await;
    assert_eq!(sink.len(), 50);
    assert_eq!(sink.indices(), (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_child_of_closed_channel_starts_closed() {
    let (root, root_sink) = recording_channel();
    root.send(batch("before")).await.unwrap();
    root.sender_wait_and_close().await;

    let child_sink = MemorySink::arc();
    let child = root.make_child_channel_with(ChannelConfig::named("late"), child_sink.clone());
    assert!(child.is_closed());
    assert_eq!(root.open_children(), 0);

    let err = child.send(batch("lost")).await.unwrap_err();
    assert!(matches!(err, ChannelError::Closed { .. }));
    let grandchild = child.make_child_channel();
    assert!(grandchild.is_closed());
    assert!(grandchild.try_send(batch("lost")).is_err());

    child.sender_wait_and_close().await;
    assert!(child_sink.is_empty());
    assert_eq!(messages(&root_sink), vec!["before"]);
    assert_eq!(root.delivered(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_try_send_on_saturated_chain_delivers_nowhere() {
    let (root, sink) = gated_channel();
    let child_sink = MemorySink::arc();
    let child = root.make_child_channel_with(ChannelConfig::named("leaf"), child_sink.clone());

    // "a" sits in the sink, "b" fills the single slot.
    let entered = sink.entered.notified();
    root.send(batch("a")).await.unwrap();
    entered.await;
    root.send(batch("b")).await.unwrap();

    let err = child.try_send(batch("c")).unwrap_err();
    assert!(matches!(err, ChannelError::Full { .. }));
    assert_eq!(err.as_label(), "channel_full");
    assert!(root.try_send(batch("c")).is_err());

    // Nothing of "c" reached the child either.
    sink.gate.add_permits(10);
    child.sender_wait_and_close().await;
    root.sender_wait_and_close().await;
    assert!(child_sink.is_empty());
    assert_eq!(messages(&sink.inner), vec!["a", "b"]);
    assert_eq!(sink.inner.indices(), vec![0, 1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_send_leaves_no_partial_delivery() {
    let (root, sink) = gated_channel();
    let child_sink = MemorySink::arc();
    let child = root.make_child_channel_with(ChannelConfig::named("leaf"), child_sink.clone());

    let entered = sink.entered.notified();
    root.send(batch("a")).await.unwrap();
    entered.await;
    root.send(batch("b")).await.unwrap();

    // Blocks on the saturated root after the child's slot was free.
    let pending = tokio::time::timeout(Duration::from_millis(30), child.send(batch("c"))).await;
    assert!(pending.is_err());

    sink.gate.add_permits(10);
    child.send(batch("d")).await.unwrap();
    child.sender_wait_and_close().await;
    root.sender_wait_and_close().await;

    assert_eq!(messages(&child_sink), vec!["d"]);
    assert_eq!(child_sink.indices(), vec![0]);
    assert_eq!(messages(&sink.inner), vec!["a", "b", "d"]);
}
