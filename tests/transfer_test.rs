//! Spawned single-file transfers and the pass-through operations.

mod common;

use common::*;
use ftp_batch::{FtpClient, TransferEvent, TransferOutcome, TransferProgress};

#[tokio::test]
async fn download_reports_cumulative_chunk_progress() {
    let transport = MockTransport::new();
    let client = FtpClient::new(transport.clone());

    // Three chunks: 64 KiB, 64 KiB, remainder.
    let payload = vec![7u8; 150_000];
    transport.with_remote(|r| {
        r.files.insert("data/big.bin".to_string(), payload.clone());
    });

    let local = scratch_dir("single-dl");
    let target = local.join("big.bin");

    let mut handle = client.start_download("data/big.bin", &target);
    let mut snapshots: Vec<TransferProgress> = Vec::new();
    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            TransferEvent::Progress(p) => snapshots.push(p),
            TransferEvent::Completed(o) => {
                outcome = Some(o);
                break;
            }
        }
    }

    assert_eq!(outcome, Some(TransferOutcome::Completed));
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].bytes_transferred, 65_536);
    assert_eq!(snapshots[1].bytes_transferred, 131_072);
    assert_eq!(snapshots[2].bytes_transferred, 150_000);
    assert!(snapshots.iter().all(|p| p.total_bytes == 150_000));
    assert_eq!(snapshots[2].percentage(), 100);

    assert_eq!(std::fs::read(&target).unwrap(), payload);
    std::fs::remove_dir_all(&local).unwrap();
}

#[tokio::test]
async fn cancel_all_stops_an_in_flight_upload_at_a_chunk_boundary() {
    let transport = MockTransport::new();
    let client = FtpClient::new(transport.clone());

    let scratch = scratch_dir("single-ul");
    // Two chunks, so the worker parks on the gated second write.
    let big = local_file(&scratch, "big.bin", &vec![3u8; 100_000]);
    let gate = transport.gate("/up/big.bin");

    let mut handle = client.start_upload(&big, "/up/big.bin");

    // First chunk lands, then the sink parks.
    let first = handle.next_event().await.expect("first event");
    assert!(matches!(first, TransferEvent::Progress(p) if p.bytes_transferred == 65_536));

    client.cancel_all();
    gate.open();

    let outcome = handle.wait().await;
    assert_eq!(outcome, TransferOutcome::Cancelled);

    // The partial upload is not rolled back.
    transport.with_remote(|r| {
        assert!(!r.uploads.get("/up/big.bin").unwrap().is_empty());
    });

    // The registry drains once the worker finishes.
    for _ in 0..100 {
        if client.active_count() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(client.active_count(), 0);

    std::fs::remove_dir_all(&scratch).unwrap();
}

#[tokio::test]
async fn upload_failure_surfaces_through_the_completion_event() {
    let transport = MockTransport::new();
    let client = FtpClient::new(transport.clone());

    // Local file never enrolled/created: the worker hits the missing
    // file and reports it via the single completion event.
    let handle = client.start_upload("/no/such/local/file.bin", "/up/x.bin");
    let outcome = handle.wait().await;
    assert!(outcome.error().is_some());
    assert!(!outcome.is_success());
    assert!(!outcome.is_cancelled());
}

#[tokio::test]
async fn pass_through_operations_reach_the_transport() {
    let transport = MockTransport::new();
    let client = FtpClient::new(transport.clone());
    transport.with_remote(|r| {
        r.files.insert("pub/kept.bin".to_string(), vec![1, 2, 3]);
    });

    assert_eq!(client.file_size("pub/kept.bin").await.unwrap(), 3);
    assert!(client.file_exists("pub/kept.bin").await.unwrap());
    assert!(!client.file_exists("pub/gone.bin").await.unwrap());

    client.delete_file("pub/kept.bin").await.unwrap();
    client.rename("pub/old.bin", "pub/new.bin").await.unwrap();

    transport.with_remote(|r| {
        assert_eq!(r.deleted, vec!["pub/kept.bin"]);
        assert_eq!(
            r.renames,
            vec![("pub/old.bin".to_string(), "pub/new.bin".to_string())]
        );
    });
}
