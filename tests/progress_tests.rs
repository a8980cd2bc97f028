//! Tests for the progress module functionality.
//!
//! This file contains tests for weighted progress aggregation, progress bar
//! styling and display management.

use std::sync::Arc;
use std::thread;
use vidqueue::download::{TaskSnapshot, TaskStage, TaskState};
use vidqueue::progress::{
    ProgressBarOpts, ProgressDisplay, ProgressManager, StyleOptions, DOWNLOAD_WEIGHT, QUERY_WEIGHT,
};

mod common;
use common::helpers::*;

fn snapshot(name: &str, state: TaskState, stage: Option<TaskStage>, progress: f64) -> TaskSnapshot {
    TaskSnapshot {
        video: create_test_video(),
        path: name.into(),
        format: "mp4".into(),
        option: None,
        state,
        stage,
        progress,
        fail_reason: None,
    }
}

// === Aggregation ===

#[test]
fn test_downloads_outweigh_queries() {
    let manager = ProgressManager::new();
    let download = manager.create_operation(DOWNLOAD_WEIGHT);
    let query = manager.create_operation(QUERY_WEIGHT);

    query.report(1.0);
    assert!(manager.progress() < 0.01);

    download.report(1.0);
    assert_eq!(manager.progress(), 1.0);
}

#[test]
fn test_invalid_weights_count_as_zero() {
    let manager = ProgressManager::new();
    let counted = manager.create_operation(1.0);
    let nan = manager.create_operation(f64::NAN);
    let negative = manager.create_operation(-3.0);

    nan.report(1.0);
    negative.report(1.0);
    counted.report(0.25);

    assert_eq!(nan.weight(), 0.0);
    assert_eq!(negative.weight(), 0.0);
    assert_eq!(manager.progress(), 0.25);
}

#[test]
fn test_manager_resets_once_everything_completes() {
    let manager = ProgressManager::new();
    let first = manager.create_operation(DOWNLOAD_WEIGHT);
    first.report(1.0);
    let second = manager.create_operation(DOWNLOAD_WEIGHT);

    drop(first);
    assert!(manager.is_active());
    assert_eq!(manager.progress(), 0.5);

    drop(second);
    assert!(!manager.is_active());
    assert_eq!(manager.operation_count(), 0);

    let third = manager.create_operation(DOWNLOAD_WEIGHT);
    third.report(0.5);
    assert_eq!(manager.progress(), 0.5);
}

#[test]
fn test_concurrent_reports_stay_in_range() {
    let manager = ProgressManager::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                let op = manager.create_operation(DOWNLOAD_WEIGHT);
                for i in 0..=100 {
                    op.report(i as f64 / 100.0);
                    let overall = manager.progress();
                    assert!((0.0..=1.0).contains(&overall));
                }
                op
            })
        })
        .collect();

    let ops: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(manager.progress(), 1.0);
    drop(ops);
    assert_eq!(manager.progress(), 0.0);
}

// === Styling ===

#[test]
fn test_style_options_default() {
    let style = StyleOptions::default();
    assert!(style.is_enabled());
    assert!(!style.main().clone().to_progress_bar(10).is_hidden());
}

#[test]
fn test_style_options_setters() {
    let mut style = StyleOptions::hidden();
    assert!(!style.is_enabled());

    style.set_child(ProgressBarOpts::with_task_style());
    assert!(style.is_enabled());

    style.set_main(ProgressBarOpts::hidden());
    assert!(style.main().clone().to_progress_bar(10).is_hidden());
}

#[test]
fn test_progress_bar_opts_to_progress_bar() {
    let pb = ProgressBarOpts::with_task_style().to_progress_bar(1000);
    assert!(!pb.is_hidden());
    assert_eq!(pb.length(), Some(1000));

    let mut opts = ProgressBarOpts::new(
        Some(ProgressBarOpts::TEMPLATE_OVERALL.to_string()),
        Some(ProgressBarOpts::CHARS_BLOCKY.to_string()),
        true,
        true,
    );
    opts.set_clear(false);
    assert_eq!(opts.to_progress_bar(5).length(), Some(5));
}

// === Display ===

#[test]
fn test_display_tracks_overall_progress() {
    let display = ProgressDisplay::new(StyleOptions::hidden());
    display.set_overall(0.333);
    assert_eq!(display.main().position(), 333);
    display.set_overall(2.0);
    assert_eq!(display.main().position(), 1000);
}

#[test]
fn test_display_child_bars_follow_snapshots() {
    let display = ProgressDisplay::new(StyleOptions::hidden());

    display.update(&snapshot("a.mp4", TaskState::Running, Some(TaskStage::Queued), 0.0));
    display.update(&snapshot("b.mp4", TaskState::Running, Some(TaskStage::Transferring), 0.4));
    display.update(&snapshot("b.mp4", TaskState::Running, Some(TaskStage::Transferring), 0.6));
    assert_eq!(display.child_count(), 2);

    display.update(&snapshot("b.mp4", TaskState::Failed, None, 0.6));
    assert_eq!(display.child_count(), 1);

    // A terminal snapshot for an unknown path is ignored.
    display.update(&snapshot("c.mp4", TaskState::Canceled, None, 0.0));
    assert_eq!(display.child_count(), 1);

    display.finish();
    assert_eq!(display.child_count(), 0);
}

#[tokio::test]
async fn test_display_fed_by_coordinator() {
    let temp_dir = create_temp_dir();
    let display = Arc::new(ProgressDisplay::new(StyleOptions::hidden()));
    let transfer = MockTransfer::gated();
    let coordinator = {
        let display = display.clone();
        create_test_builder(transfer.clone())
            .on_state_change(move |snapshot| display.update(snapshot))
            .build()
    };

    let task = coordinator.enqueue_and_start(vidqueue::DownloadRequest::new(
        create_test_video(),
        create_placeholder(temp_dir.path(), "video.mp4"),
        "mp4",
    ));
    eventually("transfer to start", || transfer.active() == 1).await;
    assert_eq!(display.child_count(), 1);
    display.set_overall(coordinator.progress());
    assert_eq!(display.main().position(), 500);

    transfer.release(1);
    assert_settles(&task, TaskState::Succeeded).await;
    assert_eq!(display.child_count(), 0);
    display.finish();
}
