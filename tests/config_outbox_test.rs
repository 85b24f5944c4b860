//! 配置文件 + 本地发件箱集成测试

use build_notifier::notification::OutboxStore;
use build_notifier::{
    BuildEvent, BuildNotifier, BuildOutcome, BuildResult, Destination, ItemRef, JobInfo,
    NotificationBuilder, NotifierConfig, Transport,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_config(dir: &TempDir, outbox: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    let json = format!(
        r#"{{
            "stream": "builds",
            "transport": "local_file",
            "outbox_path": "{}",
            "jobs": {{
                "Folder/TestJob": {{"stream": "projectStream", "topic": "projectTopic"}}
            }}
        }}"#,
        dir.path().join(outbox).display()
    );
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_job_override_delivers_to_outbox() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "outbox.jsonl");

    let config = Arc::new(NotifierConfig::load(Some(config_path.as_path())).unwrap());
    assert_eq!(config.transport, Transport::LocalFile);

    let job = JobInfo::new("TestJob").with_parent(ItemRef::new("Folder", "job/Folder/"));
    let event = BuildEvent::new(job.clone(), BuildOutcome::new("#2", BuildResult::Failure));

    let dispatcher = NotificationBuilder::from_config(&config).build().unwrap();
    let notifier = BuildNotifier::for_job(config.clone(), &job, dispatcher).unwrap();
    let report = notifier.on_build_complete(&event);
    assert_eq!(report.sent_count(), 1);

    let records = OutboxStore::new(dir.path().join("outbox.jsonl")).read_recent(10);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].destination,
        Destination::stream("projectStream", "projectTopic")
    );
    assert_eq!(
        records[0].content,
        "Project: TestJob : Build #2: **FAILURE** :cross_mark:"
    );
}

#[test]
fn test_unconfigured_job_uses_global_stream() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "outbox.jsonl");
    let config = Arc::new(NotifierConfig::load(Some(config_path.as_path())).unwrap());

    let job = JobInfo::new("Other");
    let dispatcher = NotificationBuilder::from_config(&config).build().unwrap();
    let notifier = BuildNotifier::for_job(config, &job, dispatcher).unwrap();
    notifier.on_build_complete(&BuildEvent::new(job, BuildOutcome::new("#1", BuildResult::Success)));

    let records = OutboxStore::new(dir.path().join("outbox.jsonl")).read_recent(10);
    assert_eq!(records[0].destination, Destination::stream("builds", "Other"));
}

#[test]
fn test_outbox_keeps_most_recent() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "nested/outbox.jsonl");
    let config = Arc::new(NotifierConfig::load(Some(config_path.as_path())).unwrap());

    let job = JobInfo::new("Other");
    let dispatcher = NotificationBuilder::from_config(&config).build().unwrap();
    let notifier = BuildNotifier::for_job(config, &job, dispatcher).unwrap();
    for n in 1..=5 {
        let event = BuildEvent::new(
            job.clone(),
            BuildOutcome::new(format!("#{}", n), BuildResult::Failure),
        );
        notifier.on_build_complete(&event);
    }

    let records = OutboxStore::new(dir.path().join("nested/outbox.jsonl")).read_recent(2);
    assert_eq!(records.len(), 2);
    assert!(records[0].content.starts_with("Build #4"));
    assert!(records[1].content.starts_with("Build #5"));
}

#[test]
fn test_invalid_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(NotifierConfig::load(Some(path.as_path())).is_err());
}
