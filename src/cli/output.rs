//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::channel::{SendResult, truncate_for_log};
use crate::notification::notifier::{Delivery, NotificationReport};

/// JSON 输出
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 单条投递结果，例如 `sent    stream:builds > TestJob`
pub fn format_delivery(delivery: &Delivery) -> String {
    match &delivery.result {
        SendResult::Sent => format!("sent    {}", delivery.destination),
        SendResult::Skipped(reason) => format!("skipped {} ({})", delivery.destination, reason),
        SendResult::Failed(reason) => format!(
            "failed  {}: {}",
            delivery.destination,
            truncate_for_log(reason, 200)
        ),
    }
}

pub fn format_report(report: &NotificationReport) -> String {
    if !report.notified {
        return format!(
            "No notification sent ({})",
            report.skipped.as_deref().unwrap_or("skipped")
        );
    }
    report
        .deliveries
        .iter()
        .map(format_delivery)
        .collect::<Vec<_>>()
        .join("\n")
}
