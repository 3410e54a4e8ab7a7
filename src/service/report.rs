//! Role change reports posted to a dedicated channel.
//!
//! Every role change the bot makes (reaction, join, refresh) is summarized in
//! the report channel so moderators can follow what happened without reading
//! the logs. Member and role names are escaped so they render verbatim.

use std::sync::Arc;

use serenity::all::{ChannelId, CreateMessage};
use serenity::http::Http;
use serenity::utils::MessageBuilder;

use crate::model::roles::RoleChanges;
use crate::service::refresh::RefreshSummary;

/// Discord rejects messages longer than this many characters.
const MESSAGE_LIMIT: usize = 2000;

#[derive(Clone)]
pub struct Reporter {
    http: Arc<Http>,
    channel: Option<ChannelId>,
}

impl Reporter {
    pub fn new(http: Arc<Http>, channel: Option<u64>) -> Self {
        Self {
            http,
            channel: channel.map(ChannelId::new),
        }
    }

    /// Posts a report, split over as many messages as needed
    ///
    /// Without a report channel the report is only logged. A failed post is
    /// logged and the remaining parts are dropped.
    pub async fn send(&self, report: &str) {
        tracing::debug!("Report: {:?}", report);

        let Some(channel_id) = self.channel else {
            return;
        };

        for chunk in split_report(report, MESSAGE_LIMIT) {
            let message = CreateMessage::new().content(chunk);

            if let Err(e) = channel_id.send_message(&self.http, message).await {
                tracing::error!("Failed to post report to channel {}: {}", channel_id, e);
                return;
            }
        }
    }
}

/// Report of the roles applied to one member.
///
/// # Arguments
/// - `cause`: What triggered the change, e.g. "New member"
/// - `member_name`: Display name of the member
/// - `applied`: Roles actually granted and revoked
pub fn member_report(cause: &str, member_name: &str, applied: &RoleChanges) -> String {
    let mut report = MessageBuilder::new();
    report.push(cause).push(" ").push_safe(member_name).push_line(":");

    if applied.is_empty() {
        report.push_line("No roles to add or remove.");
    }
    if !applied.to_add.is_empty() {
        report
            .push("Added roles: ")
            .push_line_safe(applied.to_add.join(", "));
    }
    if !applied.to_remove.is_empty() {
        report
            .push("Removed roles: ")
            .push_line_safe(applied.to_remove.join(", "));
    }

    report.build().trim_end().to_string()
}

/// Report of a full guild refresh.
pub fn refresh_report(summary: &RefreshSummary) -> String {
    let mut report = MessageBuilder::new();
    report.push_line(format!("Roles refresh of {} members finished.", summary.members));

    let added: Vec<_> = summary
        .role_updates
        .iter()
        .filter(|(_, applied)| !applied.to_add.is_empty())
        .collect();
    if !added.is_empty() {
        report.push_line("Added roles:");
        for (name, applied) in added {
            report
                .push_safe(name)
                .push(": ")
                .push_line_safe(applied.to_add.join(", "));
        }
    }

    let removed: Vec<_> = summary
        .role_updates
        .iter()
        .filter(|(_, applied)| !applied.to_remove.is_empty())
        .collect();
    if !removed.is_empty() {
        report.push_line("Removed roles:");
        for (name, applied) in removed {
            report
                .push_safe(name)
                .push(": ")
                .push_line_safe(applied.to_remove.join(", "));
        }
    }

    if !summary.renames.is_empty() {
        report.push_line("Renamed:");
        for (name, nickname) in &summary.renames {
            report.push_safe(name).push(" -> ").push_line_safe(nickname);
        }
    }

    if summary.role_updates.is_empty() && summary.renames.is_empty() {
        report.push_line("No changes.");
    }
    if summary.failures > 0 {
        report.push_line(format!("{} updates failed, see the logs.", summary.failures));
    }

    report.build().trim_end().to_string()
}

/// Splits a report on line boundaries into messages of at most `limit`
/// characters. Lines longer than `limit` are cut.
fn split_report(report: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in report.lines() {
        for piece in split_line(line, limit) {
            let piece_len = piece.chars().count();

            if current_len > 0 && current_len + 1 + piece_len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push('\n');
                current_len += 1;
            }

            current.push_str(piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn split_line(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;

    while let Some((index, _)) = rest.char_indices().nth(limit) {
        pieces.push(&rest[..index]);
        rest = &rest[index..];
    }
    pieces.push(rest);

    pieces
}
