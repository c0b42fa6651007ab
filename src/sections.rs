//! Sequential group and track sections.
//!
//! Group definitions are ordered most senior first (weight descending, then
//! name ascending ignoring case) so inheritance targets exist before the
//! groups that reference them are populated. Tracks keep storage order and
//! their member lists are written exactly in promotion order.

use std::cmp::Ordering;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::command::CommandWriter;
use crate::progress::ProgressReporter;
use crate::sink::RecordSink;
use crate::types::{ExportRecord, Group, HolderType, Node, Track};

/// Seniority order for group definitions.
pub fn group_order(a: &Group, b: &Group) -> Ordering {
    b.effective_weight()
        .cmp(&a.effective_weight())
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
}

pub fn sort_groups(groups: Vec<Group>) -> Vec<Group> {
    groups.into_iter().sorted_by(group_order).collect()
}

/// Render the commands for every node of a holder, skipping nodes that
/// cannot be expressed as one command line.
///
/// Returns the number of skipped nodes.
pub(crate) fn push_node_commands<'a, I>(
    record: &mut ExportRecord,
    commands: &CommandWriter,
    nodes: I,
    holder_type: HolderType,
    holder: &str,
) -> usize
where
    I: IntoIterator<Item = &'a Node>,
{
    let mut skipped = 0;
    for node in nodes {
        match commands.node(node, holder_type, holder) {
            Ok(line) => record.push(line),
            Err(e) => {
                warn!(
                    event = "Export",
                    phase = "Node",
                    holder_type = holder_type.as_ref(),
                    holder,
                    key = node.key(),
                    error = %e
                );
                skipped += 1;
            }
        }
    }
    skipped
}

/// Names inside comment lines must stay on that line.
fn comment_name(name: &str) -> String {
    name.replace(['\n', '\r'], " ")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionStats {
    pub written: usize,
    pub skipped_nodes: usize,
}

/// Writes the group and track sections through a shared sink.
pub struct SectionWriter<'a> {
    sink: &'a RecordSink,
    commands: &'a CommandWriter,
    reporter: &'a ProgressReporter,
    default_group: &'a str,
}

impl<'a> SectionWriter<'a> {
    pub fn new(
        sink: &'a RecordSink,
        commands: &'a CommandWriter,
        reporter: &'a ProgressReporter,
        default_group: &'a str,
    ) -> Self {
        SectionWriter {
            sink,
            commands,
            reporter,
            default_group,
        }
    }

    /// Write creation commands for every non-default group, then one record
    /// per group with its assignments. The default group is never created
    /// but its assignments are still written.
    pub fn write_groups(&self, groups: Vec<Group>) -> SectionStats {
        let groups = sort_groups(groups);
        let mut stats = SectionStats::default();

        let mut create = ExportRecord::new();
        create.push("# Create groups");
        for group in groups.iter().filter(|g| !g.is_named(self.default_group)) {
            match self.commands.create_group(group.name()) {
                Ok(line) => create.push(line),
                Err(e) => {
                    warn!(event = "Export", phase = "Groups", group = group.name(), error = %e);
                    stats.skipped_nodes += 1;
                }
            }
        }
        self.sink.emit(&create);

        for group in &groups {
            let mut record = ExportRecord::new();
            if stats.written == 0 {
                record.blank();
            }
            record.push(format!("# Export group: {}", comment_name(group.name())));
            stats.skipped_nodes += push_node_commands(
                &mut record,
                self.commands,
                group.nodes(),
                HolderType::Group,
                group.name(),
            );
            record.blank();
            self.sink.emit(&record);

            stats.written += 1;
            debug!(event = "Export", phase = "Groups", group = group.name(), lines = record.len());
            self.reporter
                .milestone("Exported {} groups so far.", stats.written);
        }

        self.sink.emit(&["", ""].into_iter().collect());
        stats
    }

    /// Write the track section. Nothing at all is written when there are
    /// no tracks.
    pub fn write_tracks(&self, tracks: &[Track]) -> SectionStats {
        let mut stats = SectionStats::default();
        if tracks.is_empty() {
            return stats;
        }

        let mut create = ExportRecord::new();
        create.push("# Create tracks");
        for track in tracks {
            match self.commands.create_track(track.name()) {
                Ok(line) => create.push(line),
                Err(e) => {
                    warn!(event = "Export", phase = "Tracks", track = track.name(), error = %e);
                    stats.skipped_nodes += 1;
                }
            }
        }
        create.blank();
        self.sink.emit(&create);

        for track in tracks {
            let mut record = ExportRecord::new();
            record.push(format!("# Export track: {}", comment_name(track.name())));
            for group in track.groups() {
                match self.commands.track_append(track.name(), group) {
                    Ok(line) => record.push(line),
                    Err(e) => {
                        warn!(
                            event = "Export",
                            phase = "Tracks",
                            track = track.name(),
                            group = group.as_str(),
                            error = %e
                        );
                        stats.skipped_nodes += 1;
                    }
                }
            }
            record.blank();
            self.sink.emit(&record);

            stats.written += 1;
            self.reporter
                .milestone("Exported {} tracks so far.", stats.written);
        }

        self.sink.emit(&["", ""].into_iter().collect());
        stats
    }
}
