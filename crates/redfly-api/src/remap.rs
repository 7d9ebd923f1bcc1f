// North/south-bound URL translation
//
// The aggregator and its plugins name the same resources differently:
// plugins serve `/ODIM/v1/...` where the aggregator exposes `/redfish/v1/...`,
// and devices behind a plugin use local ids (`/redfish/v1/Systems/1`) that
// the aggregator must qualify with the device UUID (`Systems/{uuid}:1`).
//
// All rewrites operate on parsed path segments, never on raw substrings, so
// a table entry `redfish` matches the segment `redfish` and nothing else.
// Payloads are scanned as text for `/`-delimited runs (inside JSON strings,
// absolute URLs, or message text) and only the rewritten runs are spliced
// back; every other byte of the body is left as the plugin sent it.

use bytes::Bytes;
use indexmap::IndexMap;
use tracing::trace;

/// Top-level Redfish collections whose members are device-scoped.
pub const DEVICE_COLLECTIONS: [&str; 3] = ["Systems", "Managers", "Chassis"];

/// Separator between the device UUID and the device-local id.
pub const COMPOSITE_SEPARATOR: char = ':';

// ── Segment table ───────────────────────────────────────────────────

/// An ordered table of segment-run rewrites.
///
/// Each entry maps one or more consecutive path segments to a replacement
/// run. At every position the longest matching entry wins; entries of equal
/// length keep their configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTable {
    entries: Vec<(Vec<String>, Vec<String>)>,
}

fn split_segments(raw: &str) -> Vec<String> {
    raw.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl SegmentTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: Vec<(Vec<String>, Vec<String>)> = pairs
            .into_iter()
            .map(|(from, to)| (split_segments(from.as_ref()), split_segments(to.as_ref())))
            .filter(|(from, _)| !from.is_empty())
            .collect();
        // Stable sort keeps configuration order among equal-length keys.
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the path part of `uri`, leaving any query or fragment intact.
    ///
    /// Returns `None` when no entry matched.
    pub fn rewrite(&self, uri: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let (path, tail) = split_path(uri);
        let segments: Vec<&str> = path.split('/').collect();
        let mut out: Vec<&str> = Vec::with_capacity(segments.len());
        let mut changed = false;
        let mut i = 0;

        while i < segments.len() {
            let matched = self.entries.iter().find(|(from, _)| {
                segments
                    .get(i..i + from.len())
                    .is_some_and(|run| run.iter().zip(from).all(|(a, b)| *a == b.as_str()))
            });
            if let Some((from, to)) = matched {
                out.extend(to.iter().map(String::as_str));
                i += from.len();
                changed = true;
            } else {
                out.push(segments[i]);
                i += 1;
            }
        }

        changed.then(|| format!("{}{tail}", out.join("/")))
    }

    /// Like [`rewrite`](Self::rewrite) but always yields a path.
    pub fn apply(&self, uri: &str) -> String {
        self.rewrite(uri).unwrap_or_else(|| uri.to_owned())
    }
}

/// Split `uri` into its path and the `?query#fragment` tail.
fn split_path(uri: &str) -> (&str, &str) {
    match uri.find(['?', '#']) {
        Some(idx) => uri.split_at(idx),
        None => (uri, ""),
    }
}

// ── Translation tables ──────────────────────────────────────────────

/// The configured south-bound and north-bound translation tables.
///
/// Read-only once built; shared by every contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTranslation {
    north_bound: SegmentTable,
    south_bound: SegmentTable,
}

impl Default for UrlTranslation {
    fn default() -> Self {
        Self {
            north_bound: SegmentTable::from_pairs([("ODIM", "redfish")]),
            south_bound: SegmentTable::from_pairs([("redfish", "ODIM")]),
        }
    }
}

impl UrlTranslation {
    pub fn new(north_bound: &IndexMap<String, String>, south_bound: &IndexMap<String, String>) -> Self {
        Self {
            north_bound: SegmentTable::from_pairs(north_bound),
            south_bound: SegmentTable::from_pairs(south_bound),
        }
    }

    /// No translation in either direction.
    pub fn identity() -> Self {
        Self {
            north_bound: SegmentTable::default(),
            south_bound: SegmentTable::default(),
        }
    }

    /// Aggregator-form path to plugin-form path.
    pub fn south_bound_path(&self, path: &str) -> String {
        self.south_bound.apply(path)
    }

    /// Rewrite every path run inside a plugin response body.
    ///
    /// The original bytes come back untouched when nothing matched or the
    /// body is not UTF-8.
    pub fn north_bound_body(&self, body: Bytes) -> Bytes {
        if self.north_bound.is_empty() {
            return body;
        }
        let Ok(text) = std::str::from_utf8(&body) else {
            trace!("body is not UTF-8, skipping URL translation");
            return body;
        };
        rewrite_path_runs(text, |run| self.north_bound.rewrite(run)).map_or(body, Bytes::from)
    }
}

// ── Device UUID remapping ───────────────────────────────────────────

/// Drop the `{device_uuid}:` qualifier from every path segment.
pub fn strip_composite(uri: &str, device_uuid: &str) -> String {
    let prefix = format!("{device_uuid}{COMPOSITE_SEPARATOR}");
    let (path, tail) = split_path(uri);
    let stripped: Vec<&str> = path
        .split('/')
        .map(|seg| seg.strip_prefix(prefix.as_str()).unwrap_or(seg))
        .collect();
    format!("{}{tail}", stripped.join("/"))
}

/// Inbound: [`strip_composite`] then apply the south-bound table.
pub fn to_device_path(uri: &str, device_uuid: &str, translation: &UrlTranslation) -> String {
    translation.south_bound_path(&strip_composite(uri, device_uuid))
}

/// Qualify the member id following `/redfish/v1/{Systems|Managers|Chassis}/`.
///
/// Returns `None` if the path has no such member or it is already qualified.
pub fn qualify_device_path(uri: &str, device_uuid: &str) -> Option<String> {
    let (path, tail) = split_path(uri);
    let mut segments: Vec<String> = path.split('/').map(str::to_owned).collect();
    let prefix = format!("{device_uuid}{COMPOSITE_SEPARATOR}");
    let mut changed = false;

    for i in 3..segments.len() {
        let is_member = segments[i - 3] == "redfish"
            && segments[i - 2] == "v1"
            && DEVICE_COLLECTIONS
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&segments[i - 1]));
        if is_member && !segments[i].is_empty() && !segments[i].starts_with(&prefix) {
            segments[i] = format!("{prefix}{}", segments[i]);
            changed = true;
        }
    }

    changed.then(|| format!("{}{tail}", segments.join("/")))
}

/// Outbound: qualify every device-scoped link in a response body.
pub fn qualify_device_links(body: &str, device_uuid: &str) -> String {
    rewrite_path_runs(body, |run| qualify_device_path(run, device_uuid))
        .unwrap_or_else(|| body.to_owned())
}

// ── Text scanning ───────────────────────────────────────────────────

/// Characters that end a path run: JSON and markup punctuation, quoting,
/// whitespace, and the start of a query or fragment.
fn ends_run(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '"' | '\'' | '\\' | '?' | '#' | ',' | ';' | '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}'
        )
}

/// Hand every maximal run of path characters containing a `/` to `rewrite`
/// and splice the replacements into `text`.
///
/// `None` means nothing was rewritten.
pub fn rewrite_path_runs<F>(text: &str, rewrite: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut changed = false;
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if ends_run(c) {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if ends_run(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }

        let run = &text[start..end];
        if !run.contains('/') {
            continue;
        }
        if let Some(replacement) = rewrite(run) {
            out.push_str(&text[copied..start]);
            out.push_str(&replacement);
            copied = end;
            changed = true;
        }
    }

    if !changed {
        return None;
    }
    out.push_str(&text[copied..]);
    Some(out)
}
