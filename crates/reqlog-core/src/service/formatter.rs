//! Renders one destination's payload as text lines or JSON.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::{JsonLayout, JsonOptions, LogConfig, RequestInfo};
use crate::error::Result;
use crate::service::classifier::CategoryMessages;
use crate::service::diagnostics::Diagnostics;

/// Separator line opening each request block in text mode.
pub const BANNER_SEPARATOR: &str =
    "---------------------------------------------------------------";

/// Envelope keys owned by request metadata and diagnostics.
pub const RESERVED_ENVELOPE_KEYS: &[&str] = &[
    "timestamp", "ip", "method", "host", "uri", "runtime", "reqs", "memory", "file",
];

/// Per-write inputs that are not part of the configuration.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    /// Timestamp already rendered with `time_format`
    pub timestamp: &'a str,
    pub request: &'a RequestInfo,
    /// Present only on the primary flush in debug mode
    pub diagnostics: Option<&'a Diagnostics>,
    /// Per-category destination
    pub apart: bool,
}

pub struct Formatter<'a> {
    config: &'a LogConfig,
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a LogConfig) -> Self {
        Self { config }
    }

    /// Newline-terminated payload for one destination.
    pub fn format(&self, groups: &[CategoryMessages], ctx: &FormatContext<'_>) -> Result<String> {
        let mut payload = if self.config.json {
            match self.config.json_layout {
                JsonLayout::Envelope => self.format_envelope(groups, ctx)?,
                JsonLayout::Lines => self.format_json_lines(groups, ctx)?,
            }
        } else {
            self.format_text(groups, ctx)
        };
        payload.push('\n');
        Ok(payload)
    }

    fn format_text(&self, groups: &[CategoryMessages], ctx: &FormatContext<'_>) -> String {
        let mut lines = Vec::new();

        if !ctx.apart {
            lines.push(BANNER_SEPARATOR.to_string());
            lines.push(banner_line(ctx.timestamp, ctx.request));
            if let Some(diagnostics) = ctx.diagnostics {
                lines.push(diagnostics.text_line());
            }
        }

        for group in groups {
            for message in &group.messages {
                lines.push(render_template(
                    &self.config.format,
                    &[ctx.timestamp, group.category.as_str(), message.as_str()],
                ));
            }
        }

        lines.join("\n")
    }

    fn format_envelope(&self, groups: &[CategoryMessages], ctx: &FormatContext<'_>) -> Result<String> {
        let mut record = Map::new();

        if !ctx.apart {
            if let Some(diagnostics) = ctx.diagnostics {
                insert_diagnostics(&mut record, diagnostics);
            }
        }

        record.insert("timestamp".into(), json!(ctx.timestamp));
        record.insert("ip".into(), json!(ctx.request.ip));
        record.insert("method".into(), json!(ctx.request.method));
        record.insert("host".into(), json!(ctx.request.host));
        record.insert("uri".into(), json!(ctx.request.uri));

        for group in groups {
            if RESERVED_ENVELOPE_KEYS.contains(&group.category.as_str()) {
                warn!(
                    "Dropping {} message(s) in category {:?}: name is reserved in the JSON envelope",
                    group.messages.len(),
                    group.category
                );
                continue;
            }
            record.insert(group.category.clone(), json!(group.messages));
        }

        self.encode(&Value::Object(record))
    }

    fn format_json_lines(&self, groups: &[CategoryMessages], ctx: &FormatContext<'_>) -> Result<String> {
        let mut lines = Vec::new();

        if !ctx.apart {
            if let Some(diagnostics) = ctx.diagnostics {
                let mut record = Map::new();
                record.insert("timestamp".into(), json!(ctx.timestamp));
                insert_diagnostics(&mut record, diagnostics);
                lines.push(self.encode(&Value::Object(record))?);
            }
        }

        for group in groups {
            for message in &group.messages {
                let record = json!({
                    "timestamp": ctx.timestamp,
                    "category": group.category,
                    "message": message,
                });
                lines.push(self.encode(&record)?);
            }
        }

        Ok(lines.join("\n"))
    }

    fn encode(&self, value: &Value) -> Result<String> {
        let encoded = serde_json::to_string(value)?;
        Ok(apply_json_options(encoded, self.config.json_options))
    }
}

fn insert_diagnostics(record: &mut Map<String, Value>, diagnostics: &Diagnostics) {
    record.insert("runtime".into(), json!(diagnostics.runtime_display()));
    record.insert("reqs".into(), json!(diagnostics.reqs_display()));
    record.insert("memory".into(), json!(diagnostics.memory_display()));
    record.insert("file".into(), json!(diagnostics.files));
}

/// `[timestamp] ip method hosturi`
pub fn banner_line(timestamp: &str, request: &RequestInfo) -> String {
    format!(
        "[{}] {} {} {}{}",
        timestamp, request.ip, request.method, request.host, request.uri
    )
}

/// Substitute `%s` placeholders in order; `%%` is a literal percent sign.
///
/// Missing arguments render as empty strings, surplus ones are dropped.
pub fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }

    out
}

/// Post-process serde_json output for the configured escaping flags.
fn apply_json_options(encoded: String, options: JsonOptions) -> String {
    if !options.escape_unicode && !options.escape_slashes {
        return encoded;
    }

    let mut out = String::with_capacity(encoded.len());
    let mut units = [0u16; 2];
    for c in encoded.chars() {
        if options.escape_slashes && c == '/' {
            out.push_str("\\/");
        } else if options.escape_unicode && !c.is_ascii() {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        } else {
            out.push(c);
        }
    }
    out
}
