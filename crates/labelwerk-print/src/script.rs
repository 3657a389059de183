// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job descriptor builder.
//
// Resolves the template, derives the output filename, and renders the XML
// job script the label designer consumes:
//
//   <XMLScript Version="2.0">
//     <Command><Print>
//       <Format>{template path}</Format>
//       <NamedSubString Name="{field}"><Value>{value}</Value></NamedSubString>
//       <PrintSetup>{printer, copies}</PrintSetup>
//     </Print></Command>
//   </XMLScript>

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use labelwerk_core::config::ServiceConfig;
use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::JobRequest;

/// Printer the designer renders through; produces a PDF via the save dialog.
pub const PDF_PRINTER: &str = "Microsoft Print to PDF";

/// Copies per job. The PDF printer writes one file per copy, so always one.
pub const COPIES: u32 = 1;

/// Timestamp segment of output filenames (second resolution).
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Stand-in for a filename component that sanitizes to nothing.
const EMPTY_COMPONENT: &str = "unnamed";

/// Highest collision suffix tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 999;

/// Everything needed to launch one job, computed before anything runs.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub template: String,
    pub template_path: PathBuf,
    pub filename: String,
    pub output_path: PathBuf,
    /// Rendered XML job script.
    pub script: String,
}

impl JobPlan {
    /// Resolve the template and render the job script for `request`.
    ///
    /// Fails with `TemplateNotFound`/`InvalidTemplateId` before anything
    /// else is computed. The only filesystem access is the template check
    /// and the collision check on the output directory.
    pub fn build(
        config: &ServiceConfig,
        request: &JobRequest,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let template_path = resolve_template(config, &request.template)?;

        let requester = if request.requester.trim().is_empty() {
            config.default_requester.as_str()
        } else {
            request.requester.as_str()
        };
        let stem = filename_stem(
            requester,
            &request.template,
            request.output_name.as_deref(),
            now,
        );
        let (filename, output_path) =
            unique_output_path(&config.output_dir, &stem, &config.artifact_extension)?;

        let script = render_script(&template_path, &request.data);
        debug!(
            template = %request.template,
            %filename,
            fields = request.data.len(),
            script_len = script.len(),
            "job script rendered"
        );

        Ok(Self {
            template: request.template.clone(),
            template_path,
            filename,
            output_path,
            script,
        })
    }
}

/// Map a template identifier to `{templates_dir}/{id}.{ext}` and check it exists.
pub fn resolve_template(config: &ServiceConfig, template: &str) -> Result<PathBuf> {
    if template.is_empty()
        || template == "."
        || template == ".."
        || template.contains(['/', '\\', '\0'])
    {
        return Err(LabelwerkError::InvalidTemplateId(template.to_string()));
    }

    let path = config
        .templates_dir
        .join(format!("{template}.{}", config.template_extension));
    if path.is_file() {
        Ok(path)
    } else {
        Err(LabelwerkError::TemplateNotFound {
            template: template.to_string(),
            path,
        })
    }
}

/// Keep alphanumerics, `_` and `-`; drop everything else.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        EMPTY_COMPONENT.to_string()
    } else {
        cleaned
    }
}

/// `{requester}_{template}_{YYYYMMDD_HHMMSS}`, or `{output_name}_{timestamp}`
/// when an explicit name was requested.
pub fn filename_stem(
    requester: &str,
    template: &str,
    output_name: Option<&str>,
    now: NaiveDateTime,
) -> String {
    let timestamp = now.format(TIMESTAMP_FORMAT);
    match output_name {
        Some(name) if !name.trim().is_empty() => {
            format!("{}_{timestamp}", sanitize_component(name))
        }
        _ => format!(
            "{}_{}_{timestamp}",
            sanitize_component(requester),
            sanitize_component(template)
        ),
    }
}

/// First free `{stem}.{ext}`, `{stem}_2.{ext}`, ... under `dir`.
///
/// Same-second submissions for the same requester and template get a
/// numeric suffix instead of overwriting an earlier artifact.
pub fn unique_output_path(dir: &Path, stem: &str, ext: &str) -> Result<(String, PathBuf)> {
    let first = format!("{stem}.{ext}");
    let path = dir.join(&first);
    if !path.exists() {
        return Ok((first, path));
    }
    for n in 2..=MAX_COLLISION_SUFFIX {
        let candidate = format!("{stem}_{n}.{ext}");
        let path = dir.join(&candidate);
        if !path.exists() {
            debug!(%candidate, "output filename taken, using suffix");
            return Ok((candidate, path));
        }
    }
    Err(LabelwerkError::Unexpected(format!(
        "no free output filename for {stem} after {MAX_COLLISION_SUFFIX} attempts"
    )))
}

/// Render the XML job script. Fields are emitted in name order.
pub fn render_script(template_path: &Path, data: &BTreeMap<String, String>) -> String {
    let mut xml = String::with_capacity(512 + data.len() * 96);
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<XMLScript Version=\"2.0\">\n");
    xml.push_str("  <Command>\n");
    xml.push_str("    <Print>\n");
    let format_path = template_path.display().to_string();
    let _ = writeln!(xml, "      <Format>{}</Format>", escape_text(&format_path));

    for (name, value) in data {
        let name = escape_attribute(name);
        let _ = writeln!(xml, "      <NamedSubString Name=\"{name}\">");
        let _ = writeln!(xml, "        <Value>{}</Value>", escape_text(value));
        xml.push_str("      </NamedSubString>\n");
    }

    xml.push_str("      <PrintSetup>\n");
    let _ = writeln!(xml, "        <Printer>{PDF_PRINTER}</Printer>");
    let _ = writeln!(xml, "        <IdenticalCopiesOfLabel>{COPIES}</IdenticalCopiesOfLabel>");
    xml.push_str("      </PrintSetup>\n");
    xml.push_str("    </Print>\n");
    xml.push_str("  </Command>\n");
    xml.push_str("</XMLScript>");
    xml
}

/// Escape `&`, `<`, `>` for element text.
pub fn escape_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape for a double-quoted attribute value.
fn escape_attribute(raw: &str) -> Cow<'_, str> {
    let text = escape_text(raw);
    if text.contains('"') {
        Cow::Owned(text.replace('"', "&quot;"))
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 12)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn unescape(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }

    /// Pull every `<Value>` body out of a rendered script.
    fn values(script: &str) -> Vec<&str> {
        script
            .lines()
            .filter_map(|line| {
                line.trim()
                    .strip_prefix("<Value>")
                    .and_then(|rest| rest.strip_suffix("</Value>"))
            })
            .collect()
    }

    fn config_in(dir: &Path) -> ServiceConfig {
        ServiceConfig {
            templates_dir: dir.join("templates"),
            output_dir: dir.join("output"),
            ..Default::default()
        }
    }

    #[test]
    fn special_characters_are_escaped_and_recoverable() {
        let originals = ["Tom & Jerry", "<script>", "a>b<c&&d", "&amp; already"];
        let data: BTreeMap<String, String> = originals
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("F{i}"), v.to_string()))
            .collect();

        let script = render_script(Path::new("/t/test.btw"), &data);
        let rendered = values(&script);
        assert_eq!(rendered.len(), originals.len());
        for (rendered, original) in rendered.iter().zip(originals) {
            assert!(!rendered.contains('<') && !rendered.contains('>'));
            assert_eq!(unescape(rendered), original);
        }
    }

    #[test]
    fn script_names_template_printer_and_copies() {
        let mut data = BTreeMap::new();
        data.insert("ProductName".to_string(), "Phone".to_string());
        let script = render_script(Path::new("/t/test.btw"), &data);

        assert!(script.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(script.contains("<Format>/t/test.btw</Format>"));
        assert!(script.contains("<NamedSubString Name=\"ProductName\">"));
        assert!(script.contains("<Value>Phone</Value>"));
        assert!(script.contains("<Printer>Microsoft Print to PDF</Printer>"));
        assert!(script.contains("<IdenticalCopiesOfLabel>1</IdenticalCopiesOfLabel>"));
        assert!(script.ends_with("</XMLScript>"));
    }

    #[test]
    fn empty_data_renders_no_named_values() {
        let script = render_script(Path::new("t.btw"), &BTreeMap::new());
        assert!(!script.contains("NamedSubString"));
        assert!(script.contains("<PrintSetup>"));
    }

    #[test]
    fn field_names_cannot_break_out_of_the_attribute() {
        let mut data = BTreeMap::new();
        data.insert("a\" Injected=\"1".to_string(), "v".to_string());
        let script = render_script(Path::new("t.btw"), &data);
        assert!(script.contains("Name=\"a&quot; Injected=&quot;1\""));
    }

    #[test]
    fn filename_is_sanitized_and_timestamped() {
        let stem = filename_stem("op 01/../x", "product label!", None, at(14, 30, 22));
        assert_eq!(stem, "op01x_productlabel_20241212_143022");
        assert!(stem
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn empty_components_get_a_placeholder() {
        let stem = filename_stem("***", "test", None, at(1, 2, 3));
        assert_eq!(stem, "unnamed_test_20241212_010203");
    }

    #[test]
    fn explicit_output_name_replaces_the_stem() {
        let stem = filename_stem("op1", "test", Some("batch 7"), at(1, 2, 3));
        assert_eq!(stem, "batch7_20241212_010203");
    }

    #[test]
    fn distinct_triples_give_distinct_names() {
        let a = filename_stem("op1", "test", None, at(9, 0, 0));
        let b = filename_stem("op2", "test", None, at(9, 0, 0));
        let c = filename_stem("op1", "other", None, at(9, 0, 0));
        let d = filename_stem("op1", "test", None, at(9, 0, 1));
        let all = [&a, &b, &c, &d];
        for (i, x) in all.iter().enumerate() {
            for y in &all[i + 1..] {
                assert_ne!(x, y);
            }
        }
    }

    #[test]
    fn collisions_get_a_numeric_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("op1_test_20241212_090000.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("op1_test_20241212_090000_2.pdf"), b"x").unwrap();

        let (name, path) =
            unique_output_path(dir.path(), "op1_test_20241212_090000", "pdf").unwrap();
        assert_eq!(name, "op1_test_20241212_090000_3.pdf");
        assert_eq!(path, dir.path().join(&name));
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = resolve_template(&config, "ghost").unwrap_err();
        assert!(matches!(
            err,
            LabelwerkError::TemplateNotFound { ref template, .. } if template == "ghost"
        ));
    }

    #[test]
    fn traversal_template_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        for bad in ["", "..", "../secret", "a\\b"] {
            let err = resolve_template(&config, bad).unwrap_err();
            assert!(matches!(err, LabelwerkError::InvalidTemplateId(_)), "{bad:?}");
        }
    }

    #[test]
    fn plan_uses_default_requester_for_blank_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.templates_dir).unwrap();
        std::fs::write(config.templates_dir.join("test.btw"), b"tpl").unwrap();

        let request = JobRequest::new("test").with_requester("  ");
        let plan = JobPlan::build(&config, &request, at(8, 0, 0)).unwrap();
        assert_eq!(plan.filename, "system_test_20241212_080000.pdf");
        assert_eq!(plan.output_path, config.output_dir.join(&plan.filename));
        assert_eq!(plan.template_path, config.templates_dir.join("test.btw"));
    }
}
