//! Human and JSON output for td commands.
//!
//! Each command builds a serializable payload and a [`HumanOutput`]. With
//! `--json` the payload is printed inside a `td.v1` envelope; otherwise the
//! human form is printed unless `--quiet` is set. Errors use the same
//! envelope with `status: "error"`.

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "td.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text form of a command result.
///
/// Rendered as a header line, indented `key: value` facts, task rows, then
/// warnings and suggested next commands.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    facts: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            facts: Vec::new(),
            rows: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.facts.push((key.into(), value.into()));
    }

    /// One line under the facts, printed as given (task rows, paths).
    pub fn push_row(&mut self, row: impl Into<String>) {
        self.rows.push(row.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, command: impl Into<String>) {
        self.next_steps.push(command.into());
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: human.map(|h| h.warnings.as_slice()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.as_slice()).unwrap_or_default(),
        }
        .print();
    }

    if let (false, Some(human)) = (options.quiet, human) {
        println!("{}", format_human(human));
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: &[],
            next_steps: &next_steps,
        }
        .print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    for (key, value) in &output.facts {
        if value.is_empty() {
            lines.push(format!("  {key}"));
        } else {
            lines.push(format!("  {key}: {value}"));
        }
    }
    if !output.rows.is_empty() {
        lines.push(String::new());
        lines.extend(output.rows.iter().map(|row| format!("  {row}")));
    }
    if !output.warnings.is_empty() || !output.next_steps.is_empty() {
        lines.push(String::new());
    }
    lines.extend(output.warnings.iter().map(|w| format!("warning: {w}")));
    lines.extend(output.next_steps.iter().map(|step| format!("next: {step}")));

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// First positional argument, skipping global flags and their values.
pub fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--data-dir" {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return arg;
    }
    "td".to_string()
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let step = match err {
        Error::InvalidConfig(_) => "fix config.toml in the data directory then retry",
        Error::ImportRejected(_) => "run `td export` to see the expected task array format",
        Error::ConfirmationRequired(_) => "td reset --yes",
        Error::NoDataDir => "pass --data-dir or set TD_DATA_DIR",
        Error::LockFailed(_) => "retry once the other td process has finished",
        _ => return Vec::new(),
    };
    vec![step.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_output_renders_facts_rows_and_hints() {
        let mut human = HumanOutput::new("Tasks (all)");
        human.push_summary("Showing", "1");
        human.push_summary("Oldest", "");
        human.push_row("[ ] t1  buy milk  (1970-01-01 00:00)");
        human.push_warning("slot was empty");
        human.push_next_step("td list");

        assert_eq!(
            format_human(&human),
            "Tasks (all)\n  Showing: 1\n  Oldest\n\n  [ ] t1  buy milk  (1970-01-01 00:00)\n\nwarning: slot was empty\nnext: td list"
        );
    }

    #[test]
    fn header_only_output_is_one_line() {
        assert_eq!(format_human(&HumanOutput::new("All tasks removed")), "All tasks removed");
    }

    #[test]
    fn error_envelope_shape() {
        let err = Error::ImportRejected("expected a JSON array".to_string());
        let next_steps = error_next_steps(&err);
        let envelope = Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command: "import",
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(&err),
                details: err.details(),
            }),
            warnings: &[],
            next_steps: &next_steps,
        };
        let json = serde_json::to_value(&envelope).expect("json");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["kind"], "user_error");
        assert_eq!(json["error"]["code"], 2);
        assert!(json.get("data").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["next_steps"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn command_name_skips_global_flags() {
        let args = ["--json", "--data-dir", "/tmp/x", "stats"].map(String::from);
        assert_eq!(infer_command_name(args), "stats");
        assert_eq!(infer_command_name(Vec::<String>::new()), "td");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::NoDataDir), "user_error");
        assert_eq!(
            error_kind(&Error::OperationFailed("boom".to_string())),
            "operation_failed"
        );
        assert_eq!(
            error_next_steps(&Error::ConfirmationRequired("reset".to_string())),
            vec!["td reset --yes".to_string()]
        );
    }
}
