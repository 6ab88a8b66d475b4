use crate::error::{ExtractorError, UserFriendlyError};
use crate::model::ServiceHealth;
use crate::presenter::{Row, View, COLUMN_HEADERS};
use console::{pad_str, style, truncate_str, Alignment, Emoji, Term};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

/// Widest a source line may get in the human table before it is cut.
const MAX_SOURCE_WIDTH: usize = 60;

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ExtractorError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// Renders the result view: error line, summary line, then the table.
    pub fn print_view(&self, view: &View) {
        match self.mode {
            OutputMode::Human => self.print_human_view(view),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "result",
                "count": view.count,
                "error": view.error,
                "events": view.rows,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => print!("{}", render_plain_view(view)),
        }
    }

    pub fn print_saved(&self, path: &Path) {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "download",
                "path": path.display().to_string(),
                "bytes": size,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            _ => self.success(&format!(
                "Saved {} ({})",
                path.display(),
                format_bytes(size)
            )),
        }
    }

    pub fn print_health(&self, base_url: &str, health: &ServiceHealth) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "status",
                "service": base_url,
                "ok": health.ok,
                "message": health.message
            })),
            _ => {
                let line = if health.message.is_empty() {
                    format!("Extraction service at {} is up", base_url)
                } else {
                    format!("{} ({})", health.message, base_url)
                };
                if health.ok {
                    self.success(&line);
                } else {
                    self.warning(&format!("Service reported not ok: {}", line));
                }
            }
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_view(&self, view: &View) {
        if let Some(ref error) = view.error {
            if self.use_colors {
                eprintln!("{}{}", CROSS, style(error).red().bold());
            } else {
                eprintln!("✗ {}", error);
            }
        }

        if self.use_colors {
            println!("Found: {} rows", style(view.count).bold());
        } else {
            println!("{}", view.summary());
        }

        if !view.has_rows() {
            return;
        }

        println!();
        let widths = column_widths(&view.rows);
        let header = format_row(&COLUMN_HEADERS, &widths);
        if self.use_colors {
            println!("{}", style(header).bold().underlined());
        } else {
            println!("{}", header);
            println!("{}", "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len() - 1)));
        }

        for (i, row) in view.rows.iter().enumerate() {
            let line = format_row(&row.cells(), &widths);
            if self.use_colors && i % 2 == 1 {
                println!("{}", style(line).dim());
            } else {
                println!("{}", line);
            }
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn column_widths(rows: &[Row]) -> [usize; 4] {
    let mut widths = COLUMN_HEADERS.map(console::measure_text_width);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(console::measure_text_width(cell));
        }
    }
    widths[3] = widths[3].min(MAX_SOURCE_WIDTH);
    widths
}

fn format_row(cells: &[&str; 4], widths: &[usize; 4]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let cell = truncate_str(cell, width, "…");
            pad_str(&cell, width, Alignment::Left, None).to_string()
        })
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}

/// Tab-separated rendition for `--output-format plain`.
fn render_plain_view(view: &View) -> String {
    let mut out = String::new();
    if let Some(ref error) = view.error {
        out.push_str(&format!("ERROR: {}\n", error));
    }
    out.push_str(&format!("COUNT: {}\n", view.count));
    if view.has_rows() {
        out.push_str(&COLUMN_HEADERS.join("\t"));
        out.push('\n');
        for row in &view.rows {
            out.push_str(&row.cells().join("\t"));
            out.push('\n');
        }
    }
    out
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
