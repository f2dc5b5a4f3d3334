use anstyle::{AnsiColor, Style};
use is_terminal::IsTerminal;
use std::fmt::Display;
use std::io::{self, Write};

const LABEL_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Neutral,
    Success,
    Info,
    Warn,
    Error,
}

impl Tone {
    fn style(self) -> Style {
        let color = match self {
            Tone::Neutral => AnsiColor::Cyan,
            Tone::Success => AnsiColor::Green,
            Tone::Info => AnsiColor::Blue,
            Tone::Warn => AnsiColor::Yellow,
            Tone::Error => AnsiColor::Red,
        };
        Style::new().bold().fg_color(Some(color.into()))
    }

    fn to_stderr(self) -> bool {
        matches!(self, Tone::Warn | Tone::Error)
    }
}

fn render(out: &mut dyn Write, color: bool, tone: Tone, label: &str, message: &str) {
    let (prefix, suffix) = if color {
        let style = tone.style();
        (style.render().to_string(), style.render_reset().to_string())
    } else {
        (String::new(), String::new())
    };

    for (idx, line) in message.split('\n').enumerate() {
        if idx == 0 {
            let _ = writeln!(out, "{prefix}{label:>LABEL_WIDTH$}{suffix} {line}");
        } else {
            let _ = writeln!(out, "{:>LABEL_WIDTH$} {line}", "");
        }
    }
    let _ = out.flush();
}

fn emit(tone: Tone, label: &str, message: &str) {
    let no_color = std::env::var_os("NO_COLOR").is_some();

    if tone.to_stderr() {
        let stderr = io::stderr();
        let color = !no_color && stderr.is_terminal();
        render(&mut stderr.lock(), color, tone, label, message);
    } else {
        let stdout = io::stdout();
        let color = !no_color && stdout.is_terminal();
        render(&mut stdout.lock(), color, tone, label, message);
    }
}

pub fn status(label: &str, message: impl Display) {
    emit(Tone::Neutral, label, &message.to_string());
}

pub fn info(message: impl Display) {
    emit(Tone::Info, "Info", &message.to_string());
}

pub fn warn(message: impl Display) {
    emit(Tone::Warn, "Warning", &message.to_string());
}

pub fn error(message: impl Display) {
    emit(Tone::Error, "Error", &message.to_string());
}

pub fn success(label: &str, message: impl Display) {
    emit(Tone::Success, label, &message.to_string());
}
