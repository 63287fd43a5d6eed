//! Line commands for the interactive `edit` loop.
//!
//! Elements are addressed by layer index (0 is the bottom layer) and snapshots
//! by list position (0 is the newest), as shown by `list`.

use anyhow::{Context, Result, bail};
use coverart_core::{AspectRatio, ShapeType};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Text,
    Shape(ShapeType),
    /// Image source: a file path, data URI or URL
    Image(String),
    Move { layer: usize, x: f64, y: f64 },
    Resize { layer: usize, width: f64, height: f64 },
    /// Set one camelCase element field; the value is parsed as JSON when possible
    Set { layer: usize, field: String, value: Value },
    Font { layer: usize, name: String },
    Remove(usize),
    Reorder { from: usize, to: usize },
    Select(usize),
    Copy(usize),
    Paste,
    Duplicate(usize),
    Background(String),
    /// Set one camelCase background field, parsed like [`EditCommand::Set`]
    BackgroundSet { field: String, value: Value },
    BackgroundImage(String),
    ClearBackgroundImage,
    Name(String),
    Ratio(AspectRatio),
    Undo,
    Redo,
    Capture,
    Restore(usize),
    DeleteSnapshot(usize),
    RenameSnapshot { index: usize, name: String },
    List,
    Fonts,
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
text | shape <rect|circle|line|triangle|star> | image <src>
move <layer> <x> <y> | resize <layer> <w> <h> | set <layer> <field> <value>
font <layer> <name> | rm <layer> | reorder <from> <to> | select <layer>
copy <layer> | paste | dup <layer>
bg <color> | bg-set <field> <value> | bg-image <src> | bg-clear | name <text> | ratio <1:1|4:5|9:16|16:9>
undo | redo | capture | restore <n> | snap-rm <n> | snap-name <n> <text>
list | fonts | save | help | quit";

impl EditCommand {
    /// Parse one input line. `None` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word {
            "" => return Ok(None),
            "text" => Self::Text,
            "shape" => Self::Shape(
                arg(&args, 0, "shape type")?
                    .parse::<ShapeType>()
                    .map_err(anyhow::Error::msg)?,
            ),
            "image" => Self::Image(required_rest(rest, "image source")?),
            "move" => Self::Move {
                layer: index(&args, 0)?,
                x: number(&args, 1)?,
                y: number(&args, 2)?,
            },
            "resize" => Self::Resize {
                layer: index(&args, 0)?,
                width: number(&args, 1)?,
                height: number(&args, 2)?,
            },
            "set" => {
                let layer = index(&args, 0)?;
                let (field, value) = field_value(&args[1..])?;
                Self::Set { layer, field, value }
            }
            "font" => Self::Font {
                layer: index(&args, 0)?,
                name: args.get(1..).map(|v| v.join(" ")).unwrap_or_default(),
            },
            "rm" => Self::Remove(index(&args, 0)?),
            "reorder" => Self::Reorder {
                from: index(&args, 0)?,
                to: index(&args, 1)?,
            },
            "select" => Self::Select(index(&args, 0)?),
            "copy" => Self::Copy(index(&args, 0)?),
            "paste" => Self::Paste,
            "dup" => Self::Duplicate(index(&args, 0)?),
            "bg" => Self::Background(required_rest(rest, "background color")?),
            "bg-set" => {
                let (field, value) = field_value(&args)?;
                Self::BackgroundSet { field, value }
            }
            "bg-image" => Self::BackgroundImage(required_rest(rest, "image source")?),
            "bg-clear" => Self::ClearBackgroundImage,
            "name" => Self::Name(required_rest(rest, "name")?),
            "ratio" => Self::Ratio(
                arg(&args, 0, "aspect ratio")?
                    .parse::<AspectRatio>()
                    .map_err(anyhow::Error::msg)?,
            ),
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "capture" => Self::Capture,
            "restore" => Self::Restore(index(&args, 0)?),
            "snap-rm" => Self::DeleteSnapshot(index(&args, 0)?),
            "snap-name" => Self::RenameSnapshot {
                index: index(&args, 0)?,
                name: args.get(1..).map(|v| v.join(" ")).unwrap_or_default(),
            },
            "list" | "ls" => Self::List,
            "fonts" => Self::Fonts,
            "save" => Self::Save,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(Some(command))
    }
}

fn arg<'a>(args: &[&'a str], i: usize, what: &str) -> Result<&'a str> {
    args.get(i).copied().with_context(|| format!("missing {what}"))
}

fn index(args: &[&str], i: usize) -> Result<usize> {
    let raw = arg(args, i, "index")?;
    raw.parse().with_context(|| format!("'{raw}' is not an index"))
}

fn number(args: &[&str], i: usize) -> Result<f64> {
    let raw = arg(args, i, "number")?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => bail!("'{raw}' is not a number"),
    }
}

/// `<field> <value...>`; the value is JSON when it parses, text otherwise.
fn field_value(args: &[&str]) -> Result<(String, Value)> {
    let field = arg(args, 0, "field name")?.to_string();
    let raw = args.get(1..).map(|v| v.join(" ")).unwrap_or_default();
    if raw.is_empty() {
        bail!("missing value for '{field}'");
    }
    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
    Ok((field, value))
}

fn required_rest(rest: &str, what: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("missing {what}");
    }
    Ok(rest.to_string())
}
