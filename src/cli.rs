//! CLI: decode / encode / check documents against a descriptor registry,
//! dump schemas, and generate the built-in theme files.
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use json_cast::theme::{self, Convert};
use json_cast::{Registry, Typed};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate and transform JSON documents against named type descriptors
#[derive(Parser, Debug)]
#[command(name = "json-cast", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// print per-input progress on stderr
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode JSON documents into their typed (internal-key) form
    Decode(TransformOut),
    /// encode typed (internal-key) documents back into JSON form
    Encode(TransformOut),
    /// decode every input and report which ones conform
    Check(CheckOut),
    /// print the descriptor registry as a schema document
    Schema(SchemaOut),
    /// write the built-in themes as JSON files
    GenerateThemes(GenerateOut),
    /// print the CSS variables of a theme file
    CssVars(CssOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document with the descriptor table (built-in theme schema if omitted)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// descriptor name to validate against
    #[arg(long = "type", default_value = "Theme")]
    type_name: String,
}

#[derive(clap::Parser, Debug)]
struct TransformOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    schema_settings: SchemaSettings,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    /// schema document to normalize and print (built-in theme schema if omitted)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// fail if any reference does not resolve
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    /// target directory (defaults to ~/.config/moss/themes)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CssOut {
    /// theme file
    #[arg(long, short)]
    input: PathBuf,

    /// print a `:root { ... }` block instead of JSON
    #[arg(long, default_value_t = false)]
    root_block: bool,
}

/// One input document plus where it came from.
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self, verbose: bool) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let label = source_path.to_string_lossy().to_string();
            let source = read_source(&source_path)
                .with_context(|| format!("failed to read source file ({label})"))?;
            if verbose {
                eprintln!("{} {label}", "reading".dimmed());
            }
            let parsed = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(ix, line)| {
                        let value = serde_json::from_str::<Value>(line)
                            .with_context(|| format!("failed to parse JSON ({label}:{})", ix + 1))?;
                        Ok((format!("{label}:{}", ix + 1), value))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({label})"))?;
                vec![(label.clone(), value)]
            };
            for (label, value) in parsed {
                self.select(label, value, &mut documents)?;
            }
        }
        Ok(documents)
    }

    fn select(&self, label: String, value: Value, out: &mut Vec<Document>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {label}"))?,
        };
        match self.jq_expr.as_ref() {
            None => out.push(Document { label, value }),
            Some(jq_expr) => {
                let results = json_cast::jq_exec::run_jaq(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?;
                for (ix, value) in results.into_iter().enumerate() {
                    out.push(Document { label: format!("{label}[{ix}]"), value });
                }
            }
        }
        Ok(())
    }
}

impl SchemaSettings {
    fn with_registry<T>(&self, f: impl FnOnce(&Registry) -> Result<T>) -> Result<T> {
        match self.schema.as_ref() {
            None => f(&*theme::SCHEMA),
            Some(path) => {
                let registry = Registry::from_path(path)
                    .with_context(|| format!("failed to load schema {}", path.display()))?;
                if !registry.contains(&self.type_name) {
                    bail!("schema {} has no descriptor named {:?}", path.display(), self.type_name);
                }
                f(&registry)
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Decode(target) => {
                let documents = target.input_settings.load_documents(self.verbose)?;
                let outputs = target.schema_settings.with_registry(|registry| {
                    documents
                        .iter()
                        .map(|doc| {
                            registry
                                .decode(&doc.value, &target.schema_settings.type_name)
                                .map(Typed::into_json)
                                .with_context(|| format!("{} does not conform", doc.label))
                        })
                        .collect::<Result<Vec<_>>>()
                })?;
                write_output(target.out.as_deref(), &render_outputs(outputs, target.input_settings.ndjson)?)
            }
            Command::Encode(target) => {
                let documents = target.input_settings.load_documents(self.verbose)?;
                let outputs = target.schema_settings.with_registry(|registry| {
                    documents
                        .iter()
                        .map(|doc| {
                            registry
                                .encode(&Typed::from_json(&doc.value), &target.schema_settings.type_name)
                                .with_context(|| format!("{} does not conform", doc.label))
                        })
                        .collect::<Result<Vec<_>>>()
                })?;
                write_output(target.out.as_deref(), &render_outputs(outputs, target.input_settings.ndjson)?)
            }
            Command::Check(target) => {
                let documents = target.input_settings.load_documents(self.verbose)?;
                let type_name = &target.schema_settings.type_name;
                let failures = target.schema_settings.with_registry(|registry| {
                    let results = documents
                        .par_iter()
                        .map(|doc| (doc, registry.decode(&doc.value, type_name)))
                        .collect::<Vec<_>>();
                    let mut failures = 0usize;
                    for (doc, result) in results {
                        match result {
                            Ok(_) => eprintln!("{} {}", "✓".green(), doc.label),
                            Err(error) => {
                                failures += 1;
                                eprintln!("{} {}", "✗".red(), doc.label.bold());
                                eprintln!("    {error}");
                                eprintln!("    {} {}", "at".dimmed(), error.path);
                            }
                        }
                    }
                    Ok(failures)
                })?;
                if failures > 0 {
                    bail!("{failures} of {} inputs failed validation against {type_name}", documents.len());
                }
                eprintln!("{}", format!("all {} inputs conform to {type_name}", documents.len()).green());
                Ok(())
            }
            Command::Schema(target) => {
                let loaded;
                let registry: &Registry = match target.schema.as_ref() {
                    None => &*theme::SCHEMA,
                    Some(path) => {
                        loaded = Registry::from_path(path)
                            .with_context(|| format!("failed to load schema {}", path.display()))?;
                        &loaded
                    }
                };
                if target.strict {
                    registry.check_references()?;
                }
                let schema_src = serde_json::to_string_pretty(&registry.to_json()?)?;
                write_output(target.out.as_deref(), &schema_src)
            }
            Command::GenerateThemes(target) => {
                let out_dir = match target.out_dir.clone() {
                    Some(dir) => dir,
                    None => theme::builtin::default_themes_dir()
                        .ok_or_else(|| anyhow!("no home directory; pass --out-dir"))?,
                };
                let written = theme::builtin::write_theme_files(&out_dir)
                    .with_context(|| format!("failed to write themes to {}", out_dir.display()))?;
                for path in &written {
                    eprintln!("{} {}", "wrote".green(), path.display());
                }
                eprintln!("Theme files generated successfully.");
                Ok(())
            }
            Command::CssVars(target) => {
                let source = read_source(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let theme = Convert::to_theme(&source)
                    .with_context(|| format!("{} is not a valid theme", target.input.display()))?;
                if target.root_block {
                    println!("{}", theme::css::css_root_block(&theme));
                } else {
                    let vars = theme::css::map_theme_to_css_variables(&theme);
                    println!("{}", serde_json::to_string_pretty(&vars)?);
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn render_outputs(mut outputs: Vec<Value>, ndjson: bool) -> Result<String> {
    if ndjson {
        let lines = outputs
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(lines.join("\n"));
    }
    let src = if outputs.len() == 1 {
        serde_json::to_string_pretty(&outputs.remove(0))?
    } else {
        serde_json::to_string_pretty(&outputs)?
    };
    Ok(src)
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn parses_decode_invocation() {
        let cli = CommandLineInterface::try_parse_from([
            "json-cast", "decode", "--type", "Colors", "-i", "a.json", "b.json", "--ndjson",
        ])
        .unwrap();
        let Command::Decode(target) = cli.cmd else { panic!("expected decode") };
        assert_eq!(target.schema_settings.type_name, "Colors");
        assert_eq!(target.input_settings.input, vec!["a.json", "b.json"]);
        assert!(target.input_settings.ndjson);
    }

    #[test]
    fn loads_ndjson_with_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.ndjson");
        std::fs::write(&path, "{\"t\": {\"a\": 1}}\n\n{\"t\": {\"a\": 2}}\n").unwrap();
        let settings = InputSettings {
            ndjson: true,
            json_pointer: Some("/t".into()),
            jq_expr: None,
            input: vec![path.to_string_lossy().to_string()],
        };
        let docs = settings.load_documents(false).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].value, serde_json::json!({ "a": 2 }));
        assert!(docs[1].label.ends_with(":3"));
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.json").to_string_lossy().to_string();
        assert!(resolve_file_path_patterns([pattern]).is_err());
    }

    #[test]
    fn single_output_is_pretty_many_are_an_array() {
        let one = render_outputs(vec![serde_json::json!({ "a": 1 })], false).unwrap();
        assert_eq!(one, "{\n  \"a\": 1\n}");
        let many = render_outputs(vec![serde_json::json!(1), serde_json::json!(2)], true).unwrap();
        assert_eq!(many, "1\n2");
    }
}
