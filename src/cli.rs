//! Minimal CLI: classify a descriptor, or load documents through it.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::descriptor::TypeDescriptor;
use crate::diagnostics::Verdict;
use crate::options::Options;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON documents against a type descriptor and re-emit them in canonical form
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print whether the descriptor is typecheckable, hashable, keyable and JSON encodable
    Classify(ClassifyCmd),
    /// decode each input under the descriptor and write it back out re-encoded
    Load(LoadCmd),
}

#[derive(Args, Debug, Clone)]
struct DescriptorSettings {
    /// descriptor document (.json)
    #[arg(long = "type", short = 't')]
    descriptor: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct CodecSettings {
    /// reject decimal literals where an int or float is expected
    #[arg(long, default_value_t = false)]
    no_cast_decimal: bool,

    /// write Decimal values as JSON numbers rather than strings
    #[arg(long, default_value_t = false)]
    decimals_as_numbers: bool,

    /// write records as positional lists
    #[arg(long, default_value_t = false)]
    records_as_lists: bool,
}

#[derive(clap::Parser, Debug)]
struct ClassifyCmd {
    #[command(flatten)]
    descriptor_settings: DescriptorSettings,
}

#[derive(clap::Parser, Debug)]
struct LoadCmd {
    #[command(flatten)]
    descriptor_settings: DescriptorSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    codec_settings: CodecSettings,

    /// indent the output
    #[arg(long)]
    pretty: bool,

    /// output file, one document per input (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl DescriptorSettings {
    fn load(&self) -> Result<TypeDescriptor> {
        let path = &self.descriptor;
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read descriptor file {}", path.display()))?;
        crate::descriptor_file::from_str(&source)
            .with_context(|| format!("invalid descriptor file {}", path.display()))
    }
}

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, String) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            apply(&source_path, source)?;
        }
        Ok(())
    }
}

impl CodecSettings {
    fn options(&self) -> Options {
        Options::default()
            .with_cast_decimal(!self.no_cast_decimal)
            .with_decimals_as_numbers(self.decimals_as_numbers)
            .with_records_as_lists(self.records_as_lists)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Classify(target) => {
                let d = target.descriptor_settings.load()?;
                println!("{}", d.to_string().bold());
                print_verdict("typecheckable", crate::is_checkable(&d));
                print_verdict("hashable", crate::is_hashable(&d));
                print_verdict("keyable", crate::is_keyable(&d));
                print_verdict("JSON encodable", crate::is_json_encodable(&d));
                Ok(())
            }
            Command::Load(target) => {
                let d = target.descriptor_settings.load()?;
                let opts = target.codec_settings.options();
                let mut documents = Vec::new();
                target.input_settings.load_process(|source_path, source| {
                    let value = crate::load_from_text(&source, &d, &opts)
                        .with_context(|| format!("failed to load {} as {d}", source_path.display()))?;
                    tracing::info!(path = %source_path.display(), %value, "loaded");
                    let encoded = crate::encode(&value, &d, &opts)?;
                    let text = if target.pretty {
                        crate::text::write_pretty(&encoded)?
                    } else {
                        crate::text::write(&encoded)?
                    };
                    documents.push(text);
                    Ok(())
                })?;
                let output = documents.join("\n");
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &output)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{output}");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_verdict(judgment: &str, verdict: Verdict) {
    if verdict.holds() {
        println!("  {} {judgment}", "✓".green());
        return;
    }
    println!("  {} {judgment}", "✗".red());
    for reason in verdict.diagnostics().reasons() {
        println!("      {}", reason.dimmed());
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
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
