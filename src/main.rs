use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use keyseq::cli::{CliArgs, CliCommand};
use keyseq::keymap::{build_processor, default_layers, load_keymap_file, KeyProcessor};
use keyseq::replay;
use keyseq::scheduler::VirtualClock;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    keyseq::tracing::init(args.log_level());

    let mut processor = load_processor(&args)?;

    match &args.command {
        CliCommand::Bindings { mode } => {
            let mode = mode.clone().unwrap_or_else(|| processor.mode().to_string());
            if !processor.mode_names().contains(&mode.as_str()) {
                anyhow::bail!("unknown mode {:?}", mode);
            }
            for (sequence, action) in processor.bindings(&mode) {
                println!("{:<24} {}", sequence.join(" "), action);
            }
        }
        CliCommand::Parse { notation } => {
            for key in processor.parser().parse_key_sequence(notation) {
                println!("{:<16} {}", key.as_str(), key.notation());
            }
        }
        CliCommand::Replay { script } => {
            let source = read_script(script)?;
            let steps = replay::parse_script(&source)
                .with_context(|| format!("Failed to parse {}", script.display()))?;
            for entry in replay::run(&mut processor, &steps) {
                println!("{}", entry);
            }
        }
    }

    Ok(())
}

fn load_processor(args: &CliArgs) -> Result<KeyProcessor<String>> {
    let mut layers = if args.no_defaults {
        Vec::new()
    } else {
        default_layers()
    };

    if let Some(path) = &args.keymap {
        let config = load_keymap_file(path)
            .with_context(|| format!("Failed to load keymap {}", path.display()))?;
        layers.push(config);
    }

    tracing::debug!("Building processor from {} keymap layers", layers.len());
    build_processor(&layers, VirtualClock::new()).context("Failed to apply keymap")
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read script from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
