use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use pico_args::Arguments;
use std::{
    env,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use touchxform::config::{Profile, ProfileStore};
use touchxform::replay::Replay;
use touchxform::trace;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            let summary_only = pargs.contains("--summary");
            let trace_path: PathBuf = pargs.free_from_str().map_err(|_| {
                anyhow!("usage: touchxform replay <trace.jsonl> [--profile <name> | --config <path>]")
            })?;

            let profile = resolve_profile(profile_name, config_path)?;
            info!("replaying {} with profile '{}'", trace_path.display(), profile.name());
            let frames = trace::read_trace(&trace_path)?;
            if frames.is_empty() {
                warn!("{} has no frames", trace_path.display());
            }

            let mut replay = Replay::new(&profile);
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for frame in &frames {
                let report = replay.step(frame);
                if !summary_only {
                    serde_json::to_writer(&mut out, &report)?;
                    writeln!(out)?;
                }
            }
            serde_json::to_writer(&mut out, &serde_json::json!({ "summary": replay.summary() }))?;
            writeln!(out)?;
            out.flush()?;
            Ok(())
        }

        Some("check") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: touchxform check <profile.toml>"))?;
            let profile = Profile::load(&path)?;
            let config = profile.gesture_config();
            let gesture = profile.build_gesture();
            println!(
                "ok: '{}' kind={} types={} pointers={}..{} threshold={:.2}px",
                profile.name(),
                config.kind.name(),
                gesture.types(),
                config.min_pointers,
                if config.max_pointers == 0 {
                    "any".to_string()
                } else {
                    config.max_pointers.to_string()
                },
                gesture.screen_transform_pixels()
            );
            Ok(())
        }

        Some("profiles") => {
            let store = ProfileStore::open()?;
            store.install_default()?;
            info!("profiles in {}", store.profiles_dir().display());
            let active = store.active_name().unwrap_or_default();
            for name in store.list() {
                let mark = if name == active { "*" } else { " " };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: touchxform use <profile_name>"))?;
            let store = ProfileStore::open()?;
            store.install_default()?;
            store.set_active(&name)?;
            println!("ok: active profile is now {name}");
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

/// `--config` wins over `--profile`; with neither the active profile is
/// used, falling back to the built-in one when no profile directory exists.
fn resolve_profile(name: Option<String>, path: Option<PathBuf>) -> Result<Profile> {
    if let Some(path) = path {
        if name.is_some() {
            warn!("--config given, ignoring --profile");
        }
        return Ok(Profile::load(&path)?);
    }

    match ProfileStore::open() {
        Ok(store) => {
            store.install_default()?;
            match name {
                Some(name) => store
                    .load(&name)
                    .with_context(|| format!("loading profile '{name}'")),
                None => Ok(store.load_active()?),
            }
        }
        Err(e) if name.is_none() => {
            warn!("{e}; using the built-in profile");
            Ok(Profile::builtin()?)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_help() {
    println!(
        r#"touchxform - multi-pointer transform gesture engine

USAGE:
  touchxform help [command]               Show general or command-specific help
  touchxform replay <trace.jsonl>         Replay a contact trace, print JSON lines
        [--profile <name> | --config <path>] [--summary]
  touchxform check <profile.toml>         Validate a profile
  touchxform profiles                     List profiles
  touchxform use <name>                   Switch active profile

TIPS:
  - Profiles: ~/.config/touchxform/profiles
  - Active profile pointer: ~/.config/touchxform/active
  - RUST_LOG=debug shows state transitions and threshold crossings
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: touchxform replay <trace.jsonl> [--profile <name> | --config <path>] [--summary]\n\
             Feeds each trace frame through the gesture and prints one JSON object per frame,\n\
             then a summary line. --summary prints only the summary."
        ),
        "check" => println!(
            "usage: touchxform check <profile.toml>\nParses and validates a profile file."
        ),
        "profiles" => {
            println!("usage: touchxform profiles\nLists available profiles; marks active with '*'.")
        }
        "use" => {
            println!("usage: touchxform use <name>\nSwitches the active profile to <name>.")
        }
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
