use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use stereo_quad::profile::{Profile, ProfileStore, PROFILE_EXTENSION};
use stereo_quad::surface::{Eye, Transform};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "list" => {
            let dir = args.next().ok_or_else(|| anyhow!("list requires a directory: profile_tool list <dir>"))?;
            cmd_list(&dir)
        }
        "show" => {
            let file = args.next().ok_or_else(|| anyhow!("show requires a file: profile_tool show <profile>"))?;
            cmd_show(&file)
        }
        "validate" => {
            let dir = args
                .next()
                .ok_or_else(|| anyhow!("validate requires a directory: profile_tool validate <dir>"))?;
            cmd_validate(&dir)
        }
        "init" => {
            let dir = args.next().ok_or_else(|| anyhow!("init requires a directory: profile_tool init <dir>"))?;
            let defaults = args.next();
            cmd_init(&dir, defaults.as_deref())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Profile Tool

Usage:
  profile_tool list <dir>                 List profiles and their speeds
  profile_tool show <profile>             Print both eye transforms of one profile file
  profile_tool validate <dir>             Parse every profile and report problems
  profile_tool init <dir> [defaults_dir]  Create the store, seeding from defaults if empty
  profile_tool help                       Show this message
"
    );
}

fn cmd_list(dir: &str) -> Result<()> {
    println!("{:<32} {:>8} {:>8} {:>8} {:>10}", "Name", "Pos", "Rot", "Scale", "Depth");
    println!("{}", "-".repeat(70));
    for path in profile_paths(dir)? {
        match Profile::load_from_path(&path) {
            Ok(profile) => {
                let speeds = profile.speeds;
                println!(
                    "{:<32} {:>8.3} {:>8.3} {:>8.3} {:>10.6}",
                    profile.name,
                    speeds.position_speed,
                    speeds.rotation_speed,
                    speeds.scale_speed,
                    speeds.depth_adjust_speed
                );
            }
            Err(err) => println!("{:<32} unreadable: {err:#}", path.display()),
        }
    }
    Ok(())
}

fn cmd_show(file: &str) -> Result<()> {
    let profile = Profile::load_from_path(file)?;
    println!("Profile '{}'", profile.name);
    for eye in Eye::BOTH {
        print_transform(eye, profile.transform(eye));
    }
    Ok(())
}

fn print_transform(eye: Eye, transform: &Transform) {
    let p = transform.position;
    let r = transform.rotation;
    let s = transform.scale;
    println!(
        "  {:<5} position ({:.4}, {:.4}, {:.4})  rotation ({:.2}, {:.2}, {:.2})  scale ({:.4}, {:.4}, {:.4})",
        eye.label(),
        p.x,
        p.y,
        p.z,
        r.x,
        r.y,
        r.z,
        s.x,
        s.y,
        s.z
    );
}

fn cmd_validate(dir: &str) -> Result<()> {
    let mut names = HashSet::new();
    let mut issues = Vec::new();
    let paths = profile_paths(dir)?;
    for path in &paths {
        match Profile::load_from_path(path) {
            Ok(profile) => {
                if !names.insert(profile.name.clone()) {
                    issues.push(format!("{}: duplicate profile name '{}'", path.display(), profile.name));
                }
            }
            Err(err) => issues.push(format!("{err:#}")),
        }
    }
    if issues.is_empty() {
        println!("{} profile(s) in '{}' are valid.", paths.len(), dir);
        Ok(())
    } else {
        Err(anyhow!(format!("profiles in '{}' have issues:\n  - {}", dir, issues.join("\n  - "))))
    }
}

fn cmd_init(dir: &str, defaults: Option<&str>) -> Result<()> {
    let mut store = ProfileStore::new(dir);
    if let Some(defaults) = defaults {
        store = store.with_defaults(defaults);
    }
    let report = store.load_all()?;
    println!(
        "Store '{}': {} profile(s), {} seeded from defaults, {} skipped{}",
        dir,
        report.loaded,
        report.seeded_from_defaults,
        report.skipped.len(),
        if report.synthesized_default { ", built-in default created" } else { "" }
    );
    Ok(())
}

fn profile_paths(dir: &str) -> Result<Vec<std::path::PathBuf>> {
    let root = Path::new(dir);
    let mut paths = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("reading profile directory '{}'", root.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(PROFILE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
