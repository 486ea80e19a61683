use crate::command::{Command, RenderArgs};


/// Parse CLI arguments into a typed Command enum.
///
/// The first argument is expected to be the subcommand (e.g., "render",
/// "gpus"). Arguments are expected WITHOUT the program name (i.e., `args`
/// should be `["gpus"]`, not `["brig", "gpus"]`).
pub fn parse_args(args: &[&str]) -> Result<Command, String> {
    if args.is_empty() {
        return Err("No command specified. Run 'brig help' for usage.".into());
    }

    match args[0] {
        "check" => parse_check(args),
        "gpus" => parse_gpus(args),
        "render" => parse_render(args),
        "collect" => parse_collect(args),
        "hosts" => parse_hosts(args),
        "help" => Ok(Command::Help),
        _ => Err(format!("Unknown command: '{}'", args[0])),
    }
}


// ---------------------------------------------------------------------------
// Sub-parsers
// ---------------------------------------------------------------------------

/// `brig check [--host <name>]`
fn parse_check(args: &[&str]) -> Result<Command, String> {
    let mut host = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--host" => {
                i += 1;
                host = Some(take_arg(rest, i, "--host")?);
            }
            other => return Err(format!("Unknown flag for check: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Check { host })
}

/// `brig gpus [--host <name>] [--json]`
fn parse_gpus(args: &[&str]) -> Result<Command, String> {
    let mut host = None;
    let mut json = false;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--host" => {
                i += 1;
                host = Some(take_arg(rest, i, "--host")?);
            }
            "--json" => json = true,
            other => return Err(format!("Unknown flag for gpus: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Gpus { host, json })
}

/// `brig render --scene <path> --start <n> --end <n> [--host <name>]
/// [--output <tpl>] [--engine <e>] [--format <f>] [--script <path>]
/// [--no-distribute] [--gpu-prefix] [--watch] [--json]`
fn parse_render(args: &[&str]) -> Result<Command, String> {
    let mut scene = None;
    let mut start = None;
    let mut end = None;
    let mut parsed = RenderArgs::default();

    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--scene" => {
                i += 1;
                scene = Some(take_arg(rest, i, "--scene")?);
            }
            "--start" => {
                i += 1;
                start = Some(take_frame(rest, i, "--start")?);
            }
            "--end" => {
                i += 1;
                end = Some(take_frame(rest, i, "--end")?);
            }
            "--host" => {
                i += 1;
                parsed.host = Some(take_arg(rest, i, "--host")?);
            }
            "--output" => {
                i += 1;
                parsed.output = Some(take_arg(rest, i, "--output")?);
            }
            "--engine" => {
                i += 1;
                parsed.engine = Some(take_arg(rest, i, "--engine")?);
            }
            "--format" => {
                i += 1;
                parsed.format = Some(take_arg(rest, i, "--format")?);
            }
            "--script" => {
                i += 1;
                parsed.script = Some(take_arg(rest, i, "--script")?);
            }
            "--no-distribute" => parsed.no_distribute = true,
            "--gpu-prefix" => parsed.gpu_prefix = true,
            "--watch" => parsed.watch = true,
            "--json" => parsed.json = true,
            other => return Err(format!("Unknown flag for render: '{}'", other)),
        }
        i += 1;
    }

    parsed.scene = scene.ok_or("render requires --scene")?;
    parsed.start = start.ok_or("render requires --start")?;
    parsed.end = end.ok_or("render requires --end")?;
    Ok(Command::Render(parsed))
}

/// `brig collect --dest <path> [--host <name>]`
fn parse_collect(args: &[&str]) -> Result<Command, String> {
    let mut host = None;
    let mut dest = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--host" => {
                i += 1;
                host = Some(take_arg(rest, i, "--host")?);
            }
            "--dest" => {
                i += 1;
                dest = Some(take_arg(rest, i, "--dest")?);
            }
            other => return Err(format!("Unknown flag for collect: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Collect {
        host,
        dest: dest.ok_or("collect requires --dest")?,
    })
}

/// `brig hosts [--label <label>]`
fn parse_hosts(args: &[&str]) -> Result<Command, String> {
    let mut label = None;
    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            "--label" => {
                i += 1;
                label = Some(take_arg(rest, i, "--label")?);
            }
            other => return Err(format!("Unknown flag for hosts: '{}'", other)),
        }
        i += 1;
    }
    Ok(Command::Hosts { label })
}


// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn take_arg(args: &[&str], index: usize, flag: &str) -> Result<String, String> {
    if index >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[index].into())
}

fn take_frame(args: &[&str], index: usize, flag: &str) -> Result<i32, String> {
    let raw = take_arg(args, index, flag)?;
    raw.parse::<i32>()
        .map_err(|_| format!("{} requires a frame number, got '{}'", flag, raw))
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Top level --

    #[test]
    fn empty_args_error() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn unknown_command_error() {
        let err = parse_args(&["frobnicate"]).unwrap_err();
        assert!(err.contains("frobnicate"));
    }

    #[test]
    fn help_parses() {
        assert_eq!(parse_args(&["help"]).unwrap(), Command::Help);
    }

    // -- check / gpus --

    #[test]
    fn check_default_host() {
        assert_eq!(
            parse_args(&["check"]).unwrap(),
            Command::Check { host: None }
        );
    }

    #[test]
    fn check_named_host() {
        assert_eq!(
            parse_args(&["check", "--host", "r1"]).unwrap(),
            Command::Check {
                host: Some("r1".into())
            }
        );
    }

    #[test]
    fn gpus_with_json() {
        assert_eq!(
            parse_args(&["gpus", "--host", "r1", "--json"]).unwrap(),
            Command::Gpus {
                host: Some("r1".into()),
                json: true
            }
        );
    }

    #[test]
    fn gpus_rejects_unknown_flag() {
        assert!(parse_args(&["gpus", "--frob"]).is_err());
    }

    // -- render --

    #[test]
    fn render_minimal() {
        let cmd = parse_args(&[
            "render", "--scene", "cube.blend", "--start", "1", "--end", "100",
        ])
        .unwrap();
        match cmd {
            Command::Render(args) => {
                assert_eq!(args.scene, "cube.blend");
                assert_eq!(args.start, 1);
                assert_eq!(args.end, 100);
                assert!(!args.no_distribute);
                assert!(!args.watch);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn render_full_flags() {
        let cmd = parse_args(&[
            "render",
            "--scene",
            "cube.blend",
            "--start",
            "-5",
            "--end",
            "10",
            "--host",
            "r2",
            "--output",
            "output/shot1_",
            "--engine",
            "BLENDER_EEVEE",
            "--format",
            "EXR",
            "--script",
            "setup.py",
            "--no-distribute",
            "--gpu-prefix",
            "--watch",
            "--json",
        ])
        .unwrap();
        match cmd {
            Command::Render(args) => {
                assert_eq!(args.start, -5);
                assert_eq!(args.host.as_deref(), Some("r2"));
                assert_eq!(args.engine.as_deref(), Some("BLENDER_EEVEE"));
                assert_eq!(args.script.as_deref(), Some("setup.py"));
                assert!(args.no_distribute);
                assert!(args.gpu_prefix);
                assert!(args.watch);
                assert!(args.json);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn render_missing_scene_errors() {
        let err = parse_args(&["render", "--start", "1", "--end", "10"]).unwrap_err();
        assert!(err.contains("--scene"));
    }

    #[test]
    fn render_missing_range_errors() {
        assert!(parse_args(&["render", "--scene", "a.blend", "--start", "1"]).is_err());
        assert!(parse_args(&["render", "--scene", "a.blend", "--end", "9"]).is_err());
    }

    #[test]
    fn render_non_numeric_frame_errors() {
        let err = parse_args(&[
            "render", "--scene", "a.blend", "--start", "one", "--end", "10",
        ])
        .unwrap_err();
        assert!(err.contains("--start"));
    }

    #[test]
    fn render_flag_without_value_errors() {
        let err =
            parse_args(&["render", "--scene", "a.blend", "--start", "1", "--end"]).unwrap_err();
        assert!(err.contains("--end"));
    }

    // -- collect / hosts --

    #[test]
    fn collect_requires_dest() {
        assert!(parse_args(&["collect"]).is_err());
        assert_eq!(
            parse_args(&["collect", "--dest", "./out"]).unwrap(),
            Command::Collect {
                host: None,
                dest: "./out".into()
            }
        );
    }

    #[test]
    fn hosts_with_label() {
        assert_eq!(
            parse_args(&["hosts", "--label", "a100"]).unwrap(),
            Command::Hosts {
                label: Some("a100".into())
            }
        );
    }
}
