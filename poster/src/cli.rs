//! Command-line entry: accepts Go-style single-dash long flags on top of `argh`'s syntax.

use argh::FromArgs;

/// Flags that take no value.
const SWITCHES: &[&str] = &["body", "preview", "help"];

/// Parses the process arguments, exiting with usage on `--help` or bad input.
pub fn from_env<T: FromArgs>() -> T {
    let mut args = std::env::args();
    let cmd = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
    let cmd = std::path::Path::new(&cmd)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(&cmd)
        .to_owned();
    let args = normalize(args);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    T::from_args(&[cmd.as_str()], &args).unwrap_or_else(|early_exit| {
        std::process::exit(match early_exit.status {
            Ok(()) => {
                println!("{}", early_exit.output);
                0
            }
            Err(()) => {
                eprintln!(
                    "{}\nRun {cmd} --help for more information.",
                    early_exit.output
                );
                1
            }
        })
    })
}

/// Rewrites `-name`, `-name=value` and `--name=value` into the `--name [value]` form.
///
/// Values following an option are passed through untouched, as is everything after `--`.
/// Switches given as `-name=false` are dropped.
pub fn normalize<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut expect_value = false;
    let mut passthrough = false;

    for arg in args {
        if passthrough || std::mem::take(&mut expect_value) {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let Some(flag) = long_flag(&arg) else {
            out.push(arg);
            continue;
        };
        match flag.split_once('=') {
            Some((name, value)) if SWITCHES.contains(&name) => match parse_bool(value) {
                Some(true) => out.push(format!("--{name}")),
                Some(false) => {}
                None => out.push(arg),
            },
            Some((name, value)) => {
                out.push(format!("--{name}"));
                out.push(value.to_owned());
            }
            None => {
                expect_value = !SWITCHES.contains(&flag);
                out.push(format!("--{flag}"));
            }
        }
    }
    out
}

/// The flag name of a one- or two-dash long flag. Short flags and negative numbers are `None`.
fn long_flag(arg: &str) -> Option<&str> {
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    let long = name.len() > 1 && name.starts_with(|c: char| c.is_ascii_alphabetic());
    long.then_some(name)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliArgs;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize(args.iter().map(|arg| (*arg).to_owned()))
    }

    fn parse(args: &[&str]) -> Result<CliArgs, argh::EarlyExit> {
        let args = normalized(args);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        CliArgs::from_args(&["poster"], &args)
    }

    #[test]
    fn single_dash_flags_become_long_flags() {
        assert_eq!(
            normalized(&["-url", "http://h:1", "-times", "3", "-body"]),
            ["--url", "http://h:1", "--times", "3", "--body"]
        );
    }

    #[test]
    fn equals_form_is_split() {
        assert_eq!(
            normalized(&["-threads=4", "--records=2"]),
            ["--threads", "4", "--records", "2"]
        );
    }

    #[test]
    fn switch_values_are_interpreted() {
        assert_eq!(normalized(&["-body=true"]), ["--body"]);
        assert!(normalized(&["-body=false"]).is_empty());
        assert_eq!(normalized(&["-body=maybe"]), ["-body=maybe"]);
    }

    #[test]
    fn option_values_are_left_alone() {
        assert_eq!(
            normalized(&["-pass", "-secret", "-threads", "-1", "-h"]),
            ["--pass", "-secret", "--threads", "-1", "-h"]
        );
        assert_eq!(normalized(&["--", "-url"]), ["--", "-url"]);
    }

    #[test]
    fn parses_go_style_command_line() {
        let args = parse(&[
            "-url",
            "http://10.0.0.1:5080/api/default/default/_json",
            "-times=10",
            "-threads",
            "4",
            "-header",
            "X-Org: default",
            "-fields",
            "12",
            "-records=3",
            "-body",
        ])
        .unwrap();
        assert_eq!(args.url, "http://10.0.0.1:5080/api/default/default/_json");
        assert_eq!(args.times, 10);
        assert_eq!(args.threads, 4);
        assert_eq!(args.header, "X-Org: default");
        assert_eq!(args.fields, 12);
        assert_eq!(args.records, 3);
        assert!(args.body);
        assert!(!args.preview);
        assert_eq!(args.user, crate::config::DEFAULT_USER);
    }

    #[test]
    fn defaults_apply_without_flags() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.url, crate::config::DEFAULT_URL);
        assert_eq!(args.times, 1);
        assert_eq!(args.threads, 1);
        assert_eq!(args.fields, 5);
        assert!(args.data.is_empty());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse(&["-bogus", "1"]).is_err());
    }
}
