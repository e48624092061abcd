//! Tests for command-line argument parsing
//!
//! Note: These tests verify the argument parser configuration by creating
//! a test parser with the same structure as the main application.

use clap::{Arg, ArgAction, Command as ClapCommand};

/// Create a command with the same argument structure as the main binary
fn create_test_command() -> ClapCommand {
    ClapCommand::new("hand-servo")
        .version("0.1.0")
        .about("Hand tracking to servo control")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug output"),
        )
        .subcommand(
            ClapCommand::new("track")
                .arg(Arg::new("input").short('i').long("input").value_name("PATH"))
                .arg(Arg::new("no-send").long("no-send").action(ArgAction::SetTrue))
                .arg(Arg::new("shared-state").long("shared-state").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("channel")
                        .long("channel")
                        .value_parser(clap::value_parser!(u8)),
                )
                .arg(Arg::new("port").long("port"))
                .arg(Arg::new("mode").long("mode")),
        )
        .subcommand(
            ClapCommand::new("send")
                .arg(Arg::new("port").long("port"))
                .arg(Arg::new("baud").long("baud").value_parser(clap::value_parser!(u32)))
                .arg(
                    Arg::new("channel")
                        .long("channel")
                        .value_parser(clap::value_parser!(u8)),
                )
                .arg(
                    Arg::new("angle")
                        .long("angle")
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(Arg::new("speed").long("speed").value_parser(clap::value_parser!(f64)))
                .arg(Arg::new("serve").long("serve").action(ArgAction::SetTrue)),
        )
        .subcommand(
            ClapCommand::new("launch")
                .arg(Arg::new("live").long("live").action(ArgAction::SetTrue))
                .arg(Arg::new("tracker").long("tracker").value_name("PATH"))
                .arg(
                    Arg::new("args")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                ),
        )
}

#[test]
fn test_help_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["hand-servo", "--help"]);

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_subcommand_required() {
    let cmd = create_test_command();
    assert!(cmd.try_get_matches_from(vec!["hand-servo"]).is_err());
}

#[test]
fn test_track_defaults() {
    let cmd = create_test_command();
    let matches = cmd.try_get_matches_from(vec!["hand-servo", "track"]).unwrap();
    let (name, sub) = matches.subcommand().unwrap();

    assert_eq!(name, "track");
    assert!(!sub.get_flag("no-send"));
    assert!(!sub.get_flag("shared-state"));
    assert!(sub.get_one::<String>("input").is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["hand-servo", "track", "--no-send", "--debug", "--config", "rig.yaml"])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    assert!(sub.get_flag("no-send"));
    assert!(sub.get_flag("debug"));
    assert_eq!(sub.get_one::<String>("config").map(String::as_str), Some("rig.yaml"));
}

#[test]
fn test_send_arguments() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec![
            "hand-servo", "send", "--port", "COM5", "--channel", "3", "--angle", "-12.5", "--speed", "45",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    assert_eq!(sub.get_one::<String>("port").map(String::as_str), Some("COM5"));
    assert_eq!(sub.get_one::<u8>("channel"), Some(&3));
    assert_eq!(sub.get_one::<f64>("angle"), Some(&-12.5));
    assert_eq!(sub.get_one::<f64>("speed"), Some(&45.0));
    assert!(!sub.get_flag("serve"));
}

#[test]
fn test_send_rejects_bad_channel() {
    for channel in ["256", "-1", "abc"] {
        let cmd = create_test_command();
        let result = cmd.try_get_matches_from(vec!["hand-servo", "send", "--channel", channel]);
        assert!(result.is_err(), "Should reject channel: {}", channel);
    }
}

#[test]
fn test_send_serve_mode() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["hand-servo", "send", "--serve", "--channel", "1"])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    assert!(sub.get_flag("serve"));
}

#[test]
fn test_launch_trailing_args() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["hand-servo", "launch", "--live", "--tracker", "./detector", "--", "--fast", "-x"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();

    assert_eq!(name, "launch");
    assert!(sub.get_flag("live"));
    assert_eq!(sub.get_one::<String>("tracker").map(String::as_str), Some("./detector"));
    let args: Vec<&str> = sub.get_many::<String>("args").unwrap().map(String::as_str).collect();
    assert_eq!(args, vec!["--fast", "-x"]);
}

#[test]
fn test_unknown_subcommand() {
    let cmd = create_test_command();
    assert!(cmd.try_get_matches_from(vec!["hand-servo", "calibrate"]).is_err());
}
