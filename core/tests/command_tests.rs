use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use argrules_core::{MapEnv, ParseError, Parser};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Context handed to handlers; records what they observed.
#[derive(Debug, Default)]
struct Calls {
    count: usize,
    seen: Vec<String>,
}

fn calls(ctx: &mut dyn Any) -> &mut Calls {
    ctx.downcast_mut::<Calls>().unwrap()
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_runs_matched_command() {
    let called = Rc::new(Cell::new(false));
    let mut parser = Parser::new();
    let flag = Rc::clone(&called);
    parser.add_command("command1", move |_, _| {
        flag.set(true);
        0
    });

    let status = parser.parse_and_run(&["command1"], &mut ()).unwrap();
    assert_eq!(status, 0);
    assert!(called.get());
}

#[test]
fn test_status_is_propagated() {
    let mut parser = Parser::new();
    parser.add_command("fail", |_, _| 3);
    assert_eq!(parser.parse_and_run(&["fail"], &mut ()).unwrap(), 3);
}

#[test]
fn test_missing_command() {
    let mut parser = Parser::new();
    parser.add_command("set", |_, _| 0);

    let err = parser.parse_and_run::<&str>(&[], &mut ()).unwrap_err();
    assert_eq!(err, ParseError::MissingCommand);
    assert_eq!(err.to_string(), "No command was provided");
}

#[test]
fn test_command_name_as_following_positional() {
    let mut parser = Parser::new();
    parser.add_command("set", |child, ctx| {
        calls(ctx).count += 1;
        assert_eq!(child.args(), ["set"]);
        0
    });

    let mut ctx = Calls::default();
    let status = parser.parse_and_run(&["set", "set"], &mut ctx).unwrap();
    assert_eq!(status, 0);
    assert_eq!(ctx.count, 1);
}

#[test]
fn test_child_parses_remaining_tokens() {
    let mut parser = Parser::new();
    parser.add_command("set", |child, ctx| {
        child.add_positional("first").required();
        child.add_positional("second").required();
        let opts = child.parse().unwrap();
        let calls = calls(ctx);
        calls.seen.push(opts.string("first").to_string());
        calls.seen.push(opts.string("second").to_string());
        calls.count += 1;
        0
    });

    let mut ctx = Calls::default();
    parser
        .parse_and_run(&["set", "foo", "bar"], &mut ctx)
        .unwrap();
    assert_eq!(ctx.count, 1);
    assert_eq!(ctx.seen, vec!["foo", "bar"]);
}

#[test]
fn test_nested_commands() {
    let mut parser = Parser::builder().name("dragon-ball").build();
    parser.add_command("volume", |volume, ctx| {
        volume.add_command("create", |create, ctx| {
            create.add_positional("volume-name").required();
            let opts = create.parse().unwrap();

            let parent = create.parent().unwrap();
            let calls = calls(ctx);
            calls.seen.push(opts.string("volume-name").to_string());
            calls.seen.push(parent.command_path());
            calls.seen.push(create.name().unwrap_or_default().to_string());
            calls.count += 1;
            0
        });
        volume.run(ctx).unwrap()
    });

    let mut ctx = Calls::default();
    let status = parser
        .parse_and_run(&["volume", "create", "my-new-volume"], &mut ctx)
        .unwrap();
    assert_eq!(status, 0);
    assert_eq!(ctx.count, 1);
    assert_eq!(
        ctx.seen,
        vec!["my-new-volume", "volume create", "dragon-ball volume create"]
    );
}

#[test]
fn test_child_help_is_a_sentinel() {
    let mut parser = Parser::new();
    parser.add_command("set", |child, ctx| {
        child.add_positional("first").required();
        let err = child.parse().unwrap_err();
        assert_eq!(err.to_string(), "");
        assert!(err.is_help_requested());
        calls(ctx).count += 1;
        0
    });

    let mut ctx = Calls::default();
    assert_eq!(parser.parse_and_run(&["set", "-h"], &mut ctx).unwrap(), 0);
    assert_eq!(ctx.count, 1);
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[test]
fn test_options_before_command_belong_to_parent() {
    let mut parser = Parser::new();
    parser.add_option("--verbose").count();
    parser.add_command("status", |child, ctx| {
        let parent = child.parent().unwrap();
        calls(ctx).count = parent.options.int("verbose") as usize;
        child.add_option("--verbose").is_true();
        let opts = child.parse().unwrap();
        calls(ctx).seen.push(opts.bool("verbose").to_string());
        0
    });

    let mut ctx = Calls::default();
    parser
        .parse_and_run(&["-verbose", "--verbose", "status", "--verbose"], &mut ctx)
        .unwrap();
    assert_eq!(ctx.count, 2);
    assert_eq!(ctx.seen, vec!["true"]);
}

#[test]
fn test_command_not_recognised_after_positional() {
    let mut parser = Parser::new();
    parser.add_positional("target");
    parser.add_command("deploy", |_, _| 0);

    let err = parser
        .parse_and_run(&["prod", "deploy"], &mut ())
        .unwrap_err();
    assert_eq!(err, ParseError::MissingCommand);

    let opts = parser.parse().unwrap();
    assert_eq!(opts.string("target"), "prod");
    assert_eq!(opts.extra(), ["deploy"]);
}

#[test]
fn test_child_inherits_settings() {
    let mut parser = Parser::builder()
        .no_help()
        .wrap_len(60)
        .env(MapEnv::new().with("TARGET", "staging"))
        .build();
    parser.add_command("deploy", |child, ctx| {
        assert!(!child.help_enabled());
        assert_eq!(child.wrap_len(), 60);
        child.add_option("--target").env("TARGET");
        let opts = child.parse().unwrap();
        calls(ctx).seen.push(opts.string("target").to_string());
        0
    });

    let mut ctx = Calls::default();
    parser.parse_and_run(&["deploy"], &mut ctx).unwrap();
    assert_eq!(ctx.seen, vec!["staging"]);
}

#[test]
fn test_command_help_text() {
    let mut parser = Parser::new();
    parser
        .add_command("volume", |_, _| 0)
        .help("Manage volumes");
    assert_eq!(parser.commands()[0].name, "volume");
    assert_eq!(parser.commands()[0].help.as_deref(), Some("Manage volumes"));
}
