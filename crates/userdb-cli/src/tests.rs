//! Unit tests for the CLI runner.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use rstest::rstest;
use tempfile::TempDir;

use super::*;

const NO_RECORD: &str = r#"{"error":"io.systemd.UserDatabase.NoRecordFound"}"#;

/// Answers one connection per scripted reply, in order.
struct ScriptedService {
    dir: TempDir,
    handle: Option<thread::JoinHandle<Vec<String>>>,
}

impl ScriptedService {
    fn spawn(replies: Vec<&'static str>) -> Self {
        let dir = tempfile::tempdir().expect("socket dir");
        let listener = UnixListener::bind(dir.path().join("multiplexer.sock")).expect("bind");
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for reply in replies {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut request = Vec::new();
                let mut byte = [0_u8; 1];
                while stream.read(&mut byte).expect("read request") == 1 && byte != [0] {
                    request.extend_from_slice(&byte);
                }
                requests.push(String::from_utf8(request).expect("UTF-8 request"));
                stream.write_all(reply.as_bytes()).expect("write reply");
                stream.write_all(b"\0").expect("write terminator");
            }
            requests
        });
        Self {
            dir,
            handle: Some(handle),
        }
    }

    fn socket(&self) -> PathBuf {
        self.dir.path().join("multiplexer.sock")
    }

    fn requests(mut self) -> Vec<String> {
        self.handle
            .take()
            .expect("server running")
            .join()
            .expect("server thread")
    }
}

struct Invocation {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(socket: &Path, args: &[&str]) -> Invocation {
    let mut argv: Vec<OsString> = vec![
        "userdb".into(),
        "--service-socket".into(),
        socket.as_os_str().to_owned(),
        "--machine-id-path".into(),
        "/nonexistent/machine-id".into(),
    ];
    argv.extend(args.iter().map(OsString::from));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, &mut stdout, &mut stderr);
    Invocation {
        code,
        stdout: String::from_utf8(stdout).expect("UTF-8 stdout"),
        stderr: String::from_utf8(stderr).expect("UTF-8 stderr"),
    }
}

#[test]
fn prints_found_user_as_json_line() {
    let service = ScriptedService::spawn(vec![
        r#"{"parameters":{"record":{"userName":"alice","realName":"Alice","uid":1000,"gid":1000,"homeDirectory":"/home/alice","shell":"/bin/sh"}}}"#,
    ]);
    let outcome = invoke(&service.socket(), &["user", "alice"]);

    assert_eq!(outcome.code, ExitCode::SUCCESS);
    assert_eq!(
        outcome.stdout,
        "{\"uid\":\"1000\",\"gid\":\"1000\",\"username\":\"alice\",\"name\":\"Alice\",\"home_dir\":\"/home/alice\",\"shell\":\"/bin/sh\"}\n"
    );
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests.iter().all(|request| request.contains("\"userName\":\"alice\"")));
}

#[rstest]
#[case(&["user", "nobody"], "user 'nobody' not found")]
#[case(&["gid", "4242"], "group id 4242 not found")]
fn reports_missing_record(#[case] args: &[&str], #[case] message: &str) {
    let service = ScriptedService::spawn(vec![NO_RECORD]);
    let outcome = invoke(&service.socket(), args);

    assert_eq!(outcome.code, ExitCode::from(EXIT_NOT_FOUND));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains(message), "stderr: {}", outcome.stderr);
    drop(service.requests());
}

#[test]
fn prints_sorted_group_ids() {
    let service = ScriptedService::spawn(vec![
        concat!(
            r#"{"continues":true,"parameters":{"userName":"alice","groupName":"wheel"}}"#,
            "\0",
            r#"{"parameters":{"userName":"alice","groupName":"audio"}}"#
        ),
        r#"{"parameters":{"record":{"groupName":"alice","gid":1000}}}"#,
        r#"{"parameters":{"record":{"groupName":"audio","gid":63}}}"#,
        r#"{"parameters":{"record":{"groupName":"wheel","gid":10}}}"#,
    ]);
    let outcome = invoke(&service.socket(), &["groups", "alice"]);

    assert_eq!(outcome.code, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        "{\"user\":\"alice\",\"gids\":[\"10\",\"63\",\"1000\"]}\n"
    );
    assert_eq!(service.requests().len(), 4);
}

#[test]
fn missing_socket_is_unavailable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let outcome = invoke(&dir.path().join("absent.sock"), &["group", "wheel"]);

    assert_eq!(outcome.code, ExitCode::from(EXIT_UNAVAILABLE));
    assert!(outcome.stderr.contains("service unavailable"));
}

#[test]
fn invalid_id_fails_before_connecting() {
    let dir = tempfile::tempdir().expect("temp dir");
    let outcome = invoke(&dir.path().join("absent.sock"), &["uid", "root"]);

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("invalid id \"root\""), "stderr: {}", outcome.stderr);
}

#[test]
fn service_error_exits_with_failure() {
    let service = ScriptedService::spawn(vec![
        r#"{"error":"io.systemd.UserDatabase.BadService"}"#,
    ]);
    let outcome = invoke(&service.socket(), &["group", "wheel"]);

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("io.systemd.UserDatabase.BadService"));
    drop(service.requests());
}

#[test]
fn help_goes_to_stdout() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(
        [OsString::from("userdb"), OsString::from("--help")],
        &mut stdout,
        &mut stderr,
    );

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(String::from_utf8_lossy(&stdout).contains("Usage"));
    assert!(stderr.is_empty());
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run([OsString::from("userdb")], &mut stdout, &mut stderr);

    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}
