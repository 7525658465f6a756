#![allow(dead_code, deprecated)]

use assert_cmd::Command;
use std::path::Path;

pub const EMAIL: &str = "writer@example.com";
pub const PASSWORD: &str = "secret1";

pub fn daybook_cmd() -> Command {
    let mut cmd = Command::cargo_bin("daybook").unwrap();
    cmd.env_remove("DAYBOOK_ROOT");
    cmd.env_remove("DAYBOOK_EXPORT_DIR");
    cmd.env_remove("DAYBOOK_PASSWORD");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// `daybook` running inside `root`
pub fn daybook_in(root: &Path) -> Command {
    let mut cmd = daybook_cmd();
    cmd.current_dir(root);
    cmd
}

/// Initialize a daybook in `root` and register the default account
pub fn init_signed_in(root: &Path) {
    daybook_cmd().arg("init").arg(root).assert().success();
    daybook_in(root)
        .args(["register", EMAIL, "--password", PASSWORD])
        .assert()
        .success();
}

/// Run a command and return the id printed as the last word of stdout
pub fn saved_id(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    text.split_whitespace().last().unwrap().to_string()
}
