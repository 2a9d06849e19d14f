use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// `init` writes the default configuration and both reference modules.
///
/// `init` 会写出默认配置和两个参考测试模块。
#[test]
fn test_init_creates_config_and_modules() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("netprobe").unwrap();
    cmd.current_dir(dir.path()).args(["--lang", "en", "init"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created config/netprobe.toml"));

    assert!(dir.path().join("config/netprobe.toml").is_file());
    assert!(dir.path().join("network_tests/test_connectivity.toml").is_file());
    let vlan = fs::read_to_string(dir.path().join("network_tests/test_vlan_configuration.toml")).unwrap();
    assert!(vlan.contains("vlan_isolation"));
}

/// Running `init` twice keeps what is already there unless `--force` is given.
///
/// 再次运行 `init` 会保留已有文件，除非指定 `--force`。
#[test]
fn test_init_keeps_existing_files() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("lab.toml");
    fs::write(
        &config,
        "default_scenario = \"basic_connectivity\"\n\n\
         [scenarios.basic_connectivity.nodes.node1]\nip_address = \"10.0.0.1\"\nsubnet_mask = \"255.0.0.0\"\n",
    )
    .unwrap();
    let before = fs::read_to_string(&config).unwrap();

    Command::cargo_bin("netprobe")
        .unwrap()
        .current_dir(dir.path())
        .args(["--lang", "en", "init", "--config", "lab.toml", "--tests-dir", "suite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept existing lab.toml"));

    assert_eq!(fs::read_to_string(&config).unwrap(), before);
    assert!(dir.path().join("suite/test_connectivity.toml").is_file());

    Command::cargo_bin("netprobe")
        .unwrap()
        .current_dir(dir.path())
        .args(["--lang", "en", "init", "--config", "lab.toml", "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&config).unwrap().contains("172.20.0.2"));
}

/// Help lists both subcommands.
///
/// 帮助信息会列出两个子命令。
#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("netprobe")
        .unwrap()
        .args(["--lang", "en", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("init"));
}

/// Without a usable container runtime the run aborts in preflight with a
/// non-zero exit code and writes no test results.
///
/// 没有可用的容器运行时，运行会在预检阶段中止，以非零退出码结束且不写入测试结果。
#[test]
fn test_run_without_runtime_fails_preflight() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("netprobe.toml"),
        r#"
default_scenario = "basic_connectivity"

[runtime]
docker_bin = "/nonexistent/docker"

[scenarios.basic_connectivity.nodes.node1]
ip_address = "172.20.0.2"
subnet_mask = "255.255.0.0"
"#,
    )
    .unwrap();

    Command::cargo_bin("netprobe")
        .unwrap()
        .current_dir(dir.path())
        .args([
            "--lang",
            "en",
            "run",
            "--config",
            "netprobe.toml",
            "--no-provision",
            "-o",
            "out",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Environment check failed:"))
        .stderr(predicate::str::contains("container runtime is not reachable"));

    assert!(!dir.path().join("network_tests").exists());
}

/// Chinese messages are used when requested.
///
/// 指定中文时使用中文消息。
#[test]
fn test_lang_flag_switches_messages() {
    let dir = tempdir().unwrap();

    Command::cargo_bin("netprobe")
        .unwrap()
        .current_dir(dir.path())
        .args(["--lang", "zh-CN", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("已创建"));
}

#[test]
fn test_conflicting_provision_flags_are_rejected() {
    Command::cargo_bin("netprobe")
        .unwrap()
        .args(["run", "--yes", "--no-provision"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
