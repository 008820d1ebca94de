//! Shell snippet builders for the scripts pushed through a
//! [`CommandRunner`](super::CommandRunner). Pure string assembly, no
//! execution.

/// Runs a command under sudo.
pub fn sudo(cmd: &str) -> String {
    format!("sudo -E -n {cmd}")
}

/// All commands must succeed, in order.
pub fn chain(cmds: &[String]) -> String {
    cmds.join(" && ")
}

/// First command that succeeds wins.
pub fn alternatives(cmds: &[String]) -> String {
    cmds.join(" || ")
}

/// Runs `cmd` only when `exe` is on the path.
pub fn if_executable(exe: &str, cmd: &str) -> String {
    format!("(which {exe} >/dev/null 2>&1 && {cmd})")
}

/// Installs an executable with whichever package manager the host carries.
pub fn install_executable(pkg: &str) -> String {
    alternatives(&[
        if_executable("apt-get", &sudo(&format!("apt-get install -y {pkg}"))),
        if_executable("yum", &sudo(&format!("yum install -y {pkg}"))),
        if_executable("zypper", &sudo(&format!("zypper --non-interactive install {pkg}"))),
    ])
}

/// Replaces a file's contents wholesale.
pub fn write_file(path: &str, contents: &str) -> String {
    sudo(&format!("tee {path} > /dev/null <<'AMBIT_EOF'\n{contents}AMBIT_EOF"))
}

/// Pins the hostname reported by the node to `fqdn` via a hostname script,
/// so agents register under a stable name.
pub fn set_hostname(fqdn: &str, script_location: &str) -> Vec<String> {
    vec![
        sudo(&format!(
            "echo '#!/bin/sh\necho {fqdn}' > {script_location}"
        )),
        sudo(&format!("chmod a+x {script_location}")),
    ]
}
