fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    // Short commit hash for `bookblock --version` on untagged builds.
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    println!("cargo:rustc-env=BOOKBLOCK_GIT_HASH={hash}");
}
