//! Basic usage of anyfs-permissions.
//!
//! Builds a small tree in a temporary directory, confines a
//! `PermissionService` to it with `RootedFs`, and runs a few requests
//! through it.
//!
//! Run with: `cargo run --example basic_usage`
//! Set `RUST_LOG=debug` to see every entry the walk touches.

use anyfs_permissions::*;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::Path;

fn show_mode(label: &str, path: &Path) {
    let mode = std::fs::symlink_metadata(path).unwrap().permissions().mode() & 0o777;
    println!("   {label:<28} {mode:03o}");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== anyfs-permissions Basic Usage Example ===\n");

    // =========================================================================
    // Step 1: Lay out a tree, plus a directory outside it
    // =========================================================================
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("share");
    std::fs::create_dir_all(base.join("reports/2024")).unwrap();
    std::fs::write(base.join("reports/summary.txt"), "summary").unwrap();
    std::fs::write(base.join("reports/2024/q1.csv"), "q1").unwrap();
    std::fs::create_dir(tmp.path().join("private")).unwrap();
    symlink(tmp.path().join("private"), base.join("reports/private")).unwrap();

    // =========================================================================
    // Step 2: Build the service from configuration
    // =========================================================================
    let config = ServiceConfig {
        backend: BackendConfig::Rooted { base: base.clone() },
        ..ServiceConfig::default()
    };
    let service = PermissionService::from_config(&config)
        .unwrap()
        .with_hook(TracingHook)
        .with_authorizer(|caller: &Caller, path: &Path| {
            caller.username == "admin" || path.starts_with("/reports/2024")
        });
    let admin = Caller::new("admin");

    // --- Recursive change ---
    println!("1. chmod -R 750 /reports");
    let request = ChangeRequest::new().mode("750").recursive(true);
    match service.handle(&admin, Path::new("/reports"), &request) {
        Ok(summary) => println!(
            "   {} entries changed, {} skipped",
            summary.mutated, summary.skipped
        ),
        Err(err) => println!("   failed: {err}"),
    }
    show_mode("/reports/2024/q1.csv", &base.join("reports/2024/q1.csv"));
    show_mode("<outside>/private", &tmp.path().join("private"));

    // --- Ownership sentinel ---
    println!("\n2. chown -1 on /reports/summary.txt (keeps the owner)");
    let response = service.respond(
        &admin,
        Path::new("/reports/summary.txt"),
        &ChangeRequest::new().owner("-1"),
    );
    println!("   status {}", response.status);

    // --- Failures, mapped to statuses ---
    println!("\n3. Requests that fail");
    let cases = [
        ("empty request", &admin, "/reports", ChangeRequest::new()),
        ("bad mode", &admin, "/reports", ChangeRequest::new().mode("9")),
        ("symlink root", &admin, "/reports/private", ChangeRequest::new().mode("700")),
        ("escape", &admin, "/../private", ChangeRequest::new().mode("777")),
        ("missing", &admin, "/nope", ChangeRequest::new().mode("700")),
    ];
    for (label, caller, path, request) in &cases {
        let response = service.respond(caller, Path::new(path), request);
        println!(
            "   {label:<14} {} {}",
            response.status,
            response.message.unwrap_or_default()
        );
    }

    let guest = Caller::new("guest");
    let response = service.respond(&guest, Path::new("/reports"), &ChangeRequest::new().mode("777"));
    println!("   {:<14} {} {}", "not allowed", response.status, response.message.unwrap_or_default());

    println!("\n=== Done ===");
}
