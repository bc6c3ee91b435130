use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn shopfloor(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shopfloor").unwrap();
    cmd.env("SHOPFLOOR_DATA_DIR", dir.path()).env_remove("RUST_LOG");
    cmd
}

fn init(dir: &TempDir) {
    shopfloor(dir)
        .args(["init", "--shop-name", "Corner Garage", "--tax-rate-bps", "0"])
        .assert()
        .success();
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

/// First displayed id with the given prefix, e.g. `job-1a2b3c4d`
fn first_id(text: &str, prefix: &str) -> String {
    let start = text.find(prefix).unwrap();
    text[start..start + prefix.len() + 8].to_string()
}

fn create_brake_estimate(dir: &TempDir) {
    shopfloor(dir)
        .args([
            "estimate",
            "create",
            "--customer",
            "12",
            "--vehicle",
            "34",
            "--job",
            "Front brakes",
            "--item",
            "part:Brake pads:1:80:t",
            "--item",
            "labor:Install pads:1.5:100",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created estimate EST-000001"))
        .stdout(predicate::str::contains("$230.00"));
}

// ---------------------------------------------------------------------------
// init / config
// ---------------------------------------------------------------------------

#[test]
fn init_creates_data_files() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    assert!(dir.path().join("config.json").exists());
    assert!(dir.path().join("data/estimates.json").exists());
    assert!(dir.path().join("data/public_links.json").exists());
}

#[test]
fn config_shows_settings() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    shopfloor(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Corner Garage"))
        .stdout(predicate::str::contains("EST-"));
}

// ---------------------------------------------------------------------------
// estimates
// ---------------------------------------------------------------------------

#[test]
fn estimate_create_list_show() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);

    shopfloor(&dir)
        .args(["estimate", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EST-000001"))
        .stdout(predicate::str::contains("pending"));

    shopfloor(&dir)
        .args(["estimate", "show", "EST-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Front brakes"))
        .stdout(predicate::str::contains("Install pads"));
}

#[test]
fn estimate_create_requires_customer() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    shopfloor(&dir)
        .args(["estimate", "create", "--vehicle", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A customer is required"));
}

#[test]
fn bad_item_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    shopfloor(&dir)
        .args([
            "estimate", "create", "-c", "1", "-v", "2", "-j", "Misc", "-i", "gizmo:Thing:1:5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid item type"));
}

#[test]
fn unknown_estimate_is_not_found() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    shopfloor(&dir)
        .args(["estimate", "show", "EST-999999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn estimate_from_yaml_file() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let input = dir.path().join("estimate.yaml");
    std::fs::write(
        &input,
        "customer_id: 5\nvehicle_id: 6\njobs:\n  - title: Battery\n    items:\n      - item_type: PART\n        description: AGM battery\n        unit_price: 21000\n",
    )
    .unwrap();

    shopfloor(&dir)
        .args(["estimate", "create", "--from"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("$210.00"));
}

// ---------------------------------------------------------------------------
// full lifecycle
// ---------------------------------------------------------------------------

#[test]
fn estimate_to_paid_invoice() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);

    shopfloor(&dir)
        .args(["estimate", "approve", "EST-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("approved"));

    shopfloor(&dir)
        .args(["workorder", "create", "EST-000001", "--technician", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created workorder WO-000001"));

    for status in ["in_progress", "completed"] {
        shopfloor(&dir)
            .args(["workorder", "status", "WO-000001", status, "--actor", "sam"])
            .assert()
            .success();
    }

    shopfloor(&dir)
        .args(["workorder", "history", "WO-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("by sam"));

    shopfloor(&dir)
        .args(["workorder", "invoice", "WO-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-000001"));

    shopfloor(&dir)
        .args(["invoice", "pay", "INV-000001", "100", "--method", "card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance due $130.00"))
        .stdout(predicate::str::contains("partial"));

    shopfloor(&dir)
        .args(["invoice", "pay", "INV-000001", "500"])
        .assert()
        .failure();

    shopfloor(&dir)
        .args(["invoice", "pay", "INV-000001", "130"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(paid)"));

    shopfloor(&dir)
        .args(["audit", "show", "INV-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-000001"));
}

#[test]
fn workorder_refuses_illegal_transition() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);
    shopfloor(&dir)
        .args(["estimate", "approve", "EST-000001"])
        .assert()
        .success();
    shopfloor(&dir)
        .args(["workorder", "create", "EST-000001"])
        .assert()
        .success();

    shopfloor(&dir)
        .args(["workorder", "status", "WO-000001", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot move from 'pending' to 'completed'"));
}

// ---------------------------------------------------------------------------
// customer portal
// ---------------------------------------------------------------------------

#[test]
fn customer_approves_through_link() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);

    let issued = stdout_of(shopfloor(&dir).args(["link", "issue", "EST-000001"]));
    let token = issued
        .lines()
        .find_map(|l| l.trim().strip_prefix("Token:"))
        .unwrap()
        .trim()
        .to_string();

    let view = stdout_of(shopfloor(&dir).args(["portal", "view", &token]));
    assert!(view.contains("Corner Garage"));
    let job = first_id(&view, "job-");

    shopfloor(&dir)
        .args(["portal", "approve", &token, &job])
        .assert()
        .success()
        .stdout(predicate::str::contains("is approved"));

    shopfloor(&dir)
        .args(["portal", "sign", &token, "--name", "Pat Doe", "--signature", "aGVsbG8="])
        .assert()
        .success();

    shopfloor(&dir)
        .args(["link", "list", "EST-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("active"));
}

#[test]
fn revoked_link_is_refused() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);

    let issued = stdout_of(shopfloor(&dir).args(["link", "issue", "EST-000001"]));
    let code = issued
        .lines()
        .find_map(|l| l.trim().strip_prefix("Short code:"))
        .unwrap()
        .trim()
        .to_string();

    shopfloor(&dir)
        .args(["link", "revoke", &code])
        .assert()
        .success();
    shopfloor(&dir)
        .args(["portal", "view", &code])
        .assert()
        .failure()
        .stderr(predicate::str::contains("revoked"));
}

// ---------------------------------------------------------------------------
// bundles
// ---------------------------------------------------------------------------

#[test]
fn bundle_applied_to_estimate() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);

    shopfloor(&dir)
        .args([
            "bundle",
            "create",
            "Oil change",
            "--item",
            "part:5W-30 oil:5:9",
            "--item",
            "labor:Oil change labor:0.5:60",
        ])
        .assert()
        .success();

    shopfloor(&dir)
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Oil change"))
        .stdout(predicate::str::contains("$75.00"));

    shopfloor(&dir)
        .args(["bundle", "apply", "oil change", "EST-000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total now $305.00"));

    shopfloor(&dir)
        .args(["bundle", "deactivate", "Oil change"])
        .assert()
        .success();
    shopfloor(&dir)
        .args(["bundle", "apply", "Oil change", "EST-000001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inactive"));
}

// ---------------------------------------------------------------------------
// export / backup
// ---------------------------------------------------------------------------

#[test]
fn export_and_verify() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_brake_estimate(&dir);
    let json = dir.path().join("dump.json");
    let yaml = dir.path().join("dump.yaml");
    let csv = dir.path().join("estimates.csv");

    shopfloor(&dir)
        .args(["export", "all", "--pretty"])
        .arg(&json)
        .assert()
        .success();
    shopfloor(&dir)
        .args(["export", "all", "--format", "yaml"])
        .arg(&yaml)
        .assert()
        .success();
    shopfloor(&dir)
        .args(["export", "estimates"])
        .arg(&csv)
        .assert()
        .success();

    for file in [&json, &yaml] {
        shopfloor(&dir)
            .args(["export", "verify"])
            .arg(file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Estimates:     1"));
    }
    assert!(std::fs::read_to_string(&csv).unwrap().contains("EST-000001"));
}

#[test]
fn backup_create_and_list() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    shopfloor(&dir)
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created"));

    shopfloor(&dir)
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 backup(s) in"));

    shopfloor(&dir)
        .args(["backup", "info", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete backup"));
}
