//! Shared testing utilities for nexus contract tests.

use assert_cmd::Command;
use nexus::adapters::{CommandInventorySource, ContentRoots};
use nexus::{Credentials, Engine, Settings};
use serde_json::{Value, json};
use md5::{Digest, Md5};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const API_KEY: &str = "contract-secret";

pub type FileEngine = Engine<CommandInventorySource, ContentRoots>;

/// A nexus deployment laid out in a temporary directory.
///
/// The inventory command appends a line to `fetches.log` on every run and
/// prints `inventory.json`, so tests can count fetches and swap the
/// inventory on disk.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let ctx = Self { root };

        ctx.write(
            "nexus.toml",
            r#"inventory_command = ["sh", "-c", "echo fetch >> fetches.log; cat inventory.json"]
cache_ttl_secs = 300
"#,
        );

        ctx.write(
            "templates/base/header.sh.j2",
            "#!/bin/bash\n# Managed by nexus\nset -e\nexport NEXUS_HOST={{ node.hostname }}\nexport NEXUS_KEY={{ node.nexus_api_key_scrambled }}\n",
        );
        ctx.write(
            "templates/roles/web.sh.j2",
            concat!(
                "# web role\n",
                "\n",
                "    echo \"role {{ node.role }}\"\n",
                "{% for s in node.script_manifest %}\n",
                "script {{ s.name }} {{ s.hash or \"-\" }} {{ s.override }}\n",
                "{% endfor %}\n",
                "{% for k in node.skel_manifest %}\n",
                "skel {{ k.src_name }} {{ k.dest_name }} {{ k.hash or \"-\" }}\n",
                "{% endfor %}\n",
                "{% for c in node.cert_manifest %}\n",
                "cert {{ c.domain }} remove={{ c.remove }} files={{ c.files | map(attribute='name') | join(',') }}\n",
                "{% endfor %}\n",
                "{% include 'shared/footer.sh.j2' %}\n",
            ),
        );
        ctx.write("templates/shared/footer.sh.j2", "# footer\necho done\n");
        ctx.write("templates/roles/broken.sh.j2", "echo {{ node.undefined_setting }}\n");
        ctx.write(
            "templates/base/purge.sh.j2",
            "# purge\nrm -rf /opt/nexus\necho purged {{ node.hostname }}\n",
        );
        ctx.write(
            "templates/web/bootstrap.sh.j2",
            "#!/bin/sh\n# bootstrap\ncurl -fsSL {{ server_url }}/register\n",
        );
        ctx.write("outside.sh.j2", "echo escaped\n");

        ctx.write("files/scripts/deploy.sh", "#!/bin/sh\necho deploy\n");
        ctx.write("files/skels/dot.bashrc", "alias ll='ls -l'\n");
        ctx.write("files/certs/example.com/cert.pem", "CERT\n");
        ctx.write("files/certs/example.com/fullchain.pem", "FULLCHAIN\n");
        ctx.write("inventory/hosts.yml", "all:\n  hosts:\n    web01: {}\n");

        ctx.write_inventory(&default_inventory());
        ctx
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("Failed to create fixture directory");
        fs::write(path, content).expect("Failed to write fixture");
    }

    pub fn write_inventory(&self, inventory: &Value) {
        self.write("inventory.json", &inventory.to_string());
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.path("nexus.toml")).expect("Failed to load test settings")
    }

    pub fn engine(&self) -> FileEngine {
        Engine::from_settings(&self.settings(), Credentials::new(API_KEY))
            .expect("Failed to build engine")
    }

    /// Number of times the inventory command has run.
    pub fn fetch_count(&self) -> usize {
        fs::read_to_string(self.path("fetches.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    /// Set the mtime of an inventory definition file, relative to now.
    pub fn touch_inventory(&self, relative: &str, offset_secs: i64) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs() as i64;
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs((now + offset_secs) as u64);
        File::options()
            .write(true)
            .open(self.path(relative))
            .and_then(|file| file.set_modified(time))
            .expect("Failed to set mtime");
    }

    /// Build a command for invoking the compiled `nexus` binary in the deployment root.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("nexus").expect("Failed to locate nexus binary");
        cmd.current_dir(self.root())
            .env("NEXUS_API_KEY", API_KEY)
            .env_remove("NEXUS_API_KEY_LEGACY")
            .env("RUST_LOG", "warn");
        cmd
    }
}

/// Hex MD5 of a fixture file, as a node computes it.
#[allow(dead_code)]
pub fn md5_hex(path: &Path) -> String {
    let bytes = fs::read(path).expect("Failed to read fixture");
    Md5::digest(&bytes).iter().map(|byte| format!("{:02x}", byte)).collect()
}

pub fn default_inventory() -> Value {
    json!({
        "_meta": { "hostvars": {
            "web01": {
                "nexus_id": "m-web",
                "role": "web",
                "nexus_workflow": ["base/header", "roles/web"],
                "nexus_scripts": ["deploy.sh", { "name": "ghost.sh" }, { "name": "later.sh", "override": true }],
                "nexus_skels": ["dot.bashrc", "dot.vimrc"],
                "nexus_ssl": ["example.com", { "domain": "old.example.com", "remove": true }]
            },
            "gone01": {
                "nexus_id": "m-gone",
                "nexus_purge": true,
                "nexus_workflow": ["base/header", "roles/web"]
            },
            "evil01": { "nexus_workflow": ["base/header", "../outside"] },
            "broken01": { "nexus_workflow": ["base/header", "roles/broken"] },
            "idle01": { "role": "idle" }
        }},
        "all": { "vars": { "registrator_server": "nexus.internal", "registrator_port": 8080 } }
    })
}
