#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use tempfile::TempDir;

use reelsync::remote::MemoryBackend;
use reelsync::{FileIdentityStore, Movie, MovieDetails, MovieId};

/// Helper struct to run reelsync commands against an isolated home directory
pub struct ReelTest {
    pub temp_dir: TempDir,
    binary_path: &'static str,
}

impl ReelTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        ReelTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_reelsync"),
        }
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("REELSYNC_HOME", self.home())
            .env_remove("REELSYNC_BACKEND_URL")
            .env_remove("REELSYNC_BACKEND_KEY")
            .env_remove("TMDB_API_KEY")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute reelsync command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_identity(&self, user_id: &str) {
        fs::create_dir_all(self.home()).expect("Failed to create home directory");
        fs::write(
            self.home().join("identity.json"),
            format!(r#"{{"userId":"{user_id}"}}"#),
        )
        .expect("Failed to write identity file");
    }

    pub fn config_exists(&self) -> bool {
        self.home().join("config.yaml").exists()
    }
}

pub fn movie(id: u64, title: &str) -> MovieDetails {
    MovieDetails {
        movie: Movie {
            id: MovieId(id),
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            vote_average: 7.5,
            release_date: Some("2008-07-16".to_string()),
            overview: None,
        },
        vote_count: 100,
        runtime: Some(120),
        genres: Vec::new(),
        budget: 0,
        revenue: 0,
        production_companies: Vec::new(),
    }
}

/// Backend seeded with a small catalog. Search order follows seed order.
pub fn seeded_backend() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::new().with_movies([
        movie(268, "Batman"),
        movie(364, "Batman Returns"),
        movie(414906, "The Batman"),
        movie(27205, "Inception"),
        movie(155, "The Dark Knight"),
    ]))
}

/// File identity store inside a fresh temp directory
pub fn temp_identity_store() -> (TempDir, Arc<FileIdentityStore>) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = Arc::new(FileIdentityStore::at(dir.path().join("identity.json")));
    (dir, store)
}
