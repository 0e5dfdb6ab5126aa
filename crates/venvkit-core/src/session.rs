//! The application controller: one per process, owning the registry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::create::{validate_env_name, CreateError, Created};
use crate::discovery::scan::scan_env_directory;
use crate::discovery::search::{search_system, SearchError};
use crate::discovery::{is_valid_env, Discovered};
use crate::effects::Effects;
use crate::notice::{Notice, Notifier};
use crate::packages::list_packages;
use crate::registry::log::RegistryLog;
use crate::registry::Registry;
use crate::terminal::{launch_terminal, LaunchError};

/// What the details pane shows for one environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnvDetails {
    pub name: String,
    pub path: PathBuf,
    pub packages: Vec<String>,
}

pub struct Session<'a> {
    config: Config,
    effects: &'a dyn Effects,
    notifier: &'a dyn Notifier,
    log: RegistryLog,
    registry: Registry,
}

impl<'a> Session<'a> {
    /// Runs startup discovery: scans the default directory, then applies the
    /// persisted log on top so logged paths win on a name collision.
    #[must_use]
    pub fn open(config: Config, effects: &'a dyn Effects, notifier: &'a dyn Notifier) -> Self {
        let log = RegistryLog::new(config.log_path());
        let mut registry = Registry::from(scan_env_directory(config.platform(), config.env_dir()));
        let scanned = registry.len();
        let report = registry.merge(log.load(notifier));
        tracing::debug!(
            scanned,
            logged_added = report.added,
            logged_replaced = report.replaced,
            "startup discovery finished"
        );
        Self {
            config,
            effects,
            notifier,
            log,
            registry,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn is_valid(&self, path: &Path) -> bool {
        is_valid_env(self.config.platform(), path)
    }

    /// Runs the system-wide search and folds its results into the registry,
    /// persisting when anything was found.
    ///
    /// # Errors
    /// Returns [`SearchError`] when the indexer is missing or fails; the
    /// registry is left untouched.
    pub fn search_system(&mut self) -> Result<Discovered, SearchError> {
        let found = search_system(self.config.platform(), self.effects.indexer())?;
        if found.is_empty() {
            tracing::info!("system search found no environments");
            return Ok(found);
        }
        let report = self.registry.merge(found.clone());
        tracing::info!(
            found = found.len(),
            added = report.added,
            replaced = report.replaced,
            "merged system search results"
        );
        self.log.save(&self.registry, self.notifier);
        Ok(found)
    }

    /// Creates an environment under the configured parent directory,
    /// registers it, and optionally opens a terminal inside it.
    ///
    /// A terminal that fails to start is reported as an error notice; the
    /// environment stays created and registered.
    ///
    /// # Errors
    /// Returns [`CreateError`] for a rejected name, an occupied target, or a
    /// failed build. No state changes in any of those cases.
    pub fn create(&mut self, raw_name: &str, open_terminal: bool) -> Result<Created, CreateError> {
        let name = validate_env_name(raw_name)?;
        let target = self.config.create_dir().join(&name);
        if fs::symlink_metadata(&target).is_ok() {
            return Err(CreateError::AlreadyExists(target));
        }
        let python = self
            .config
            .venv_python()
            .map_err(|err| CreateError::BuildFailed(format!("{err:#}")))?;
        self.effects
            .builder()
            .create(&python, &target)
            .map_err(|err| CreateError::BuildFailed(format!("{err:#}")))?;
        tracing::info!(name = %name, path = %target.display(), "created environment");

        self.registry.insert(name.clone(), target.clone());
        self.log.save(&self.registry, self.notifier);

        let terminal = if open_terminal {
            match self.open_terminal(&target) {
                Ok(program) => Some(program),
                Err(err) => {
                    self.notifier.notify(Notice::error("Error", err.to_string()));
                    None
                }
            }
        } else {
            None
        };
        Ok(Created {
            name,
            path: target,
            terminal,
        })
    }

    /// Opens a terminal in `env`, returning the emulator that started.
    ///
    /// # Errors
    /// See [`launch_terminal`].
    pub fn open_terminal(&self, env: &Path) -> Result<String, LaunchError> {
        launch_terminal(
            self.config.terminals(),
            self.effects.terminal(),
            self.config.platform(),
            env,
        )
    }

    /// Details for a registered name, or `None` when the name is unknown.
    #[must_use]
    pub fn details(&self, name: &str) -> Option<EnvDetails> {
        let path = self.registry.get(name)?;
        Some(EnvDetails {
            name: name.to_string(),
            path: path.to_path_buf(),
            packages: list_packages(self.effects.packages(), self.config.platform(), path),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::{bail, Result};
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::discovery::Platform;
    use crate::effects::{EnvBuilder, FileIndexer, IndexerHits, PackageInspector, TerminalSpawner};
    use crate::notice::{NoticeLevel, NoticeLog};
    use crate::process::RunOutput;
    use crate::terminal::{TerminalChain, TerminalSpec};

    #[derive(Default)]
    pub(crate) struct FakeEffects {
        pub(crate) hits: RefCell<String>,
        pub(crate) indexer_missing: Cell<bool>,
        pub(crate) build_fails: Cell<bool>,
        pub(crate) builds: RefCell<Vec<PathBuf>>,
        pub(crate) freeze_output: RefCell<String>,
        pub(crate) terminal_available: Cell<bool>,
        pub(crate) spawned: RefCell<Vec<(String, PathBuf)>>,
    }

    impl FileIndexer for FakeEffects {
        fn locate(&self, _file_name: &str) -> Result<IndexerHits, SearchError> {
            if self.indexer_missing.get() {
                return Err(SearchError::IndexerMissing {
                    tool: "locate".into(),
                });
            }
            Ok(IndexerHits::from_output(&self.hits.borrow()))
        }
    }

    impl EnvBuilder for FakeEffects {
        fn create(&self, _python: &str, target: &Path) -> Result<()> {
            self.builds.borrow_mut().push(target.to_path_buf());
            if self.build_fails.get() {
                bail!("exited with status 1: ensurepip is not available");
            }
            make_env_at(target)
        }
    }

    impl PackageInspector for FakeEffects {
        fn freeze(&self, _python: &Path, _env: &Path) -> Result<RunOutput> {
            Ok(RunOutput {
                code: 0,
                stdout: self.freeze_output.borrow().clone(),
                stderr: String::new(),
            })
        }
    }

    impl TerminalSpawner for FakeEffects {
        fn is_available(&self, _program: &str) -> bool {
            self.terminal_available.get()
        }

        fn spawn(&self, program: &str, _args: &[String], cwd: &Path) -> Result<()> {
            if !self.terminal_available.get() {
                bail!("failed to start {program}");
            }
            self.spawned
                .borrow_mut()
                .push((program.to_string(), cwd.to_path_buf()));
            Ok(())
        }
    }

    impl Effects for FakeEffects {
        fn indexer(&self) -> &dyn FileIndexer {
            self
        }

        fn builder(&self) -> &dyn EnvBuilder {
            self
        }

        fn packages(&self) -> &dyn PackageInspector {
            self
        }

        fn terminal(&self) -> &dyn TerminalSpawner {
            self
        }
    }

    pub(crate) fn make_env_at(env: &Path) -> Result<()> {
        fs::create_dir_all(env.join("bin"))?;
        fs::write(env.join("bin").join("activate"), "")?;
        fs::write(env.join("bin").join("python"), "")?;
        fs::write(env.join("pyvenv.cfg"), "home = /usr/bin\n")?;
        Ok(())
    }

    pub(crate) struct Fixture {
        pub(crate) temp: TempDir,
        pub(crate) config: Config,
    }

    impl Fixture {
        pub(crate) fn new() -> Result<Self> {
            let temp = tempdir()?;
            let envs = temp.path().join("envs");
            let create = temp.path().join("home");
            fs::create_dir_all(&envs)?;
            fs::create_dir_all(&create)?;
            let config = Config::new(
                temp.path().join("venv_log.json"),
                envs,
                create,
                Platform::Unix,
            )
            .with_python("python3");
            Ok(Self { temp, config })
        }

        pub(crate) fn env_dir(&self) -> &Path {
            self.config.env_dir()
        }
    }

    #[test]
    fn startup_scan_keeps_only_valid_children() -> Result<()> {
        let fixture = Fixture::new()?;
        make_env_at(&fixture.env_dir().join("a"))?;
        fs::create_dir_all(fixture.env_dir().join("b"))?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();

        let session = Session::open(fixture.config.clone(), &effects, &notices);
        let names: Vec<&str> = session.registry().names().collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(
            session.registry().get("a"),
            Some(fixture.env_dir().join("a").as_path())
        );
        Ok(())
    }

    #[test]
    fn logged_entries_are_loaded_as_is() -> Result<()> {
        let fixture = Fixture::new()?;
        fs::write(fixture.config.log_path(), r#"{"x": "/home/u/x"}"#)?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();

        let session = Session::open(fixture.config.clone(), &effects, &notices);
        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.registry().get("x"), Some(Path::new("/home/u/x")));
        assert!(notices.is_empty());
        Ok(())
    }

    #[test]
    fn logged_path_wins_over_scanned_path() -> Result<()> {
        let fixture = Fixture::new()?;
        make_env_at(&fixture.env_dir().join("x"))?;
        fs::write(fixture.config.log_path(), r#"{"x": "/home/u/x"}"#)?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();

        let session = Session::open(fixture.config.clone(), &effects, &notices);
        assert_eq!(session.registry().get("x"), Some(Path::new("/home/u/x")));
        Ok(())
    }

    #[test]
    fn create_on_existing_path_changes_nothing() -> Result<()> {
        let fixture = Fixture::new()?;
        fs::create_dir_all(fixture.config.create_dir().join("taken"))?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let err = session.create("taken", true).expect_err("path exists");
        assert!(matches!(err, CreateError::AlreadyExists(_)));
        assert!(effects.builds.borrow().is_empty());
        assert!(session.registry().is_empty());
        assert!(!fixture.config.log_path().exists());
        Ok(())
    }

    #[test]
    fn create_registers_persists_and_opens_terminal() -> Result<()> {
        let fixture = Fixture::new()?;
        let effects = FakeEffects::default();
        effects.terminal_available.set(true);
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let created = session.create("  tools ", true)?;
        let target = fixture.config.create_dir().join("tools");
        assert_eq!(created.name, "tools");
        assert_eq!(created.path, target);
        assert_eq!(created.terminal.as_deref(), Some("mate-terminal"));
        assert_eq!(effects.builds.borrow().as_slice(), [target.clone()]);
        assert_eq!(effects.spawned.borrow()[0].1, target);
        assert_eq!(session.registry().get("tools"), Some(target.as_path()));

        let reloaded = RegistryLog::new(fixture.config.log_path()).load(&notices);
        assert_eq!(reloaded.get("tools"), Some(target.as_path()));
        assert!(notices.is_empty());
        Ok(())
    }

    #[test]
    fn configured_terminal_chain_is_used() -> Result<()> {
        let fixture = Fixture::new()?;
        let config = fixture
            .config
            .clone()
            .with_terminals(TerminalChain::new(vec![TerminalSpec::new("kitty", &["--"])]));
        let effects = FakeEffects::default();
        effects.terminal_available.set(true);
        let notices = NoticeLog::new();
        let mut session = Session::open(config, &effects, &notices);

        let created = session.create("docs", true)?;
        assert_eq!(created.terminal.as_deref(), Some("kitty"));
        Ok(())
    }

    #[test]
    fn failed_build_leaves_registry_alone() -> Result<()> {
        let fixture = Fixture::new()?;
        let effects = FakeEffects::default();
        effects.build_fails.set(true);
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let err = session.create("broken", false).expect_err("build fails");
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("ensurepip"));
        assert!(session.registry().is_empty());
        assert!(!fixture.config.log_path().exists());
        Ok(())
    }

    #[test]
    fn terminal_failure_after_create_is_a_notice() -> Result<()> {
        let fixture = Fixture::new()?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let created = session.create("fresh", true)?;
        assert!(created.terminal.is_none());
        assert!(session.registry().contains("fresh"));
        let raised = notices.drain();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].level, NoticeLevel::Error);
        assert!(raised[0].message.starts_with("Failed to launch terminal"));
        Ok(())
    }

    #[test]
    fn search_merges_and_persists() -> Result<()> {
        let fixture = Fixture::new()?;
        let elsewhere = fixture.temp.path().join("projects").join("api").join(".venv");
        make_env_at(&elsewhere)?;
        let effects = FakeEffects::default();
        *effects.hits.borrow_mut() = format!("{}\n", elsewhere.join("pyvenv.cfg").display());
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let found = session.search_system()?;
        assert_eq!(found.get(".venv"), Some(&elsewhere));
        assert_eq!(session.registry().get(".venv"), Some(elsewhere.as_path()));
        let reloaded = RegistryLog::new(fixture.config.log_path()).load(&notices);
        assert_eq!(reloaded, *session.registry());
        Ok(())
    }

    #[test]
    fn search_without_hits_does_not_write_the_log() -> Result<()> {
        let fixture = Fixture::new()?;
        let effects = FakeEffects::default();
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        assert!(session.search_system()?.is_empty());
        assert!(!fixture.config.log_path().exists());
        Ok(())
    }

    #[test]
    fn missing_indexer_is_an_error() -> Result<()> {
        let fixture = Fixture::new()?;
        let effects = FakeEffects::default();
        effects.indexer_missing.set(true);
        let notices = NoticeLog::new();
        let mut session = Session::open(fixture.config.clone(), &effects, &notices);

        let err = session.search_system().expect_err("indexer missing");
        assert!(err.is_user_error());
        Ok(())
    }

    #[test]
    fn details_include_packages() -> Result<()> {
        let fixture = Fixture::new()?;
        make_env_at(&fixture.env_dir().join("a"))?;
        let effects = FakeEffects::default();
        *effects.freeze_output.borrow_mut() = "requests==2.31.0\n".to_string();
        let notices = NoticeLog::new();
        let session = Session::open(fixture.config.clone(), &effects, &notices);

        let details = session.details("a").expect("registered");
        assert_eq!(details.packages, vec!["requests==2.31.0"]);
        assert!(session.details("missing").is_none());
        Ok(())
    }
}
