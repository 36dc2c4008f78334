use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use codelink_core::configs::{config_path, parse_config, DisplayConfig};
use codelink_core::context::{
    require, Auth, AuthContext, DesignContext, DesignFile, Project, ProjectContext, TokenSource,
};
use codelink_core::display::SpinnerOptions;
use codelink_core::step::{from_fn, pause_spinning_and_run, transition_to, StepResult};
use codelink_core::{SkipDecision, Task, TaskError, TaskHandle, Ui, Workflow};
use colored::*;

use crate::design_url::parse_design_url;

pub const TOKEN_ENV: &str = "CODELINK_ACCESS_TOKEN";

/// Shorter tokens are masked completely
const MIN_REVEAL_LEN: usize = 12;

#[derive(Debug, Default)]
pub struct DoctorContext {
    pub auth: Auth,
    pub project: Project,
    pub design: DesignFile,
}

impl DoctorContext {
    pub fn new(root: impl Into<PathBuf>, token: Option<String>, source: TokenSource) -> Self {
        Self {
            auth: Auth {
                token_source: token.as_ref().map(|_| source),
                access_token: token,
            },
            project: Project {
                root: root.into(),
                ..Project::default()
            },
            design: DesignFile::default(),
        }
    }
}

impl AuthContext for DoctorContext {
    fn auth(&self) -> &Auth {
        &self.auth
    }

    fn auth_mut(&mut self) -> &mut Auth {
        &mut self.auth
    }
}

impl ProjectContext for DoctorContext {
    fn project(&self) -> &Project {
        &self.project
    }

    fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }
}

impl DesignContext for DoctorContext {
    fn design(&self) -> &DesignFile {
        &self.design
    }

    fn design_mut(&mut self) -> &mut DesignFile {
        &mut self.design
    }
}

pub async fn execute(workspace: &Path, token: Option<String>, display: &DisplayConfig) -> Result<()> {
    let (token, source) = resolve_token(token, std::env::var(TOKEN_ENV).ok());

    println!("{} {}", "Checking workspace".bold(), workspace.display().to_string().cyan());
    println!();

    let ctx = DoctorContext::new(workspace, token, source);
    let mut workflow = doctor_workflow(ctx, display.spinner_options());
    workflow.run().await?;
    println!();
    ensure_passed(&workflow)?;

    println!("{} {}", "✓".green().bold(), "All checks passed".green().bold());
    Ok(())
}

/// `--token` wins over the environment
fn resolve_token(flag: Option<String>, env: Option<String>) -> (Option<String>, TokenSource) {
    match flag {
        Some(token) => (Some(token), TokenSource::Flag),
        None => (env, TokenSource::Environment),
    }
}

fn ensure_passed(workflow: &Workflow<DoctorContext>) -> Result<()> {
    let failed = workflow.tasks().iter().filter(|task| task.is_failed()).count();
    if failed > 0 {
        anyhow::bail!("{} check(s) failed", failed);
    }
    Ok(())
}

pub fn doctor_workflow(ctx: DoctorContext, options: SpinnerOptions) -> Workflow<DoctorContext> {
    let tasks = vec![config_task(), git_task(), token_task(), design_task()]
        .into_iter()
        .map(|task| task.spinner_options(options.clone()).on_error(report_failure))
        .collect();

    Workflow::new(ctx, tasks)
}

/// Failures are already on screen; log the cause and move on to the next check
fn report_failure(err: anyhow::Error, _ctx: &DoctorContext, task: &TaskHandle) -> Result<()> {
    tracing::warn!(check = task.name(), error = %err, "check failed");
    Ok(())
}

fn config_task() -> Task<DoctorContext> {
    Task::new("config")
        .initial("Reading configuration")
        .skip_when(|ctx: &DoctorContext| -> SkipDecision<DoctorContext> {
            if config_path(&ctx.project().root).exists() {
                SkipDecision::Run
            } else {
                SkipDecision::SkipWith(Ui::with_subtext(
                    "No configuration file",
                    "Defaults are in effect",
                ))
            }
        })
        .step(from_fn(load_project_config::<DoctorContext>))
}

fn load_project_config<C>(ctx: &mut C, _task: &mut TaskHandle) -> StepResult<C>
where
    C: ProjectContext + 'static,
{
    let path = config_path(&ctx.project().root);
    let content = fs::read_to_string(&path)
        .map_err(|e| TaskError::<C>::with_cause("Could not read configuration", e))?;
    let config = parse_config(&content)
        .map_err(|e| TaskError::<C>::with_cause("Invalid configuration", e))?;

    let project = ctx.project_mut();
    project.config_path = Some(path);
    project.config = Some(config);

    Ok(Some(Ui::computed(|ctx: &C| {
        let path = ctx
            .project()
            .config_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        Ui::with_subtext("Configuration loaded", path)
    })))
}

fn git_task() -> Task<DoctorContext> {
    Task::new("git")
        .initial("Looking for a git repository")
        .step(from_fn(locate_git_root::<DoctorContext>))
        .step(pause_spinning_and_run(from_fn(print_head::<DoctorContext>)))
        .step(transition_to("Inside a git repository"))
}

fn locate_git_root<C: ProjectContext>(ctx: &mut C, task: &mut TaskHandle) -> StepResult<C> {
    match find_git_root(&ctx.project().root) {
        Some(root) => {
            tracing::debug!(root = %root.display(), "found git repository");
            ctx.project_mut().git_root = Some(root);
        }
        None => task.fail(
            &*ctx,
            Some(Ui::with_subtext("Not a git repository", "Run `git init` first")),
        ),
    }
    Ok(None)
}

fn print_head<C>(ctx: &mut C, _task: &mut TaskHandle) -> StepResult<C>
where
    C: ProjectContext + 'static,
{
    let git_root = require(&ctx.project().git_root, "project.git_root")?;
    let head = read_head(git_root)
        .map_err(|e| TaskError::<C>::with_cause("Could not read git HEAD", e))?;
    let (label, value) = describe_head(&head);
    println!("  {} {}", label.dimmed(), value.cyan());
    Ok(None)
}

/// Worktrees and submodules have a `.git` file pointing at the real git dir
fn git_dir(root: &Path) -> io::Result<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Ok(dot_git);
    }
    let content = fs::read_to_string(&dot_git)?;
    let target = content
        .trim()
        .strip_prefix("gitdir:")
        .map(str::trim)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} has no gitdir pointer", dot_git.display()),
            )
        })?;
    Ok(root.join(target))
}

fn read_head(root: &Path) -> Result<String> {
    let dir = git_dir(root)
        .with_context(|| format!("Failed to resolve git dir in {}", root.display()))?;
    let head_path = dir.join("HEAD");
    let head = fs::read_to_string(&head_path)
        .with_context(|| format!("Failed to read {}", head_path.display()))?;
    Ok(head.trim().to_string())
}

fn describe_head(head: &str) -> (&'static str, &str) {
    match head.strip_prefix("ref: refs/heads/") {
        Some(branch) => ("branch", branch),
        None => ("detached at", head),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn token_task() -> Task<DoctorContext> {
    Task::new("token")
        .initial("Checking access token")
        .step(from_fn(check_token::<DoctorContext>))
}

fn check_token<C>(ctx: &mut C, _task: &mut TaskHandle) -> StepResult<C>
where
    C: AuthContext + 'static,
{
    let missing = || {
        TaskError::<C>::new(Ui::with_subtext(
            "No access token",
            format!("Set {} or pass --token", TOKEN_ENV),
        ))
    };
    let token = require(&ctx.auth().access_token, "auth.access_token").map_err(|_| missing())?;
    if token.trim().is_empty() {
        return Err(missing().into());
    }
    if token.chars().any(char::is_whitespace) {
        return Err(TaskError::<C>::new(Ui::with_subtext(
            "Malformed access token",
            "Tokens cannot contain whitespace",
        ))
        .into());
    }

    let origin = match ctx.auth().token_source {
        Some(TokenSource::Flag) => "--token",
        _ => TOKEN_ENV,
    };
    Ok(Some(Ui::with_subtext(
        "Access token present",
        format!("{} from {}", mask_token(token), origin),
    )))
}

fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count < MIN_REVEAL_LEN {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

fn design_task() -> Task<DoctorContext> {
    Task::new("design")
        .initial("Checking design file")
        .skip_when(|ctx: &DoctorContext| -> SkipDecision<DoctorContext> {
            let configured = ctx
                .project()
                .config
                .as_ref()
                .and_then(|config| config.design.as_ref())
                .is_some();
            if configured {
                SkipDecision::Run
            } else {
                SkipDecision::SkipWith("No design file configured".into())
            }
        })
        .step(from_fn(resolve_design_file::<DoctorContext>))
}

fn resolve_design_file<C>(ctx: &mut C, _task: &mut TaskHandle) -> StepResult<C>
where
    C: ProjectContext + DesignContext + 'static,
{
    let config = require(&ctx.project().config, "project.config")?;
    let design = require(&config.design, "project.config.design")?;
    let file_url = design.file_url.clone();
    let parsed = parse_design_url(&file_url)
        .map_err(|e| TaskError::<C>::with_cause("Invalid design file URL", e))?;

    let design = ctx.design_mut();
    design.file_url = Some(file_url);
    design.file_key = Some(parsed.file_key);
    design.node_id = parsed.node_id;

    Ok(Some(Ui::computed(|ctx: &C| {
        let design = ctx.design();
        let key = design.file_key.clone().unwrap_or_default();
        match &design.node_id {
            Some(node) => Ui::with_subtext("Design file linked", format!("{} (node {})", key, node)),
            None => Ui::with_subtext("Design file linked", key),
        }
    })))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use codelink_core::configs::SpinnerConfig;
    use tempfile::TempDir;

    use super::*;

    fn quiet() -> SpinnerOptions {
        SpinnerOptions {
            frames: vec!["-".to_string()],
            interval: Duration::from_millis(80),
            interactive: false,
        }
    }

    fn quiet_display() -> DisplayConfig {
        DisplayConfig {
            spinner: Some(SpinnerConfig {
                enabled: Some(false),
                ..SpinnerConfig::default()
            }),
            color: None,
        }
    }

    fn workspace_with_head(config: Option<&str>, head: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("HEAD"), head).unwrap();
        if let Some(config) = config {
            fs::write(dir.path().join("codelink.yml"), config).unwrap();
        }
        dir
    }

    fn workspace(config: Option<&str>) -> TempDir {
        workspace_with_head(config, "ref: refs/heads/main\n")
    }

    /// A linked worktree: `.git` is a file pointing at `gitdir`
    fn worktree(gitdir: &str, head: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".git"), format!("gitdir: {}\n", gitdir)).unwrap();
        if let Some(head) = head {
            let target = dir.path().join(gitdir);
            fs::create_dir_all(&target).unwrap();
            fs::write(target.join("HEAD"), head).unwrap();
        }
        dir
    }

    async fn run(dir: &TempDir, token: Option<&str>) -> Workflow<DoctorContext> {
        let ctx = DoctorContext::new(
            dir.path(),
            token.map(str::to_string),
            TokenSource::Flag,
        );
        let mut workflow = doctor_workflow(ctx, quiet());
        workflow.run().await.unwrap();
        workflow
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let dir = workspace(Some(
            "design:\n  fileUrl: https://design.example.com/file/AbC123/Kit?node-id=1-2\n",
        ));
        let workflow = run(&dir, Some("secret-token")).await;

        assert!(workflow.tasks().iter().all(|task| task.is_completed()));
        let ctx = workflow.context();
        assert_eq!(ctx.project.git_root.as_deref(), Some(dir.path()));
        assert_eq!(ctx.design.file_key.as_deref(), Some("AbC123"));
        assert_eq!(ctx.design.node_id.as_deref(), Some("1:2"));
        assert_eq!(workflow.tasks()[3].current_text(), Some("Design file linked"));
    }

    #[tokio::test]
    async fn test_missing_config_skips_dependent_checks() {
        let dir = workspace(None);
        let workflow = run(&dir, Some("secret-token")).await;

        let tasks = workflow.tasks();
        assert!(tasks[0].is_skipped());
        assert_eq!(tasks[0].current_text(), Some("No configuration file"));
        assert!(tasks[1].is_completed());
        assert!(tasks[2].is_completed());
        assert!(tasks[3].is_skipped());
    }

    #[tokio::test]
    async fn test_invalid_yaml_fails_only_config_check() {
        let dir = workspace(Some("display: [unclosed\n"));
        let workflow = run(&dir, Some("secret-token")).await;

        let tasks = workflow.tasks();
        assert!(tasks[0].is_failed());
        assert_eq!(tasks[0].current_text(), Some("Invalid configuration"));
        assert!(workflow.context().project.config.is_none());
        assert!(tasks[1].is_completed());
        assert!(tasks[2].is_completed());
        assert!(tasks[3].is_skipped());
    }

    #[tokio::test]
    async fn test_missing_token_fails_with_hint() {
        let dir = workspace(None);
        let workflow = run(&dir, None).await;

        let token = &workflow.tasks()[2];
        assert!(token.is_failed());
        assert_eq!(token.current_text(), Some("No access token"));
        assert_eq!(
            token.handle().rendered().subtext.as_deref(),
            Some("Set CODELINK_ACCESS_TOKEN or pass --token")
        );
    }

    #[tokio::test]
    async fn test_bad_design_url_fails() {
        let dir = workspace(Some("design:\n  fileUrl: not-a-url\n"));
        let workflow = run(&dir, Some("secret-token")).await;

        let design = &workflow.tasks()[3];
        assert!(design.is_failed());
        assert_eq!(design.current_text(), Some("Invalid design file URL"));
        assert!(workflow.context().design.file_key.is_none());
    }

    #[test]
    fn test_find_git_root_walks_up() {
        let dir = workspace(None);
        let nested = dir.path().join("src").join("components");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_git_root(&nested).as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_worktree_git_file_is_followed() {
        let dir = worktree("meta/worktrees/feature", Some("ref: refs/heads/feature\n"));
        let workflow = run(&dir, Some("secret-token")).await;

        let git = &workflow.tasks()[1];
        assert!(git.is_completed());
        assert_eq!(git.current_text(), Some("Inside a git repository"));
        assert_eq!(workflow.context().project.git_root.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_unreadable_head_fails_with_message() {
        let dir = worktree("meta/worktrees/gone", None);
        let workflow = run(&dir, Some("secret-token")).await;

        let git = &workflow.tasks()[1];
        assert!(git.is_failed());
        assert_eq!(git.current_text(), Some("Could not read git HEAD"));
        assert!(workflow.tasks()[2].is_completed());
    }

    #[tokio::test]
    async fn test_detached_head_passes() {
        let dir = workspace_with_head(None, "4b825dc642cb6eb9a060e54bf8d69288fbee4904\n");
        let workflow = run(&dir, Some("secret-token")).await;
        assert!(workflow.tasks()[1].is_completed());
    }

    #[test]
    fn test_describe_head() {
        assert_eq!(describe_head("ref: refs/heads/main"), ("branch", "main"));
        assert_eq!(describe_head("4b825dc6"), ("detached at", "4b825dc6"));
    }

    #[tokio::test]
    async fn test_execute_succeeds_with_token_flag() {
        let dir = workspace(None);
        execute(dir.path(), Some("secret-token".to_string()), &quiet_display())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_execute_fails_when_any_check_fails() {
        let dir = workspace(Some("display: [unclosed\n"));
        let err = execute(dir.path(), Some("secret-token".to_string()), &quiet_display())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "1 check(s) failed");
    }

    #[tokio::test]
    async fn test_ensure_passed_counts_failed_checks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("codelink.yml"), "display: [unclosed\n").unwrap();
        let workflow = run(&dir, None).await;

        let err = ensure_passed(&workflow).unwrap_err();
        assert!(err.to_string().ends_with("check(s) failed"));
    }

    #[test]
    fn test_flag_token_wins_over_environment() {
        let (token, source) = resolve_token(Some("flag".to_string()), Some("env".to_string()));
        assert_eq!(token.as_deref(), Some("flag"));
        assert_eq!(source, TokenSource::Flag);

        let (token, source) = resolve_token(None, Some("env".to_string()));
        assert_eq!(token.as_deref(), Some("env"));
        assert_eq!(source, TokenSource::Environment);

        let (token, _) = resolve_token(None, None);
        assert!(token.is_none());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefghijklmnop"), "****mnop");
        assert_eq!(mask_token("abcde"), "****");
        assert_eq!(mask_token("abcdefghijk"), "****");
    }
}
