use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use taskdeck::application_port::*;
use taskdeck::client::*;
use taskdeck::domain_model::*;
use taskdeck::logger::*;
use taskdeck::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let client = Client::try_new(&project_settings)?;

    let session = Arc::downgrade(&client.session);
    let _auth_log = client.session.subscribe(move || {
        if let Some(session) = session.upgrade() {
            info!(authenticated = session.is_authenticated(), "auth state changed");
        }
    });
    client.session.init_from_storage();

    run(&client, cli.command).await
}

async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
    let auth = &client.auth_gateway;
    match command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let profile = auth
                .register(RegisterInput {
                    username,
                    email,
                    password,
                })
                .await?;
            print_json(&profile)
        }
        Command::Login { username, password } => {
            auth.login(LoginInput { username, password }).await?;
            print_status(&client.session)
        }
        Command::Logout => {
            auth.logout();
            print_status(&client.session)
        }
        Command::Status => print_status(&client.session),
        Command::Refresh => {
            client.pipeline().coordinator().refresh().await?;
            print_status(&client.session)
        }
        Command::ForgotPassword { email } => print_json(&auth.forgot_password(&email).await?),
        Command::ResetPassword {
            uid,
            token,
            new_password,
        } => {
            let ack = auth
                .reset_password(ResetPasswordInput {
                    uid,
                    token,
                    new_password,
                })
                .await?;
            print_json(&ack)
        }
        Command::Tasks(command) => run_tasks(client.task_service.as_ref(), command).await,
    }
}

async fn run_tasks(tasks: &dyn TaskService, command: TasksCommand) -> anyhow::Result<()> {
    match command {
        TasksCommand::List(filter) => print_json(&tasks.list(&task_query(filter)?).await?),
        TasksCommand::All(filter) => print_json(&tasks.list_all(&task_query(filter)?).await?),
        TasksCommand::Get { id } => print_json(&tasks.get(TaskId(id)).await?),
        TasksCommand::Create(draft) => print_json(&tasks.create(&task_draft(draft)?).await?),
        TasksCommand::Update { id, draft } => {
            print_json(&tasks.update(TaskId(id), &task_draft(draft)?).await?)
        }
        TasksCommand::Patch { id, patch } => {
            let patch = task_patch(patch)?;
            if patch.is_empty() {
                anyhow::bail!("nothing to change; pass at least one field");
            }
            print_json(&tasks.patch(TaskId(id), &patch).await?)
        }
        TasksCommand::Delete { id } => {
            tasks.delete(TaskId(id)).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        TasksCommand::Analytics => print_json(&tasks.analytics().await?),
        TasksCommand::Insights => print_json(&tasks.insights().await?),
        TasksCommand::Reminders => print_json(&tasks.reminders().await?),
        TasksCommand::Dashboard => {
            let (analytics, insights, reminders) = futures_util::try_join!(
                tasks.analytics(),
                tasks.insights(),
                tasks.reminders()
            )?;
            print_json(&serde_json::json!({
                "analytics": analytics,
                "insights": insights,
                "reminders": reminders,
            }))
        }
    }
}

fn task_query(filter: FilterArgs) -> anyhow::Result<TaskQuery> {
    Ok(TaskQuery {
        status: filter.status.as_deref().map(str::parse).transpose()?,
        priority: filter.priority.as_deref().map(str::parse).transpose()?,
        category: filter.category,
        important: filter.important,
        search: filter.search,
        ordering: filter.ordering.as_deref().map(str::parse).transpose()?,
        page: filter.page,
    })
}

fn task_draft(draft: DraftArgs) -> anyhow::Result<TaskDraft> {
    Ok(TaskDraft {
        title: draft.title,
        description: draft.description,
        due_date: parse_date(draft.due_date.as_deref())?,
        priority: draft.priority.as_deref().map(str::parse).transpose()?,
        status: draft.status.as_deref().map(str::parse).transpose()?,
        is_important: draft.important,
        category: draft.category,
    })
}

fn task_patch(patch: PatchArgs) -> anyhow::Result<TaskPatch> {
    Ok(TaskPatch {
        title: patch.title,
        description: patch.description,
        due_date: parse_date(patch.due_date.as_deref())?,
        priority: patch.priority.as_deref().map(str::parse).transpose()?,
        status: patch.status.as_deref().map(str::parse).transpose()?,
        is_important: patch.important,
        category: patch.category,
    })
}

fn parse_date(value: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("invalid date `{v}`, expected YYYY-MM-DD"))
        })
        .transpose()
}

fn print_status(session: &SessionState) -> anyhow::Result<()> {
    let claims = session.claims();
    print_json(&serde_json::json!({
        "authenticated": claims.is_some(),
        "expires_at": claims.as_ref().and_then(Claims::expires_at),
        "is_admin": claims.as_ref().is_some_and(Claims::is_admin),
    }))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
