//! Tecmarsign Academy admin console for the terminal
//!
//! Signs in against the configured Supabase project and drives the same
//! page controllers the graphical console uses.
//!
//! ```sh
//! # Default config (~/.config/tecmarsign-admin/config.toml)
//! academy-admin --email admin@example.com users list --role tutor
//!
//! # Custom config path
//! academy-admin --config ./admin.toml dashboard
//!
//! # Validate config and exit
//! academy-admin --check
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};

use tecmarsign_admin::application::AuthProvider;
use tecmarsign_admin::config::AppConfig;
use tecmarsign_admin::domain::{CourseCategory, PaymentState, PaymentStatus, UserRole};
use tecmarsign_admin::interfaces::display::{format_kes, format_optional_date, weeks};
use tecmarsign_admin::interfaces::pages::{
    AccessDeniedPage, Choice, CourseFilters, CourseFormPage, CourseShowPage, CreateUserPage,
    DashboardPage, EditUserPage, EnrollmentFilters, ListController, ListQuery, LoginPage,
    PaymentFilters, PaymentShowPage, SubmitOutcome, UserFilters,
};
use tecmarsign_admin::interfaces::{GuardDecision, RouteGuard, Shell};
use tecmarsign_admin::telemetry::{init_fallback_tracing, init_tracing};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Tecmarsign Academy admin console.
#[derive(Parser, Debug)]
#[command(
    name = "academy-admin",
    version,
    about = "Manage users, courses, enrollments and payments of Tecmarsign Academy",
    long_about = "Tecmarsign Academy admin console backed by a hosted Supabase project.\n\n\
                  Default config: ~/.config/tecmarsign-admin/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ACADEMY_ADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Account to sign in with.
    #[arg(long, env = "ACADEMY_ADMIN_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "ACADEMY_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in identity.
    Whoami,
    /// Headline metrics.
    Dashboard,
    #[command(subcommand)]
    Users(UserCommand),
    #[command(subcommand)]
    Courses(CourseCommand),
    #[command(subcommand)]
    Phases(PhaseCommand),
    #[command(subcommand)]
    Enrollments(EnrollmentCommand),
    #[command(subcommand)]
    Payments(PaymentCommand),
}

#[derive(Args, Debug)]
struct Paging {
    #[arg(long, default_value_t = 1)]
    page: u32,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// admin, tutor, student or all
        #[arg(long, default_value = "all")]
        role: String,
        /// active, inactive or all
        #[arg(long, default_value = "all")]
        status: String,
        #[command(flatten)]
        paging: Paging,
    },
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: String,
        #[arg(long)]
        inactive: bool,
    },
    Edit {
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Email the user a password recovery link.
    ResetPassword { id: String },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
    List {
        #[arg(long, default_value = "")]
        title: String,
        /// tech, marketing, design or all
        #[arg(long, default_value = "all")]
        category: String,
        /// published, draft or all
        #[arg(long, default_value = "all")]
        published: String,
        #[command(flatten)]
        paging: Paging,
    },
    Show { id: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "tech")]
        category: String,
        #[arg(long, default_value = "")]
        thumbnail_url: String,
        #[arg(long)]
        publish: bool,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        thumbnail_url: Option<String>,
        #[arg(long)]
        published: Option<bool>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PhaseCommand {
    Add {
        course_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        weeks: Option<i32>,
        #[arg(long)]
        number: Option<i32>,
    },
    Delete {
        course_id: String,
        phase_id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum EnrollmentCommand {
    List {
        /// pending, paid, failed or all
        #[arg(long, default_value = "all")]
        payment_status: String,
        /// granted, revoked or all
        #[arg(long, default_value = "all")]
        access: String,
        #[command(flatten)]
        paging: Paging,
    },
}

#[derive(Subcommand, Debug)]
enum PaymentCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// pending, completed, failed or all
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long, default_value = "all")]
        method: String,
        #[command(flatten)]
        paging: Paging,
    },
    Show { id: String },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // ── Load configuration ──────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(tecmarsign_admin::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let mut cfg = AppConfig::default();
            cfg.apply_env_overrides();
            if cli.check {
                init_fallback_tracing();
                error!("Failed to load config from {}: {}", config_path.display(), e);
                return Err(e.into());
            }
            eprintln!("Config {} not loaded ({}), using defaults", config_path.display(), e);
            cfg
        }
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);
    info!("Configuration from {}", config_path.display());

    // ── Config validation mode ──────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Backend     : {}", config.backend.url);
        println!("   Site URL    : {}", config.ui.site_url);
        println!("   Page size   : {}", config.ui.page_size);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err("no command given, see --help".into());
    };
    config.validate()?;
    let auth = tecmarsign_admin::connect_supabase(&config)?;
    sign_in(&auth, cli.email, cli.password).await?;

    let page_size = Some(config.ui.page_size);
    let result = run(&auth, &config, command, page_size).await;
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn sign_in(auth: &AuthProvider, email: Option<String>, password: Option<String>) -> CliResult<()> {
    if auth.check().await.authenticated {
        return Ok(());
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err("sign-in requires --email and --password".into());
    };
    let mut login = LoginPage::new(auth.clone());
    login.form.email = email;
    login.form.password = password;
    match login.submit().await {
        SubmitOutcome::Navigate(_) => Ok(()),
        other => Err(other
            .error_message()
            .unwrap_or("Login failed")
            .to_string()
            .into()),
    }
}

/// Apply the route guard the graphical console applies.
async fn guard(auth: &AuthProvider, path: &str) -> CliResult<()> {
    match RouteGuard::new(auth.clone()).resolve(path).await {
        GuardDecision::Render(_) => Ok(()),
        GuardDecision::Redirect(target) if target == "/access-denied" => {
            let page = AccessDeniedPage::new(auth.clone());
            page.sign_out().await;
            Err(tecmarsign_admin::interfaces::pages::access_denied::MESSAGE.into())
        }
        GuardDecision::Redirect(target) => Err(format!("not signed in (redirect to {})", target).into()),
    }
}

fn confirm(yes: bool, what: &str) -> CliResult<bool> {
    if yes {
        return Ok(true);
    }
    print!("Delete {}? Type 'yes' to confirm: ", what);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim() == "yes")
}

fn finish(outcome: SubmitOutcome) -> CliResult<()> {
    match outcome {
        SubmitOutcome::Navigate(_) | SubmitOutcome::Saved => {
            println!("Done");
            Ok(())
        }
        SubmitOutcome::Busy => Err("another request is still running".into()),
        other => Err(other.error_message().unwrap_or("failed").to_string().into()),
    }
}

fn choice<T>(value: &str, parse: impl FnOnce(&str) -> Option<T>) -> CliResult<Choice<T>> {
    let selected = Choice::from_select(value, parse);
    if selected.is_all() && value != "all" {
        return Err(format!("unknown filter value '{}'", value).into());
    }
    Ok(selected)
}

/// Filters are already applied (and page 1 fetched) by `update_query`.
async fn load_page<Q: ListQuery>(list: &mut ListController<Q>, page: u32) -> CliResult<()> {
    if page > 1 {
        list.set_page(page).await?;
    }
    Ok(())
}

fn footer<Q: ListQuery>(list: &ListController<Q>) {
    println!(
        "-- page {} of {} ({} total)",
        list.page(),
        list.total_pages().max(1),
        list.total()
    );
}

async fn run(
    auth: &AuthProvider,
    config: &AppConfig,
    command: Command,
    page_size: Option<u32>,
) -> CliResult<()> {
    let data = auth.data().clone();
    match command {
        Command::Whoami => {
            guard(auth, "/").await?;
            let mut shell = Shell::new();
            let identity = shell.load_identity(auth).await.cloned();
            match identity {
                Some(identity) => println!(
                    "{} <{}> ({})",
                    identity.name,
                    identity.email.as_deref().unwrap_or("-"),
                    identity.role.label()
                ),
                None => println!("{}", shell.display_name()),
            }
        }

        Command::Dashboard => {
            guard(auth, "/").await?;
            let mut shell = Shell::new();
            let identity = shell.load_identity(auth).await.cloned();
            let mut page = DashboardPage::new();
            page.load(&data).await?;
            println!("{}", DashboardPage::welcome(identity.as_ref()));
            for card in page.cards() {
                println!("{:<12} {:>18}  {}", card.title, card.value, card.description);
            }
        }

        Command::Users(cmd) => match cmd {
            UserCommand::List { search, role, status, paging } => {
                guard(auth, "/users").await?;
                let mut list: ListController<UserFilters> =
                    ListController::with_page_size(data, page_size);
                let role = choice(&role, UserRole::parse)?;
                let status = choice(&status, UserFilters::parse_status)?;
                list.update_query(|q| {
                    q.search = search;
                    q.role = role;
                    q.status = status;
                })
                .await?;
                load_page(&mut list, paging.page).await?;
                for user in list.rows() {
                    println!(
                        "{}  {:<24} {:<32} {:<14} {:<8} {}",
                        user.id,
                        user.full_name,
                        user.email,
                        user.phone_number,
                        user.role.label(),
                        if user.is_active { "Active" } else { "Inactive" }
                    );
                }
                footer(&list);
            }
            UserCommand::Create { full_name, email, phone, password, role, inactive } => {
                guard(auth, "/users/create").await?;
                let mut page = CreateUserPage::new(auth.clone());
                page.form.full_name = full_name;
                page.form.email = email;
                page.form.phone_number = phone;
                page.form.password = password;
                page.form.role = UserRole::parse(&role).ok_or("unknown role")?;
                page.form.is_active = !inactive;
                finish(page.submit().await)?;
            }
            UserCommand::Edit { id, full_name, phone, role, active } => {
                guard(auth, &format!("/users/edit/{}", id)).await?;
                let mut page = EditUserPage::new(auth.clone(), config.ui.reset_password_url());
                page.load(&id).await?;
                if let Some(name) = full_name {
                    page.form.full_name = name;
                }
                if let Some(phone) = phone {
                    page.form.phone_number = phone;
                }
                if let Some(role) = role {
                    let role = UserRole::parse(&role).ok_or("unknown role")?;
                    if !page.set_role(role) {
                        if let Some(note) = page.role_note() {
                            eprintln!("{}", note);
                        }
                    }
                }
                if let Some(active) = active {
                    if !page.set_active(active) {
                        if let Some(note) = page.active_note() {
                            eprintln!("{}", note);
                        }
                    }
                }
                finish(page.submit().await)?;
            }
            UserCommand::ResetPassword { id } => {
                guard(auth, &format!("/users/edit/{}", id)).await?;
                let mut page = EditUserPage::new(auth.clone(), config.ui.reset_password_url());
                page.load(&id).await?;
                finish(page.send_password_reset().await)?;
            }
            UserCommand::Delete { id, yes } => {
                guard(auth, "/users").await?;
                if !confirm(yes, &format!("user {}", id))? {
                    println!("Cancelled");
                    return Ok(());
                }
                let mut list: ListController<UserFilters> = ListController::new(data);
                list.request_delete(id);
                finish(list.confirm_delete().await)?;
            }
        },

        Command::Courses(cmd) => match cmd {
            CourseCommand::List { title, category, published, paging } => {
                guard(auth, "/courses").await?;
                let mut list: ListController<CourseFilters> =
                    ListController::with_page_size(data, page_size);
                let category = choice(&category, CourseCategory::parse)?;
                let published = choice(&published, CourseFilters::parse_published)?;
                list.update_query(|q| {
                    q.title = title;
                    q.category = category;
                    q.published = published;
                })
                .await?;
                load_page(&mut list, paging.page).await?;
                for course in list.rows() {
                    println!(
                        "{}  {:<40} {:<10} {}",
                        course.id,
                        course.title,
                        course.category.label(),
                        course.status_label()
                    );
                }
                footer(&list);
            }
            CourseCommand::Show { id } => {
                guard(auth, &format!("/courses/show/{}", id)).await?;
                let page = CourseShowPage::load(data, &id).await?;
                let course = page.course();
                println!("{} [{}] {}", course.title, course.category.label(), course.status_label());
                if let Some(description) = &course.description {
                    println!("{}", description);
                }
                for phase in page.phases.phases() {
                    println!(
                        "  {}. {:<28} {:<9} {:>16}  {}",
                        phase.phase_number,
                        phase.phase_name,
                        phase.duration_weeks.map(weeks).unwrap_or_else(|| "-".into()),
                        format_kes(phase.price),
                        phase.id
                    );
                }
            }
            CourseCommand::Create { title, description, category, thumbnail_url, publish } => {
                guard(auth, "/courses/create").await?;
                let mut page = CourseFormPage::create(data);
                page.form.title = title;
                page.form.description = description;
                page.form.category = CourseCategory::parse(&category).ok_or("unknown category")?;
                page.form.thumbnail_url = thumbnail_url;
                page.form.is_published = publish;
                finish(page.submit().await)?;
            }
            CourseCommand::Edit { id, title, description, category, thumbnail_url, published } => {
                guard(auth, &format!("/courses/edit/{}", id)).await?;
                let mut page = CourseFormPage::edit(data, &id).await?;
                if let Some(title) = title {
                    page.form.title = title;
                }
                if let Some(description) = description {
                    page.form.description = description;
                }
                if let Some(category) = category {
                    page.form.category = CourseCategory::parse(&category).ok_or("unknown category")?;
                }
                if let Some(url) = thumbnail_url {
                    page.form.thumbnail_url = url;
                }
                if let Some(published) = published {
                    page.form.is_published = published;
                }
                finish(page.submit().await)?;
            }
            CourseCommand::Delete { id, yes } => {
                guard(auth, "/courses").await?;
                if !confirm(yes, &format!("course {}", id))? {
                    println!("Cancelled");
                    return Ok(());
                }
                let mut list: ListController<CourseFilters> = ListController::new(data);
                list.request_delete(id);
                finish(list.confirm_delete().await)?;
            }
        },

        Command::Phases(cmd) => match cmd {
            PhaseCommand::Add { course_id, name, price, weeks, number } => {
                guard(auth, &format!("/courses/show/{}", course_id)).await?;
                let mut page = CourseShowPage::load(data, &course_id).await?;
                page.phases.open_create();
                if let Some(form) = page.phases.dialog_form() {
                    form.phase_name = name;
                    form.price = price;
                    if let Some(weeks) = weeks {
                        form.duration_weeks = weeks;
                    }
                    if let Some(number) = number {
                        form.phase_number = number;
                    }
                }
                finish(page.phases.submit().await)?;
            }
            PhaseCommand::Delete { course_id, phase_id, yes } => {
                guard(auth, &format!("/courses/show/{}", course_id)).await?;
                if !confirm(yes, &format!("phase {}", phase_id))? {
                    println!("Cancelled");
                    return Ok(());
                }
                let mut page = CourseShowPage::load(data, &course_id).await?;
                page.phases.request_delete(phase_id);
                finish(page.phases.confirm_delete().await)?;
            }
        },

        Command::Enrollments(EnrollmentCommand::List { payment_status, access, paging }) => {
            guard(auth, "/enrollments").await?;
            let mut list: ListController<EnrollmentFilters> =
                ListController::with_page_size(data, page_size);
            let payment_status = choice(&payment_status, PaymentStatus::parse)?;
            let access = choice(&access, EnrollmentFilters::parse_access)?;
            list.update_query(|q| {
                q.payment_status = payment_status;
                q.access = access;
            })
            .await?;
            load_page(&mut list, paging.page).await?;
            for e in list.rows() {
                println!(
                    "{}  {:<24} {:<28} {:<16} {:<8} {:<8} {}",
                    e.id,
                    e.student_name(),
                    e.course_title(),
                    e.phase_name(),
                    e.payment_status.as_str(),
                    if e.has_access() { "granted" } else { "-" },
                    format_optional_date(e.expires_at)
                );
            }
            footer(&list);
        }

        Command::Payments(cmd) => match cmd {
            PaymentCommand::List { search, status, method, paging } => {
                guard(auth, "/payments").await?;
                let mut list: ListController<PaymentFilters> =
                    ListController::with_page_size(data, page_size);
                let status = choice(&status, PaymentState::parse)?;
                let method = choice(&method, PaymentFilters::parse_method)?;
                list.update_query(|q| {
                    q.search = search;
                    q.status = status;
                    q.method = method;
                })
                .await?;
                load_page(&mut list, paging.page).await?;
                for p in list.rows() {
                    println!(
                        "{}  {:<14} {:>16} {:<8} {:<10} {}",
                        p.id,
                        p.transaction_id,
                        format_kes(p.amount),
                        p.payment_method,
                        p.status.as_str(),
                        format_optional_date(p.payment_date)
                    );
                }
                footer(&list);
            }
            PaymentCommand::Show { id } => {
                guard(auth, &format!("/payments/show/{}", id)).await?;
                let page = PaymentShowPage::load(data, &id).await?;
                let p = page.payment();
                println!("Transaction : {}", p.transaction_id);
                println!("Receipt     : {}", page.receipt());
                println!("Student     : {}", page.student_name());
                println!("Amount      : {}", page.amount());
                println!("Method      : {}", p.payment_method);
                println!("Status      : {}", p.status.as_str());
                println!("Paid on     : {}", page.paid_on());
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sign_in_flags_are_backed_by_env() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("config").as_deref(), Some("ACADEMY_ADMIN_CONFIG"));
        assert_eq!(env_of("email").as_deref(), Some("ACADEMY_ADMIN_EMAIL"));
        assert_eq!(env_of("password").as_deref(), Some("ACADEMY_ADMIN_PASSWORD"));
    }
}
