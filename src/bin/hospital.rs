//! 命令行客户端
//!
//! 会话保存在 `HOSPITAL_SESSION_DIR`（默认 `<config_dir>/hospital-client`），
//! 多次调用之间保持登录状态。

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::{Context, Result, bail};
    use clap::{Parser, Subcommand};
    use hospital_client::api::AppointmentQuery;
    use hospital_client::shared::{LoginRequest, Role};
    use hospital_client::{
        ClientConfig, FileStorage, HospitalApi, MemoryHistory, Navigator, ReqwestHttpClient,
        RequestPipeline, RouteTable, SessionStore, auth,
    };
    use std::rc::Rc;
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    #[derive(Parser)]
    #[command(name = "hospital")]
    #[command(about = "Hospital appointment system client")]
    struct Cli {
        /// 覆盖 HOSPITAL_API_BASE_URL
        #[arg(long, global = true)]
        base_url: Option<String>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Sign in and store the session
        Login {
            #[arg(short, long)]
            username: String,
            #[arg(short, long, env = "HOSPITAL_PASSWORD", hide_env_values = true)]
            password: String,
            /// patient / doctor / admin
            #[arg(long)]
            user_type: Option<String>,
        },
        /// Clear the stored session
        Logout,
        /// Show the current identity
        Whoami,
        /// Run the route guard for a path with the current session
        Check { path: String },
        /// List departments
        Departments {
            #[arg(short, long)]
            search: Option<String>,
        },
        /// List doctors
        Doctors {
            #[arg(short, long)]
            dept: Option<i64>,
            #[arg(short, long)]
            search: Option<String>,
        },
        /// List appointments visible to the current role
        Appointments {
            /// 管理员：只看最近的预约
            #[arg(long)]
            recent: bool,
        },
    }

    fn init_tracing() {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    pub async fn run() -> Result<()> {
        init_tracing();
        let cli = Cli::parse();

        let mut config = ClientConfig::from_env();
        if let Some(url) = cli.base_url {
            config = config.with_base_url(url);
        }

        let dir = config
            .session_dir
            .clone()
            .context("cannot determine a session directory, set HOSPITAL_SESSION_DIR")?;
        let session = SessionStore::new(Rc::new(FileStorage::new(dir)));
        let client = ReqwestHttpClient::new(config.timeout)?;
        let policy = config.post_login_redirect;
        let pipeline = RequestPipeline::new(client, session.clone(), config);
        let api = HospitalApi::new(&pipeline);

        match cli.command {
            Command::Login {
                username,
                password,
                user_type,
            } => {
                let request = LoginRequest {
                    username,
                    password,
                    user_type,
                };
                let user = auth::login(&pipeline, &request).await?;
                println!(
                    "signed in as {} ({})",
                    user.real_name.as_deref().unwrap_or(&user.username),
                    user.role
                );
            }
            Command::Logout => {
                auth::logout(&session)?;
                println!("signed out");
            }
            Command::Whoami => match session.session().user() {
                Some(user) => println!("{} #{} {}", user.username, user.id, user.role),
                None => println!("anonymous"),
            },
            Command::Check { path } => {
                let navigator = Navigator::new(
                    RouteTable::hospital(),
                    session.clone(),
                    MemoryHistory::default(),
                    policy,
                );
                let nav = navigator.navigate(&path);
                println!(
                    "{path}: {:?} -> {} ({})",
                    nav.decision, nav.route.path, nav.route.view
                );
            }
            Command::Departments { search } => {
                let depts = match search {
                    Some(keyword) => api.departments().search(&keyword).await?,
                    None => api.departments().list().await?,
                };
                for dept in depts {
                    println!("{:>4}  {}", dept.id, dept.dept_name);
                }
            }
            Command::Doctors { dept, search } => {
                let doctors = match (dept, search) {
                    (Some(id), _) => api.doctors().by_department(id).await?,
                    (None, Some(keyword)) => api.doctors().search(&keyword).await?,
                    (None, None) => api.doctors().all().await?,
                };
                for doctor in doctors {
                    println!(
                        "{:>4}  {}  {}  {}",
                        doctor.id,
                        doctor.real_name.as_deref().unwrap_or("-"),
                        doctor.title.as_deref().unwrap_or("-"),
                        doctor.dept_name.as_deref().unwrap_or("-"),
                    );
                }
            }
            Command::Appointments { recent } => {
                let appointments = match session.session().role() {
                    Some(Role::Patient) => api.appointments().patient_list().await?,
                    Some(Role::Doctor) => api.appointments().doctor_list().await?,
                    Some(Role::Admin) => {
                        let query = if recent {
                            AppointmentQuery::recent()
                        } else {
                            AppointmentQuery::default()
                        };
                        api.appointments().list(&query).await?
                    }
                    None => bail!("not signed in, run `hospital login` first"),
                };
                for a in appointments {
                    let date = a
                        .appointment_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".into());
                    println!(
                        "{:>4}  {}  {}  {}  {}",
                        a.id,
                        date,
                        a.doctor_name.as_deref().unwrap_or("-"),
                        a.department_name.as_deref().unwrap_or("-"),
                        a.status_text.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        Ok(())
    }
}

// 请求 future 不是 Send 的，使用单线程运行时
#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
